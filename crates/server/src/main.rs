use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskhive_server::{
    config, db,
    handlers::ws::create_chat_registry,
    services::{notify::Notifier, storage::StorageService},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskhive_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = config::Config::from_env();

    // Initialize attachment storage
    let storage = StorageService::new(config.storage_path.clone());
    storage
        .init()
        .await
        .map_err(|e| anyhow::anyhow!("storage init failed: {e}"))?;

    // Initialize database
    let db = db::Database::connect(&config.database_url).await?;
    db.run_migrations().await?;
    db::seed::ensure_bootstrap(&db, &config).await?;

    // Live chat rooms and the notification dispatcher
    let chat = create_chat_registry();
    let notifier = Notifier::new(db.clone(), config.telegram_bot_token.clone());

    let state = AppState {
        db,
        config: config.clone(),
        chat,
        notifier,
        storage,
    };

    let app = taskhive_server::app(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

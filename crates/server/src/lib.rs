pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod middleware;
pub mod policy;
pub mod repo;
pub mod routes;
pub mod services;

use axum::{middleware as axum_middleware, routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use handlers::ws::ChatRegistry;
use services::{notify::Notifier, storage::StorageService};

#[derive(Clone)]
pub struct AppState {
    pub db: db::Database,
    pub config: config::Config,
    pub chat: ChatRegistry,
    pub notifier: Notifier,
    pub storage: StorageService,
}

/// Assemble the full application router. Everything except login, the
/// company list, the websocket upgrade, and the health probe sits behind the
/// actor-resolving auth layer.
pub fn app(state: AppState) -> Router {
    let protected_routes = Router::new()
        .nest("/companies", routes::companies::router())
        .nest("/users", routes::users::router())
        .nest("/tasks", routes::tasks::router())
        .nest("/comments", routes::comments::router())
        .nest("/messages", routes::messages::router())
        .nest("/attachments", routes::attachments::router())
        .nest("/reminders", routes::reminders::router())
        .nest("/notifications", routes::notifications::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    let api_router = Router::new()
        .nest("/auth", routes::auth::router())
        .merge(protected_routes);

    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(handlers::ws::ws_handler))
        .nest("/api", api_router)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

async fn health_check() -> &'static str {
    "OK"
}

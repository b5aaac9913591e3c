use chrono::Utc;
use uuid::Uuid;

use crate::{auth, config::Config, db::Database};

/// First-run bootstrap: every other record in the system is created by an
/// Admin, so an empty database gets one company and one Admin account from
/// the configuration.
pub async fn ensure_bootstrap(db: &Database, config: &Config) -> anyhow::Result<()> {
    let user_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(&db.pool)
        .await?;
    if user_count > 0 {
        return Ok(());
    }

    let now = Utc::now();

    let company_id = match sqlx::query_scalar::<_, String>("SELECT id FROM companies WHERE name = ?")
        .bind(&config.bootstrap_company)
        .fetch_optional(&db.pool)
        .await?
    {
        Some(id) => id,
        None => {
            let id = Uuid::new_v4().to_string();
            sqlx::query("INSERT INTO companies (id, name, created_at) VALUES (?, ?, ?)")
                .bind(&id)
                .bind(&config.bootstrap_company)
                .bind(now)
                .execute(&db.pool)
                .await?;
            id
        }
    };

    let password_hash = auth::hash_password(&config.bootstrap_admin_password)
        .map_err(|err| anyhow::anyhow!("failed to hash bootstrap password: {err}"))?;

    sqlx::query(
        "INSERT INTO users (id, username, password_hash, role, company_id, is_active, mobile_number, telegram_chat_id, created_at) \
         VALUES (?, ?, ?, 'Admin', ?, 1, NULL, NULL, ?)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&config.bootstrap_admin_username)
    .bind(&password_hash)
    .bind(&company_id)
    .bind(now)
    .execute(&db.pool)
    .await?;

    tracing::info!(
        company = %config.bootstrap_company,
        username = %config.bootstrap_admin_username,
        "seeded bootstrap admin account"
    );
    Ok(())
}

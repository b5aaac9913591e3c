pub mod models;
pub mod seed;

use std::sync::Arc;
use std::time::Duration;

use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tokio::sync::{Mutex, MutexGuard};

/// Shared storage handle. Constructed once at startup and cloned into every
/// request handler; there is no global instance.
///
/// The write lock serializes every mutating repository operation so that the
/// authorization check, the lifecycle check, and the write execute as one
/// unit. Reads go straight to the pool.
#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
    write_lock: Arc<Mutex<()>>,
}

impl Database {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        // Ensure the data directory exists
        if let Some(path) = url.strip_prefix("sqlite:") {
            let path = path.split('?').next().unwrap_or(path);
            if let Some(parent) = std::path::Path::new(path).parent() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // Bounded retry with backoff on transient contention (another process
        // holding the file lock); logical errors surface immediately.
        let mut attempt = 0;
        let pool = loop {
            match SqlitePoolOptions::new().max_connections(5).connect(url).await {
                Ok(pool) => break pool,
                Err(err) if attempt < 4 && is_transient(&err) => {
                    attempt += 1;
                    let delay = Duration::from_millis(100u64 << attempt);
                    tracing::warn!(%err, attempt, "database busy, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err.into()),
            }
        };

        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Acquire the process-wide write lock. Held for the full check-then-act
    /// span of a mutating repository call.
    pub async fn write_guard(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }
}

fn is_transient(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.message().contains("locked")
        || db.message().contains("busy"))
}

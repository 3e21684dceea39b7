//! Database connection pool and migration management.
//!
//! This module provides utilities for:
//! - Creating a PostgreSQL connection pool with a bounded lock wait
//! - Running database migrations automatically

use sqlx::{Pool, Postgres, postgres::PgPoolOptions};
use std::time::Duration;

/// Type alias for PostgreSQL connection pool.
pub type DbPool = Pool<Postgres>;

/// Create a new PostgreSQL connection pool.
///
/// See [`pool_options`] for the per-connection session settings.
///
/// # Errors
///
/// Returns an error if:
/// - Database connection string is invalid
/// - Cannot connect to PostgreSQL server
/// - Database authentication fails
pub async fn create_pool(
    database_url: &str,
    max_connections: u32,
    lock_timeout: Duration,
) -> Result<DbPool, sqlx::Error> {
    pool_options(max_connections, lock_timeout)
        .connect(database_url)
        .await
}

/// Pool options shared by every pool this service opens.
///
/// Every connection sets the session `lock_timeout`, so a transfer blocked
/// on a `FOR UPDATE` row lock fails with SQLSTATE 55P03 instead of waiting
/// forever. The same duration bounds how long a request waits for a free
/// connection.
pub fn pool_options(max_connections: u32, lock_timeout: Duration) -> PgPoolOptions {
    let lock_timeout_setting = format!("{}ms", lock_timeout.as_millis());

    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(lock_timeout)
        .after_connect(move |conn, _meta| {
            let setting = lock_timeout_setting.clone();
            Box::pin(async move {
                sqlx::query("SELECT set_config('lock_timeout', $1, false)")
                    .bind(setting)
                    .execute(&mut *conn)
                    .await?;
                Ok(())
            })
        })
}

/// Run database migrations from the `migrations/` directory.
///
/// Migrations are tracked in the `_sqlx_migrations` table, so each one runs only once.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    // The macro embeds ./migrations at compile time
    sqlx::migrate!("./migrations").run(pool).await
}

//! Postgres connection pool and schema migrations.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::{DbError, PgWorkflowStore};

/// Type alias for the shared Postgres pool used across the whole application.
pub type DbPool = PgPool;

/// How long a request waits for a free connection before failing.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Create a new connection pool from the given `database_url`.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, DbError> {
    info!(max_connections, "connecting to workflow database");
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Connect and wrap the pool in a [`PgWorkflowStore`].
pub async fn connect_store(database_url: &str, max_connections: u32) -> Result<PgWorkflowStore, DbError> {
    let pool = create_pool(database_url, max_connections).await?;
    Ok(PgWorkflowStore::new(pool))
}

/// Apply the embedded migrations from the workspace `migrations/` directory.
pub async fn run_migrations(pool: &DbPool) -> Result<(), DbError> {
    info!("running workflow schema migrations");
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}

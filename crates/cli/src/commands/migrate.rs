//! Database migration command.
//!
//! Applies `crates/api/migrations/` to `DATABASE_URL`. The API server never
//! migrates on startup.

use thiserror::Error;

use super::{ConnectError, connect};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run pending migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let store = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(store.pool()).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}

//! Database migration command.
//!
//! Migrations are embedded in the server crate and applied here, never on
//! server startup, so a deploy cannot race schema changes.

use sqlx::PgPool;

use farmstand_server::db::MIGRATOR;

use super::CliError;

/// Apply all pending migrations.
pub async fn run(pool: &PgPool) -> Result<(), CliError> {
    tracing::info!("Running migrations...");
    MIGRATOR.run(pool).await?;
    tracing::info!("Migrations complete");

    Ok(())
}

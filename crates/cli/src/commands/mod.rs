//! CLI command implementations.

pub mod import_cities;
pub mod migrate;

use farmstand_server::db::RepositoryError;

/// Errors from CLI commands.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

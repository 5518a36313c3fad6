//! Database operations for the Farmstand `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `location_country` / `location_state` / `location_city` /
//!   `location_zip_code` - Serviceable-area reference data. Written only by
//!   `fs-cli import-cities`; read-only at request time.
//! - `site_user` - Sellers and buyers, with the seller's registered zip code
//! - `user_favorite_farm` - Viewer-follows-seller relation
//! - `product` - Marketplace listings
//! - `ip_location_log` - Failed geo-IP resolution attempts
//! - `tower_sessions.session` - Tower-sessions storage
//!
//! # Migrations
//!
//! Migrations live in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p farmstand-cli -- migrate
//! ```

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub mod catalog;
pub mod cities;
pub mod favorites;
pub mod products;

pub use catalog::{CatalogFilter, Near, Visibility};
pub use cities::CityRepository;
pub use favorites::FavoriteRepository;
pub use products::ProductRepository;

/// Embedded SQL migrations, run explicitly by the CLI.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Errors from repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

//! Session middleware configuration.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions. Farmstand has
//! no login endpoints of its own; an external authentication flow writes
//! the user id under [`CURRENT_USER_KEY`] and everything here only reads it.

use farmstand_core::UserId;
use sqlx::PgPool;
use tower_sessions::{Expiry, Session, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::ServerConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "fs_session";

/// Session key holding the authenticated user id.
pub const CURRENT_USER_KEY: &str = "current_user_id";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer with `PostgreSQL` store.
///
/// The sessions table is created by migration, not here.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &ServerConfig,
) -> SessionManagerLayer<PostgresStore> {
    let store = PostgresStore::new(pool.clone());

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Read the authenticated user id from the session, if present.
pub async fn current_user_id(session: &Session) -> Option<UserId> {
    session
        .get::<i32>(CURRENT_USER_KEY)
        .await
        .ok()
        .flatten()
        .map(UserId::new)
}

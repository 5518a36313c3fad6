//! HTTP middleware stack for the marketplace API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//! 5. Location (viewer identity + resolved-location cache fill)

pub mod location;
pub mod request_id;
pub mod session;

pub use location::resolve_location;
pub use request_id::request_id_middleware;
pub use session::{CURRENT_USER_KEY, create_session_layer, current_user_id};

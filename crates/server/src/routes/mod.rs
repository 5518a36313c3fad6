//! HTTP route handlers for the marketplace API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness check
//! GET  /health/ready                - Readiness check (database ping)
//!
//! # Locations
//! GET  /api/locations/locate        - Viewer's resolved location
//! POST /api/locations/set-location  - Pin the viewer to a chosen city
//! GET  /api/locations/cities        - Serviceable cities (?state=)
//!
//! # Products
//! GET  /api/products                - Public catalog near the viewer
//! GET  /api/products/mine           - Own visible listings (auth)
//! GET  /api/products/mine/hidden    - Own hidden listings (auth)
//! GET  /api/products/{slug}         - Listing detail + discovery rails
//!
//! # Favorites (auth)
//! POST   /api/favorites/{seller_id} - Follow a farm
//! DELETE /api/favorites/{seller_id} - Unfollow a farm
//! ```
//!
//! All `/api` routes sit behind the location middleware, which guarantees
//! a viewer identity extension and a warm location cache entry.

pub mod favorites;
pub mod locations;
pub mod products;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::middleware::resolve_location;
use crate::state::AppState;

/// Create the `/api` router with the location middleware applied.
pub fn api_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/locations/locate", get(locations::locate))
        .route("/locations/set-location", post(locations::set_location))
        .route("/locations/cities", get(locations::cities))
        .route("/products", get(products::list_products))
        .route("/products/mine", get(products::my_products))
        .route("/products/mine/hidden", get(products::my_hidden_products))
        .route("/products/{slug}", get(products::product_detail))
        .route(
            "/favorites/{seller_id}",
            post(favorites::add_favorite).delete(favorites::remove_favorite),
        )
        .layer(middleware::from_fn_with_state(state, resolve_location))
}

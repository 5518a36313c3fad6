//! Viewer location resolution and caching.
//!
//! The pipeline: the middleware derives a viewer identity, checks the
//! [`LocationStore`]; on a miss the [`LocationResolver`] turns the client IP
//! into a known city (or the default-city fallback) and the result is
//! cached with a TTL. The cache is the single source of truth for "current
//! resolved location" - losing an entry just means the next request
//! re-resolves.

pub mod resolver;
pub mod store;

use serde::Serialize;

use crate::models::City;

pub use resolver::{CityDirectory, LocationResolver};
pub use store::LocationStore;

/// The location currently associated with a viewer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedLocation {
    /// The resolved city, `None` only when a store miss was backfilled
    /// without resolution (degrades the catalog to "all locations").
    pub city: Option<City>,
    /// Catalog search radius in miles.
    pub lookup_radius: i32,
    /// Whether this value is the default-city fallback rather than a real
    /// match for the viewer's IP.
    pub is_undefined: bool,
}

impl ResolvedLocation {
    /// The "never resolved" shape: no city, default radius. The catalog
    /// treats it as unfiltered.
    #[must_use]
    pub const fn unresolved(default_radius: i32) -> Self {
        Self {
            city: None,
            lookup_radius: default_radius,
            is_undefined: true,
        }
    }
}

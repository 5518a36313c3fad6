//! Serviceable-city reference data.

use farmstand_core::{CityId, GeoPoint};
use serde::Serialize;

/// A known serviceable city.
///
/// Immutable reference data: loaded once by `fs-cli import-cities` and
/// read-only at request time, so values are freely cloned into the
/// per-viewer location cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct City {
    pub id: CityId,
    pub name: String,
    /// Unique slug, e.g. `brooklyn-ny`.
    pub slug: String,
    /// State abbreviation matched against geo-IP region codes (e.g. "NY").
    pub state: String,
    /// Full state name (e.g. "New York").
    pub state_full: String,
    pub country: String,
    pub point: GeoPoint,
}

/// Compact city shape for the public city-list endpoint.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CitySummary {
    pub slug: String,
    pub name: String,
    pub state: String,
    pub country: String,
}

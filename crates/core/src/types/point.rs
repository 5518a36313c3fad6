//! Geographic points and great-circle distance.
//!
//! City and zip-code reference data carries a plain latitude/longitude pair
//! rather than a geospatial database type. Distances are computed with the
//! haversine formula, which is accurate to well under a mile at the
//! metro-area scale the catalog filters on.

use serde::{Deserialize, Serialize};

/// Mean earth radius in miles.
const EARTH_RADIUS_MILES: f64 = 3958.8;

/// A latitude/longitude pair in degrees (WGS 84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a point from latitude and longitude in degrees.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to `other` in miles (haversine).
    #[must_use]
    pub fn distance_miles(&self, other: &Self) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().min(1.0).asin();

        EARTH_RADIUS_MILES * c
    }
}

//! Location endpoints: where the API thinks the viewer is, manual
//! overrides, and the serviceable-city listing.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::db::CityRepository;
use crate::error::{AppError, Result};
use crate::location::{CityDirectory, LocationStore, ResolvedLocation};
use crate::models::{CitySummary, ViewerId, viewer::Viewer};
use crate::state::AppState;

/// GET /api/locations/locate
///
/// The viewer's current resolved location. The location middleware fills
/// the store on the way in, so a miss here is an eviction race; it is
/// answered with the unresolved shape rather than re-running resolution.
pub async fn locate(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
) -> Json<ResolvedLocation> {
    let location = state.locations().get(&viewer).await.unwrap_or_else(|| {
        ResolvedLocation::unresolved(state.config().location.default_lookup_radius)
    });

    Json(location)
}

/// Request body for a manual location override.
#[derive(Debug, Deserialize)]
pub struct SetLocationRequest {
    /// Slug of a serviceable city.
    pub slug: String,
    /// Search radius in miles; defaults to the configured radius.
    pub lookup_radius: Option<i32>,
}

/// POST /api/locations/set-location
///
/// Pin the viewer to a chosen city. A manual choice is never "undefined";
/// it sticks for the same TTL as a resolved one.
pub async fn set_location(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
    Json(body): Json<SetLocationRequest>,
) -> Result<Json<ResolvedLocation>> {
    let location = apply_location_choice(
        CityRepository::new(state.pool()),
        state.locations(),
        &viewer,
        body,
        state.config().location.default_lookup_radius,
    )
    .await?;

    Ok(Json(location))
}

/// Rewrite the viewer's cache entry with a chosen city.
///
/// An unknown slug is a 404 and leaves any existing entry untouched.
async fn apply_location_choice<D: CityDirectory>(
    directory: D,
    store: &LocationStore,
    viewer: &ViewerId,
    body: SetLocationRequest,
    default_radius: i32,
) -> Result<ResolvedLocation> {
    let city = directory
        .by_slug(&body.slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("city '{}'", body.slug)))?;

    let location = ResolvedLocation {
        city: Some(city),
        lookup_radius: body.lookup_radius.unwrap_or(default_radius),
        is_undefined: false,
    };

    store.set(viewer, location.clone()).await;

    Ok(location)
}

/// Query parameters for the city listing.
#[derive(Debug, Deserialize)]
pub struct CitiesQuery {
    /// Restrict to one state by slug.
    pub state: Option<String>,
}

/// GET /api/locations/cities
///
/// All serviceable cities, optionally restricted to one state. Backed by a
/// short-TTL response cache; city data only changes on imports.
pub async fn cities(
    State(state): State<AppState>,
    Query(query): Query<CitiesQuery>,
) -> Result<Json<Vec<CitySummary>>> {
    let key = query.state.clone().unwrap_or_else(|| "all".to_string());

    if let Some(cached) = state.city_lists().get(&key).await {
        return Ok(Json(cached.as_ref().clone()));
    }

    let cities = CityRepository::new(state.pool())
        .list(query.state.as_deref())
        .await?;

    state.city_lists().insert(key, Arc::new(cities.clone())).await;

    Ok(Json(cities))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use farmstand_core::{CityId, GeoPoint};

    use super::*;
    use crate::db::RepositoryError;
    use crate::models::City;

    struct OneCityDirectory(City);

    #[async_trait]
    impl CityDirectory for &OneCityDirectory {
        async fn by_name_state(
            &self,
            name: &str,
            state: &str,
        ) -> std::result::Result<Option<City>, RepositoryError> {
            Ok((self.0.name.eq_ignore_ascii_case(name)
                && self.0.state.eq_ignore_ascii_case(state))
            .then(|| self.0.clone()))
        }

        async fn by_slug(&self, slug: &str) -> std::result::Result<Option<City>, RepositoryError> {
            Ok((self.0.slug == slug).then(|| self.0.clone()))
        }

        async fn log_failed_lookup(
            &self,
            _ip_address: &str,
            _determined_city: &str,
        ) -> std::result::Result<(), RepositoryError> {
            Ok(())
        }
    }

    fn brooklyn() -> City {
        City {
            id: CityId::new(2),
            name: "Brooklyn".to_string(),
            slug: "brooklyn-ny".to_string(),
            state: "NY".to_string(),
            state_full: "New York".to_string(),
            country: "United States".to_string(),
            point: GeoPoint::new(40.6782, -73.9442),
        }
    }

    fn boston_fallback() -> ResolvedLocation {
        ResolvedLocation {
            city: Some(City {
                id: CityId::new(1),
                name: "Boston".to_string(),
                slug: "boston-ma".to_string(),
                state: "MA".to_string(),
                state_full: "Massachusetts".to_string(),
                country: "United States".to_string(),
                point: GeoPoint::new(42.3601, -71.0589),
            }),
            lookup_radius: 20,
            is_undefined: true,
        }
    }

    #[tokio::test]
    async fn test_known_slug_rewrites_cache_entry() {
        let store = LocationStore::new(Duration::from_secs(60));
        let viewer = ViewerId::Anonymous("a1b2c3d4e5f6".to_string());
        store.set(&viewer, boston_fallback()).await;

        let body = SetLocationRequest {
            slug: "brooklyn-ny".to_string(),
            lookup_radius: Some(50),
        };
        let location =
            apply_location_choice(&OneCityDirectory(brooklyn()), &store, &viewer, body, 20)
                .await
                .expect("set location");

        assert_eq!(location.city.as_ref().map(|c| c.slug.as_str()), Some("brooklyn-ny"));
        assert_eq!(location.lookup_radius, 50);
        assert!(!location.is_undefined);
        assert_eq!(store.get(&viewer).await, Some(location));
    }

    #[tokio::test]
    async fn test_omitted_radius_uses_default() {
        let store = LocationStore::new(Duration::from_secs(60));
        let viewer = ViewerId::Anonymous("deadbeef0123".to_string());

        let body = SetLocationRequest {
            slug: "brooklyn-ny".to_string(),
            lookup_radius: None,
        };
        let location =
            apply_location_choice(&OneCityDirectory(brooklyn()), &store, &viewer, body, 20)
                .await
                .expect("set location");

        assert_eq!(location.lookup_radius, 20);
    }

    #[tokio::test]
    async fn test_unknown_slug_is_404_and_leaves_entry_intact() {
        let store = LocationStore::new(Duration::from_secs(60));
        let viewer = ViewerId::Anonymous("a1b2c3d4e5f6".to_string());
        store.set(&viewer, boston_fallback()).await;

        let body = SetLocationRequest {
            slug: "atlantis".to_string(),
            lookup_radius: Some(50),
        };
        let err = apply_location_choice(&OneCityDirectory(brooklyn()), &store, &viewer, body, 20)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(store.get(&viewer).await, Some(boston_fallback()));
    }
}

//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::geoip::GeoIpResolver;
use crate::location::LocationStore;
use crate::models::CitySummary;

/// How long a cached city listing stays fresh. City data changes only on
/// imports, so a short window keeps the endpoint cheap without a flush hook.
const CITY_LIST_TTL: Duration = Duration::from_secs(300);

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    geoip: GeoIpResolver,
    locations: LocationStore,
    city_lists: Cache<String, Arc<Vec<CitySummary>>>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Opens the geo-IP database from the configured path; a missing file is
    /// tolerated and every lookup falls through to the default city.
    #[must_use]
    pub fn new(config: ServerConfig, pool: PgPool) -> Self {
        let geoip = GeoIpResolver::open(&config.location.geoip_db_path);
        let locations = LocationStore::new(config.location.ttl);
        let city_lists = Cache::builder()
            .max_capacity(256)
            .time_to_live(CITY_LIST_TTL)
            .build();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                geoip,
                locations,
                city_lists,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the geo-IP resolver.
    #[must_use]
    pub fn geoip(&self) -> &GeoIpResolver {
        &self.inner.geoip
    }

    /// Get a reference to the per-viewer resolved-location store.
    #[must_use]
    pub fn locations(&self) -> &LocationStore {
        &self.inner.locations
    }

    /// Get a reference to the city listing response cache.
    #[must_use]
    pub fn city_lists(&self) -> &Cache<String, Arc<Vec<CitySummary>>> {
        &self.inner.city_lists
    }
}

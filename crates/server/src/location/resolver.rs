//! IP-to-city resolution with default-city fallback.
//!
//! Resolution never fails because of geo data: an address the geo-IP
//! database does not know, or a city the catalog does not serve, falls back
//! to the configured default city with `is_undefined = true`, and the
//! attempt is logged for diagnosing geo-IP/catalog gaps. Only backend
//! failures (the city catalog or the log table being unreachable)
//! propagate.

use async_trait::async_trait;

use crate::db::RepositoryError;
use crate::geoip::IpLocator;
use crate::models::City;

/// City catalog lookups needed during resolution.
///
/// Implemented by `CityRepository`; tests substitute an in-memory
/// directory.
#[async_trait]
pub trait CityDirectory: Send + Sync {
    /// Case-insensitive match on city name and state (abbreviation or full
    /// name).
    async fn by_name_state(&self, name: &str, state: &str)
    -> Result<Option<City>, RepositoryError>;

    /// Lookup by unique slug.
    async fn by_slug(&self, slug: &str) -> Result<Option<City>, RepositoryError>;

    /// Record a geo-IP attempt that did not map onto the catalog.
    async fn log_failed_lookup(
        &self,
        ip_address: &str,
        determined_city: &str,
    ) -> Result<(), RepositoryError>;
}

/// Resolves a client IP to a serviceable city.
pub struct LocationResolver<'a, G, D> {
    geoip: &'a G,
    directory: D,
    default_city_slug: &'a str,
}

impl<'a, G, D> LocationResolver<'a, G, D>
where
    G: IpLocator,
    D: CityDirectory,
{
    /// Create a resolver over a geo-IP locator and a city directory.
    pub const fn new(geoip: &'a G, directory: D, default_city_slug: &'a str) -> Self {
        Self {
            geoip,
            directory,
            default_city_slug,
        }
    }

    /// Resolve `ip` to a city, falling back to the default city.
    ///
    /// Returns the city and an `is_undefined` flag: `false` for a real
    /// match, `true` when the fallback was substituted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` only for backend failures; geo lookup
    /// failures are absorbed into the fallback.
    pub async fn resolve(&self, ip: &str) -> Result<(City, bool), RepositoryError> {
        match self.locate(ip).await? {
            Some(city) => Ok((city, false)),
            None => Ok((self.default_city().await?, true)),
        }
    }

    /// The geo lookup itself: IP -> raw guess -> catalog match.
    ///
    /// Logs and returns `None` on any step that does not map cleanly.
    async fn locate(&self, ip: &str) -> Result<Option<City>, RepositoryError> {
        let Some(geo) = self.geoip.locate(ip) else {
            self.directory
                .log_failed_lookup(ip, "address not found")
                .await?;
            return Ok(None);
        };

        let (Some(city_name), Some(region)) = (geo.city.as_deref(), geo.region.as_deref()) else {
            self.directory
                .log_failed_lookup(ip, geo.city.as_deref().unwrap_or("address not found"))
                .await?;
            return Ok(None);
        };

        let Some(city) = self.directory.by_name_state(city_name, region).await? else {
            self.directory.log_failed_lookup(ip, city_name).await?;
            tracing::debug!(ip, city = city_name, region, "city not in catalog");
            return Ok(None);
        };

        Ok(Some(city))
    }

    async fn default_city(&self) -> Result<City, RepositoryError> {
        self.directory
            .by_slug(self.default_city_slug)
            .await?
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "default city '{}' missing from catalog",
                    self.default_city_slug
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use farmstand_core::{CityId, GeoPoint};

    use super::*;
    use crate::geoip::RawGeo;

    struct StubLocator(Option<RawGeo>);

    impl IpLocator for StubLocator {
        fn locate(&self, _ip: &str) -> Option<RawGeo> {
            self.0.clone()
        }
    }

    struct MemoryDirectory {
        cities: Vec<City>,
        log: Mutex<Vec<(String, String)>>,
    }

    impl MemoryDirectory {
        fn new(cities: Vec<City>) -> Self {
            Self {
                cities,
                log: Mutex::new(Vec::new()),
            }
        }

        fn logged(&self) -> Vec<(String, String)> {
            self.log.lock().expect("log mutex").clone()
        }
    }

    #[async_trait]
    impl CityDirectory for &MemoryDirectory {
        async fn by_name_state(
            &self,
            name: &str,
            state: &str,
        ) -> Result<Option<City>, RepositoryError> {
            Ok(self
                .cities
                .iter()
                .find(|c| {
                    c.name.eq_ignore_ascii_case(name)
                        && (c.state.eq_ignore_ascii_case(state)
                            || c.state_full.eq_ignore_ascii_case(state))
                })
                .cloned())
        }

        async fn by_slug(&self, slug: &str) -> Result<Option<City>, RepositoryError> {
            Ok(self.cities.iter().find(|c| c.slug == slug).cloned())
        }

        async fn log_failed_lookup(
            &self,
            ip_address: &str,
            determined_city: &str,
        ) -> Result<(), RepositoryError> {
            self.log
                .lock()
                .expect("log mutex")
                .push((ip_address.to_string(), determined_city.to_string()));
            Ok(())
        }
    }

    fn boston() -> City {
        City {
            id: CityId::new(1),
            name: "Boston".to_string(),
            slug: "boston-ma".to_string(),
            state: "MA".to_string(),
            state_full: "Massachusetts".to_string(),
            country: "United States".to_string(),
            point: GeoPoint::new(42.3601, -71.0589),
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

    fn raw(city: &str, region: &str) -> RawGeo {
        RawGeo {
            city: Some(city.to_string()),
            region: Some(region.to_string()),
        }
    }

    #[tokio::test]
    async fn test_known_city_resolves_without_fallback() {
        let directory = MemoryDirectory::new(vec![boston(), brooklyn()]);
        let geoip = StubLocator(Some(raw("Brooklyn", "NY")));
        let resolver = LocationResolver::new(&geoip, &directory, "boston-ma");

        let (city, is_undefined) = resolver.resolve("203.0.113.9").await.expect("resolve");
        assert_eq!(city.slug, "brooklyn-ny");
        assert!(!is_undefined);
        assert!(directory.logged().is_empty());
    }

    #[tokio::test]
    async fn test_region_full_name_also_matches() {
        let directory = MemoryDirectory::new(vec![brooklyn()]);
        let geoip = StubLocator(Some(raw("brooklyn", "New York")));
        let resolver = LocationResolver::new(&geoip, &directory, "brooklyn-ny");

        let (city, is_undefined) = resolver.resolve("203.0.113.9").await.expect("resolve");
        assert_eq!(city.slug, "brooklyn-ny");
        assert!(!is_undefined);
    }

    #[tokio::test]
    async fn test_geoip_miss_falls_back_and_logs() {
        let directory = MemoryDirectory::new(vec![boston()]);
        let geoip = StubLocator(None);
        let resolver = LocationResolver::new(&geoip, &directory, "boston-ma");

        let (city, is_undefined) = resolver.resolve("198.51.100.7").await.expect("resolve");
        assert_eq!(city.slug, "boston-ma");
        assert!(is_undefined);
        assert_eq!(
            directory.logged(),
            vec![("198.51.100.7".to_string(), "address not found".to_string())]
        );
    }

    #[tokio::test]
    async fn test_city_outside_catalog_falls_back_and_logs_guess() {
        let directory = MemoryDirectory::new(vec![boston()]);
        let geoip = StubLocator(Some(raw("Mountain View", "CA")));
        let resolver = LocationResolver::new(&geoip, &directory, "boston-ma");

        let (city, is_undefined) = resolver.resolve("8.8.8.8").await.expect("resolve");
        assert_eq!(city.slug, "boston-ma");
        assert!(is_undefined);
        assert_eq!(
            directory.logged(),
            vec![("8.8.8.8".to_string(), "Mountain View".to_string())]
        );
    }

    #[tokio::test]
    async fn test_missing_default_city_is_a_backend_error() {
        let directory = MemoryDirectory::new(vec![]);
        let geoip = StubLocator(None);
        let resolver = LocationResolver::new(&geoip, &directory, "boston-ma");

        let err = resolver.resolve("198.51.100.7").await.unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }
}

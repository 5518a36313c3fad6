//! Geo-IP lookups against a local MaxMind City database.
//!
//! The database file is opened once at startup. A missing file is tolerated:
//! every lookup then misses and the resolver substitutes the default city,
//! so a deployment without geo data still serves the full catalog.

use std::net::IpAddr;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use maxminddb::geoip2;

/// Raw city/region guess from the geo-IP database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawGeo {
    /// City name, when the database knows it.
    pub city: Option<String>,
    /// Region: the subdivision ISO code when present (e.g. "NY"),
    /// otherwise the English subdivision name.
    pub region: Option<String>,
}

/// Maps an IP address to a best-effort city/region guess.
///
/// The trait seam exists so the location resolver can be tested without a
/// `.mmdb` fixture on disk.
pub trait IpLocator: Send + Sync {
    /// Look up `ip`, returning `None` when the address cannot be located.
    fn locate(&self, ip: &str) -> Option<RawGeo>;
}

/// `IpLocator` backed by a MaxMind City database file.
#[derive(Clone)]
pub struct GeoIpResolver {
    reader: Option<Arc<maxminddb::Reader<Vec<u8>>>>,
}

impl GeoIpResolver {
    /// Open the database at `path`.
    ///
    /// A missing or unreadable file logs a warning and produces a resolver
    /// whose every lookup misses.
    #[must_use]
    pub fn open(path: &str) -> Self {
        if !Path::new(path).exists() {
            tracing::warn!(path, "geo-IP database not found; IP resolution disabled");
            return Self { reader: None };
        }

        match maxminddb::Reader::open_readfile(path) {
            Ok(reader) => Self {
                reader: Some(Arc::new(reader)),
            },
            Err(e) => {
                tracing::warn!(path, error = %e, "failed to open geo-IP database");
                Self { reader: None }
            }
        }
    }

    /// Whether a database file was successfully opened.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.reader.is_some()
    }
}

impl IpLocator for GeoIpResolver {
    fn locate(&self, ip: &str) -> Option<RawGeo> {
        let reader = self.reader.as_ref()?;
        let addr = IpAddr::from_str(ip).ok()?;

        let record: geoip2::City<'_> = match reader.lookup(addr) {
            Ok(Some(record)) => record,
            Ok(None) | Err(_) => return None,
        };

        let city = record
            .city
            .as_ref()
            .and_then(|c| c.names.as_ref())
            .and_then(|names| names.get("en"))
            .map(|s| (*s).to_string());

        let region = record
            .subdivisions
            .as_ref()
            .and_then(|subs| subs.first())
            .and_then(|sub| {
                sub.iso_code.map(str::to_string).or_else(|| {
                    sub.names
                        .as_ref()
                        .and_then(|names| names.get("en"))
                        .map(|s| (*s).to_string())
                })
            });

        Some(RawGeo { city, region })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_database_disables_lookups() {
        let resolver = GeoIpResolver::open("/nonexistent/GeoLite2-City.mmdb");
        assert!(!resolver.is_available());
        assert_eq!(resolver.locate("8.8.8.8"), None);
    }

    #[test]
    fn test_unparseable_ip_misses() {
        let resolver = GeoIpResolver::open("/nonexistent/GeoLite2-City.mmdb");
        assert_eq!(resolver.locate("not-an-ip"), None);
        assert_eq!(resolver.locate(""), None);
    }
}

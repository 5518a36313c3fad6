//! Per-viewer resolved-location cache.
//!
//! An in-process `moka` cache keyed by viewer identity. One TTL covers both
//! the cache entries and the viewer cookie (single config knob), so the
//! cookie can never outlive the cached value it refers to by design drift -
//! and the middleware checks cache presence rather than trusting the cookie
//! anyway.
//!
//! Concurrent first requests for the same viewer may each resolve and each
//! write; last-write-wins is fine because the value is a deterministic
//! function of inputs that change slower than the TTL.

use std::time::Duration;

use moka::future::Cache;

use super::ResolvedLocation;
use crate::models::ViewerId;

/// Upper bound on cached viewers; far above expected concurrent visitors,
/// present so an abuse of anonymous ids cannot grow memory without bound.
const MAX_TRACKED_VIEWERS: u64 = 100_000;

/// Cache of resolved locations keyed by viewer identity.
#[derive(Clone)]
pub struct LocationStore {
    cache: Cache<String, ResolvedLocation>,
}

impl LocationStore {
    /// Create a store whose entries expire after `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(MAX_TRACKED_VIEWERS)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// The viewer's current resolved location, or `None` if never set or
    /// expired (the two are indistinguishable by design).
    pub async fn get(&self, viewer: &ViewerId) -> Option<ResolvedLocation> {
        self.cache.get(&Self::key(viewer)).await
    }

    /// Store the viewer's resolved location for the TTL window.
    pub async fn set(&self, viewer: &ViewerId, location: ResolvedLocation) {
        self.cache.insert(Self::key(viewer), location).await;
    }

    fn key(viewer: &ViewerId) -> String {
        format!("user_location::{viewer}")
    }
}

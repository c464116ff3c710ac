//! TTL cache in front of the aggregator
//!
//! Lookups and inserts are separate steps, so two concurrent misses for the
//! same key both compute. Failed computations are never stored.

use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use crate::analytics::models::StatsSnapshot;
use crate::config::CacheConfig;

/// Guild id plus the range exactly as requested
///
/// Absent bounds stay absent, so open-ended requests for a guild share one
/// entry until it expires.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct StatsKey {
    pub guild_id: String,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl StatsKey {
    pub fn new(guild_id: &str, start: Option<&str>, end: Option<&str>) -> Self {
        let normalize = |raw: Option<&str>| {
            raw.map(str::trim)
                .filter(|raw| !raw.is_empty())
                .map(str::to_string)
        };
        Self {
            guild_id: guild_id.to_string(),
            start: normalize(start),
            end: normalize(end),
        }
    }
}

#[derive(Clone)]
pub struct StatsCache {
    inner: Cache<StatsKey, Arc<StatsSnapshot>>,
}

impl StatsCache {
    pub fn new(config: &CacheConfig) -> Self {
        let inner = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(Duration::from_secs(config.ttl_secs))
            .build();

        Self { inner }
    }

    pub async fn get(&self, key: &StatsKey) -> Option<Arc<StatsSnapshot>> {
        self.inner.get(key).await
    }

    pub async fn insert(&self, key: StatsKey, snapshot: Arc<StatsSnapshot>) {
        self.inner.insert(key, snapshot).await;
    }
}

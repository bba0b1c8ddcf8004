use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use sirenlink_core::error::Result;
use sirenlink_core::protocol::GeoPoint;

use crate::config::GeoSection;
use crate::obs::GatewayMetrics;

use super::{Facility, GeoProvider, RouteGeometry};

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// Bounded map whose entries expire `ttl` after insertion.
pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    ttl: Duration,
    max_entries: usize,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.inserted_at.elapsed() < self.ttl {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    pub async fn insert(&self, key: String, value: V) {
        let mut entries = self.entries.write().await;
        if entries.len() >= self.max_entries && !entries.contains_key(&key) {
            let ttl = self.ttl;
            entries.retain(|_, v| v.inserted_at.elapsed() < ttl);
            // Still full of live entries: drop the oldest one.
            if entries.len() >= self.max_entries {
                if let Some(oldest) = entries
                    .iter()
                    .min_by_key(|(_, v)| v.inserted_at)
                    .map(|(k, _)| k.clone())
                {
                    entries.remove(&oldest);
                }
            }
        }
        entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

fn round_coord(v: f64, precision: u32) -> String {
    let f = 10f64.powi(precision as i32);
    let r = (v * f).round() / f;
    // Avoid "-0.000" and "0.000" splitting one key.
    let r = if r == 0.0 { 0.0 } else { r };
    format!("{:.*}", precision as usize, r)
}

/// Cache key for `points` rounded to `precision` decimal places.
pub fn coord_key(kind: &str, points: &[GeoPoint], precision: u32) -> String {
    let mut key = String::from(kind);
    for p in points {
        key.push(':');
        key.push_str(&round_coord(p.lat, precision));
        key.push(',');
        key.push_str(&round_coord(p.lon, precision));
    }
    key
}

/// Caching decorator around any `GeoProvider`.
///
/// Only successful lookups are cached; route misses (`None`) and upstream
/// errors always go back to the provider.
pub struct CachedGeo<P> {
    inner: P,
    facilities: TtlCache<Vec<Facility>>,
    routes: TtlCache<RouteGeometry>,
    precision: u32,
    metrics: Option<Arc<GatewayMetrics>>,
}

impl<P: GeoProvider> CachedGeo<P> {
    pub fn new(inner: P, cfg: &GeoSection) -> Self {
        let ttl = Duration::from_secs(cfg.cache_ttl_secs);
        Self {
            inner,
            facilities: TtlCache::new(ttl, cfg.cache_max_entries),
            routes: TtlCache::new(ttl, cfg.cache_max_entries),
            precision: cfg.cache_precision,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<GatewayMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    fn count(&self, kind: &str, cache: &str) {
        if let Some(m) = &self.metrics {
            m.geo_lookups.inc(&[("kind", kind), ("cache", cache)]);
        }
    }
}

#[async_trait]
impl<P: GeoProvider> GeoProvider for CachedGeo<P> {
    async fn nearby_facilities(&self, at: GeoPoint) -> Result<Vec<Facility>> {
        let key = coord_key("facilities", &[at], self.precision);
        if let Some(hit) = self.facilities.get(&key).await {
            self.count("facilities", "hit");
            return Ok(hit);
        }
        self.count("facilities", "miss");

        let found = self.inner.nearby_facilities(at).await?;
        self.facilities.insert(key, found.clone()).await;
        Ok(found)
    }

    async fn route(&self, start: GeoPoint, end: GeoPoint) -> Result<Option<RouteGeometry>> {
        let key = coord_key("route", &[start, end], self.precision);
        if let Some(hit) = self.routes.get(&key).await {
            self.count("route", "hit");
            return Ok(Some(hit));
        }
        self.count("route", "miss");

        let found = self.inner.route(start, end).await?;
        if let Some(geom) = &found {
            self.routes.insert(key, geom.clone()).await;
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = TtlCache::new(Duration::from_millis(20), 8);
        cache.insert("k".into(), 1u32).await;
        assert_eq!(cache.get("k").await, Some(1));

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn full_cache_evicts_oldest_live_entry() {
        let cache = TtlCache::new(Duration::from_secs(60), 2);
        cache.insert("a".into(), 1u32).await;
        tokio::time::sleep(Duration::from_millis(2)).await;
        cache.insert("b".into(), 2).await;
        tokio::time::sleep(Duration::from_millis(2)).await;
        cache.insert("c".into(), 3).await;

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get("a").await, None);
        assert_eq!(cache.get("b").await, Some(2));
        assert_eq!(cache.get("c").await, Some(3));
    }

    #[tokio::test]
    async fn expired_entries_are_swept_before_eviction() {
        let cache = TtlCache::new(Duration::from_millis(200), 2);
        cache.insert("stale".into(), 0u32).await;
        tokio::time::sleep(Duration::from_millis(250)).await;

        cache.insert("b".into(), 2).await;
        cache.insert("c".into(), 3).await;

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get("b").await, Some(2));
        assert_eq!(cache.get("c").await, Some(3));
    }

    #[tokio::test]
    async fn overwriting_a_key_does_not_evict() {
        let cache = TtlCache::new(Duration::from_secs(60), 2);
        cache.insert("a".into(), 1u32).await;
        cache.insert("b".into(), 2).await;
        cache.insert("b".into(), 20).await;

        assert_eq!(cache.get("a").await, Some(1));
        assert_eq!(cache.get("b").await, Some(20));
    }

    #[test]
    fn negative_zero_shares_a_key() {
        assert_eq!(round_coord(-0.0, 4), round_coord(0.0, 4));
        assert_eq!(
            coord_key("facilities", &[GeoPoint::new(-0.00001, 0.0)], 4),
            coord_key("facilities", &[GeoPoint::new(0.0, -0.0)], 4)
        );
        assert_eq!(round_coord(12.971_64, 4), "12.9716");
    }
}

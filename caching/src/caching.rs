// caching/src/caching.rs

use std::time::Duration;

use moka::future::Cache as MokaCache;

/// Bounded TTL cache for device-pushed heart-rate readings, keyed by device
/// or session id. A reading only has prefill value while it is fresh, so
/// entries expire instead of accumulating.
#[derive(Clone)]
pub struct ReadingsCache {
    inner: MokaCache<String, u16>,
}

impl ReadingsCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        ReadingsCache {
            inner: MokaCache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn record_reading(&self, device_id: String, bpm: u16) {
        self.inner.insert(device_id, bpm).await;
    }

    pub async fn latest_reading(&self, device_id: &str) -> Option<u16> {
        self.inner.get(device_id).await
    }

    pub async fn invalidate(&self, device_id: &str) {
        self.inner.invalidate(device_id).await;
    }
}

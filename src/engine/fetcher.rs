//! Presence fetch with cache write-through and stale fallback.

use crate::models::PresenceSnapshot;
use crate::roblox::PresenceApi;
use crate::storage::PresenceCache;
use std::sync::Arc;

/// Fetches live presence, maintaining the durable cache.
///
/// On a live success the snapshot is unconditionally written to the cache.
/// On any failure the cached snapshot is returned marked stale; with no
/// cached entry the Unknown stale sentinel is returned. `fetch` never
/// errors — every failure path degrades.
pub struct PresenceFetcher {
    api: Arc<dyn PresenceApi>,
    cache: Arc<dyn PresenceCache>,
}

impl PresenceFetcher {
    /// Creates a fetcher over a presence API and a cache.
    #[must_use]
    pub fn new(api: Arc<dyn PresenceApi>, cache: Arc<dyn PresenceCache>) -> Self {
        Self { api, cache }
    }

    /// Fetches the current presence snapshot for one account.
    ///
    /// Returns the snapshot and whether it came from the live API.
    pub async fn fetch(&self, entity_id: u64) -> (PresenceSnapshot, bool) {
        match self.api.user_presence(entity_id).await {
            Ok(record) => {
                let snapshot = PresenceSnapshot::live(record.status, record.place_id);
                if let Err(e) = self.cache.put(entity_id, &snapshot) {
                    // A cache write failure only hurts the next outage.
                    tracing::warn!(entity_id, error = %e, "failed to cache presence snapshot");
                }
                (snapshot, true)
            },
            Err(e) => {
                tracing::debug!(entity_id, error = %e, "live fetch failed, falling back to cache");
                (self.cached_or_unknown(entity_id), false)
            },
        }
    }

    fn cached_or_unknown(&self, entity_id: u64) -> PresenceSnapshot {
        match self.cache.get(entity_id) {
            Ok(Some(mut cached)) => {
                cached.mark_stale();
                cached
            },
            Ok(None) => PresenceSnapshot::unknown_stale(),
            Err(e) => {
                tracing::warn!(entity_id, error = %e, "cache read failed");
                PresenceSnapshot::unknown_stale()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PresenceStatus;
    use crate::roblox::{ApiError, PresenceRecord};
    use crate::storage::MemoryCache;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Presence API double returning a fixed record or hard failure,
    /// counting calls.
    struct ScriptedApi {
        record: Option<PresenceRecord>,
        calls: AtomicUsize,
    }

    impl ScriptedApi {
        fn returning(status: PresenceStatus, place_id: Option<u64>) -> Self {
            Self {
                record: Some(PresenceRecord { status, place_id }),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                record: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PresenceApi for ScriptedApi {
        async fn user_presence(&self, entity_id: u64) -> Result<PresenceRecord, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.record.ok_or(ApiError::MissingRecord(entity_id))
        }
    }

    #[tokio::test]
    async fn test_live_success_writes_cache() {
        let api = Arc::new(ScriptedApi::returning(PresenceStatus::InGame, Some(1818)));
        let cache = Arc::new(MemoryCache::new());
        let fetcher = PresenceFetcher::new(api.clone(), cache.clone());

        let (snapshot, live) = fetcher.fetch(42).await;
        assert!(live);
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
        assert!(!snapshot.stale);
        assert_eq!(snapshot.status, PresenceStatus::InGame);

        let cached = cache.get(42).expect("get").expect("cached");
        assert_eq!(cached.status, PresenceStatus::InGame);
        assert_eq!(cached.place_id, Some(1818));
    }

    #[tokio::test]
    async fn test_failure_serves_cache_marked_stale() {
        let cache = Arc::new(MemoryCache::new());
        cache
            .put(42, &PresenceSnapshot::live(PresenceStatus::Online, None))
            .expect("seed cache");

        let fetcher = PresenceFetcher::new(Arc::new(ScriptedApi::failing()), cache);
        let (snapshot, live) = fetcher.fetch(42).await;
        assert!(!live);
        assert!(snapshot.stale);
        assert_eq!(snapshot.status, PresenceStatus::Online);
        assert_eq!(snapshot.label(), "Online*");
    }

    #[tokio::test]
    async fn test_repeated_failures_do_not_double_mark() {
        let cache = Arc::new(MemoryCache::new());
        cache
            .put(42, &PresenceSnapshot::live(PresenceStatus::InGame, None))
            .expect("seed cache");

        let fetcher = PresenceFetcher::new(Arc::new(ScriptedApi::failing()), cache);
        let (first, _) = fetcher.fetch(42).await;
        let (second, _) = fetcher.fetch(42).await;
        assert_eq!(first.label(), "InGame*");
        assert_eq!(second.label().matches('*').count(), 1);
    }

    #[tokio::test]
    async fn test_failure_with_empty_cache_returns_sentinel() {
        let fetcher =
            PresenceFetcher::new(Arc::new(ScriptedApi::failing()), Arc::new(MemoryCache::new()));

        let (snapshot, live) = fetcher.fetch(42).await;
        assert!(!live);
        assert!(snapshot.status.is_unknown());
        assert!(snapshot.stale);
        assert!(snapshot.place_id.is_none());
    }

    #[tokio::test]
    async fn test_failure_never_deletes_cache_entry() {
        let cache = Arc::new(MemoryCache::new());
        cache
            .put(42, &PresenceSnapshot::live(PresenceStatus::InStudio, None))
            .expect("seed cache");

        let fetcher = PresenceFetcher::new(Arc::new(ScriptedApi::failing()), cache.clone());
        let _ = fetcher.fetch(42).await;

        let still_cached = cache.get(42).expect("get").expect("entry kept");
        assert_eq!(still_cached.status, PresenceStatus::InStudio);
        assert!(!still_cached.stale);
    }
}

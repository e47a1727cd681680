//! Weight-bounded LRU block cache (spec §4.1, invariant 6, testable
//! properties 10-13).
//!
//! Entries are immutable `Bytes` keyed by `(path, block_size, block_index)`.
//! Weight is the byte length of the cached block; the cache evicts by LRU
//! once `cache_max_bytes` is exceeded, and entries additionally expire
//! `cache_ttl_minutes` after last access. Concurrent `get_or_fetch` calls
//! for the same key deduplicate to a single underlying fetch via moka's
//! `try_get_with`.

use bytes::Bytes;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::error::StorageError;

/// Cache key: a block is uniquely identified by the file it came from,
/// the block size used to carve it, and its index within that carving.
/// Two files never collide even if a block index happens to coincide
/// (testable property 12).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockKey {
    pub path: Arc<str>,
    pub block_size: u32,
    pub block_index: u64,
}

/// Running counters for observability (§3: "Supplemented Features").
#[derive(Debug, Default)]
pub struct CacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub evictions: AtomicU64,
}

impl CacheStats {
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }
}

/// Weight-bounded, TTL-on-access LRU of file blocks, shared across every
/// `InputFile` that reads from the same backing store. Backed by
/// `moka::future::Cache` rather than the `sync` variant specifically so
/// that concurrent `get_or_fetch` calls for the same key dedup to one
/// underlying fetch instead of racing a plain check-then-act.
pub struct BlockCache {
    cache: moka::future::Cache<BlockKey, Bytes>,
    stats: Arc<CacheStats>,
}

impl BlockCache {
    /// Build a cache with the given byte budget and access TTL.
    pub fn new(max_bytes: u64, ttl: Duration) -> Self {
        let stats = Arc::new(CacheStats::default());
        let evictions = Arc::clone(&stats);
        let cache = moka::future::Cache::builder()
            .max_capacity(max_bytes)
            .weigher(|_key: &BlockKey, value: &Bytes| -> u32 {
                value.len().try_into().unwrap_or(u32::MAX)
            })
            .time_to_idle(ttl)
            .eviction_listener(move |_key, _value, _cause| {
                evictions.evictions.fetch_add(1, Ordering::Relaxed);
            })
            .build();
        BlockCache { cache, stats }
    }

    pub fn stats(&self) -> Arc<CacheStats> {
        Arc::clone(&self.stats)
    }

    /// Look up `key`, fetching via `fetch` on a miss. Concurrent callers
    /// asking for the same key observe a single invocation of `fetch`:
    /// the second caller awaits the first caller's in-flight future
    /// instead of issuing its own (moka's `try_get_with` semantics).
    pub async fn get_or_fetch<F, Fut>(&self, key: BlockKey, fetch: F) -> Result<Bytes, StorageError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Bytes, StorageError>> + Send + 'static,
    {
        // Best-effort hit/miss accounting: a concurrent insert between
        // this check and `try_get_with` undercounts a hit as a miss, but
        // never double-runs `fetch` (that guarantee comes from
        // `try_get_with` itself, not from this check).
        let probably_cached = self.cache.contains_key(&key);
        match self.cache.try_get_with(key, fetch()).await {
            Ok(bytes) => {
                if probably_cached {
                    self.stats.hits.fetch_add(1, Ordering::Relaxed);
                } else {
                    self.stats.misses.fetch_add(1, Ordering::Relaxed);
                }
                Ok(bytes)
            }
            Err(shared) => Err(StorageError::Shared(shared)),
        }
    }

    /// Drop every cached block whose path starts with `prefix`. Exposed
    /// for the mutable-file edge case noted in spec §4.1 (a path gets
    /// overwritten out from under an immutable-by-convention cache).
    pub fn invalidate_prefix(&self, prefix: &str) {
        let prefix = prefix.to_string();
        self.cache.invalidate_entries_if(move |k, _v| k.path.starts_with(&prefix)).ok();
    }

    #[cfg(test)]
    pub async fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(path: &str, idx: u64) -> BlockKey {
        BlockKey {
            path: Arc::from(path),
            block_size: 4096,
            block_index: idx,
        }
    }

    #[tokio::test]
    async fn repeated_sequential_fetches_hit_the_cache() {
        let cache = BlockCache::new(1024 * 1024, Duration::from_secs(300));
        let calls = Arc::new(AtomicU64::new(0));

        for _ in 0..2 {
            let calls = Arc::clone(&calls);
            cache
                .get_or_fetch(key("a", 0), || async move {
                    calls.fetch_add(1, Ordering::Relaxed);
                    Ok(Bytes::from_static(b"block-data"))
                })
                .await
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    /// Two fetches for the same key, launched together via `tokio::join!`
    /// so both are genuinely in flight at once, must dedup to a single
    /// underlying fetch rather than each seeing an empty cache.
    #[tokio::test]
    async fn concurrent_fetches_for_the_same_key_dedup_to_one() {
        let cache = BlockCache::new(1024 * 1024, Duration::from_secs(300));
        let calls = Arc::new(AtomicU64::new(0));

        let fetch = |calls: Arc<AtomicU64>| {
            move || async move {
                calls.fetch_add(1, Ordering::Relaxed);
                // Yield so the other `join!` branch gets polled before this
                // fetch resolves, guaranteeing real overlap rather than the
                // two calls happening to run back-to-back.
                tokio::task::yield_now().await;
                Ok(Bytes::from_static(b"block-data"))
            }
        };

        let (a, b) = tokio::join!(
            cache.get_or_fetch(key("a", 0), fetch(Arc::clone(&calls))),
            cache.get_or_fetch(key("a", 0), fetch(Arc::clone(&calls))),
        );
        assert_eq!(a.unwrap(), Bytes::from_static(b"block-data"));
        assert_eq!(b.unwrap(), Bytes::from_static(b"block-data"));
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn distinct_paths_do_not_collide_on_same_block_index() {
        let cache = BlockCache::new(1024 * 1024, Duration::from_secs(300));
        cache
            .get_or_fetch(key("a", 0), || async { Ok(Bytes::from_static(b"A")) })
            .await
            .unwrap();
        cache
            .get_or_fetch(key("b", 0), || async { Ok(Bytes::from_static(b"B")) })
            .await
            .unwrap();
        assert_eq!(cache.entry_count().await, 2);
    }
}

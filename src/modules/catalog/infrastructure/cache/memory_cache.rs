use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::modules::catalog::domain::repositories::{CacheStats, CacheStore};
use crate::shared::errors::AppResult;

const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Cached entry with TTL support
#[derive(Debug, Clone)]
struct CacheEntry {
    data: Vec<u8>,
    /// Insertion order, used for oldest-first eviction
    sequence: u64,
    /// `None` when the TTL reaches past what `Instant` can represent
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(data: Vec<u8>, ttl: Duration, sequence: u64) -> Self {
        Self {
            data,
            sequence,
            expires_at: Instant::now().checked_add(ttl),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// In-process cache store backed by a sharded map.
///
/// Expired entries are dropped lazily on read and by a background sweep that
/// starts with the first operation inside a tokio runtime.
#[derive(Debug)]
pub struct MemoryCacheStore {
    cache: Arc<DashMap<String, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: Arc<AtomicU64>,
    next_sequence: AtomicU64,
    cleanup_task_started: AtomicBool,
    shutdown: CancellationToken,
    max_entries: usize,
}

impl MemoryCacheStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            cache: Arc::new(DashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: Arc::new(AtomicU64::new(0)),
            next_sequence: AtomicU64::new(0),
            cleanup_task_started: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
            max_entries: max_entries.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Ensure cleanup task is started (idempotent)
    fn ensure_cleanup_task_started(&self) {
        if tokio::runtime::Handle::try_current().is_err() {
            return;
        }
        if self
            .cleanup_task_started
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return;
        }

        let cache = Arc::clone(&self.cache);
        let evictions = Arc::clone(&self.evictions);
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = interval.tick() => {
                        let before = cache.len();
                        cache.retain(|_, entry| !entry.is_expired());
                        let removed = before.saturating_sub(cache.len());
                        if removed > 0 {
                            evictions.fetch_add(removed as u64, Ordering::Relaxed);
                            debug!("Cleaned up {} expired cache entries", removed);
                        }
                    }
                }
            }
        });
        debug!("Background cache cleanup task started");
    }

    /// Evict oldest entries until the cache is back to 90% of capacity
    fn evict_oldest_entries(&self) {
        let current_size = self.cache.len();
        if current_size < self.max_entries {
            return;
        }

        self.cache.retain(|_, entry| !entry.is_expired());

        let mut by_age: Vec<(String, u64)> = self
            .cache
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().sequence))
            .collect();
        by_age.sort_by_key(|(_, sequence)| *sequence);

        let target_size = (self.max_entries * 9) / 10;
        let to_evict = self.cache.len().saturating_sub(target_size).max(1);

        for (key, _) in by_age.into_iter().take(to_evict) {
            self.cache.remove(&key);
        }

        let evicted = current_size.saturating_sub(self.cache.len());
        self.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
        debug!(
            "Evicted {} cache entries (was {}, now {})",
            evicted,
            current_size,
            self.cache.len()
        );
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl Drop for MemoryCacheStore {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        self.ensure_cleanup_task_started();

        if let Some(entry) = self.cache.get(key) {
            if !entry.is_expired() {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit for key: {}", key);
                return Ok(Some(entry.data.clone()));
            }
        }

        // Expired entries are removed on the way out; the guard above is released
        if self.cache.remove_if(key, |_, entry| entry.is_expired()).is_some() {
            debug!("Removed expired cache entry for key: {}", key);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!("Cache miss for key: {}", key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> AppResult<()> {
        self.ensure_cleanup_task_started();

        if self.cache.len() >= self.max_entries && !self.cache.contains_key(key) {
            self.evict_oldest_entries();
        }

        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        self.cache
            .insert(key.to_string(), CacheEntry::new(value, ttl, sequence));
        debug!("Cached key: {} with TTL: {:?}", key, ttl);
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        self.cache.remove(key);
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        self.cache.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        info!("Cache cleared");
        Ok(())
    }

    async fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.cache.len(),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

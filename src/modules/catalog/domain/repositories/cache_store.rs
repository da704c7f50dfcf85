use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::shared::errors::AppResult;

/// Key-value store with per-key expiry.
///
/// Expired and absent keys are indistinguishable: both come back as `None`.
/// An `Err` means the cache itself is unreachable.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> AppResult<()>;

    async fn remove(&self, key: &str) -> AppResult<()>;

    async fn clear(&self) -> AppResult<()>;

    async fn stats(&self) -> CacheStats;
}

/// Cache statistics for monitoring
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            self.hits as f64 / (self.hits + self.misses) as f64
        }
    }
}

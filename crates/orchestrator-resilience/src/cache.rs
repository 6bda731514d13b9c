//! Response cache backend abstraction.
//!
//! The cache store is an external capability as far as the orchestrator is
//! concerned: it only decides keys and TTLs. This module provides the
//! backend trait, an in-memory implementation for single-process
//! deployments, and the key-derivation helper used when a caller does not
//! supply its own key.

use async_trait::async_trait;
use orchestrator_core::CallParams;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;

/// Default TTL for cached generation results (questions, study plans)
pub const GENERATION_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Default TTL for cached evaluation results
pub const EVALUATION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Error types for cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    /// Backend connection or I/O problem
    #[error("Cache backend error: {0}")]
    Backend(String),

    /// Stored payload could not be decoded
    #[error("Cache serialization error: {0}")]
    Serialization(String),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache backend trait for polymorphic cache implementations.
///
/// Set operations are idempotent; re-setting the same key is harmless.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Get a value from the cache
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Set a value in the cache with a TTL
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()>;

    /// Delete a key from the cache
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Backend name for logs and metrics
    fn name(&self) -> &'static str;
}

/// Derive a namespaced cache key from a prompt and its sampling parameters.
///
/// Temperature is discretized into tenth-buckets so float noise does not
/// fragment the cache.
#[must_use]
pub fn cache_key(namespace: &str, prompt: &str, params: &CallParams) -> String {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    prompt.hash(&mut hasher);
    let prompt_hash = hasher.finish();

    let temperature_bucket = params.temperature.map_or(7, |t| (t * 10.0) as u32);

    format!(
        "{}:ai:{}:{}:{}",
        namespace,
        prompt_hash,
        temperature_bucket,
        params.max_tokens.unwrap_or(0)
    )
}

/// Cache entry with instant-based expiry
#[derive(Debug)]
struct CacheEntry {
    data: Vec<u8>,
    expires_at: Instant,
    hits: u64,
}

impl CacheEntry {
    fn new(data: Vec<u8>, ttl: Duration) -> Self {
        Self {
            data,
            expires_at: Instant::now() + ttl,
            hits: 0,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// In-memory cache backend for single-process deployments
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    max_entries: usize,
}

impl MemoryCache {
    /// Create a new memory cache holding at most `max_entries` values
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            max_entries,
        }
    }

    /// Evict expired entries, then lowest-hit entries if still at capacity
    async fn evict_if_needed(&self) {
        let mut entries = self.entries.write().await;

        entries.retain(|_, entry| !entry.is_expired());

        if entries.len() >= self.max_entries {
            let to_remove = entries.len() - self.max_entries + 1;
            let mut hit_counts: Vec<(String, u64)> = entries
                .iter()
                .map(|(k, v)| (k.clone(), v.hits))
                .collect();
            hit_counts.sort_by_key(|(_, hits)| *hits);

            for (key, _) in hit_counts.into_iter().take(to_remove) {
                entries.remove(&key);
            }
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[async_trait]
impl ResponseCache for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut entries = self.entries.write().await;

        if let Some(entry) = entries.get_mut(key) {
            if entry.is_expired() {
                entries.remove(key);
                return Ok(None);
            }
            entry.hits += 1;
            return Ok(Some(entry.data.clone()));
        }

        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        self.evict_if_needed().await;

        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), CacheEntry::new(value, ttl));

        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

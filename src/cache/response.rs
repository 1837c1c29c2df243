//! Content-addressed response cache.
//!
//! [`ResponseCache`] memoizes normalized results keyed on the SHA-256 of
//! the raw asset bytes. The declared content type is not part of the key,
//! so identical bytes uploaded under different MIME types share an entry.
//!
//! # Eviction
//!
//! - Entries older than the TTL are treated as absent on lookup and
//!   removed then (lazy expiry). Expired entries at the old end of the
//!   queue are also dropped on insert.
//! - When a new key would exceed `max_entries`, the least recently
//!   *inserted* entry is evicted. Lookups use `peek`, so reads never
//!   change eviction order; re-inserting a key moves it to the back and
//!   refreshes its expiry.
//!
//! All access goes through one mutex per cache. It is never held across
//! an `.await`.

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use lru::LruCache;
use sha2::{Digest, Sha256};
use tokio::time::Instant;

use crate::types::AnalyzeResult;

/// Configuration for the response cache.
///
/// ```rust
/// # use detector_gateway::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .max_entries(1_024)
///     .ttl(Duration::from_secs(300));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of cached entries. Default: 256.
    pub max_entries: usize,
    /// Time-to-live for cached entries. Default: 10 minutes.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 256,
            ttl: Duration::from_secs(600),
        }
    }
}

impl CacheConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of entries.
    pub fn max_entries(mut self, n: usize) -> Self {
        self.max_entries = n;
        self
    }

    /// Set the time-to-live for entries.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

#[derive(Debug, Clone)]
struct CachedEntry {
    result: AnalyzeResult,
    /// `None` when the TTL reaches past any representable instant.
    expires_at: Option<Instant>,
}

impl CachedEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// In-memory TTL cache of normalized results.
pub struct ResponseCache {
    entries: Mutex<LruCache<String, CachedEntry>>,
    ttl: Duration,
}

impl ResponseCache {
    /// Create an empty cache. A zero `max_entries` is treated as one.
    pub fn new(config: &CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl: config.ttl,
        }
    }

    /// Look up a digest. Expired entries are removed and reported as a miss.
    pub fn get(&self, digest: &str) -> Option<AnalyzeResult> {
        let now = Instant::now();
        let mut entries = self.lock();
        let expired = match entries.peek(digest) {
            Some(entry) if !entry.is_expired(now) => return Some(entry.result.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(digest);
        }
        None
    }

    /// Store a result, evicting the oldest insertion if the cache is full.
    pub fn insert(&self, digest: impl Into<String>, result: AnalyzeResult) {
        let now = Instant::now();
        let mut entries = self.lock();
        while entries
            .peek_lru()
            .is_some_and(|(_, entry)| entry.is_expired(now))
        {
            entries.pop_lru();
        }
        entries.put(
            digest.into(),
            CachedEntry {
                result,
                expires_at: now.checked_add(self.ttl),
            },
        );
    }

    /// Number of stored entries, including any not yet lazily expired.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, CachedEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Lowercase hex SHA-256 of the raw bytes.
pub fn content_digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(label: &str) -> AnalyzeResult {
        AnalyzeResult::new(label, 0.5, vec![], "v1")
    }

    fn cache(max_entries: usize, ttl_secs: u64) -> ResponseCache {
        ResponseCache::new(
            &CacheConfig::new()
                .max_entries(max_entries)
                .ttl(Duration::from_secs(ttl_secs)),
        )
    }

    #[test]
    fn digest_is_sha256_hex() {
        assert_eq!(
            content_digest(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn digest_differs_on_bytes() {
        assert_ne!(content_digest(b"one"), content_digest(b"two"));
    }

    #[tokio::test(start_paused = true)]
    async fn miss_then_hit() {
        let cache = cache(4, 60);
        assert!(cache.get("k").is_none());
        cache.insert("k", result("fake"));
        assert_eq!(cache.get("k").unwrap().label, "fake");
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = cache(4, 60);
        cache.insert("k", result("fake"));

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(cache.get("k").is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get("k").is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn evicts_oldest_insert_even_if_recently_read() {
        let cache = cache(2, 60);
        cache.insert("a", result("a"));
        cache.insert("b", result("b"));

        // Reading "a" must not protect it.
        assert!(cache.get("a").is_some());
        cache.insert("c", result("c"));

        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_some());
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn reinsert_refreshes_position_and_expiry() {
        let cache = cache(2, 60);
        cache.insert("a", result("a1"));
        tokio::time::advance(Duration::from_secs(30)).await;
        cache.insert("b", result("b"));
        cache.insert("a", result("a2"));

        cache.insert("c", result("c"));
        assert!(cache.get("b").is_none());
        assert_eq!(cache.get("a").unwrap().label, "a2");

        tokio::time::advance(Duration::from_secs(45)).await;
        assert!(cache.get("a").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn insert_drops_expired_entries() {
        let cache = cache(8, 10);
        cache.insert("old-1", result("x"));
        cache.insert("old-2", result("x"));
        tokio::time::advance(Duration::from_secs(11)).await;

        cache.insert("new", result("y"));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_ttl_never_expires() {
        let cache = ResponseCache::new(&CacheConfig::new().ttl(Duration::MAX));
        cache.insert("k", result("fake"));

        tokio::time::advance(Duration::from_secs(10 * 365 * 24 * 3600)).await;
        assert_eq!(cache.get("k").unwrap().label, "fake");
        cache.insert("other", result("real"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn zero_capacity_is_clamped_to_one() {
        let cache = ResponseCache::new(&CacheConfig::new().max_entries(0));
        cache.insert("a", result("a"));
        cache.insert("b", result("b"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_empties_cache() {
        let cache = cache(4, 60);
        cache.insert("a", result("a"));
        cache.clear();
        assert!(cache.is_empty());
    }
}

//! Process-wide key/value cache with per-entry TTL.
//!
//! Values are JSON documents. Any [`CacheError`] is treated by callers as a
//! plain miss: the cached thing is rebuilt instead of failing the request.

use std::time::{Duration, Instant};

use miette::Diagnostic;
use moka::sync::Cache;
use moka::Expiry;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    #[diagnostic(
        code(routekeeper::cache::unavailable),
        help("The value will be rebuilt on every call until the cache recovers")
    )]
    Unavailable(String),
}

pub trait KeyValueCache: Send + Sync {
    fn has(&self, key: &str) -> Result<bool, CacheError>;
    fn get(&self, key: &str) -> Result<Option<Value>, CacheError>;
    fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError>;
    fn remove(&self, key: &str) -> Result<(), CacheError>;
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    ttl: Duration,
}

struct EntryTtl;

impl Expiry<String, Entry> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// In-memory cache backed by moka.
pub struct MemoryCache {
    inner: Cache<String, Entry>,
}

impl MemoryCache {
    pub fn new(max_entries: u64) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_entries)
                .expire_after(EntryTtl)
                .build(),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(1_024)
    }
}

impl KeyValueCache for MemoryCache {
    fn has(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.inner.contains_key(key))
    }

    fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        Ok(self.inner.get(key).map(|e| e.value))
    }

    fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError> {
        self.inner.insert(key.to_string(), Entry { value, ttl });
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.inner.invalidate(key);
        Ok(())
    }
}

/// A cache that is never reachable. Every cached value is rebuilt per call.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl KeyValueCache for NoCache {
    fn has(&self, _key: &str) -> Result<bool, CacheError> {
        Err(CacheError::Unavailable("no cache configured".into()))
    }

    fn get(&self, _key: &str) -> Result<Option<Value>, CacheError> {
        Err(CacheError::Unavailable("no cache configured".into()))
    }

    fn set(&self, _key: &str, _value: Value, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("no cache configured".into()))
    }

    fn remove(&self, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("no cache configured".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_get_remove() {
        let cache = MemoryCache::default();
        assert!(!cache.has("routes").unwrap());

        cache
            .set("routes", json!({ "controllers": {} }), Duration::from_secs(60))
            .unwrap();
        assert!(cache.has("routes").unwrap());
        assert_eq!(
            cache.get("routes").unwrap(),
            Some(json!({ "controllers": {} }))
        );

        cache.remove("routes").unwrap();
        assert_eq!(cache.get("routes").unwrap(), None);
    }

    #[test]
    fn test_entry_expires() {
        let cache = MemoryCache::default();
        cache
            .set("short", json!(1), Duration::from_millis(20))
            .unwrap();
        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(cache.get("short").unwrap(), None);
    }

    #[test]
    fn test_no_cache_is_unavailable() {
        let cache = NoCache;
        assert!(matches!(cache.has("routes"), Err(CacheError::Unavailable(_))));
        assert!(cache.set("routes", json!(null), Duration::from_secs(1)).is_err());
    }
}

//! Runtime resources shared between processors
//!
//! Resources are built once per compile and shared by every processor that
//! names them. Locks are held only for the duration of a single access and
//! never across an `.await`.

use super::stream_config::{CacheConfig, RateLimitConfig, ResourcesConfig};
use super::{EngineError, EngineResult};
use lru::LruCache;
use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

// ==================== Caches ====================

enum CacheStore {
    Memory {
        ttl: Duration,
        /// `None` expiry never lapses, used when the TTL is beyond `Instant`'s range
        entries: HashMap<String, (String, Option<Instant>)>,
    },
    Lru(LruCache<String, String>),
}

fn is_expired(expires: Option<Instant>, now: Instant) -> bool {
    expires.is_some_and(|at| at <= now)
}

/// A named key/value cache
pub struct CacheResource {
    store: Mutex<CacheStore>,
}

impl CacheResource {
    pub fn new(config: &CacheConfig) -> EngineResult<Self> {
        let store = match config {
            CacheConfig::Memory { ttl_secs } => CacheStore::Memory {
                ttl: Duration::from_secs(*ttl_secs),
                entries: HashMap::new(),
            },
            CacheConfig::Lru { cap } => {
                let cap = NonZeroUsize::new(*cap).ok_or_else(|| {
                    EngineError::Validation("lru cache cap must be greater than zero".to_string())
                })?;
                CacheStore::Lru(LruCache::new(cap))
            }
        };
        Ok(Self {
            store: Mutex::new(store),
        })
    }

    pub fn set(&self, key: &str, value: &str) {
        let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        match &mut *store {
            CacheStore::Memory { entries, ttl } => {
                let now = Instant::now();
                entries.retain(|_, (_, expires)| !is_expired(*expires, now));
                let expires = now.checked_add(*ttl);
                entries.insert(key.to_string(), (value.to_string(), expires));
            }
            CacheStore::Lru(cache) => {
                cache.put(key.to_string(), value.to_string());
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        match &mut *store {
            CacheStore::Memory { entries, .. } => {
                let now = Instant::now();
                match entries.get(key) {
                    Some((value, expires)) if !is_expired(*expires, now) => Some(value.clone()),
                    Some(_) => {
                        entries.remove(key);
                        None
                    }
                    None => None,
                }
            }
            CacheStore::Lru(cache) => cache.get(key).cloned(),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        let store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        match &*store {
            CacheStore::Memory { entries, .. } => entries.len(),
            CacheStore::Lru(cache) => cache.len(),
        }
    }

    pub fn delete(&self, key: &str) {
        let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        match &mut *store {
            CacheStore::Memory { entries, .. } => {
                entries.remove(key);
            }
            CacheStore::Lru(cache) => {
                cache.pop(key);
            }
        }
    }
}

// ==================== Rate limits ====================

struct Window {
    started: Instant,
    used: u32,
}

/// A fixed-window token counter
pub struct RateLimitResource {
    count: u32,
    interval: Duration,
    window: Mutex<Window>,
}

impl RateLimitResource {
    pub fn new(config: &RateLimitConfig) -> Self {
        let RateLimitConfig::Local { count, interval_ms } = config;
        Self {
            count: (*count).max(1),
            interval: Duration::from_millis(*interval_ms),
            window: Mutex::new(Window {
                started: Instant::now(),
                used: 0,
            }),
        }
    }

    /// Try to take a token
    ///
    /// Returns `None` when a token was taken, otherwise how long to wait
    /// before the current window resets.
    pub fn access(&self) -> Option<Duration> {
        let mut window = self.window.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        let elapsed = now.duration_since(window.started);
        if elapsed >= self.interval {
            window.started = now;
            window.used = 0;
        }
        if window.used < self.count {
            window.used += 1;
            None
        } else {
            Some(self.interval.saturating_sub(elapsed))
        }
    }

    /// Take a token, sleeping through as many windows as needed
    pub async fn acquire(&self) {
        while let Some(wait) = self.access() {
            tokio::time::sleep(wait.max(Duration::from_millis(1))).await;
        }
    }
}

// ==================== Registry ====================

/// All resources of one compiled pipeline
#[derive(Default)]
pub struct Resources {
    caches: BTreeMap<String, Arc<CacheResource>>,
    rate_limits: BTreeMap<String, Arc<RateLimitResource>>,
}

impl Resources {
    pub fn build(config: &ResourcesConfig) -> EngineResult<Self> {
        let mut caches = BTreeMap::new();
        for (label, conf) in &config.caches {
            caches.insert(label.clone(), Arc::new(CacheResource::new(conf)?));
        }
        let rate_limits = config
            .rate_limits
            .iter()
            .map(|(label, conf)| (label.clone(), Arc::new(RateLimitResource::new(conf))))
            .collect();
        Ok(Self {
            caches,
            rate_limits,
        })
    }

    pub fn cache(&self, label: &str) -> EngineResult<Arc<CacheResource>> {
        self.caches
            .get(label)
            .cloned()
            .ok_or_else(|| EngineError::Validation(format!("cache resource '{}' not found", label)))
    }

    pub fn rate_limit(&self, label: &str) -> EngineResult<Arc<RateLimitResource>> {
        self.rate_limits.get(label).cloned().ok_or_else(|| {
            EngineError::Validation(format!("rate limit resource '{}' not found", label))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_cache_set_get_delete() {
        let cache = CacheResource::new(&CacheConfig::Memory { ttl_secs: 60 }).unwrap();
        cache.set("k", "v");
        assert_eq!(cache.get("k").as_deref(), Some("v"));
        cache.delete("k");
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_memory_cache_expiry() {
        let cache = CacheResource::new(&CacheConfig::Memory { ttl_secs: 0 }).unwrap();
        cache.set("k", "v");
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_memory_cache_huge_ttl_never_expires() {
        let cache = CacheResource::new(&CacheConfig::Memory { ttl_secs: u64::MAX }).unwrap();
        cache.set("k", "v");
        assert_eq!(cache.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_memory_cache_prunes_expired_on_set() {
        let cache = CacheResource::new(&CacheConfig::Memory { ttl_secs: 0 }).unwrap();
        for i in 0..100 {
            cache.set(&i.to_string(), "v");
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_lru_cache_evicts_oldest() {
        let cache = CacheResource::new(&CacheConfig::Lru { cap: 2 }).unwrap();
        cache.set("a", "1");
        cache.set("b", "2");
        cache.set("c", "3");
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("c").as_deref(), Some("3"));
    }

    #[test]
    fn test_lru_zero_cap_rejected() {
        assert!(CacheResource::new(&CacheConfig::Lru { cap: 0 }).is_err());
    }

    #[test]
    fn test_rate_limit_window() {
        let limit = RateLimitResource::new(&RateLimitConfig::Local {
            count: 2,
            interval_ms: 60_000,
        });
        assert!(limit.access().is_none());
        assert!(limit.access().is_none());
        let wait = limit.access().expect("third access should wait");
        assert!(wait <= Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_rate_limit_acquire_waits_for_reset() {
        let limit = RateLimitResource::new(&RateLimitConfig::Local {
            count: 1,
            interval_ms: 20,
        });
        let start = Instant::now();
        limit.acquire().await;
        limit.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(15));
    }

    #[test]
    fn test_registry_lookup() {
        let mut config = ResourcesConfig::default();
        config
            .caches
            .insert("example".to_string(), CacheConfig::Memory { ttl_secs: 5 });
        let resources = Resources::build(&config).unwrap();
        assert!(resources.cache("example").is_ok());
        assert!(resources.cache("other").is_err());
        assert!(resources.rate_limit("example").is_err());
    }
}

//! In-process TTL cache for market data responses.
//!
//! Entries are never evicted. An expired entry is still kept so that it can
//! be served when a refresh fails.

use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use log::{debug, warn};

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> ManualClock {
        ManualClock {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::from_secs(0)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut elapsed = self.elapsed.lock().unwrap_or_else(PoisonError::into_inner);
        *elapsed += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        ManualClock::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.elapsed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct Entry<V> {
    value: V,
    fetched_at: Instant,
}

pub struct PriceCache<V> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, Entry<V>>>,
}

impl<V: Clone> PriceCache<V> {
    pub fn new(ttl: Duration) -> PriceCache<V> {
        PriceCache::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> PriceCache<V> {
        PriceCache {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached value for `key`, unless it is older than the TTL.
    pub fn get(&self, key: &str) -> Option<V> {
        match self.lookup(key) {
            (Some(fresh), _) => Some(fresh),
            _ => None,
        }
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        let fetched_at = self.clock.now();
        self.lock().insert(key.into(), Entry { value, fetched_at });
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serves a fresh entry, or runs `fetch` and stores its result.
    ///
    /// When `fetch` fails and an expired entry exists, the expired value is
    /// returned instead. With no entry at all the error is propagated.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &str, fetch: F) -> Result<V, E>
        where F: FnOnce() -> Fut,
              Fut: Future<Output = Result<V, E>>,
              E: Display
    {
        let stale = match self.lookup(key) {
            (Some(fresh), _) => {
                debug!("Cache hit for '{}'", key);
                return Ok(fresh);
            },
            (None, stale) => stale,
        };

        match fetch().await {
            Ok(value) => {
                self.insert(key, value.clone());
                Ok(value)
            },
            Err(err) => match stale {
                Some(value) => {
                    warn!("Refresh of '{}' failed, serving expired entry. Cause: {}", key, err);
                    Ok(value)
                },
                None => Err(err),
            }
        }
    }

    /// Returns `(fresh, stale)`; at most one is set.
    fn lookup(&self, key: &str) -> (Option<V>, Option<V>) {
        let now = self.clock.now();
        let entries = self.lock();

        match entries.get(key) {
            None => (None, None),
            Some(entry) if now.saturating_duration_since(entry.fetched_at) < self.ttl =>
                (Some(entry.value.clone()), None),
            Some(entry) => (None, Some(entry.value.clone())),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn cache(clock: &Arc<ManualClock>) -> PriceCache<f64> {
        PriceCache::with_clock(DEFAULT_TTL, clock.clone())
    }

    #[tokio::test]
    async fn fresh_entry_skips_fetch() {
        let clock = Arc::new(ManualClock::new());
        let cache = cache(&clock);
        let calls = Cell::new(0);
        let counter = &calls;

        let fetch = move || async move { counter.set(counter.get() + 1); Ok::<_, String>(42.0) };
        assert_eq!(cache.get_or_fetch("price_bitcoin", fetch).await, Ok(42.0));

        clock.advance(Duration::from_secs(299));
        let fetch = move || async move { counter.set(counter.get() + 1); Ok::<_, String>(43.0) };
        assert_eq!(cache.get_or_fetch("price_bitcoin", fetch).await, Ok(42.0));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn expired_entry_is_refetched() {
        let clock = Arc::new(ManualClock::new());
        let cache = cache(&clock);

        cache.insert("price_bitcoin", 1.0);
        clock.advance(Duration::from_secs(300));
        assert_eq!(cache.get("price_bitcoin"), None);

        let value = cache.get_or_fetch("price_bitcoin", || async { Ok::<_, String>(2.0) }).await;
        assert_eq!(value, Ok(2.0));
        assert_eq!(cache.get("price_bitcoin"), Some(2.0));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn failed_refresh_serves_stale_value() {
        let clock = Arc::new(ManualClock::new());
        let cache = cache(&clock);

        cache.insert("price_bitcoin", 1.0);
        clock.advance(Duration::from_secs(3600));

        let value = cache.get_or_fetch("price_bitcoin", || async { Err::<f64, _>("upstream down") }).await;
        assert_eq!(value, Ok(1.0));
    }

    #[tokio::test]
    async fn failure_without_entry_propagates() {
        let cache: PriceCache<f64> = PriceCache::new(DEFAULT_TTL);

        let value = cache.get_or_fetch("price_ghost", || async { Err::<f64, _>("upstream down") }).await;
        assert_eq!(value, Err("upstream down"));
        assert!(cache.is_empty());
    }
}

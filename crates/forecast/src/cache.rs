//! TTL caches for upstream responses and computed forecasts.
//!
//! Entries are bounded by an LRU capacity and expire after a fixed TTL.
//! Expiry is lazy: a stale entry is evicted by the lookup that finds it.
//! Time comes from an injectable [`Clock`].

use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Clock> Clock for std::sync::Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Location key rounded to 3 decimal places (about 100 m)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocationKey {
    lat_milli: i64,
    lon_milli: i64,
}

impl LocationKey {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat_milli: (lat * 1000.0).round() as i64,
            lon_milli: (lon * 1000.0).round() as i64,
        }
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.3},{:.3}",
            self.lat_milli as f64 / 1000.0,
            self.lon_milli as f64 / 1000.0
        )
    }
}

struct Entry<V> {
    value: V,
    expires: DateTime<Utc>,
}

/// Bounded key-value store whose entries expire after a fixed TTL.
pub struct TtlCache<V> {
    inner: LruCache<LocationKey, Entry<V>>,
    ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache holding at most `capacity` entries (at least one).
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: LruCache::new(cap),
            ttl,
        }
    }

    /// Fresh value for `key`; a stale entry is evicted and misses.
    pub fn get(&mut self, key: &LocationKey, now: DateTime<Utc>) -> Option<V> {
        let expires = self.inner.peek(key)?.expires;
        if expires > now {
            self.inner.get(key).map(|e| e.value.clone())
        } else {
            self.inner.pop(key);
            None
        }
    }

    /// Store `value`, expiring `ttl` after `now`.
    pub fn put(&mut self, key: LocationKey, value: V, now: DateTime<Utc>) {
        self.inner.put(
            key,
            Entry {
                value,
                expires: now + self.ttl,
            },
        );
    }

    /// Entries currently held, stale ones included.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

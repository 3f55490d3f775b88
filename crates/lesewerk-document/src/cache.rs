// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bounded, time-expiring result cache for extracted page ranges.
//
// Eviction is strict FIFO by first insertion. Expired entries are not swept;
// they are only treated as absent when read.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

/// Source of "now" for TTL checks.
pub type Clock = Arc<dyn Fn() -> Instant + Send + Sync>;

/// A cached value and the moment it was stored.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    created_at: Instant,
}

/// Key/value store bounded by entry count and entry age.
pub struct PageCache {
    entries: HashMap<String, CacheEntry>,
    /// Keys in insertion order; front is evicted first.
    order: VecDeque<String>,
    max_size: usize,
    ttl: Duration,
    clock: Clock,
}

impl PageCache {
    /// Create a cache holding at most `max_size` entries (minimum 1) for `ttl`.
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self::with_clock(max_size, ttl, Arc::new(Instant::now))
    }

    /// Create a cache that reads time from `clock`.
    pub fn with_clock(max_size: usize, ttl: Duration, clock: Clock) -> Self {
        let max_size = max_size.max(1);
        Self {
            entries: HashMap::with_capacity(max_size),
            order: VecDeque::with_capacity(max_size),
            max_size,
            ttl,
            clock,
        }
    }

    /// Return the stored value if present and younger than the TTL.
    pub fn get(&self, key: &str) -> Option<&str> {
        let entry = self.entries.get(key)?;
        let age = (self.clock)().saturating_duration_since(entry.created_at);
        if age < self.ttl {
            trace!(key, ?age, "cache hit");
            Some(entry.value.as_str())
        } else {
            debug!(key, ?age, "cache entry expired");
            None
        }
    }

    /// Store `value` under `key`.
    ///
    /// A new key evicts the oldest-inserted entry when the cache is full. An
    /// existing key is overwritten in place: its value and timestamp are
    /// replaced, its queue position is kept, and nothing is evicted.
    pub fn set(&mut self, key: String, value: String) {
        let created_at = (self.clock)();
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.value = value;
            entry.created_at = created_at;
            return;
        }

        while self.entries.len() >= self.max_size {
            match self.order.pop_front() {
                Some(oldest) => {
                    debug!(key = %oldest, "evicting oldest cache entry");
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }

        self.order.push_back(key.clone());
        self.entries.insert(key, CacheEntry { value, created_at });
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl fmt::Debug for PageCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageCache")
            .field("len", &self.entries.len())
            .field("max_size", &self.max_size)
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// A clock that only moves when told to.
    fn manual_clock() -> (Clock, Arc<Mutex<Instant>>) {
        let now = Arc::new(Mutex::new(Instant::now()));
        let handle = Arc::clone(&now);
        let clock: Clock = Arc::new(move || *handle.lock().unwrap());
        (clock, now)
    }

    #[test]
    fn stores_and_returns_values() {
        let mut cache = PageCache::new(4, Duration::from_secs(60));
        cache.set("a".into(), "alpha".into());
        assert_eq!(cache.get("a"), Some("alpha"));
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn evicts_earliest_inserted_when_full() {
        let mut cache = PageCache::new(3, Duration::from_secs(60));
        for key in ["k1", "k2", "k3", "k4"] {
            cache.set(key.into(), format!("v-{key}"));
        }
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get("k1"), None);
        assert_eq!(cache.get("k2"), Some("v-k2"));
        assert_eq!(cache.get("k4"), Some("v-k4"));
    }

    #[test]
    fn reads_do_not_refresh_eviction_order() {
        let mut cache = PageCache::new(2, Duration::from_secs(60));
        cache.set("first".into(), "1".into());
        cache.set("second".into(), "2".into());
        // An LRU would now keep "first".
        assert!(cache.get("first").is_some());
        cache.set("third".into(), "3".into());
        assert_eq!(cache.get("first"), None);
        assert_eq!(cache.get("second"), Some("2"));
    }

    #[test]
    fn overwrite_keeps_position_and_does_not_evict() {
        let mut cache = PageCache::new(2, Duration::from_secs(60));
        cache.set("a".into(), "1".into());
        cache.set("b".into(), "2".into());
        cache.set("a".into(), "1b".into());
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), Some("1b"));
        assert_eq!(cache.get("b"), Some("2"));

        // "a" is still the oldest insertion, so it goes first.
        cache.set("c".into(), "3".into());
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some("2"));
    }

    #[test]
    fn entries_expire_exactly_at_ttl() {
        let (clock, now) = manual_clock();
        let mut cache = PageCache::with_clock(4, Duration::from_secs(10), clock);
        cache.set("page".into(), "text".into());

        *now.lock().unwrap() += Duration::from_secs(9);
        assert_eq!(cache.get("page"), Some("text"));

        *now.lock().unwrap() += Duration::from_secs(1);
        assert_eq!(cache.get("page"), None);
        // Lazily expired: still occupying a slot.
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn overwrite_refreshes_timestamp() {
        let (clock, now) = manual_clock();
        let mut cache = PageCache::with_clock(4, Duration::from_secs(10), clock);
        cache.set("page".into(), "old".into());
        *now.lock().unwrap() += Duration::from_secs(8);
        cache.set("page".into(), "new".into());
        *now.lock().unwrap() += Duration::from_secs(8);
        assert_eq!(cache.get("page"), Some("new"));
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut cache = PageCache::new(0, Duration::from_secs(1));
        cache.set("x".into(), "1".into());
        cache.set("y".into(), "2".into());
        assert_eq!(cache.max_size(), 1);
        assert_eq!(cache.get("y"), Some("2"));
    }
}

//! Generation-invalidated view cache.
//!
//! Every entry is stamped with the generation that was current when it was
//! written. Bumping the generation invalidates every entry at once without
//! touching the map; stale entries are dropped lazily on the next `get`, or
//! explicitly through `evict`, `clear` and `evict_older_than`.
//!
//! The cache is meant for a single-threaded cooperative caller. All
//! operations take `&self` and no borrow is held across the await inside
//! [`GenerationCache::with_cache`], so a bump may land while a fetch is in
//! flight. When that happens the fetched value is stored under the new
//! generation.
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

/// Source of wall-clock milliseconds used to stamp entries.
pub trait Clock {
    fn now_millis(&self) -> i64;
}

/// Wall clock backed by `chrono::Utc`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Hand-driven clock for deterministic age eviction.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<i64>,
}

impl ManualClock {
    #[must_use]
    pub const fn new(start_millis: i64) -> Self {
        Self {
            now: Cell::new(start_millis),
        }
    }

    pub fn set(&self, millis: i64) {
        self.now.set(millis);
    }

    pub fn advance(&self, millis: i64) {
        self.now.set(self.now.get().saturating_add(millis));
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_millis(&self) -> i64 {
        (**self).now_millis()
    }
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    fn now_millis(&self) -> i64 {
        (**self).now_millis()
    }
}

/// A cached value with the generation and time it was written under.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub data: T,
    pub generation: u64,
    /// Wall-clock milliseconds at write time; only used for age eviction.
    pub fetched_at: i64,
}

/// Running counters for diagnostics. They never affect cache behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Misses caused by an entry from an older generation.
    pub stale_drops: u64,
    pub writes: u64,
    pub evictions: u64,
}

impl CacheStats {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

type ErasedEntry = CacheEntry<Box<dyn Any>>;

/// Shared key/value cache invalidated by a single generation counter.
pub struct GenerationCache<C: Clock = SystemClock> {
    entries: RefCell<HashMap<String, ErasedEntry>>,
    generation: Cell<u64>,
    stats: Cell<CacheStats>,
    clock: C,
}

impl GenerationCache<SystemClock> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for GenerationCache<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> GenerationCache<C> {
    #[must_use]
    pub fn with_clock(clock: C) -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
            generation: Cell::new(0),
            stats: Cell::new(CacheStats::default()),
            clock,
        }
    }

    /// Current generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    /// Advance the generation by one, invalidating every stored entry.
    ///
    /// Nothing is scanned or removed here; entries are compared against the
    /// new baseline when they are next read.
    pub fn bump_generation(&self) -> u64 {
        let next = self.generation.get() + 1;
        self.generation.set(next);
        log::trace!("cache generation bumped to {next}");
        next
    }

    /// Look up `key`, returning `None` when it is absent or stale.
    ///
    /// A stale entry is removed as part of the lookup.
    pub fn get<T: Clone + 'static>(&self, key: &str) -> Option<T> {
        let current = self.generation.get();
        let mut entries = self.entries.borrow_mut();
        let Some(entry) = entries.get(key) else {
            self.record(|s| s.misses += 1);
            log::trace!("cache miss for {key}");
            return None;
        };

        if entry.generation != current {
            let stored = entry.generation;
            entries.remove(key);
            self.record(|s| {
                s.misses += 1;
                s.stale_drops += 1;
            });
            log::debug!("dropped stale cache entry {key} (generation {stored}, current {current})");
            return None;
        }

        if let Some(data) = entry.data.downcast_ref::<T>() {
            self.record(|s| s.hits += 1);
            Some(data.clone())
        } else {
            self.record(|s| s.misses += 1);
            log::warn!(
                "cache entry {key} does not hold a {}",
                std::any::type_name::<T>()
            );
            None
        }
    }

    /// Insert or overwrite `key`, stamped with the current generation and time.
    pub fn set<T: 'static>(&self, key: &str, data: T) {
        let entry = CacheEntry {
            data: Box::new(data) as Box<dyn Any>,
            generation: self.generation.get(),
            fetched_at: self.clock.now_millis(),
        };
        self.entries.borrow_mut().insert(key.to_string(), entry);
        self.record(|s| s.writes += 1);
    }

    /// Remove `key` whatever its generation or age. Absent keys are ignored.
    pub fn evict(&self, key: &str) {
        if self.entries.borrow_mut().remove(key).is_some() {
            self.record(|s| s.evictions += 1);
        }
    }

    /// Remove every entry. The generation is left as is.
    pub fn clear(&self) {
        let mut entries = self.entries.borrow_mut();
        let removed = entries.len() as u64;
        entries.clear();
        self.record(|s| s.evictions += removed);
    }

    /// Remove entries written more than `max_age_ms` ago, valid or not.
    ///
    /// Returns how many entries were removed.
    pub fn evict_older_than(&self, max_age_ms: i64) -> usize {
        let cutoff = self.clock.now_millis().saturating_sub(max_age_ms);
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|_, entry| entry.fetched_at >= cutoff);
        let removed = before - entries.len();
        if removed > 0 {
            self.record(|s| s.evictions += removed as u64);
            log::debug!("evicted {removed} cache entries older than {max_age_ms}ms");
        }
        removed
    }

    /// Number of stored entries, including stale ones not yet dropped.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Generation an entry was written under, without validating or dropping it.
    #[must_use]
    pub fn entry_generation(&self, key: &str) -> Option<u64> {
        self.entries.borrow().get(key).map(|entry| entry.generation)
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats.get()
    }

    pub fn reset_stats(&self) {
        self.stats.set(CacheStats::default());
    }

    /// Read-through lookup.
    ///
    /// On a hit the cached value is returned and `fetcher` is never called.
    /// On a miss the fetcher is awaited and its value stored under whatever
    /// generation is current once it resolves. Fetch errors are returned
    /// unchanged and leave the cache untouched. Concurrent misses on the same
    /// key each run their own fetch; the last one to finish wins.
    ///
    /// # Errors
    ///
    /// Returns the fetcher's error when a miss has to be filled and the fetch fails.
    pub async fn with_cache<T, E, F, Fut>(&self, key: &str, fetcher: F) -> Result<T, E>
    where
        T: Clone + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get::<T>(key) {
            return Ok(hit);
        }
        let data = fetcher().await?;
        self.set(key, data.clone());
        Ok(data)
    }

    fn record(&self, update: impl FnOnce(&mut CacheStats)) {
        let mut stats = self.stats.get();
        update(&mut stats);
        self.stats.set(stats);
    }
}

impl<C: Clock> fmt::Debug for GenerationCache<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationCache")
            .field("generation", &self.generation.get())
            .field("len", &self.len())
            .field("stats", &self.stats.get())
            .finish_non_exhaustive()
    }
}

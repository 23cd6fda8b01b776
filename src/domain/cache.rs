//! Memoizing get-or-create store keyed by [`Identity`].
//!
//! All lookups, builds and inserts for one cache instance are serialized
//! behind a single mutex, so an identity is never built twice concurrently
//! and no caller ever sees a half-inserted entry. Values are handed out as
//! `Arc<T>` and are read without further locking.
//!
//! Entries are never dropped when their last external handle goes away.
//! Reclaiming them is the job of [`Cache::maintain`], which a
//! [`Maintainer`](crate::domain::maintenance::Maintainer) calls periodically.

use crate::domain::error::Result;
use crate::domain::identity::Identity;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

/// Factory for a single cacheable value.
///
/// A builder lives only for the duration of one [`Cache::find_and_add`]
/// call.
pub trait Builder<T> {
    /// Identity of the value `make` would produce.
    fn id(&self) -> Identity;

    fn make(&self) -> Result<T>;

    /// Whether a previously cached value is still valid for this request.
    fn is_consistent(&self, _existing: &T) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub rebuilds: u64,
    pub evictions: u64,
    /// Builds performed while the cache was disabled.
    pub uncached: u64,
}

struct CacheState<T> {
    entries: BTreeMap<Identity, Arc<T>>,
    size: usize,
    enabled: bool,
    /// First key the next maintenance scan looks at. `None` starts at the
    /// beginning of the map.
    cursor: Option<Identity>,
    stats: CacheStats,
}

pub struct Cache<T> {
    name: &'static str,
    state: Mutex<CacheState<T>>,
}

impl<T> Cache<T> {
    pub fn new(name: &'static str, size: usize) -> Self {
        Self {
            name,
            state: Mutex::new(CacheState {
                entries: BTreeMap::new(),
                size,
                enabled: true,
                cursor: None,
                stats: CacheStats::default(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    // A panicking builder never leaves the map half-updated (inserts happen
    // after `make` returns), so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, CacheState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the cached value for `builder.id()`, building and inserting
    /// it first if needed.
    ///
    /// When the cache is disabled every call builds a fresh, uncached value.
    /// A cached value that `builder.is_consistent` rejects is rebuilt once
    /// and replaced. If `make` fails the error is returned unchanged and the
    /// cache is left as it was.
    pub fn find_and_add<B>(&self, builder: &B) -> Result<Arc<T>>
    where
        B: Builder<T> + ?Sized,
    {
        let mut guard = self.lock();
        let state = &mut *guard;

        if !state.enabled {
            state.stats.uncached += 1;
            drop(guard);
            return builder.make().map(Arc::new);
        }

        let id = builder.id();
        let stale = match state.entries.get(&id) {
            Some(existing) if builder.is_consistent(existing) => {
                state.stats.hits += 1;
                trace!(cache = self.name, %id, "cache hit");
                return Ok(Arc::clone(existing));
            }
            Some(_) => true,
            None => false,
        };

        if stale {
            debug!(cache = self.name, %id, "stale cache entry, rebuilding");
        } else {
            debug!(cache = self.name, %id, "cache miss");
        }

        // The stale entry, if any, is only replaced once the rebuild succeeds.
        let value = Arc::new(builder.make()?);
        if stale {
            state.stats.rebuilds += 1;
        } else {
            state.stats.misses += 1;
        }
        state.entries.insert(id, Arc::clone(&value));
        Ok(value)
    }

    /// Turning the cache off keeps existing entries; they are served again
    /// once it is re-enabled.
    pub fn enable(&self, enabled: bool) {
        self.lock().enabled = enabled;
        debug!(cache = self.name, enabled, "cache enable changed");
    }

    pub fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    pub fn set_size(&self, size: usize) {
        self.lock().size = size;
        debug!(cache = self.name, size, "cache size changed");
    }

    pub fn size(&self) -> usize {
        self.lock().size
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    pub fn contains(&self, id: &Identity) -> bool {
        self.lock().entries.contains_key(id)
    }

    pub fn get(&self, id: &Identity) -> Option<Arc<T>> {
        self.lock().entries.get(id).cloned()
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.cursor = None;
    }

    /// One maintenance tick.
    ///
    /// Does nothing while the map is within its configured size. Otherwise
    /// scans entries in key order from the rotating cursor, wrapping around,
    /// and evicts the first one held by nobody but the cache. The cursor
    /// moves one entry forward per tick whether or not anything was evicted.
    /// Returns the evicted identity, if any.
    pub fn maintain(&self) -> Option<Identity> {
        let mut guard = self.lock();
        let state = &mut *guard;

        if state.entries.len() <= state.size {
            return None;
        }

        let start = state
            .cursor
            .as_ref()
            .and_then(|c| state.entries.range(c.clone()..).next())
            .or_else(|| state.entries.iter().next())
            .map(|(k, _)| k.clone())?;

        let victim = state
            .entries
            .range(start.clone()..)
            .chain(state.entries.range(..start.clone()))
            .find(|(_, v)| Arc::strong_count(v) == 1)
            .map(|(k, _)| k.clone());

        state.cursor = state
            .entries
            .range((Bound::Excluded(start), Bound::Unbounded))
            .next()
            .map(|(k, _)| k.clone());

        if let Some(id) = &victim {
            state.entries.remove(id);
            state.stats.evictions += 1;
            debug!(
                cache = self.name,
                %id,
                remaining = state.entries.len(),
                "evicted unreferenced entry"
            );
        }
        victim
    }
}

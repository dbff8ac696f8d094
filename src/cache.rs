/*!
A memo of compiled patterns keyed by pattern text and flags.

A [`Cache`] is an explicit value: construct one, share it (it is `Sync`) and
clear it when needed. There is no process wide cache.

Each key owns a slot that is filled at most once. The first caller to miss
on a key compiles the pattern, and any caller that looks up the same key in
the meantime blocks on that slot and receives the same result. A failed
compile is handed to everyone waiting on it and then forgotten, so the next
lookup of that key compiles again.
*/

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, OnceLock, PoisonError,
    },
};

use crate::{compiler::Compiler, error::Error, flags::Flags, pattern::Pattern};

/// The configuration used by a [`Cache`].
#[derive(Clone, Debug, Default)]
pub struct Config {
    capacity: Option<Option<usize>>,
}

impl Config {
    /// Return a new default configuration.
    pub fn new() -> Config {
        Config::default()
    }

    /// Set the maximum number of patterns kept. When a new pattern would
    /// exceed it, the least recently used pattern is evicted. `None` means
    /// the cache grows without bound.
    ///
    /// The default is 100.
    pub fn capacity(self, limit: Option<usize>) -> Config {
        Config { capacity: Some(limit), ..self }
    }

    /// Returns the maximum number of patterns kept, or `None` when the
    /// cache is unbounded.
    pub fn get_capacity(&self) -> Option<usize> {
        self.capacity.unwrap_or(Some(100))
    }

    /// Overwrite the default configuration such that the options in `o` are
    /// always used. If an option in `o` is not set, then the corresponding
    /// option in `self` is used.
    pub fn overwrite(&self, o: Config) -> Config {
        Config { capacity: o.capacity.or(self.capacity) }
    }
}

/// Counters describing how a [`Cache`] has been used.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CacheStats {
    /// Lookups that found an existing slot, including slots whose compile
    /// was still in flight.
    pub hits: u64,
    /// Lookups that created a new slot.
    pub misses: u64,
    /// Calls made to the compiler.
    pub compiles: u64,
}

type Slot = Arc<OnceLock<Result<Pattern, Error>>>;

#[derive(Debug)]
struct Entry {
    flags: Flags,
    slot: Slot,
    last_used: u64,
}

#[derive(Debug, Default)]
struct State {
    /// Entries grouped by pattern text, so that lookups can borrow the text
    /// instead of building an owned key.
    entries: HashMap<String, Vec<Entry>>,
    len: usize,
    clock: u64,
}

/// A thread safe cache of compiled patterns.
///
/// # Example
///
/// ```
/// use regex_host::{Cache, Compiler, Flags};
///
/// let cache = Cache::new(Compiler::new());
/// let a = cache.get_or_compile(r"\d+", Flags::NONE)?;
/// let b = cache.get_or_compile(r"\d+", Flags::NONE)?;
/// assert_eq!(1, cache.stats().compiles);
/// assert_eq!(a.pattern(), b.pattern());
///
/// // A different flag set is a different key.
/// cache.get_or_compile(r"\d+", Flags::ASCII)?;
/// assert_eq!(2, cache.len());
///
/// cache.clear();
/// assert!(cache.is_empty());
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Cache {
    compiler: Compiler,
    config: Config,
    state: Mutex<State>,
    hits: AtomicU64,
    misses: AtomicU64,
    compiles: AtomicU64,
}

impl Cache {
    /// Create an empty cache with a default configuration that compiles
    /// patterns with the given compiler.
    pub fn new(compiler: Compiler) -> Cache {
        Cache::with_config(compiler, Config::new())
    }

    /// Create an empty cache with the given configuration.
    pub fn with_config(compiler: Compiler, config: Config) -> Cache {
        Cache {
            compiler,
            config,
            state: Mutex::new(State::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            compiles: AtomicU64::new(0),
        }
    }

    /// Return the compiled form of `pattern` with `flags`, compiling it only
    /// if no entry for that exact pattern text and flag set exists.
    pub fn get_or_compile(
        &self,
        pattern: &str,
        flags: Flags,
    ) -> Result<Pattern, Error> {
        let slot = self.slot(pattern, flags);
        let result = slot
            .get_or_init(|| {
                self.compiles.fetch_add(1, Ordering::Relaxed);
                self.compiler.compile(pattern, flags)
            })
            .clone();
        if result.is_err() {
            self.forget(pattern, flags, &slot);
        } else {
            self.shrink(&mut self.state());
        }
        result
    }

    /// Remove every entry. Patterns already handed out stay usable.
    pub fn clear(&self) {
        let mut state = self.state();
        state.entries.clear();
        state.len = 0;
        debug!("pattern cache cleared");
    }

    /// The number of entries in the cache.
    pub fn len(&self) -> usize {
        self.state().len
    }

    /// Whether the cache has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return usage counters for this cache.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            compiles: self.compiles.load(Ordering::Relaxed),
        }
    }

    /// Find or create the slot for a key. The state lock is only held for
    /// the lookup, never while compiling.
    fn slot(&self, pattern: &str, flags: Flags) -> Slot {
        let mut state = self.state();
        state.clock += 1;
        let now = state.clock;
        if let Some(entry) = state
            .entries
            .get_mut(pattern)
            .and_then(|list| list.iter_mut().find(|e| e.flags == flags))
        {
            entry.last_used = now;
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!("pattern cache hit for {:?} ({:?})", pattern, flags);
            return Arc::clone(&entry.slot);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        trace!("pattern cache miss for {:?} ({:?})", pattern, flags);
        let slot = Slot::default();
        state.entries.entry(pattern.to_string()).or_default().push(Entry {
            flags,
            slot: Arc::clone(&slot),
            last_used: now,
        });
        state.len += 1;
        self.shrink(&mut state);
        slot
    }

    /// Evict settled entries until the cache fits its capacity. Entries
    /// whose compile is still in flight are never evicted, so the cache may
    /// briefly hold more entries than its capacity.
    fn shrink(&self, state: &mut State) {
        if let Some(capacity) = self.config.get_capacity() {
            while state.len > capacity {
                if !state.evict_oldest() {
                    break;
                }
            }
        }
    }

    /// Drop the entry for a key if it still holds `slot`.
    fn forget(&self, pattern: &str, flags: Flags, slot: &Slot) {
        let mut state = self.state();
        let removed = match state.entries.get_mut(pattern) {
            None => false,
            Some(list) => {
                let before = list.len();
                list.retain(|e| {
                    e.flags != flags || !Arc::ptr_eq(&e.slot, slot)
                });
                before != list.len()
            }
        };
        if removed {
            state.len -= 1;
            state.prune(pattern);
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl State {
    /// Remove the least recently used entry whose compile has finished.
    /// Returns false if there was no such entry.
    fn evict_oldest(&mut self) -> bool {
        let oldest = self
            .entries
            .iter()
            .flat_map(|(text, list)| {
                list.iter()
                    .filter(|e| e.slot.get().is_some())
                    .map(move |e| (e.last_used, text, e.flags))
            })
            .min_by_key(|&(last_used, _, _)| last_used)
            .map(|(_, text, flags)| (text.clone(), flags));
        let (text, flags) = match oldest {
            None => return false,
            Some(oldest) => oldest,
        };
        if let Some(list) = self.entries.get_mut(&text) {
            list.retain(|e| e.flags != flags);
        }
        self.prune(&text);
        self.len -= 1;
        debug!("pattern cache evicted {:?} ({:?})", text, flags);
        true
    }

    fn prune(&mut self, text: &str) {
        if self.entries.get(text).map_or(false, |list| list.is_empty()) {
            self.entries.remove(text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_after_miss() {
        let cache = Cache::new(Compiler::new());
        let a = cache.get_or_compile("a+", Flags::NONE).unwrap();
        let b = cache.get_or_compile("a+", Flags::NONE).unwrap();
        assert_eq!(a.pattern(), b.pattern());
        assert_eq!(
            CacheStats { hits: 1, misses: 1, compiles: 1 },
            cache.stats()
        );
        assert_eq!(1, cache.len());
    }

    #[test]
    fn failures_are_not_kept() {
        let cache = Cache::new(Compiler::new());
        assert!(cache.get_or_compile("(", Flags::NONE).is_err());
        assert!(cache.is_empty());
        assert!(cache.get_or_compile("(", Flags::NONE).is_err());
        assert_eq!(2, cache.stats().compiles);
        assert!(cache
            .get_or_compile("a", Flags::ASCII | Flags::UNICODE)
            .is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn least_recently_used_is_evicted() {
        let config = Config::new().capacity(Some(2));
        let cache = Cache::with_config(Compiler::new(), config);
        cache.get_or_compile("a", Flags::NONE).unwrap();
        cache.get_or_compile("b", Flags::NONE).unwrap();
        // Touch 'a' so that 'b' becomes the oldest.
        cache.get_or_compile("a", Flags::NONE).unwrap();
        cache.get_or_compile("c", Flags::NONE).unwrap();
        assert_eq!(2, cache.len());
        assert_eq!(3, cache.stats().compiles);

        cache.get_or_compile("a", Flags::NONE).unwrap();
        assert_eq!(3, cache.stats().compiles);
        cache.get_or_compile("b", Flags::NONE).unwrap();
        assert_eq!(4, cache.stats().compiles);
    }

    #[test]
    fn flags_are_part_of_the_key() {
        let config = Config::new().capacity(Some(1));
        let cache = Cache::with_config(Compiler::new(), config);
        cache.get_or_compile("a", Flags::NONE).unwrap();
        cache.get_or_compile("a", Flags::IGNORECASE).unwrap();
        assert_eq!(1, cache.len());
        cache.get_or_compile("a", Flags::IGNORECASE).unwrap();
        assert_eq!(2, cache.stats().compiles);
    }

    #[test]
    fn unbounded() {
        let config = Config::new().capacity(None);
        let cache = Cache::with_config(Compiler::new(), config);
        for i in 0..300 {
            cache.get_or_compile(&format!("x{}", i), Flags::NONE).unwrap();
        }
        assert_eq!(300, cache.len());
    }

    #[test]
    fn in_flight_entries_are_not_evicted() {
        let config = Config::new().capacity(Some(1));
        let cache = Cache::with_config(Compiler::new(), config);
        // A slot that nobody has filled yet stands for a compile in flight.
        let pending = cache.slot("a", Flags::NONE);
        cache.get_or_compile("b", Flags::NONE).unwrap();
        let again = cache.slot("a", Flags::NONE);
        assert!(Arc::ptr_eq(&pending, &again));
        assert_eq!(
            CacheStats { hits: 1, misses: 2, compiles: 1 },
            cache.stats()
        );

        // Once filled, the entry is evicted like any other.
        cache.get_or_compile("a", Flags::NONE).unwrap();
        assert_eq!(1, cache.len());
        assert_eq!(2, cache.stats().compiles);
    }

    #[test]
    fn evicted_patterns_stay_usable() {
        let config = Config::new().capacity(Some(1));
        let cache = Cache::with_config(Compiler::new(), config);
        let a = cache.get_or_compile("a", Flags::NONE).unwrap();
        cache.get_or_compile("b", Flags::NONE).unwrap();
        assert!(a.search("xa", 0).is_some());
    }
}

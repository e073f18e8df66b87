//! Operation result cache
//!
//! Memoizes transform results keyed by `(input text, operation, options)`.
//! The cache is a pure side table: clearing or disabling it never changes
//! a result, only how long it takes.
//!
//! # Key derivation
//!
//! | Field       | Content                                        |
//! |-------------|------------------------------------------------|
//! | `hash`      | FxHash over text, operation name, options JSON |
//! | `text`      | The input text                                 |
//! | `operation` | Operation name                                 |
//! | `options`   | Options serialized as JSON                     |
//!
//! Only `hash` feeds the map's hasher. Equality compares every field, so
//! two inputs whose hashes collide are distinct entries and a lookup never
//! returns another input's result.
//!
//! # Eviction
//!
//! Entries are kept in touch order and weigh their input plus result
//! bytes. A write evicts least-recently-used entries until the total byte
//! budget fits; an entry larger than a tenth of the budget is refused
//! outright. Expired entries are dropped when
//! read and swept on every write.

use lru::LruCache;
use rustc_hash::FxHasher;
use serde::Serialize;
use serde_json::Value;
use std::hash::{Hash, Hasher};

use crate::utils::{Clock, SystemClock};

/// Fraction of the budget a single entry may occupy
const MAX_ENTRY_FRACTION: usize = 10;

#[derive(Clone, Debug)]
pub struct CacheKey {
    hash: u64,
    text: String,
    operation: String,
    options: String,
}

impl CacheKey {
    pub fn new(text: &str, operation: &str, options: &Value) -> Self {
        let options = options.to_string();
        let mut hasher = FxHasher::default();
        text.hash(&mut hasher);
        operation.hash(&mut hasher);
        options.hash(&mut hasher);
        Self {
            hash: hasher.finish(),
            text: text.to_string(),
            operation: operation.to_string(),
            options,
        }
    }
}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
            && self.operation == other.operation
            && self.options == other.options
            && self.text == other.text
    }
}

impl Eq for CacheKey {}

#[derive(Clone, Debug)]
struct CacheEntry {
    value: String,
    size: usize,
    expires_at: i64,
}

/// LRU map bounded by total input and result bytes rather than entry count
pub struct ByteBudgetCache<C: Clock = SystemClock> {
    entries: LruCache<CacheKey, CacheEntry>,
    max_bytes: usize,
    max_age_ms: i64,
    current_bytes: usize,
    clock: C,
}

impl<C: Clock> ByteBudgetCache<C> {
    pub fn new(max_bytes: usize, max_age_ms: i64, clock: C) -> Self {
        Self {
            entries: LruCache::unbounded(),
            max_bytes,
            max_age_ms,
            current_bytes: 0,
            clock,
        }
    }

    /// Size estimate for an entry: input plus result UTF-8 bytes
    fn estimate_size(key: &CacheKey, value: &str) -> usize {
        (key.text.len() + value.len()).max(1)
    }

    /// Store `value`. Returns `false` when the entry is too large to cache.
    pub fn insert(&mut self, key: CacheKey, value: String) -> bool {
        let size = Self::estimate_size(&key, &value);
        self.purge_expired();

        if size > self.max_bytes / MAX_ENTRY_FRACTION {
            log::warn!(
                "Cache entry too large ({} bytes, limit {}), skipping",
                size,
                self.max_bytes / MAX_ENTRY_FRACTION
            );
            return false;
        }

        self.remove(&key);

        while self.current_bytes + size > self.max_bytes {
            match self.entries.pop_lru() {
                Some((_, evicted)) => self.current_bytes -= evicted.size,
                None => break,
            }
        }

        let now = self.clock.now_ms();
        self.entries.put(
            key,
            CacheEntry {
                value,
                size,
                expires_at: now + self.max_age_ms,
            },
        );
        self.current_bytes += size;
        true
    }

    /// Look up `key`, marking it most recently used
    pub fn get(&mut self, key: &CacheKey) -> Option<&str> {
        let now = self.clock.now_ms();
        let expired = self.entries.peek(key)?.expires_at < now;
        if expired {
            self.remove(key);
            return None;
        }
        self.entries.get(key).map(|entry| entry.value.as_str())
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains(key)
    }

    pub fn remove(&mut self, key: &CacheKey) -> bool {
        match self.entries.pop(key) {
            Some(entry) => {
                self.current_bytes -= entry.size;
                true
            }
            None => false,
        }
    }

    /// Drop every expired entry
    pub fn purge_expired(&mut self) {
        let now = self.clock.now_ms();
        let expired: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.expires_at < now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired {
            self.remove(&key);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.current_bytes = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current_bytes(&self) -> usize {
        self.current_bytes
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }
}

/// Snapshot of cache usage for the settings panel
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub size: usize,
    pub entries: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    pub saves: u64,
    /// Percentage of lookups that hit, rounded to two decimals
    pub hit_rate: f64,
}

/// Result cache for `(text, operation, options)` triples with hit statistics
pub struct OperationCache<C: Clock = SystemClock> {
    cache: ByteBudgetCache<C>,
    hits: u64,
    misses: u64,
    saves: u64,
}

impl OperationCache<SystemClock> {
    pub fn new(max_bytes: usize, max_age_ms: i64) -> Self {
        Self::with_clock(max_bytes, max_age_ms, SystemClock)
    }
}

impl<C: Clock> OperationCache<C> {
    pub fn with_clock(max_bytes: usize, max_age_ms: i64, clock: C) -> Self {
        Self {
            cache: ByteBudgetCache::new(max_bytes, max_age_ms, clock),
            hits: 0,
            misses: 0,
            saves: 0,
        }
    }

    pub fn get(&mut self, text: &str, operation: &str, options: &Value) -> Option<String> {
        let key = CacheKey::new(text, operation, options);
        match self.cache.get(&key) {
            Some(result) => {
                self.hits += 1;
                log::debug!("Cache hit for {}", operation);
                Some(result.to_string())
            }
            None => {
                self.misses += 1;
                log::debug!("Cache miss for {}", operation);
                None
            }
        }
    }

    pub fn set(&mut self, text: &str, operation: &str, options: &Value, result: String) {
        let key = CacheKey::new(text, operation, options);
        if self.cache.insert(key, result) {
            self.saves += 1;
        }
    }

    /// Drop all entries and reset statistics
    pub fn clear(&mut self) {
        self.cache.clear();
        self.hits = 0;
        self.misses = 0;
        self.saves = 0;
    }

    pub fn stats(&self) -> CacheStats {
        let total = self.hits + self.misses;
        let hit_rate = if total > 0 {
            let rate = self.hits as f64 / total as f64 * 100.0;
            (rate * 100.0).round() / 100.0
        } else {
            0.0
        };

        CacheStats {
            size: self.cache.current_bytes(),
            entries: self.cache.len(),
            max_size: self.cache.max_bytes(),
            hits: self.hits,
            misses: self.misses,
            saves: self.saves,
            hit_rate,
        }
    }
}

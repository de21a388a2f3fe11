use crate::size::estimate_size;
use fanws_memory::{
    EvictionRequest, EvictionResult, MemoryCategory, MemoryEvictor, MemoryManager,
    MemoryRegistration, MemoryTracker, MB,
};
use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

/// Thread-safe, byte-budgeted cache from string keys to shared values.
///
/// Eviction policy is least-recently-used: both `set` and a successful `get`
/// mark an entry as most recent. Each entry is charged its [`estimate_size`]
/// at insertion. Eviction runs inside `set` under the cache lock, so the
/// tracked total never exceeds the budget once `set` returns. A value larger
/// than the whole budget is not stored, and any previous value under its key
/// is removed.
///
/// Values are handed out as `Arc<V>`; eviction drops the cache's reference
/// but never invalidates values held by callers.
pub struct FileCache<V> {
    name: String,
    inner: Mutex<Inner<V>>,
    registration: OnceLock<MemoryRegistration>,
    tracker: OnceLock<MemoryTracker>,
}

struct Inner<V> {
    max_bytes: u64,
    total_bytes: u64,
    ttl: Option<Duration>,
    lru: LruCache<String, Entry<V>>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

struct Entry<V> {
    value: Arc<V>,
    size: u64,
    inserted_at: Instant,
}

/// Counters and occupancy of a [`FileCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub bytes: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl<V> FileCache<V> {
    pub fn new(max_size_mb: u64) -> Self {
        Self::with_max_bytes(max_size_mb.saturating_mul(MB))
    }

    pub fn with_max_bytes(max_bytes: u64) -> Self {
        Self {
            name: "file_cache".to_string(),
            inner: Mutex::new(Inner {
                max_bytes,
                total_bytes: 0,
                ttl: None,
                lru: LruCache::unbounded(),
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
            registration: OnceLock::new(),
            tracker: OnceLock::new(),
        }
    }

    /// Expire entries `ttl` after insertion. Expired entries read as misses.
    pub fn with_ttl(self, ttl: Duration) -> Self {
        self.inner.lock().ttl = Some(ttl);
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up `key`. Absent, evicted and expired keys all return `None`.
    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let now = Instant::now();

        match inner.lru.peek(key).map(|entry| inner.is_expired(entry, now)) {
            None => {
                inner.misses += 1;
                None
            }
            Some(true) => {
                inner.remove(key);
                inner.misses += 1;
                self.update_tracker_locked(inner);
                None
            }
            Some(false) => {
                inner.hits += 1;
                inner.lru.get(key).map(|entry| entry.value.clone())
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        let inner = self.inner.lock();
        let now = Instant::now();
        inner
            .lru
            .peek(key)
            .is_some_and(|entry| !inner.is_expired(entry, now))
    }

    pub fn remove(&self, key: &str) -> Option<Arc<V>> {
        let mut inner = self.inner.lock();
        let removed = inner.remove(key);
        self.update_tracker_locked(&inner);
        removed
    }

    /// Remove every entry and reset the tracked size to zero.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.lru.clear();
        inner.total_bytes = 0;
        self.update_tracker_locked(&inner);
    }

    /// Evict least-recently-used entries until at most `target_bytes` remain.
    /// Returns the number of bytes freed.
    pub fn evict_to(&self, target_bytes: u64) -> u64 {
        let mut inner = self.inner.lock();
        let before = inner.total_bytes;
        inner.purge_expired(Instant::now());
        inner.evict_lru_to(target_bytes);
        self.update_tracker_locked(&inner);
        before.saturating_sub(inner.total_bytes)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn current_size_bytes(&self) -> u64 {
        self.inner.lock().total_bytes
    }

    pub fn current_size_mb(&self) -> f64 {
        self.current_size_bytes() as f64 / MB as f64
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.inner.lock().max_bytes
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<String> {
        self.inner.lock().lru.iter().map(|(key, _)| key.clone()).collect()
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            entries: inner.lru.len(),
            bytes: inner.total_bytes,
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
        }
    }

    fn update_tracker_locked(&self, inner: &Inner<V>) {
        if let Some(tracker) = self.tracker.get() {
            tracker.set_bytes(inner.total_bytes);
        }
    }
}

impl<V: Serialize> FileCache<V> {
    /// Store `value` under `key`, replacing and re-measuring any previous value.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let size = estimate_size(&value);

        let mut inner = self.inner.lock();
        inner.remove(&key);

        // A value that can never fit would evict everything and still overflow.
        if size > inner.max_bytes {
            tracing::debug!(
                target = "fanws.cache",
                cache = %self.name,
                key = %key,
                size,
                max_bytes = inner.max_bytes,
                "value exceeds cache budget; not cached"
            );
            self.update_tracker_locked(&inner);
            return;
        }

        inner.lru.put(
            key,
            Entry {
                value: Arc::new(value),
                size,
                inserted_at: Instant::now(),
            },
        );
        inner.total_bytes = inner.total_bytes.saturating_add(size);

        if inner.total_bytes > inner.max_bytes {
            inner.purge_expired(Instant::now());
            let max_bytes = inner.max_bytes;
            inner.evict_lru_to(max_bytes);
        }
        self.update_tracker_locked(&inner);
    }
}

impl<V: Send + Sync + 'static> FileCache<V> {
    /// Register with `manager` so memory pressure can shrink this cache.
    ///
    /// Only the first registration takes effect.
    pub fn register_with(self: &Arc<Self>, manager: &MemoryManager) {
        if self.registration.get().is_some() {
            return;
        }
        let registration = manager.register_evictor(
            self.name.clone(),
            MemoryCategory::FileCache,
            self.clone() as Arc<dyn MemoryEvictor>,
        );
        let tracker = registration.tracker();
        tracker.set_bytes(self.current_size_bytes());
        if self.registration.set(registration).is_ok() {
            let _ = self.tracker.set(tracker);
        }
    }
}

impl<V> Inner<V> {
    fn is_expired(&self, entry: &Entry<V>, now: Instant) -> bool {
        self.ttl
            .is_some_and(|ttl| now.saturating_duration_since(entry.inserted_at) >= ttl)
    }

    fn remove(&mut self, key: &str) -> Option<Arc<V>> {
        let entry = self.lru.pop(key)?;
        self.total_bytes = self.total_bytes.saturating_sub(entry.size);
        Some(entry.value)
    }

    fn purge_expired(&mut self, now: Instant) {
        if self.ttl.is_none() {
            return;
        }
        let expired: Vec<String> = self
            .lru
            .iter()
            .filter(|(_, entry)| self.is_expired(entry, now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired {
            self.remove(&key);
        }
    }

    fn evict_lru_to(&mut self, target_bytes: u64) {
        while self.total_bytes > target_bytes {
            let Some((_key, evicted)) = self.lru.pop_lru() else {
                self.total_bytes = 0;
                break;
            };
            self.total_bytes = self.total_bytes.saturating_sub(evicted.size);
            self.evictions += 1;
        }
    }
}

impl<V: Send + Sync + 'static> MemoryEvictor for FileCache<V> {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> MemoryCategory {
        MemoryCategory::FileCache
    }

    fn evict(&self, request: EvictionRequest) -> EvictionResult {
        let before = self.current_size_bytes();
        if request.target_bytes == 0 {
            self.clear();
        } else {
            self.evict_to(request.target_bytes);
        }
        EvictionResult {
            before_bytes: before,
            after_bytes: self.current_size_bytes(),
        }
    }
}

impl<V> std::fmt::Debug for FileCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("FileCache")
            .field("name", &self.name)
            .field("entries", &inner.lru.len())
            .field("total_bytes", &inner.total_bytes)
            .field("max_bytes", &inner.max_bytes)
            .finish()
    }
}

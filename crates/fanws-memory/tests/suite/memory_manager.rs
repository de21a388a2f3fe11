use fanws_memory::{
    EvictionRequest, EvictionResult, MemoryCategory, MemoryConfig, MemoryEvent, MemoryEvictor,
    MemoryManager, MemoryPressure, MemoryRegistration, MemoryTracker, MB,
};
use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};

struct TestEvictor {
    name: String,
    category: MemoryCategory,
    bytes: Mutex<u64>,
    registration: OnceLock<MemoryRegistration>,
    tracker: OnceLock<MemoryTracker>,
}

impl TestEvictor {
    fn new(manager: &MemoryManager, name: &str, category: MemoryCategory) -> Arc<Self> {
        let evictor = Arc::new(Self {
            name: name.to_string(),
            category,
            bytes: Mutex::new(0),
            registration: OnceLock::new(),
            tracker: OnceLock::new(),
        });

        let registration = manager.register_evictor(name.to_string(), category, evictor.clone());
        evictor
            .tracker
            .set(registration.tracker())
            .unwrap_or_else(|_| panic!("tracker only set once"));
        evictor
            .registration
            .set(registration)
            .unwrap_or_else(|_| panic!("registration only set once"));

        evictor
    }

    fn set_bytes(&self, bytes: u64) {
        *self.bytes.lock() = bytes;
        self.tracker.get().unwrap().set_bytes(bytes);
    }

    fn bytes(&self) -> u64 {
        *self.bytes.lock()
    }
}

impl MemoryEvictor for TestEvictor {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> MemoryCategory {
        self.category
    }

    fn evict(&self, request: EvictionRequest) -> EvictionResult {
        let mut bytes = self.bytes.lock();
        let before = *bytes;
        let after = before.min(request.target_bytes);
        *bytes = after;
        self.tracker.get().unwrap().set_bytes(after);
        EvictionResult {
            before_bytes: before,
            after_bytes: after,
        }
    }
}

/// A config whose process limit can never be reached, so pressure stays `Normal`.
fn roomy_config(max_cache_mb: u64) -> MemoryConfig {
    MemoryConfig::new(1 << 40, max_cache_mb, 0.8, 0.95).unwrap()
}

#[test]
fn optimize_brings_caches_within_cache_budget() {
    let manager = MemoryManager::new(roomy_config(1));
    let a = TestEvictor::new(&manager, "a", MemoryCategory::FileCache);
    let b = TestEvictor::new(&manager, "b", MemoryCategory::FileCache);
    a.set_bytes(2 * MB);
    b.set_bytes(2 * MB);

    assert_eq!(manager.check_thresholds(), MemoryPressure::Normal);
    let stats = manager.optimize_memory();

    assert_eq!(a.bytes(), MB / 2);
    assert_eq!(b.bytes(), MB / 2);
    assert!(stats.cache_memory_mb <= 1.0);
}

#[test]
fn optimize_on_empty_state_is_a_no_op() {
    let manager = MemoryManager::new(roomy_config(1));
    let stats = manager.optimize_memory();
    assert_eq!(stats.cache_memory_mb, 0.0);

    let cache = TestEvictor::new(&manager, "small", MemoryCategory::FileCache);
    cache.set_bytes(1024);
    manager.optimize_memory();
    assert_eq!(cache.bytes(), 1024);
}

#[test]
fn cleanup_clears_caches_and_is_idempotent() {
    let manager = MemoryManager::new(roomy_config(64));
    let cache = TestEvictor::new(&manager, "cache", MemoryCategory::FileCache);
    let text = TestEvictor::new(&manager, "text", MemoryCategory::LazyText);
    cache.set_bytes(5 * MB);
    text.set_bytes(MB);

    let first = manager.cleanup();
    assert_eq!(cache.bytes(), 0);
    assert_eq!(text.bytes(), 0);
    assert_eq!(first.cache_memory_mb, 0.0);

    let second = manager.cleanup();
    assert_eq!(second.cache_memory_mb, 0.0);
    assert!(second.gc_collections > first.gc_collections);
}

#[test]
fn gc_collections_never_decrease() {
    let manager = MemoryManager::new(MemoryConfig::default());
    let mut last = manager.get_memory_stats().gc_collections;
    for round in 0..10 {
        let stats = if round % 2 == 0 {
            manager.force_garbage_collection()
        } else {
            manager.get_memory_stats()
        };
        assert!(stats.gc_collections >= last);
        if round % 2 == 0 {
            assert!(stats.gc_collections > last);
        }
        last = stats.gc_collections;
    }
}

#[test]
fn cache_memory_tracks_registrations() {
    let manager = MemoryManager::new(roomy_config(64));
    let buffers = TestEvictor::new(&manager, "buffers", MemoryCategory::Other);
    buffers.set_bytes(3 * MB);
    let cache = TestEvictor::new(&manager, "cache", MemoryCategory::FileCache);
    cache.set_bytes(MB);

    assert_eq!(manager.get_memory_stats().cache_memory_mb, 4.0);

    let report = manager.report();
    assert_eq!(report.components[0].name, "buffers");
    assert_eq!(report.components[1].name, "cache");
    assert_eq!(report.usage.get(MemoryCategory::FileCache), MB);

    drop(buffers);
    assert_eq!(manager.get_memory_stats().cache_memory_mb, 1.0);
}

#[test]
fn tracker_add_bytes_saturates() {
    let manager = MemoryManager::new(roomy_config(64));
    let component = TestEvictor::new(&manager, "t", MemoryCategory::Other);
    let tracker = component.tracker.get().unwrap();
    tracker.add_bytes(100);
    tracker.add_bytes(-40);
    assert_eq!(tracker.bytes(), 60);
    tracker.add_bytes(-1_000);
    assert_eq!(tracker.bytes(), 0);
}

#[test]
fn critical_pressure_clears_caches_and_emits_event() {
    // One megabyte is below any real process footprint.
    let manager = MemoryManager::new(MemoryConfig::new(1, 1, 0.5, 0.9).unwrap());
    if manager.get_memory_stats().process_memory_mb == 0.0 {
        // Host does not expose RSS; pressure can't be observed here.
        return;
    }

    let events: Arc<Mutex<Vec<MemoryEvent>>> = Arc::new(Mutex::new(Vec::new()));
    manager.subscribe({
        let events = events.clone();
        Arc::new(move |event: MemoryEvent| events.lock().push(event))
    });

    let cache = TestEvictor::new(&manager, "cache", MemoryCategory::FileCache);
    cache.set_bytes(512 * 1024);

    let report = manager.enforce();
    assert_eq!(report.pressure, MemoryPressure::Critical);
    assert_eq!(cache.bytes(), 0);

    // Band unchanged on the second pass: no new event.
    manager.enforce();
    let events = events.lock();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].previous_pressure, MemoryPressure::Normal);
    assert_eq!(events[0].pressure, MemoryPressure::Critical);
}

#[test]
fn threshold_check_has_no_side_effects() {
    let manager = MemoryManager::new(MemoryConfig::new(1, 1, 0.5, 0.9).unwrap());
    let cache = TestEvictor::new(&manager, "cache", MemoryCategory::FileCache);
    cache.set_bytes(4 * MB);

    let collections = manager.get_memory_stats().gc_collections;
    manager.check_thresholds();
    manager.check_thresholds();

    assert_eq!(cache.bytes(), 4 * MB);
    assert!(manager.get_memory_stats().gc_collections >= collections);
}

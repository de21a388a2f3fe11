use fanws_cache::{FileCache, LazyTextLoader};
use fanws_memory::{MemoryCategory, MemoryConfig, MemoryManager, MB};
use std::io::Write;
use std::sync::Arc;

fn roomy_manager(max_cache_mb: u64) -> MemoryManager {
    MemoryManager::new(MemoryConfig::new(1 << 40, max_cache_mb, 0.8, 0.95).unwrap())
}

#[test]
fn registered_cache_reports_its_size() {
    let manager = roomy_manager(64);
    let cache: Arc<FileCache<String>> = Arc::new(FileCache::new(8).named("chapters"));
    cache.set("one", "x".repeat(1022));
    cache.register_with(&manager);

    let report = manager.report();
    assert_eq!(report.usage.get(MemoryCategory::FileCache), 1024);
    assert_eq!(report.components[0].name, "chapters");

    cache.set("two", "y".repeat(1022));
    assert_eq!(manager.report().usage.get(MemoryCategory::FileCache), 2048);
}

#[test]
fn optimize_shrinks_registered_caches() {
    let manager = roomy_manager(1);
    let cache: Arc<FileCache<String>> = Arc::new(FileCache::new(4));
    cache.register_with(&manager);

    // 64 entries of 64 KiB each: 4 MiB against a 1 MiB cache budget.
    for i in 0..64 {
        cache.set(format!("k{i}"), "x".repeat(64 * 1024 - 2));
    }
    assert_eq!(cache.current_size_bytes(), 4 * MB);

    let stats = manager.optimize_memory();
    assert!(cache.current_size_bytes() <= MB);
    assert!(stats.cache_memory_mb <= 1.0);
    // Most recent entries survive.
    assert!(cache.contains("k63"));
    assert!(!cache.contains("k0"));
}

#[test]
fn cleanup_releases_caches_and_lazy_text() {
    let manager = roomy_manager(64);
    let cache: Arc<FileCache<String>> = Arc::new(FileCache::new(4));
    cache.register_with(&manager);
    cache.set("k", "value".to_string());

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&[b'a'; 1000]).unwrap();
    file.flush().unwrap();
    let loader = Arc::new(LazyTextLoader::with_chunk_size(file.path(), 100).unwrap());
    loader.register_with(&manager);
    loader.read_chunk(0).unwrap();
    loader.read_chunk(9).unwrap();
    assert_eq!(manager.report().usage.get(MemoryCategory::LazyText), 200);

    let stats = manager.cleanup();
    assert_eq!(stats.cache_memory_mb, 0.0);
    assert!(cache.is_empty());
    assert_eq!(loader.cached_bytes(), 0);
}

#[test]
fn dropping_a_cache_unregisters_it() {
    let manager = roomy_manager(64);
    let cache: Arc<FileCache<String>> = Arc::new(FileCache::new(4));
    cache.register_with(&manager);
    cache.set("k", "x".repeat(100));
    assert!(manager.get_memory_stats().cache_memory_mb > 0.0);

    drop(cache);
    assert_eq!(manager.get_memory_stats().cache_memory_mb, 0.0);
    assert!(manager.report().components.is_empty());
}

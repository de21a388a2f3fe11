use fanws_config::FanwsConfig;
use fanws_memory::MemoryCategory;
use fanws_permissions::{Permission, PermissionContext, UserRole};
use fanws_runtime::Runtime;
use serde_json::json;
use std::io::Write;

fn quiet_config() -> FanwsConfig {
    let mut config = FanwsConfig::default();
    config.memory.monitor_interval_ms = 0;
    config
}

#[test]
fn projects_are_registered_with_the_memory_manager() {
    let runtime = Runtime::new(quiet_config()).unwrap();
    let novel = runtime.open_project("novel");
    novel.set("outline", json!({"acts": 3, "title": "Tides"}));
    runtime.open_project("poems").set("draft", json!("roses"));

    let report = runtime.memory().report();
    let names: Vec<&str> = report.components.iter().map(|c| c.name.as_str()).collect();
    assert!(names.contains(&"project:novel"));
    assert!(names.contains(&"project:poems"));
    assert!(report.usage.get(MemoryCategory::FileCache) > 0);

    assert!(std::sync::Arc::ptr_eq(&novel, &runtime.open_project("novel")));
    assert_eq!(runtime.projects().project_names(), vec!["novel", "poems"]);
}

#[test]
fn shutdown_clears_caches_and_is_repeatable() {
    let runtime = Runtime::new(FanwsConfig::default()).unwrap();
    runtime.open_project("novel").set("k", json!([1, 2, 3]));

    let first = runtime.shutdown();
    assert_eq!(first.cache_memory_mb, 0.0);
    assert!(runtime.open_project("novel").get("k").is_none());

    let second = runtime.shutdown();
    assert!(second.gc_collections > first.gc_collections);
}

#[test]
fn open_text_uses_configured_chunk_size() {
    let mut config = quiet_config();
    config.cache.lazy_chunk_size = 16;
    let runtime = Runtime::new(config).unwrap();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&[b'x'; 40]).unwrap();
    file.flush().unwrap();

    let text = runtime.open_text(file.path()).unwrap();
    assert_eq!(text.chunk_count(), 3);
    text.read_chunk(0).unwrap();
    assert_eq!(runtime.memory().report().usage.get(MemoryCategory::LazyText), 16);

    runtime.memory().cleanup();
    assert_eq!(text.cached_bytes(), 0);

    assert!(runtime.open_text(file.path().with_extension("missing")).is_err());
}

#[test]
fn permissions_use_configured_evaluators() {
    let runtime = Runtime::new(quiet_config()).unwrap();
    let permissions = runtime.permissions();

    let ctx = PermissionContext::new("u2", "document", "edit_document")
        .with_resource_id("ch-1")
        .with_metadata("locked_by", "u1");
    assert!(!permissions.check_permission("u2", UserRole::Editor, Permission::EditDocument, &ctx));
    assert_eq!(permissions.get_audit_log(1).len(), 1);
}

#[test]
fn config_file_builds_a_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fanws.toml");
    std::fs::write(
        &path,
        "[logging]\nstderr = false\n\n[memory]\nmonitor_interval_ms = 0\nmax_cache_mb = 8\n",
    )
    .unwrap();

    let runtime = Runtime::from_config_file(&path).unwrap();
    assert_eq!(runtime.config().memory.max_cache_mb, 8);
    assert_eq!(runtime.memory().config().max_cache_mb(), 8);
}

#[test]
fn shared_runtime_is_built_once() {
    let handles: Vec<_> = (0..4)
        .map(|_| std::thread::spawn(|| Runtime::shared(quiet_config).unwrap() as *const Runtime as usize))
        .collect();
    let addresses: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(addresses.windows(2).all(|pair| pair[0] == pair[1]));

    let mut other = quiet_config();
    other.memory.max_cache_mb = 1;
    let again = Runtime::shared(|| other).unwrap();
    assert_eq!(again.config().memory.max_cache_mb, 256);
}

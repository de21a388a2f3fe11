use fanws_config::{ConfigError, FanwsConfig};
use std::time::Duration;

#[test]
fn full_file_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fanws.toml");
    std::fs::write(
        &path,
        r#"
[logging]
level = "debug"
json = true
stderr = false

[memory]
max_memory_mb = 4096
max_cache_mb = 512
enable_streaming = false
monitor_interval_ms = 0
auto_cleanup_on_critical = false

[cache]
lazy_chunk_size = 8192
entry_ttl_secs = 60

[permissions]
decision_cache_ttl_secs = 30
audit_log_capacity = 50
"#,
    )
    .unwrap();

    let config = FanwsConfig::load_from_path(&path).unwrap();
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.json);
    assert!(!config.memory.enable_streaming);
    assert!(!config.memory.auto_cleanup_on_critical);
    assert_eq!(config.memory.monitor_interval(), None);
    assert_eq!(config.cache.entry_ttl(), Some(Duration::from_secs(60)));

    let settings = config.permission_settings();
    assert_eq!(settings.decision_cache_ttl, Duration::from_secs(30));
    assert_eq!(settings.audit_log_capacity, 50);

    let memory = config.memory_config().unwrap();
    assert_eq!(memory.max_cache_mb(), 512);
    assert!(!memory.enable_streaming());

    let (_same, diagnostics) = FanwsConfig::load_from_path_with_diagnostics(&path).unwrap();
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let err = FanwsConfig::load_from_str("[memory\nmax_memory_mb = 1").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)));
}

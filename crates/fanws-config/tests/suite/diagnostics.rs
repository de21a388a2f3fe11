use fanws_config::{ConfigValidationError, ConfigWarning, FanwsConfig};

#[test]
fn default_config_has_no_diagnostics() {
    let (_config, diagnostics) = FanwsConfig::load_from_str_with_diagnostics("").unwrap();
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn unknown_keys_are_reported_with_full_paths() {
    let text = r#"
colour = "blue"

[memory]
max_memroy_mb = 10

[cache]
lazy_chunk_size = 1024
"#;
    let (config, diagnostics) = FanwsConfig::load_from_str_with_diagnostics(text).unwrap();
    assert_eq!(diagnostics.unknown_keys, vec!["colour", "memory.max_memroy_mb"]);
    assert!(diagnostics.is_ok());
    assert_eq!(config.cache.lazy_chunk_size, 1024);
    assert_eq!(config.memory.max_memory_mb, 1024);
}

#[test]
fn inconsistent_memory_settings_are_errors() {
    let text = r#"
[memory]
max_memory_mb = 512
max_cache_mb = 1024
warning_threshold = 0.9
critical_threshold = 0.9

[cache]
lazy_chunk_size = 0
"#;
    let (_config, diagnostics) = FanwsConfig::load_from_str_with_diagnostics(text).unwrap();
    assert!(!diagnostics.is_ok());
    assert!(diagnostics.errors.contains(&ConfigValidationError::ThresholdOrder {
        warning: 0.9,
        critical: 0.9,
    }));
    assert!(diagnostics.errors.contains(&ConfigValidationError::CacheExceedsMemory {
        max_cache_mb: 1024,
        max_memory_mb: 512,
    }));
    assert!(diagnostics.errors.iter().any(|err| matches!(
        err,
        ConfigValidationError::InvalidValue { toml_path, .. } if toml_path == "cache.lazy_chunk_size"
    )));
}

#[test]
fn out_of_range_threshold_is_an_error() {
    let text = "[memory]\ncritical_threshold = 1.5\n";
    let (_config, diagnostics) = FanwsConfig::load_from_str_with_diagnostics(text).unwrap();
    assert!(diagnostics.errors.iter().any(|err| matches!(
        err,
        ConfigValidationError::InvalidValue { toml_path, .. } if toml_path == "memory.critical_threshold"
    )));
}

#[test]
fn invalid_logging_level_is_a_warning() {
    let text = "[logging]\nlevel = \"fanws.cache=loud\"\n";
    let (_config, diagnostics) = FanwsConfig::load_from_str_with_diagnostics(text).unwrap();
    assert!(diagnostics.is_ok());
    assert!(matches!(
        diagnostics.warnings.as_slice(),
        [ConfigWarning::LoggingLevelInvalid { .. }]
    ));
}

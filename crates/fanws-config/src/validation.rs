use crate::diagnostics::{ConfigValidationError, ConfigWarning, ValidationDiagnostics};
use crate::{FanwsConfig, LoggingConfig};

impl FanwsConfig {
    /// Check semantic invariants, reporting every problem found in one pass.
    #[must_use]
    pub fn validate(&self) -> ValidationDiagnostics {
        let mut out = ValidationDiagnostics::default();
        validate_memory(self, &mut out);
        validate_cache(self, &mut out);
        validate_permissions(self, &mut out);
        validate_logging(self, &mut out);
        out
    }
}

fn validate_memory(config: &FanwsConfig, out: &mut ValidationDiagnostics) {
    let memory = &config.memory;

    if memory.max_memory_mb == 0 {
        out.errors.push(ConfigValidationError::InvalidValue {
            toml_path: "memory.max_memory_mb".to_string(),
            message: "must be >= 1".to_string(),
        });
    }

    for (path, value) in [
        ("memory.warning_threshold", memory.warning_threshold),
        ("memory.critical_threshold", memory.critical_threshold),
    ] {
        if !(value > 0.0 && value <= 1.0) {
            out.errors.push(ConfigValidationError::InvalidValue {
                toml_path: path.to_string(),
                message: format!("must be within (0, 1], got {value}"),
            });
        }
    }

    if memory.warning_threshold >= memory.critical_threshold {
        out.errors.push(ConfigValidationError::ThresholdOrder {
            warning: memory.warning_threshold,
            critical: memory.critical_threshold,
        });
    }

    if memory.max_cache_mb > memory.max_memory_mb {
        out.errors.push(ConfigValidationError::CacheExceedsMemory {
            max_cache_mb: memory.max_cache_mb,
            max_memory_mb: memory.max_memory_mb,
        });
    }

    if memory.monitor_interval_ms > 0 && memory.monitor_interval_ms < 100 {
        out.warnings.push(ConfigWarning::InvalidValue {
            toml_path: "memory.monitor_interval_ms".to_string(),
            message: "polling faster than every 100ms costs more than it saves".to_string(),
        });
    }
}

fn validate_cache(config: &FanwsConfig, out: &mut ValidationDiagnostics) {
    if config.cache.lazy_chunk_size == 0 {
        out.errors.push(ConfigValidationError::InvalidValue {
            toml_path: "cache.lazy_chunk_size".to_string(),
            message: "must be >= 1".to_string(),
        });
    }
}

fn validate_permissions(config: &FanwsConfig, out: &mut ValidationDiagnostics) {
    if config.permissions.audit_log_capacity == 0 {
        out.warnings.push(ConfigWarning::InvalidValue {
            toml_path: "permissions.audit_log_capacity".to_string(),
            message: "0 disables the audit log".to_string(),
        });
    }
}

fn validate_logging(config: &FanwsConfig, out: &mut ValidationDiagnostics) {
    let normalized = LoggingConfig::normalize_level_directives(&config.logging.level);
    if !config.logging.level.trim().is_empty()
        && tracing_subscriber::EnvFilter::try_new(normalized.clone()).is_err()
    {
        out.warnings.push(ConfigWarning::LoggingLevelInvalid {
            value: config.logging.level.clone(),
            normalized,
        });
    }
}

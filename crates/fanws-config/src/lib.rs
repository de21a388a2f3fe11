//! `fanws.toml` configuration: loading, validation and logging setup.

mod diagnostics;
mod logging;
mod validation;

pub use diagnostics::{ConfigDiagnostics, ConfigValidationError, ConfigWarning, ValidationDiagnostics};
pub use logging::{init_tracing, LoggingConfig};

use fanws_memory::MemoryConfigError;
use fanws_permissions::PermissionSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// Top-level configuration. Every table and field is optional in the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FanwsConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub memory: MemorySection,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub permissions: PermissionsSection,
}

/// `[memory]`: limits and thresholds for the memory manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorySection {
    #[serde(default = "MemorySection::default_max_memory_mb")]
    pub max_memory_mb: u64,
    #[serde(default = "MemorySection::default_max_cache_mb")]
    pub max_cache_mb: u64,
    #[serde(default = "default_true")]
    pub enable_lazy_loading: bool,
    #[serde(default = "default_true")]
    pub enable_streaming: bool,
    #[serde(default)]
    pub enable_compression: bool,
    /// Fraction of `max_memory_mb` at which pressure becomes `Warning`.
    #[serde(default = "MemorySection::default_warning_threshold")]
    pub warning_threshold: f64,
    /// Fraction of `max_memory_mb` at which pressure becomes `Critical`.
    #[serde(default = "MemorySection::default_critical_threshold")]
    pub critical_threshold: f64,
    /// Background monitor poll interval. `0` disables the monitor.
    #[serde(default = "MemorySection::default_monitor_interval_ms")]
    pub monitor_interval_ms: u64,
    #[serde(default = "default_true")]
    pub auto_cleanup_on_critical: bool,
}

impl MemorySection {
    fn default_max_memory_mb() -> u64 {
        1024
    }

    fn default_max_cache_mb() -> u64 {
        256
    }

    fn default_warning_threshold() -> f64 {
        0.80
    }

    fn default_critical_threshold() -> f64 {
        0.95
    }

    fn default_monitor_interval_ms() -> u64 {
        5_000
    }

    pub fn monitor_interval(&self) -> Option<Duration> {
        (self.monitor_interval_ms > 0).then(|| Duration::from_millis(self.monitor_interval_ms))
    }
}

impl Default for MemorySection {
    fn default() -> Self {
        Self {
            max_memory_mb: Self::default_max_memory_mb(),
            max_cache_mb: Self::default_max_cache_mb(),
            enable_lazy_loading: true,
            enable_streaming: true,
            enable_compression: false,
            warning_threshold: Self::default_warning_threshold(),
            critical_threshold: Self::default_critical_threshold(),
            monitor_interval_ms: Self::default_monitor_interval_ms(),
            auto_cleanup_on_critical: true,
        }
    }
}

/// `[cache]`: file cache and lazy loader knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSection {
    #[serde(default = "CacheSection::default_lazy_chunk_size")]
    pub lazy_chunk_size: usize,
    /// Entry age limit in seconds. `0` means entries only leave by eviction.
    #[serde(default)]
    pub entry_ttl_secs: u64,
}

impl CacheSection {
    fn default_lazy_chunk_size() -> usize {
        64 * 1024
    }

    pub fn entry_ttl(&self) -> Option<Duration> {
        (self.entry_ttl_secs > 0).then(|| Duration::from_secs(self.entry_ttl_secs))
    }
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            lazy_chunk_size: Self::default_lazy_chunk_size(),
            entry_ttl_secs: 0,
        }
    }
}

/// `[permissions]`: decision cache and audit log sizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionsSection {
    #[serde(default = "PermissionsSection::default_decision_cache_ttl_secs")]
    pub decision_cache_ttl_secs: u64,
    #[serde(default = "PermissionsSection::default_audit_log_capacity")]
    pub audit_log_capacity: usize,
}

impl PermissionsSection {
    fn default_decision_cache_ttl_secs() -> u64 {
        300
    }

    fn default_audit_log_capacity() -> usize {
        1000
    }
}

impl Default for PermissionsSection {
    fn default() -> Self {
        Self {
            decision_cache_ttl_secs: Self::default_decision_cache_ttl_secs(),
            audit_log_capacity: Self::default_audit_log_capacity(),
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // The default `Display` quotes a snippet of the input; keep only the message.
        ConfigError::Toml(sanitize_toml_error_message(err.message()))
    }
}

/// Redact user-supplied values that serde echoes into parse errors, e.g.
/// `invalid type: string "x", expected a boolean`.
fn sanitize_toml_error_message(message: &str) -> String {
    static QUOTED: OnceLock<Option<regex::Regex>> = OnceLock::new();
    static BACKTICKED_VALUE: OnceLock<Option<regex::Regex>> = OnceLock::new();

    let quoted = QUOTED.get_or_init(|| regex::Regex::new(r#""(?:\\.|[^"\\])*""#).ok());
    let mut out = match quoted {
        Some(re) => re.replace_all(message, r#""<redacted>""#).into_owned(),
        None => message.to_string(),
    };

    // `unknown field `x``, `invalid type: integer `7``: the first backticked
    // segment is user input. Names listed after `expected` are schema names.
    let backticked = BACKTICKED_VALUE.get_or_init(|| {
        regex::Regex::new(r"^((?:unknown field|unknown variant|invalid type: [a-z ]+|invalid value: [a-z ]+) )`[^`]*`").ok()
    });
    if let Some(re) = backticked {
        out = re.replace(&out, "$1`<redacted>`").into_owned();
    }
    out
}

impl FanwsConfig {
    /// Load a config file from TOML.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = read_config(path.as_ref())?;
        Self::load_from_str(&text)
    }

    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a config file and report unknown keys and semantic problems.
    pub fn load_from_path_with_diagnostics(
        path: impl AsRef<Path>,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let text = read_config(path.as_ref())?;
        Self::load_from_str_with_diagnostics(&text)
    }

    /// Parse `text` and return the config together with diagnostics.
    ///
    /// Diagnostics never fail the load; callers decide whether errors in
    /// them are fatal.
    pub fn load_from_str_with_diagnostics(
        text: &str,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let (config, unknown_keys) =
            diagnostics::deserialize_toml_with_unknown_keys::<FanwsConfig>(text)?;

        let mut diagnostics = ConfigDiagnostics {
            unknown_keys,
            ..ConfigDiagnostics::default()
        };
        diagnostics.extend_validation(config.validate());

        for key in &diagnostics.unknown_keys {
            tracing::warn!(target = "fanws.config", key = %key, "unknown config key");
        }
        Ok((config, diagnostics))
    }

    /// The `[memory]` table as a validated [`fanws_memory::MemoryConfig`].
    pub fn memory_config(&self) -> Result<fanws_memory::MemoryConfig, MemoryConfigError> {
        let memory = &self.memory;
        Ok(fanws_memory::MemoryConfig::new(
            memory.max_memory_mb,
            memory.max_cache_mb,
            memory.warning_threshold,
            memory.critical_threshold,
        )?
        .with_lazy_loading(memory.enable_lazy_loading)
        .with_streaming(memory.enable_streaming)
        .with_compression(memory.enable_compression))
    }

    pub fn permission_settings(&self) -> PermissionSettings {
        PermissionSettings {
            decision_cache_ttl: Duration::from_secs(self.permissions.decision_cache_ttl_secs),
            audit_log_capacity: self.permissions.audit_log_capacity,
        }
    }
}

fn read_config(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}

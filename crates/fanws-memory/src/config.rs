use crate::pressure::MemoryPressure;
use crate::types::MemoryStats;
use serde::{Deserialize, Serialize};

pub const MB: u64 = 1024 * 1024;

/// Invariant violations rejected by [`MemoryConfig::validate`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MemoryConfigError {
    #[error("max_memory_mb must be greater than zero")]
    ZeroMemoryLimit,

    #[error("{name} must be within (0, 1], got {value}")]
    ThresholdOutOfRange { name: &'static str, value: f64 },

    #[error("warning_threshold ({warning}) must be lower than critical_threshold ({critical})")]
    ThresholdOrder { warning: f64, critical: f64 },
}

/// Immutable tuning knobs for the memory subsystem.
///
/// Thresholds are fractions of `max_memory_mb` and must satisfy
/// `0 < warning_threshold < critical_threshold <= 1.0`. Deserialization
/// enforces the same rules as [`MemoryConfig::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMemoryConfig")]
pub struct MemoryConfig {
    max_memory_mb: u64,
    max_cache_mb: u64,
    enable_lazy_loading: bool,
    enable_streaming: bool,
    enable_compression: bool,
    warning_threshold: f64,
    critical_threshold: f64,
}

#[derive(Deserialize)]
struct RawMemoryConfig {
    max_memory_mb: u64,
    max_cache_mb: u64,
    enable_lazy_loading: bool,
    enable_streaming: bool,
    enable_compression: bool,
    warning_threshold: f64,
    critical_threshold: f64,
}

impl TryFrom<RawMemoryConfig> for MemoryConfig {
    type Error = MemoryConfigError;

    fn try_from(raw: RawMemoryConfig) -> Result<Self, Self::Error> {
        let config = Self {
            max_memory_mb: raw.max_memory_mb,
            max_cache_mb: raw.max_cache_mb,
            enable_lazy_loading: raw.enable_lazy_loading,
            enable_streaming: raw.enable_streaming,
            enable_compression: raw.enable_compression,
            warning_threshold: raw.warning_threshold,
            critical_threshold: raw.critical_threshold,
        };
        config.validate()?;
        Ok(config)
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_memory_mb: 1024,
            max_cache_mb: 256,
            enable_lazy_loading: true,
            enable_streaming: true,
            enable_compression: false,
            warning_threshold: 0.80,
            critical_threshold: 0.95,
        }
    }
}

impl MemoryConfig {
    /// Build a config with the given limits and thresholds; feature flags keep their defaults.
    pub fn new(
        max_memory_mb: u64,
        max_cache_mb: u64,
        warning_threshold: f64,
        critical_threshold: f64,
    ) -> Result<Self, MemoryConfigError> {
        let config = Self {
            max_memory_mb,
            max_cache_mb,
            warning_threshold,
            critical_threshold,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_lazy_loading(mut self, enabled: bool) -> Self {
        self.enable_lazy_loading = enabled;
        self
    }

    pub fn with_streaming(mut self, enabled: bool) -> Self {
        self.enable_streaming = enabled;
        self
    }

    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.enable_compression = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), MemoryConfigError> {
        if self.max_memory_mb == 0 {
            return Err(MemoryConfigError::ZeroMemoryLimit);
        }
        for (name, value) in [
            ("warning_threshold", self.warning_threshold),
            ("critical_threshold", self.critical_threshold),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(MemoryConfigError::ThresholdOutOfRange { name, value });
            }
        }
        if self.warning_threshold >= self.critical_threshold {
            return Err(MemoryConfigError::ThresholdOrder {
                warning: self.warning_threshold,
                critical: self.critical_threshold,
            });
        }
        Ok(())
    }

    pub fn max_memory_mb(&self) -> u64 {
        self.max_memory_mb
    }

    pub fn max_cache_mb(&self) -> u64 {
        self.max_cache_mb
    }

    pub fn max_cache_bytes(&self) -> u64 {
        self.max_cache_mb.saturating_mul(MB)
    }

    pub fn enable_lazy_loading(&self) -> bool {
        self.enable_lazy_loading
    }

    pub fn enable_streaming(&self) -> bool {
        self.enable_streaming
    }

    pub fn enable_compression(&self) -> bool {
        self.enable_compression
    }

    pub fn warning_threshold(&self) -> f64 {
        self.warning_threshold
    }

    pub fn critical_threshold(&self) -> f64 {
        self.critical_threshold
    }

    /// Classify a stats snapshot into a pressure band.
    ///
    /// Pure: depends only on `stats.process_memory_mb` and this config.
    pub fn pressure_for(&self, stats: &MemoryStats) -> MemoryPressure {
        let limit = self.max_memory_mb.max(1) as f64;
        let ratio = stats.process_memory_mb / limit;
        if ratio >= self.critical_threshold {
            MemoryPressure::Critical
        } else if ratio >= self.warning_threshold {
            MemoryPressure::Warning
        } else {
            MemoryPressure::Normal
        }
    }
}

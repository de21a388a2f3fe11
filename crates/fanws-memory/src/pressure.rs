use serde::{Deserialize, Serialize};

/// Coarse-grained memory pressure bands derived from `MemoryConfig` thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryPressure {
    Normal,
    Warning,
    Critical,
}

impl MemoryPressure {
    /// Fraction of the cache budget caches are asked to keep at this band.
    pub(crate) fn cache_target_ratio(self) -> f64 {
        match self {
            MemoryPressure::Normal => 1.0,
            MemoryPressure::Warning => 0.5,
            MemoryPressure::Critical => 0.0,
        }
    }
}

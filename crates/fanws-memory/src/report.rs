use crate::pressure::MemoryPressure;
use crate::types::{MemoryBreakdown, MemoryCategory, MemoryStats};
use serde::{Deserialize, Serialize};

/// Tracked usage of one registered component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentUsage {
    pub name: String,
    pub category: MemoryCategory,
    pub bytes: u64,
}

/// Snapshot of memory state intended for the UI status indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryReport {
    pub stats: MemoryStats,
    pub pressure: MemoryPressure,
    pub usage: MemoryBreakdown,
    /// Components sorted by descending usage, then by name.
    pub components: Vec<ComponentUsage>,
}

impl MemoryReport {
    pub fn cache_bytes(&self) -> u64 {
        self.usage.total()
    }
}

use serde::{Deserialize, Serialize};

/// Coarse categories for tracked cache memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryCategory {
    /// Key/value caches (`FileCache`, per-project caches).
    FileCache,
    /// Chunk buffers held by lazy text loaders.
    LazyText,
    Other,
}

/// Per-category tracked memory in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryBreakdown {
    pub file_cache: u64,
    pub lazy_text: u64,
    pub other: u64,
}

impl MemoryBreakdown {
    pub fn total(self) -> u64 {
        self.file_cache
            .saturating_add(self.lazy_text)
            .saturating_add(self.other)
    }

    pub fn get(self, category: MemoryCategory) -> u64 {
        match category {
            MemoryCategory::FileCache => self.file_cache,
            MemoryCategory::LazyText => self.lazy_text,
            MemoryCategory::Other => self.other,
        }
    }

    pub fn set(&mut self, category: MemoryCategory, bytes: u64) {
        match category {
            MemoryCategory::FileCache => self.file_cache = bytes,
            MemoryCategory::LazyText => self.lazy_text = bytes,
            MemoryCategory::Other => self.other = bytes,
        }
    }

    pub fn categories() -> [MemoryCategory; 3] {
        [
            MemoryCategory::FileCache,
            MemoryCategory::LazyText,
            MemoryCategory::Other,
        ]
    }
}

/// Point-in-time memory snapshot. A fresh value is produced on every sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    /// Resident set size of this process, in MiB. Zero when unavailable.
    pub process_memory_mb: f64,
    /// Host-wide memory usage in percent (0-100). Zero when unavailable.
    pub system_memory_percent: f64,
    /// Bytes self-reported by registered caches, in MiB.
    pub cache_memory_mb: f64,
    /// Reclamation cycles run over the process lifetime. Never decreases.
    pub gc_collections: u64,
}

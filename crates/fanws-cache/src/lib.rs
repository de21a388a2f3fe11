//! In-memory caches and lazy text loading for FANWS.
//!
//! - [`FileCache`]: a byte-budgeted LRU cache from string keys to shared values.
//! - [`ProjectFileCache`] / [`ProjectCaches`]: one isolated cache per open project.
//! - [`LazyTextLoader`]: chunked, on-demand reads of large manuscript files.
//!
//! Every cache can register with a [`fanws_memory::MemoryManager`] so memory
//! pressure drives eviction.

mod error;
mod file_cache;
mod lazy_text;
mod project;
mod size;

pub use error::{CacheError, Result};
pub use file_cache::{CacheStats, FileCache};
pub use lazy_text::{LazyTextLoader, Lines, DEFAULT_CHUNK_SIZE};
pub use project::{ProjectCaches, ProjectFileCache};
pub use size::estimate_size;

//! Memory accounting, pressure detection and cache eviction orchestration for FANWS.
//!
//! This crate is intentionally lightweight and "best-effort":
//! - Host sampling never fails; unavailable sources degrade to zeroed fields.
//! - Cache accounting is self-reported by the owning components through
//!   [`MemoryTracker`] handles.
//! - Eviction is cooperative via [`MemoryEvictor`] implementors.
//!
//! There is no ambient global instance. The application's composition root
//! constructs one [`MemoryManager`] and clones the handle wherever it is needed.

mod config;
mod eviction;
mod manager;
mod monitor;
mod pressure;
mod process;
mod reclaim;
mod report;
mod types;

pub use config::{MemoryConfig, MemoryConfigError, MB};
pub use eviction::{EvictionRequest, EvictionResult, MemoryEvictor};
pub use manager::{MemoryEvent, MemoryManager, MemoryRegistration, MemoryTracker};
pub use pressure::MemoryPressure;
pub use report::{ComponentUsage, MemoryReport};
pub use types::{MemoryBreakdown, MemoryCategory, MemoryStats};

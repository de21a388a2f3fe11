use crate::pressure::MemoryPressure;
use crate::types::MemoryCategory;

/// A request to shrink a component to at most `target_bytes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionRequest {
    pub pressure: MemoryPressure,
    pub target_bytes: u64,
}

/// Outcome of a single [`MemoryEvictor::evict`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvictionResult {
    pub before_bytes: u64,
    pub after_bytes: u64,
}

impl EvictionResult {
    pub fn freed_bytes(&self) -> u64 {
        self.before_bytes.saturating_sub(self.after_bytes)
    }
}

/// A component that can release memory on request.
///
/// Implementations must be cheap to call repeatedly and must never panic when
/// they hold nothing.
pub trait MemoryEvictor: Send + Sync {
    fn name(&self) -> &str;

    fn category(&self) -> MemoryCategory;

    fn evict(&self, request: EvictionRequest) -> EvictionResult;
}

use crate::permission::Permission;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One recorded permission check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unix time in milliseconds, taken from the check's context.
    pub timestamp: u64,
    pub user_id: String,
    pub permission: Permission,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub action: String,
    pub granted: bool,
}

/// Append-only ring of the most recent checks; the oldest entry is dropped
/// once `capacity` is reached.
#[derive(Debug)]
pub(crate) struct AuditLog {
    capacity: usize,
    entries: VecDeque<AuditEntry>,
}

impl AuditLog {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity.min(1024)),
        }
    }

    pub(crate) fn push(&mut self, entry: AuditEntry) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// The most recent `limit` entries, oldest first.
    pub(crate) fn recent(&self, limit: usize) -> Vec<AuditEntry> {
        let skip = self.entries.len().saturating_sub(limit);
        self.entries.iter().skip(skip).cloned().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

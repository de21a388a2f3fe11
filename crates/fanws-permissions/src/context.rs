use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};

/// The situation a permission check is made in.
///
/// Built per check and discarded afterwards; only the fields copied into the
/// audit log outlive it. `metadata` carries evaluator inputs such as
/// `owner_id`, `locked_by`, `start_time` and `end_time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionContext {
    pub user_id: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub action: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Unix time in milliseconds.
    pub timestamp: u64,
}

impl PermissionContext {
    pub fn new(
        user_id: impl Into<String>,
        resource_type: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            resource_type: resource_type.into(),
            resource_id: None,
            action: action.into(),
            metadata: Map::new(),
            timestamp: now_millis(),
        }
    }

    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn at(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub(crate) fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    pub(crate) fn metadata_u64(&self, key: &str) -> Option<u64> {
        self.metadata.get(key).and_then(Value::as_u64)
    }
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

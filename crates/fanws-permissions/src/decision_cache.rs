use crate::permission::Permission;
use crate::role::RoleId;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct DecisionKey {
    user_id: String,
    permission: Permission,
    resource_id: Option<String>,
}

impl DecisionKey {
    pub(crate) fn new(user_id: &str, permission: Permission, resource_id: Option<&str>) -> Self {
        Self {
            user_id: user_id.to_string(),
            permission,
            resource_id: resource_id.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone)]
struct Decision {
    granted: bool,
    role: RoleId,
    computed_at: Instant,
}

/// Short-lived memo of check results keyed by `(user, permission, resource)`.
///
/// Every invalidation bumps `generation`. A check records the generation it
/// started in and its result is only stored if no invalidation happened
/// meanwhile, so a grant or revoke racing with a check can't be undone by a
/// stale insert.
#[derive(Debug)]
pub(crate) struct DecisionCache {
    ttl: Duration,
    generation: u64,
    entries: HashMap<DecisionKey, Decision>,
}

impl DecisionCache {
    pub(crate) fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            generation: 0,
            entries: HashMap::new(),
        }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// A fresh decision made for the same role, if any.
    pub(crate) fn get(&mut self, key: &DecisionKey, role: &RoleId, now: Instant) -> Option<bool> {
        let decision = self.entries.get(key)?;
        if now.saturating_duration_since(decision.computed_at) >= self.ttl {
            self.entries.remove(key);
            return None;
        }
        // The user's role assignment lives outside this manager; a decision
        // made under another role doesn't apply.
        (decision.role == *role).then_some(decision.granted)
    }

    pub(crate) fn insert_if_current(
        &mut self,
        generation: u64,
        key: DecisionKey,
        role: RoleId,
        granted: bool,
        now: Instant,
    ) {
        if generation != self.generation || self.ttl.is_zero() {
            return;
        }
        self.entries.insert(
            key,
            Decision {
                granted,
                role,
                computed_at: now,
            },
        );
    }

    /// Drop every decision for `user_id`; returns how many were dropped.
    pub(crate) fn invalidate_user(&mut self, user_id: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.user_id != user_id);
        self.generation = self.generation.wrapping_add(1);
        before - self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

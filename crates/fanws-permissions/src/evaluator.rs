use crate::context::PermissionContext;
use crate::permission::Permission;
use std::collections::BTreeSet;

/// Outcome of a single evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Allow, even if the user's permission set lacks the permission.
    Grant,
    /// Refuse. Stops the evaluator chain; nothing later can re-grant.
    Deny,
    /// The evaluator has no opinion on this context.
    Abstain,
}

impl From<bool> for Verdict {
    fn from(granted: bool) -> Self {
        if granted {
            Verdict::Grant
        } else {
            Verdict::Deny
        }
    }
}

/// A contextual rule consulted after the role and custom-grant lookup.
///
/// Evaluators run in registration order. Implement this for new rules and add
/// them with [`crate::PermissionManager::add_evaluator`]; closures of the same
/// shape implement it too.
pub trait PermissionEvaluator: Send + Sync {
    fn evaluate(
        &self,
        context: &PermissionContext,
        user_permissions: &BTreeSet<Permission>,
    ) -> Verdict;

    /// Label used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> PermissionEvaluator for F
where
    F: Fn(&PermissionContext, &BTreeSet<Permission>) -> Verdict + Send + Sync,
{
    fn evaluate(
        &self,
        context: &PermissionContext,
        user_permissions: &BTreeSet<Permission>,
    ) -> Verdict {
        self(context, user_permissions)
    }
}

/// Grants when `metadata.owner_id` names the acting user.
#[derive(Debug, Default, Clone, Copy)]
pub struct OwnershipEvaluator;

impl PermissionEvaluator for OwnershipEvaluator {
    fn evaluate(&self, context: &PermissionContext, _: &BTreeSet<Permission>) -> Verdict {
        match context.metadata_str("owner_id") {
            Some(owner) if owner == context.user_id => Verdict::Grant,
            _ => Verdict::Abstain,
        }
    }

    fn name(&self) -> &str {
        "ownership"
    }
}

/// Denies outside the `[metadata.start_time, metadata.end_time]` window
/// (unix millis, inclusive). Abstains unless both bounds are present.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimeWindowEvaluator;

impl PermissionEvaluator for TimeWindowEvaluator {
    fn evaluate(&self, context: &PermissionContext, _: &BTreeSet<Permission>) -> Verdict {
        let (Some(start), Some(end)) = (
            context.metadata_u64("start_time"),
            context.metadata_u64("end_time"),
        ) else {
            return Verdict::Abstain;
        };

        if (start..=end).contains(&context.timestamp) {
            Verdict::Abstain
        } else {
            Verdict::Deny
        }
    }

    fn name(&self) -> &str {
        "time_window"
    }
}

/// Denies mutating actions on a resource locked by someone else.
///
/// The lock holder is read from `metadata.locked_by`; an action is mutating
/// when its name starts with `edit`, `delete`, `update` or `remove`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResourceLockEvaluator;

const LOCKED_ACTION_PREFIXES: [&str; 4] = ["edit", "delete", "update", "remove"];

impl PermissionEvaluator for ResourceLockEvaluator {
    fn evaluate(&self, context: &PermissionContext, _: &BTreeSet<Permission>) -> Verdict {
        let Some(holder) = context.metadata_str("locked_by") else {
            return Verdict::Abstain;
        };
        if holder == context.user_id {
            return Verdict::Abstain;
        }

        let action = context.action.to_ascii_lowercase();
        if LOCKED_ACTION_PREFIXES
            .iter()
            .any(|prefix| action.starts_with(prefix))
        {
            Verdict::Deny
        } else {
            Verdict::Abstain
        }
    }

    fn name(&self) -> &str {
        "resource_lock"
    }
}

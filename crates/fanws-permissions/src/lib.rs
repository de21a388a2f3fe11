//! Role-based authorization for FANWS collaboration features.
//!
//! [`PermissionManager`] answers "may this user do this?" from three sources:
//! the permission set of the user's role, per-user custom grants, and a chain
//! of pluggable [`PermissionEvaluator`]s that look at the request context.
//! Decisions are memoized briefly and every check is recorded in a bounded
//! audit log.
//!
//! Denial is a normal `false` result. Call sites that need hard enforcement use
//! [`require_permission`] / [`with_permission`].

mod audit;
mod context;
mod decision_cache;
mod enforce;
mod error;
mod evaluator;
mod manager;
mod permission;
mod role;
mod transfer;

pub use audit::AuditEntry;
pub use context::PermissionContext;
pub use enforce::{require_permission, with_permission};
pub use error::{PermissionDenied, RoleError};
pub use evaluator::{
    OwnershipEvaluator, PermissionEvaluator, ResourceLockEvaluator, TimeWindowEvaluator, Verdict,
};
pub use manager::{PermissionManager, PermissionSettings};
pub use permission::{ParsePermissionError, Permission, PermissionCategory};
pub use role::{can_modify_user_role, RoleDefinition, RoleId, UserRole};
pub use transfer::{ImportReport, CONFIG_VERSION};

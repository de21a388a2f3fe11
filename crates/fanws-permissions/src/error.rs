use crate::permission::Permission;
use crate::role::RoleId;

/// Rejected role-definition changes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoleError {
    #[error("role `{0}` is a system role and cannot be modified")]
    SystemRoleImmutable(RoleId),
    #[error("unknown role `{0}`")]
    UnknownRole(RoleId),
    #[error("role `{0}` already exists")]
    DuplicateRole(RoleId),
    #[error("invalid role name {0:?}")]
    InvalidRoleName(String),
}

/// Returned by the enforcement wrappers when a check fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("user `{user_id}` is not allowed to `{permission}`{}", resource_suffix(.resource_id))]
pub struct PermissionDenied {
    pub user_id: String,
    pub permission: Permission,
    pub resource_id: Option<String>,
}

fn resource_suffix(resource_id: &Option<String>) -> String {
    match resource_id {
        Some(id) => format!(" on `{id}`"),
        None => String::new(),
    }
}

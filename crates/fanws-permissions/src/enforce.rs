use crate::context::PermissionContext;
use crate::error::PermissionDenied;
use crate::manager::PermissionManager;
use crate::permission::Permission;
use crate::role::RoleId;

/// Check `permission` and turn a denial into an error.
///
/// ```
/// use fanws_permissions::{require_permission, Permission, PermissionContext, PermissionManager, UserRole};
///
/// let manager = PermissionManager::new();
/// let ctx = PermissionContext::new("u1", "project", "delete").with_resource_id("novel");
/// assert!(require_permission(&manager, "u1", UserRole::Owner, Permission::DeleteProject, &ctx).is_ok());
/// assert!(require_permission(&manager, "u1", UserRole::Viewer, Permission::DeleteProject, &ctx).is_err());
/// ```
pub fn require_permission(
    manager: &PermissionManager,
    user_id: &str,
    role: impl Into<RoleId>,
    permission: Permission,
    context: &PermissionContext,
) -> Result<(), PermissionDenied> {
    if manager.check_permission(user_id, role, permission, context) {
        Ok(())
    } else {
        Err(PermissionDenied {
            user_id: user_id.to_string(),
            permission,
            resource_id: context.resource_id.clone(),
        })
    }
}

/// Run `action` only if the check passes.
pub fn with_permission<T>(
    manager: &PermissionManager,
    user_id: &str,
    role: impl Into<RoleId>,
    permission: Permission,
    context: &PermissionContext,
    action: impl FnOnce() -> T,
) -> Result<T, PermissionDenied> {
    require_permission(manager, user_id, role, permission, context)?;
    Ok(action())
}

use crate::audit::{AuditEntry, AuditLog};
use crate::context::PermissionContext;
use crate::decision_cache::{DecisionCache, DecisionKey};
use crate::error::RoleError;
use crate::evaluator::{
    OwnershipEvaluator, PermissionEvaluator, ResourceLockEvaluator, TimeWindowEvaluator, Verdict,
};
use crate::permission::{Permission, PermissionCategory};
use crate::role::{self, custom_role_id, RoleDefinition, RoleId, UserRole};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Tunables for a [`PermissionManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionSettings {
    /// How long a decision is served from cache. Zero disables caching.
    pub decision_cache_ttl: Duration,
    /// Maximum number of retained audit entries.
    pub audit_log_capacity: usize,
}

impl Default for PermissionSettings {
    fn default() -> Self {
        Self {
            decision_cache_ttl: Duration::from_secs(300),
            audit_log_capacity: 1000,
        }
    }
}

/// Role-based permission engine.
///
/// Thread-safe; share it behind an `Arc`. Checks never fail: unknown roles
/// resolve to an empty permission set and denial is a `false` result.
pub struct PermissionManager {
    pub(crate) roles: RwLock<BTreeMap<RoleId, RoleDefinition>>,
    pub(crate) custom_permissions: RwLock<HashMap<String, BTreeSet<Permission>>>,
    evaluators: RwLock<Vec<Arc<dyn PermissionEvaluator>>>,
    decisions: Mutex<DecisionCache>,
    audit: Mutex<AuditLog>,
}

impl Default for PermissionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PermissionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionManager")
            .field("roles", &self.roles.read().len())
            .field("evaluators", &self.evaluators.read().len())
            .field("cached_decisions", &self.decisions.lock().len())
            .field("audit_entries", &self.audit.lock().len())
            .finish()
    }
}

impl PermissionManager {
    /// A manager with the built-in roles and no evaluators.
    pub fn new() -> Self {
        Self::with_settings(PermissionSettings::default())
    }

    pub fn with_settings(settings: PermissionSettings) -> Self {
        let roles = UserRole::ALL
            .into_iter()
            .map(|role| (RoleId::Builtin(role), RoleDefinition::system(role)))
            .collect();

        Self {
            roles: RwLock::new(roles),
            custom_permissions: RwLock::new(HashMap::new()),
            evaluators: RwLock::new(Vec::new()),
            decisions: Mutex::new(DecisionCache::new(settings.decision_cache_ttl)),
            audit: Mutex::new(AuditLog::new(settings.audit_log_capacity)),
        }
    }

    /// Register the ownership, time-window and resource-lock evaluators, in
    /// that order.
    pub fn with_default_evaluators(self) -> Self {
        self.add_evaluator(Arc::new(OwnershipEvaluator));
        self.add_evaluator(Arc::new(TimeWindowEvaluator));
        self.add_evaluator(Arc::new(ResourceLockEvaluator));
        self
    }

    /// Append an evaluator to the chain. Cached decisions are dropped since
    /// they were made without it.
    pub fn add_evaluator(&self, evaluator: Arc<dyn PermissionEvaluator>) {
        tracing::debug!(target = "fanws.permissions", evaluator = evaluator.name(), "added evaluator");
        self.evaluators.write().push(evaluator);
        self.decisions.lock().clear();
    }

    /// Decide whether `user_id`, holding `role`, may use `permission` in `context`.
    ///
    /// The base answer is membership in the role's permissions plus the user's
    /// custom grants. Evaluators then run in order: `Grant` allows, `Deny`
    /// refuses and stops the chain. The result is cached per
    /// `(user, permission, context.resource_id)` and every call is audited.
    ///
    /// A cache hit skips the evaluators, so metadata that changes within the
    /// TTL (a new `locked_by`, a closing time window) is not seen until the
    /// decision expires or is dropped with [`Self::invalidate_user`] or
    /// [`Self::clear_cache`].
    pub fn check_permission(
        &self,
        user_id: &str,
        role: impl Into<RoleId>,
        permission: Permission,
        context: &PermissionContext,
    ) -> bool {
        let role = role.into();
        let key = DecisionKey::new(user_id, permission, context.resource_id.as_deref());
        let now = Instant::now();

        let (cached, generation) = {
            let mut decisions = self.decisions.lock();
            (decisions.get(&key, &role, now), decisions.generation())
        };

        let granted = match cached {
            Some(granted) => granted,
            None => {
                let granted = self.evaluate(user_id, &role, permission, context);
                self.decisions
                    .lock()
                    .insert_if_current(generation, key, role.clone(), granted, now);
                granted
            }
        };

        tracing::debug!(
            target = "fanws.permissions",
            user = %user_id,
            role = %role,
            permission = %permission,
            resource = ?context.resource_id,
            granted,
            cached = cached.is_some(),
            "permission check"
        );

        self.audit.lock().push(AuditEntry {
            timestamp: context.timestamp,
            user_id: user_id.to_string(),
            permission,
            resource_type: context.resource_type.clone(),
            resource_id: context.resource_id.clone(),
            action: context.action.clone(),
            granted,
        });

        granted
    }

    fn evaluate(
        &self,
        user_id: &str,
        role: &RoleId,
        permission: Permission,
        context: &PermissionContext,
    ) -> bool {
        let permissions = self.get_user_permissions(user_id, role.clone());
        let mut granted = permissions.contains(&permission);

        // Clone the chain so evaluators run without holding the lock.
        let evaluators = self.evaluators.read().clone();
        for evaluator in &evaluators {
            match evaluator.evaluate(context, &permissions) {
                Verdict::Grant => granted = true,
                Verdict::Deny => {
                    tracing::debug!(
                        target = "fanws.permissions",
                        evaluator = evaluator.name(),
                        user = %user_id,
                        permission = %permission,
                        "evaluator vetoed"
                    );
                    return false;
                }
                Verdict::Abstain => {}
            }
        }
        granted
    }

    /// Role permissions plus the user's custom grants. Unknown roles
    /// contribute nothing.
    pub fn get_user_permissions(
        &self,
        user_id: &str,
        role: impl Into<RoleId>,
    ) -> BTreeSet<Permission> {
        let mut permissions = self.get_role_permissions(&role.into());
        if let Some(custom) = self.custom_permissions.read().get(user_id) {
            permissions.extend(custom.iter().copied());
        }
        permissions
    }

    /// The permission set of `role`, or an empty set if it is not defined.
    pub fn get_role_permissions(&self, role: &RoleId) -> BTreeSet<Permission> {
        self.roles
            .read()
            .get(role)
            .map(|definition| definition.permissions.clone())
            .unwrap_or_default()
    }

    pub fn get_role(&self, role: &RoleId) -> Option<RoleDefinition> {
        self.roles.read().get(role).cloned()
    }

    pub fn roles(&self) -> Vec<RoleDefinition> {
        self.roles.read().values().cloned().collect()
    }

    /// The user's custom grants (empty if none).
    pub fn custom_permissions(&self, user_id: &str) -> BTreeSet<Permission> {
        self.custom_permissions
            .read()
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Grant `permission` to `user_id` on top of their role. Returns `false`
    /// if the user already had this custom grant.
    pub fn grant_custom_permission(&self, user_id: &str, permission: Permission) -> bool {
        let added = self
            .custom_permissions
            .write()
            .entry(user_id.to_string())
            .or_default()
            .insert(permission);
        self.invalidate_user(user_id);
        tracing::info!(target = "fanws.permissions", user = %user_id, permission = %permission, "granted custom permission");
        added
    }

    /// Withdraw a custom grant. Role permissions are unaffected. Returns
    /// whether the grant existed.
    pub fn revoke_custom_permission(&self, user_id: &str, permission: Permission) -> bool {
        let removed = {
            let mut custom = self.custom_permissions.write();
            match custom.get_mut(user_id) {
                Some(set) => {
                    let removed = set.remove(&permission);
                    if set.is_empty() {
                        custom.remove(user_id);
                    }
                    removed
                }
                None => false,
            }
        };
        self.invalidate_user(user_id);
        tracing::info!(target = "fanws.permissions", user = %user_id, permission = %permission, removed, "revoked custom permission");
        removed
    }

    /// Drop cached decisions for one user, e.g. after their role assignment
    /// changed in the host.
    pub fn invalidate_user(&self, user_id: &str) {
        let dropped = self.decisions.lock().invalidate_user(user_id);
        tracing::trace!(target = "fanws.permissions", user = %user_id, dropped, "invalidated cached decisions");
    }

    /// Register a non-system role. Its id is `custom_` followed by a slug of
    /// `name`.
    pub fn create_custom_role(
        &self,
        name: &str,
        description: &str,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Result<RoleId, RoleError> {
        let id = custom_role_id(name).ok_or_else(|| RoleError::InvalidRoleName(name.to_string()))?;
        let role_id = RoleId::Custom(id.clone());

        let mut roles = self.roles.write();
        if roles.contains_key(&role_id) {
            return Err(RoleError::DuplicateRole(role_id));
        }
        roles.insert(
            role_id.clone(),
            RoleDefinition::custom(id, name.trim(), description, permissions.into_iter().collect()),
        );
        drop(roles);

        tracing::info!(target = "fanws.permissions", role = %role_id, "created custom role");
        Ok(role_id)
    }

    /// Replace the permission set of a custom role. System roles are
    /// immutable. Clears every cached decision.
    pub fn update_role_permissions(
        &self,
        role: &RoleId,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Result<(), RoleError> {
        if role.is_builtin() {
            tracing::warn!(target = "fanws.permissions", role = %role, "refused to modify system role");
            return Err(RoleError::SystemRoleImmutable(role.clone()));
        }

        {
            let mut roles = self.roles.write();
            let definition = roles
                .get_mut(role)
                .ok_or_else(|| RoleError::UnknownRole(role.clone()))?;
            definition.permissions = permissions.into_iter().collect();
        }
        self.clear_cache();
        tracing::info!(target = "fanws.permissions", role = %role, "updated role permissions");
        Ok(())
    }

    /// Remove a custom role. Users still assigned to it resolve to no
    /// permissions.
    pub fn delete_custom_role(&self, role: &RoleId) -> Result<RoleDefinition, RoleError> {
        if role.is_builtin() {
            return Err(RoleError::SystemRoleImmutable(role.clone()));
        }
        let removed = self
            .roles
            .write()
            .remove(role)
            .ok_or_else(|| RoleError::UnknownRole(role.clone()))?;
        self.clear_cache();
        tracing::info!(target = "fanws.permissions", role = %role, "deleted custom role");
        Ok(removed)
    }

    /// Built-in roles and their levels.
    pub fn get_role_hierarchy(&self) -> BTreeMap<UserRole, u8> {
        UserRole::ALL
            .into_iter()
            .map(|role| (role, role.level()))
            .collect()
    }

    pub fn can_modify_user_role(
        &self,
        modifier: UserRole,
        target: UserRole,
        new_role: UserRole,
    ) -> bool {
        role::can_modify_user_role(modifier, target, new_role)
    }

    /// Every permission, grouped by category.
    pub fn get_available_permissions(&self) -> BTreeMap<PermissionCategory, Vec<Permission>> {
        let mut grouped: BTreeMap<PermissionCategory, Vec<Permission>> = BTreeMap::new();
        for permission in Permission::ALL {
            grouped
                .entry(permission.category())
                .or_default()
                .push(permission);
        }
        grouped
    }

    /// For every defined role, whether it holds each permission.
    pub fn get_role_permissions_matrix(&self) -> BTreeMap<RoleId, BTreeMap<Permission, bool>> {
        self.roles
            .read()
            .iter()
            .map(|(id, definition)| {
                let row = Permission::ALL
                    .into_iter()
                    .map(|permission| (permission, definition.permissions.contains(&permission)))
                    .collect();
                (id.clone(), row)
            })
            .collect()
    }

    /// The most recent `limit` checks, newest last.
    pub fn get_audit_log(&self, limit: usize) -> Vec<AuditEntry> {
        self.audit.lock().recent(limit)
    }

    pub fn clear_cache(&self) {
        self.decisions.lock().clear();
    }

    /// Number of decisions currently cached (including expired ones not yet
    /// swept).
    pub fn cache_len(&self) -> usize {
        self.decisions.lock().len()
    }
}

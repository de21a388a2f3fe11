use crate::manager::PermissionManager;
use crate::permission::Permission;
use crate::role::{RoleDefinition, RoleId};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;

/// Version written by [`PermissionManager::export_permissions_config`].
pub const CONFIG_VERSION: u64 = 1;

/// What [`PermissionManager::import_permissions_config`] applied and skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub roles_imported: usize,
    pub grants_imported: usize,
    /// One human-readable line per skipped entry.
    pub skipped: Vec<String>,
}

impl ImportReport {
    fn skip(&mut self, reason: String) {
        tracing::warn!(target = "fanws.permissions", reason = %reason, "skipped permissions config entry");
        self.skipped.push(reason);
    }
}

impl PermissionManager {
    /// Snapshot of role definitions and custom grants as JSON:
    ///
    /// ```json
    /// {"version": 1,
    ///  "roles": {"editor": {"name": "...", "description": "...",
    ///                       "permissions": ["read_document"], "is_system_role": true}},
    ///  "custom_permissions": {"alice": ["export_data"]}}
    /// ```
    pub fn export_permissions_config(&self) -> Value {
        let roles: Map<String, Value> = self
            .roles
            .read()
            .iter()
            .map(|(id, definition)| {
                (
                    id.to_string(),
                    json!({
                        "name": definition.name,
                        "description": definition.description,
                        "permissions": definition.permissions,
                        "is_system_role": definition.is_system_role,
                    }),
                )
            })
            .collect();

        let mut users: Vec<(String, BTreeSet<Permission>)> = self
            .custom_permissions
            .read()
            .iter()
            .map(|(user, set)| (user.clone(), set.clone()))
            .collect();
        users.sort_by(|a, b| a.0.cmp(&b.0));
        let custom: Map<String, Value> = users
            .into_iter()
            .map(|(user, set)| (user, json!(set)))
            .collect();

        json!({
            "version": CONFIG_VERSION,
            "roles": roles,
            "custom_permissions": custom,
        })
    }

    /// Apply a config produced by [`Self::export_permissions_config`].
    ///
    /// Custom roles are created or replaced; custom grants are added to what
    /// users already hold. System roles, unknown permissions and malformed
    /// entries are skipped with a warning. Cached decisions are dropped.
    pub fn import_permissions_config(&self, config: &Value) -> ImportReport {
        let mut report = ImportReport::default();

        let Some(config) = config.as_object() else {
            report.skip("config is not a JSON object".to_string());
            return report;
        };

        match config.get("version").and_then(Value::as_u64) {
            Some(CONFIG_VERSION) | None => {}
            Some(other) => tracing::warn!(
                target = "fanws.permissions",
                version = other,
                "importing permissions config with unexpected version"
            ),
        }

        if let Some(roles) = section(config, "roles", &mut report) {
            for (id, value) in roles {
                if let Some(definition) = parse_role(id, value, &mut report) {
                    self.roles.write().insert(definition.id.clone(), definition);
                    report.roles_imported += 1;
                }
            }
        }

        if let Some(users) = section(config, "custom_permissions", &mut report) {
            for (user, value) in users {
                let Some(list) = value.as_array() else {
                    report.skip(format!("custom permissions for `{user}` are not a list"));
                    continue;
                };
                let permissions = parse_permissions(list, &format!("user `{user}`"), &mut report);
                if permissions.is_empty() {
                    continue;
                }
                let mut custom = self.custom_permissions.write();
                let held = custom.entry(user.clone()).or_default();
                for permission in permissions {
                    if held.insert(permission) {
                        report.grants_imported += 1;
                    }
                }
            }
        }

        self.clear_cache();
        tracing::info!(
            target = "fanws.permissions",
            roles = report.roles_imported,
            grants = report.grants_imported,
            skipped = report.skipped.len(),
            "imported permissions config"
        );
        report
    }
}

fn section<'a>(
    config: &'a Map<String, Value>,
    name: &str,
    report: &mut ImportReport,
) -> Option<&'a Map<String, Value>> {
    let value = config.get(name)?;
    let section = value.as_object();
    if section.is_none() {
        report.skip(format!("`{name}` is not an object"));
    }
    section
}

fn parse_role(id: &str, value: &Value, report: &mut ImportReport) -> Option<RoleDefinition> {
    match RoleId::from(id) {
        RoleId::Builtin(_) => {
            // System roles are fixed; exported copies are informational.
            tracing::debug!(target = "fanws.permissions", role = %id, "ignoring system role on import");
            return None;
        }
        RoleId::Custom(name) if !name.starts_with(RoleId::CUSTOM_PREFIX) => {
            report.skip(format!("role `{name}` is not a custom role id"));
            return None;
        }
        RoleId::Custom(_) => {}
    }

    let Some(fields) = value.as_object() else {
        report.skip(format!("role `{id}` is not an object"));
        return None;
    };
    let Some(list) = fields.get("permissions").and_then(Value::as_array) else {
        report.skip(format!("role `{id}` has no permission list"));
        return None;
    };

    let permissions = parse_permissions(list, &format!("role `{id}`"), report);
    let name = fields.get("name").and_then(Value::as_str).unwrap_or(id);
    let description = fields
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default();
    Some(RoleDefinition::custom(id.to_string(), name, description, permissions))
}

fn parse_permissions(list: &[Value], owner: &str, report: &mut ImportReport) -> BTreeSet<Permission> {
    let mut permissions = BTreeSet::new();
    for value in list {
        match value.as_str().map(str::parse::<Permission>) {
            Some(Ok(permission)) => {
                permissions.insert(permission);
            }
            Some(Err(err)) => report.skip(format!("{owner}: {err}")),
            None => report.skip(format!("{owner}: permission {value} is not a string")),
        }
    }
    permissions
}

use crate::permission::Permission;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Built-in roles, ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Guest,
    Viewer,
    Commenter,
    Reviewer,
    Editor,
    Admin,
    Owner,
}

impl UserRole {
    pub const ALL: [UserRole; 7] = [
        UserRole::Guest,
        UserRole::Viewer,
        UserRole::Commenter,
        UserRole::Reviewer,
        UserRole::Editor,
        UserRole::Admin,
        UserRole::Owner,
    ];

    /// Hierarchy level; strictly increases with privilege.
    pub fn level(self) -> u8 {
        match self {
            UserRole::Guest => 1,
            UserRole::Viewer => 2,
            UserRole::Commenter => 3,
            UserRole::Reviewer => 4,
            UserRole::Editor => 5,
            UserRole::Admin => 6,
            UserRole::Owner => 7,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Guest => "guest",
            UserRole::Viewer => "viewer",
            UserRole::Commenter => "commenter",
            UserRole::Reviewer => "reviewer",
            UserRole::Editor => "editor",
            UserRole::Admin => "admin",
            UserRole::Owner => "owner",
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            UserRole::Guest => "Guest",
            UserRole::Viewer => "Viewer",
            UserRole::Commenter => "Commenter",
            UserRole::Reviewer => "Reviewer",
            UserRole::Editor => "Editor",
            UserRole::Admin => "Administrator",
            UserRole::Owner => "Owner",
        }
    }

    fn description(self) -> &'static str {
        match self {
            UserRole::Guest => "Limited read-only access",
            UserRole::Viewer => "Read access to documents and history",
            UserRole::Commenter => "Can read and comment",
            UserRole::Reviewer => "Can comment and view analytics",
            UserRole::Editor => "Can create and edit content",
            UserRole::Admin => "Manages collaborators and project settings",
            UserRole::Owner => "Full control over the project",
        }
    }

    /// The fixed permission set of this role. Each role includes everything
    /// the role below it holds.
    pub fn permissions(self) -> BTreeSet<Permission> {
        use Permission::*;
        let added: &[Permission] = match self {
            UserRole::Guest => &[ReadDocument, ViewProject],
            UserRole::Viewer => &[ViewCollaborators, ViewHistory],
            UserRole::Commenter => &[CommentDocument],
            UserRole::Reviewer => &[ViewAnalytics],
            UserRole::Editor => &[
                EditDocument,
                CreateDocument,
                CreateVersion,
                ExportData,
                MergeChanges,
            ],
            UserRole::Admin => &[
                DeleteDocument,
                EditProject,
                ManageProjectSettings,
                InviteUsers,
                RemoveUsers,
                ManagePermissions,
                RestoreVersion,
                ManageUsers,
                ImportData,
                BackupData,
                ExportAnalytics,
            ],
            UserRole::Owner => return Permission::ALL.into_iter().collect(),
        };

        let mut permissions = match self.below() {
            Some(lower) => lower.permissions(),
            None => BTreeSet::new(),
        };
        permissions.extend(added.iter().copied());
        permissions
    }

    fn below(self) -> Option<UserRole> {
        let index = UserRole::ALL.iter().position(|role| *role == self)?;
        index.checked_sub(1).map(|lower| UserRole::ALL[lower])
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserRole::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

/// `modifier` may change `target`'s role to `new_role` only when its level
/// strictly exceeds both the current and the proposed level.
pub fn can_modify_user_role(modifier: UserRole, target: UserRole, new_role: UserRole) -> bool {
    modifier.level() > target.level() && modifier.level() > new_role.level()
}

/// Identifier of a role definition: a built-in role or a custom one.
///
/// Serialized as a plain string. Custom ids always carry the `custom_` prefix,
/// so they never collide with built-in names.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum RoleId {
    Builtin(UserRole),
    Custom(String),
}

impl RoleId {
    pub const CUSTOM_PREFIX: &'static str = "custom_";

    pub fn as_builtin(&self) -> Option<UserRole> {
        match self {
            RoleId::Builtin(role) => Some(*role),
            RoleId::Custom(_) => None,
        }
    }

    pub fn is_builtin(&self) -> bool {
        self.as_builtin().is_some()
    }
}

impl From<UserRole> for RoleId {
    fn from(role: UserRole) -> Self {
        RoleId::Builtin(role)
    }
}

impl From<String> for RoleId {
    fn from(value: String) -> Self {
        match value.parse::<UserRole>() {
            Ok(role) => RoleId::Builtin(role),
            Err(()) => RoleId::Custom(value),
        }
    }
}

impl From<&str> for RoleId {
    fn from(value: &str) -> Self {
        RoleId::from(value.to_string())
    }
}

impl From<RoleId> for String {
    fn from(id: RoleId) -> Self {
        match id {
            RoleId::Builtin(role) => role.as_str().to_string(),
            RoleId::Custom(name) => name,
        }
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleId::Builtin(role) => f.write_str(role.as_str()),
            RoleId::Custom(name) => f.write_str(name),
        }
    }
}

/// A role and the permissions it carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
    pub id: RoleId,
    pub name: String,
    pub description: String,
    pub permissions: BTreeSet<Permission>,
    pub is_system_role: bool,
}

impl RoleDefinition {
    pub(crate) fn system(role: UserRole) -> Self {
        Self {
            id: RoleId::Builtin(role),
            name: role.display_name().to_string(),
            description: role.description().to_string(),
            permissions: role.permissions(),
            is_system_role: true,
        }
    }

    pub(crate) fn custom(
        id: String,
        name: impl Into<String>,
        description: impl Into<String>,
        permissions: BTreeSet<Permission>,
    ) -> Self {
        Self {
            id: RoleId::Custom(id),
            name: name.into(),
            description: description.into(),
            permissions,
            is_system_role: false,
        }
    }
}

/// `custom_<slug>` for a display name, or `None` if nothing usable remains.
pub(crate) fn custom_role_id(name: &str) -> Option<String> {
    let mut slug = String::with_capacity(name.len());
    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    (!slug.is_empty()).then(|| format!("{}{slug}", RoleId::CUSTOM_PREFIX))
}

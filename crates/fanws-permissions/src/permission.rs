use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Grouping used by UIs to lay out the permission list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionCategory {
    Document,
    Project,
    Collaboration,
    VersionControl,
    Administration,
    DataManagement,
    Analytics,
}

impl PermissionCategory {
    pub const ALL: [PermissionCategory; 7] = [
        PermissionCategory::Document,
        PermissionCategory::Project,
        PermissionCategory::Collaboration,
        PermissionCategory::VersionControl,
        PermissionCategory::Administration,
        PermissionCategory::DataManagement,
        PermissionCategory::Analytics,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PermissionCategory::Document => "document",
            PermissionCategory::Project => "project",
            PermissionCategory::Collaboration => "collaboration",
            PermissionCategory::VersionControl => "version_control",
            PermissionCategory::Administration => "administration",
            PermissionCategory::DataManagement => "data_management",
            PermissionCategory::Analytics => "analytics",
        }
    }
}

impl fmt::Display for PermissionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single capability a user may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    // Document
    ReadDocument,
    EditDocument,
    CreateDocument,
    DeleteDocument,
    CommentDocument,
    // Project
    ViewProject,
    EditProject,
    DeleteProject,
    ManageProjectSettings,
    // Collaboration
    InviteUsers,
    RemoveUsers,
    ManagePermissions,
    ViewCollaborators,
    // Version control
    ViewHistory,
    CreateVersion,
    RestoreVersion,
    MergeChanges,
    // Administration
    ManageUsers,
    SystemSettings,
    // Data management
    ExportData,
    ImportData,
    BackupData,
    // Analytics
    ViewAnalytics,
    ExportAnalytics,
}

impl Permission {
    pub const ALL: [Permission; 24] = [
        Permission::ReadDocument,
        Permission::EditDocument,
        Permission::CreateDocument,
        Permission::DeleteDocument,
        Permission::CommentDocument,
        Permission::ViewProject,
        Permission::EditProject,
        Permission::DeleteProject,
        Permission::ManageProjectSettings,
        Permission::InviteUsers,
        Permission::RemoveUsers,
        Permission::ManagePermissions,
        Permission::ViewCollaborators,
        Permission::ViewHistory,
        Permission::CreateVersion,
        Permission::RestoreVersion,
        Permission::MergeChanges,
        Permission::ManageUsers,
        Permission::SystemSettings,
        Permission::ExportData,
        Permission::ImportData,
        Permission::BackupData,
        Permission::ViewAnalytics,
        Permission::ExportAnalytics,
    ];

    pub fn category(self) -> PermissionCategory {
        use Permission::*;
        match self {
            ReadDocument | EditDocument | CreateDocument | DeleteDocument | CommentDocument => {
                PermissionCategory::Document
            }
            ViewProject | EditProject | DeleteProject | ManageProjectSettings => {
                PermissionCategory::Project
            }
            InviteUsers | RemoveUsers | ManagePermissions | ViewCollaborators => {
                PermissionCategory::Collaboration
            }
            ViewHistory | CreateVersion | RestoreVersion | MergeChanges => {
                PermissionCategory::VersionControl
            }
            ManageUsers | SystemSettings => PermissionCategory::Administration,
            ExportData | ImportData | BackupData => PermissionCategory::DataManagement,
            ViewAnalytics | ExportAnalytics => PermissionCategory::Analytics,
        }
    }

    /// Stable wire name, identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        use Permission::*;
        match self {
            ReadDocument => "read_document",
            EditDocument => "edit_document",
            CreateDocument => "create_document",
            DeleteDocument => "delete_document",
            CommentDocument => "comment_document",
            ViewProject => "view_project",
            EditProject => "edit_project",
            DeleteProject => "delete_project",
            ManageProjectSettings => "manage_project_settings",
            InviteUsers => "invite_users",
            RemoveUsers => "remove_users",
            ManagePermissions => "manage_permissions",
            ViewCollaborators => "view_collaborators",
            ViewHistory => "view_history",
            CreateVersion => "create_version",
            RestoreVersion => "restore_version",
            MergeChanges => "merge_changes",
            ManageUsers => "manage_users",
            SystemSettings => "system_settings",
            ExportData => "export_data",
            ImportData => "import_data",
            BackupData => "backup_data",
            ViewAnalytics => "view_analytics",
            ExportAnalytics => "export_analytics",
        }
    }

    pub fn description(self) -> &'static str {
        use Permission::*;
        match self {
            ReadDocument => "Read document contents",
            EditDocument => "Edit document contents",
            CreateDocument => "Create new documents",
            DeleteDocument => "Delete documents",
            CommentDocument => "Comment on documents",
            ViewProject => "Open and browse the project",
            EditProject => "Edit project metadata",
            DeleteProject => "Delete the project",
            ManageProjectSettings => "Change project settings",
            InviteUsers => "Invite collaborators",
            RemoveUsers => "Remove collaborators",
            ManagePermissions => "Change collaborator permissions",
            ViewCollaborators => "See who collaborates on the project",
            ViewHistory => "Browse version history",
            CreateVersion => "Create versions",
            RestoreVersion => "Restore earlier versions",
            MergeChanges => "Merge concurrent changes",
            ManageUsers => "Manage user accounts",
            SystemSettings => "Change system-wide settings",
            ExportData => "Export project data",
            ImportData => "Import project data",
            BackupData => "Create backups",
            ViewAnalytics => "View writing analytics",
            ExportAnalytics => "Export writing analytics",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown permission `{0}`")]
pub struct ParsePermissionError(pub String);

impl FromStr for Permission {
    type Err = ParsePermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|permission| permission.as_str() == s)
            .ok_or_else(|| ParsePermissionError(s.to_string()))
    }
}

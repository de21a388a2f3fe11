use fanws_permissions::{
    Permission, PermissionContext, PermissionEvaluator, PermissionManager, UserRole, Verdict,
};
use std::collections::BTreeSet;
use std::sync::Arc;

#[test]
fn resource_lock_vetoes_role_permission() {
    let manager = PermissionManager::new().with_default_evaluators();
    let locked = PermissionContext::new("alice", "document", "edit_document")
        .with_resource_id("chapter-7")
        .with_metadata("locked_by", "bob");

    assert!(UserRole::Editor.permissions().contains(&Permission::EditDocument));
    assert!(!manager.check_permission("alice", UserRole::Editor, Permission::EditDocument, &locked));

    // The lock holder is unaffected.
    let own_lock = PermissionContext::new("bob", "document", "edit_document")
        .with_resource_id("chapter-7")
        .with_metadata("locked_by", "bob");
    assert!(manager.check_permission("bob", UserRole::Editor, Permission::EditDocument, &own_lock));
}

#[test]
fn veto_wins_over_earlier_grant() {
    let manager = PermissionManager::new().with_default_evaluators();
    // Owner of the resource, but someone else holds the lock.
    let ctx = PermissionContext::new("alice", "document", "delete_document")
        .with_metadata("owner_id", "alice")
        .with_metadata("locked_by", "bob");
    assert!(!manager.check_permission("alice", UserRole::Viewer, Permission::DeleteDocument, &ctx));
}

#[test]
fn ownership_grants_beyond_role() {
    let manager = PermissionManager::new().with_default_evaluators();
    let ctx = PermissionContext::new("alice", "document", "edit_document")
        .with_resource_id("notes")
        .with_metadata("owner_id", "alice");
    assert!(manager.check_permission("alice", UserRole::Viewer, Permission::EditDocument, &ctx));
}

#[test]
fn time_window_denies_outside_bounds() {
    let manager = PermissionManager::new().with_default_evaluators();
    let window = |resource: &str, at: u64| {
        PermissionContext::new("alice", "document", "read_document")
            .with_resource_id(resource)
            .with_metadata("start_time", 1_000u64)
            .with_metadata("end_time", 2_000u64)
            .at(at)
    };
    assert!(manager.check_permission("alice", UserRole::Editor, Permission::ReadDocument, &window("a", 1_500)));
    assert!(!manager.check_permission("alice", UserRole::Editor, Permission::ReadDocument, &window("b", 2_500)));
}

struct FrozenProjects(BTreeSet<String>);

impl PermissionEvaluator for FrozenProjects {
    fn evaluate(&self, context: &PermissionContext, _: &BTreeSet<Permission>) -> Verdict {
        match &context.resource_id {
            Some(id) if self.0.contains(id) && context.action != "read" => Verdict::Deny,
            _ => Verdict::Abstain,
        }
    }
}

#[test]
fn new_evaluators_plug_in_without_core_changes() {
    let manager = PermissionManager::new();
    let ctx = PermissionContext::new("alice", "project", "edit").with_resource_id("archived");
    assert!(manager.check_permission("alice", UserRole::Owner, Permission::EditProject, &ctx));

    manager.add_evaluator(Arc::new(FrozenProjects(["archived".to_string()].into())));
    assert!(!manager.check_permission("alice", UserRole::Owner, Permission::EditProject, &ctx));

    manager.add_evaluator(Arc::new(|_: &PermissionContext, _: &BTreeSet<Permission>| Verdict::Grant));
    // Earlier veto still short-circuits.
    assert!(!manager.check_permission("alice", UserRole::Owner, Permission::EditProject, &ctx));
}

use fanws_permissions::{Permission, PermissionContext, PermissionManager, RoleId, UserRole};

fn ctx(user: &str) -> PermissionContext {
    PermissionContext::new(user, "project", "delete_project").with_resource_id("novel-1")
}

#[test]
fn owner_may_delete_project_and_viewer_may_not() {
    let manager = PermissionManager::with_settings(Default::default()).with_default_evaluators();

    assert!(manager.check_permission("u1", UserRole::Owner, Permission::DeleteProject, &ctx("u1")));
    assert!(!manager.check_permission("u2", UserRole::Viewer, Permission::DeleteProject, &ctx("u2")));

    let log = manager.get_audit_log(10);
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].user_id, "u1");
    assert!(log[0].granted);
    assert_eq!(log[1].user_id, "u2");
    assert!(!log[1].granted);
    assert_eq!(log[1].permission, Permission::DeleteProject);
    assert_eq!(log[1].resource_id.as_deref(), Some("novel-1"));
}

#[test]
fn repeated_checks_are_stable_and_cached() {
    let manager = PermissionManager::new();
    let first = manager.check_permission("u", UserRole::Commenter, Permission::EditDocument, &ctx("u"));
    for _ in 0..5 {
        assert_eq!(
            manager.check_permission("u", UserRole::Commenter, Permission::EditDocument, &ctx("u")),
            first
        );
    }
    assert_eq!(manager.cache_len(), 1);
    // Cache hits are audited too.
    assert_eq!(manager.get_audit_log(100).len(), 6);
}

#[test]
fn grant_and_revoke_take_effect_immediately() {
    let manager = PermissionManager::new();
    let check = || manager.check_permission("u", UserRole::Viewer, Permission::EditDocument, &ctx("u"));

    assert!(!check());
    manager.grant_custom_permission("u", Permission::EditDocument);
    assert!(check());
    manager.revoke_custom_permission("u", Permission::EditDocument);
    assert!(!check());
}

#[test]
fn invalidation_only_touches_the_affected_user() {
    let manager = PermissionManager::new();
    for user in ["a", "b"] {
        manager.check_permission(user, UserRole::Editor, Permission::ReadDocument, &ctx(user));
    }
    assert_eq!(manager.cache_len(), 2);

    manager.grant_custom_permission("a", Permission::BackupData);
    assert_eq!(manager.cache_len(), 1);
}

#[test]
fn custom_role_edits_clear_all_decisions() {
    let manager = PermissionManager::new();
    let role = manager
        .create_custom_role("Beta Reader", "Reads drafts", [Permission::ReadDocument])
        .unwrap();
    manager.check_permission("a", role.clone(), Permission::CommentDocument, &ctx("a"));
    manager.check_permission("b", UserRole::Editor, Permission::ReadDocument, &ctx("b"));
    assert_eq!(manager.cache_len(), 2);

    manager
        .update_role_permissions(&role, [Permission::ReadDocument, Permission::CommentDocument])
        .unwrap();
    assert_eq!(manager.cache_len(), 0);
    assert!(manager.check_permission("a", role, Permission::CommentDocument, &ctx("a")));
}

#[test]
fn audit_log_is_bounded() {
    let manager = PermissionManager::new();
    for i in 0..1_050 {
        let user = format!("user-{i}");
        manager.check_permission(&user, UserRole::Guest, Permission::ReadDocument, &ctx(&user));
    }
    let log = manager.get_audit_log(usize::MAX);
    assert_eq!(log.len(), 1_000);
    assert_eq!(log.first().unwrap().user_id, "user-50");
    assert_eq!(log.last().unwrap().user_id, "user-1049");

    let recent = manager.get_audit_log(3);
    let users: Vec<&str> = recent.iter().map(|e| e.user_id.as_str()).collect();
    assert_eq!(users, vec!["user-1047", "user-1048", "user-1049"]);
}

#[test]
fn export_import_carries_custom_state_to_a_new_manager() {
    let source = PermissionManager::new();
    let role = source
        .create_custom_role("Story Lead", "", [Permission::ReadDocument, Permission::MergeChanges])
        .unwrap();
    source.grant_custom_permission("alice", Permission::ExportAnalytics);

    let target = PermissionManager::new();
    let report = target.import_permissions_config(&source.export_permissions_config());
    assert_eq!(report.roles_imported, 1);
    assert_eq!(report.grants_imported, 1);
    assert!(report.skipped.is_empty());

    assert_eq!(target.get_role(&role), source.get_role(&role));
    assert_eq!(
        target.get_user_permissions("alice", RoleId::from(UserRole::Guest)),
        source.get_user_permissions("alice", RoleId::from(UserRole::Guest))
    );
}

#[test]
fn cached_decision_ignores_new_metadata_until_invalidated() {
    let manager = PermissionManager::new().with_default_evaluators();
    let open = PermissionContext::new("alice", "document", "edit_document").with_resource_id("ch-1");
    let locked = open.clone().with_metadata("locked_by", "bob");

    assert!(manager.check_permission("alice", UserRole::Editor, Permission::EditDocument, &open));
    assert!(manager.check_permission("alice", UserRole::Editor, Permission::EditDocument, &locked));

    manager.invalidate_user("alice");
    assert!(!manager.check_permission("alice", UserRole::Editor, Permission::EditDocument, &locked));
}

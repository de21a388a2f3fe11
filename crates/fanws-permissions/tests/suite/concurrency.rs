use fanws_permissions::{Permission, PermissionContext, PermissionManager, UserRole};
use std::sync::Arc;
use std::thread;

#[test]
fn concurrent_checks_are_all_audited() {
    let manager = Arc::new(PermissionManager::new().with_default_evaluators());

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let manager = manager.clone();
            thread::spawn(move || {
                let user = format!("user-{t}");
                for i in 0..50 {
                    let ctx = PermissionContext::new(&user, "document", "read_document")
                        .with_resource_id(format!("doc-{}", i % 5));
                    assert!(manager.check_permission(&user, UserRole::Viewer, Permission::ReadDocument, &ctx));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(manager.get_audit_log(usize::MAX).len(), 400);
    assert_eq!(manager.cache_len(), 8 * 5);
}

#[test]
fn grant_is_never_lost_to_a_racing_check() {
    let manager = Arc::new(PermissionManager::new());
    let ctx = PermissionContext::new("u", "document", "export").with_resource_id("draft");

    let checker = {
        let manager = manager.clone();
        let ctx = ctx.clone();
        thread::spawn(move || {
            for _ in 0..500 {
                manager.check_permission("u", UserRole::Guest, Permission::ExportData, &ctx);
            }
        })
    };
    manager.grant_custom_permission("u", Permission::ExportData);
    checker.join().unwrap();

    assert!(manager.check_permission("u", UserRole::Guest, Permission::ExportData, &ctx));
}

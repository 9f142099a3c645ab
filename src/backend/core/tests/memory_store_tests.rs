//! Integration tests for the RBAC store over the in-memory backend.
//!
//! These exercise the public store API end to end; the PostgreSQL backend is
//! covered by the same scenarios in `postgres_tests.rs`.

use futures::future::join_all;
use pgrbac_core::error::ErrorCode;
use pgrbac_core::rbac::StoreStats;
use pgrbac_core::{rbac_names, Rbac};

// ============================================================================
// Test Utilities
// ============================================================================

const CREATE: &str = "service.component.create";
const DELETE: &str = "service.component.delete";
const ADMIN: &str = "roles/service.componentAdmin";
const USER: &str = "user:example@example.com";

fn store() -> Rbac {
    Rbac::in_memory()
}

// ============================================================================
// Permission -> Role
// ============================================================================

#[tokio::test]
async fn test_assign_permission_then_role_has_it() {
    let rbac = store();
    rbac.assign_permission_to_role(CREATE, ADMIN).await.unwrap();

    assert!(rbac.role_has_permission(ADMIN, CREATE).await.unwrap());
    assert!(!rbac.role_has_permission(ADMIN, DELETE).await.unwrap());
}

#[tokio::test]
async fn test_assign_permission_is_idempotent() {
    let rbac = store();
    rbac.assign_permission_to_role(CREATE, ADMIN).await.unwrap();
    let once = rbac.stats().await.unwrap();

    rbac.assign_permission_to_role(CREATE, ADMIN).await.unwrap();
    let twice = rbac.stats().await.unwrap();

    assert_eq!(once, twice);
    assert_eq!(
        twice,
        StoreStats {
            roles: 1,
            permissions: 1,
            subjects: 0,
            role_permissions: 1,
            subject_roles: 0,
        }
    );
    assert!(rbac.role_has_permission(ADMIN, CREATE).await.unwrap());
}

#[tokio::test]
async fn test_remove_permission_from_role() {
    let rbac = store();
    rbac.assign_permission_to_role(CREATE, ADMIN).await.unwrap();
    rbac.remove_permission_from_role(CREATE, ADMIN).await.unwrap();

    assert!(!rbac.role_has_permission(ADMIN, CREATE).await.unwrap());

    // The entities survive the unlink.
    let stats = rbac.stats().await.unwrap();
    assert_eq!(stats.roles, 1);
    assert_eq!(stats.permissions, 1);
    assert_eq!(stats.role_permissions, 0);
}

#[tokio::test]
async fn test_remove_permission_never_assigned_is_noop() {
    let rbac = store();

    // Neither name exists.
    rbac.remove_permission_from_role(CREATE, ADMIN).await.unwrap();

    // Both exist but are not linked.
    rbac.assign_permission_to_role(DELETE, ADMIN).await.unwrap();
    rbac.assign_permission_to_role(CREATE, "roles/other").await.unwrap();
    rbac.remove_permission_from_role(CREATE, ADMIN).await.unwrap();

    assert!(rbac.role_has_permission(ADMIN, DELETE).await.unwrap());
    assert!(rbac.role_has_permission("roles/other", CREATE).await.unwrap());
    assert_eq!(rbac.stats().await.unwrap().role_permissions, 2);
}

// ============================================================================
// Role -> Subject
// ============================================================================

#[tokio::test]
async fn test_assign_and_remove_role() {
    let rbac = store();
    rbac.assign_role_to_subject(ADMIN, USER).await.unwrap();
    assert!(rbac.subject_has_role(USER, ADMIN).await.unwrap());

    rbac.remove_role_from_subject(ADMIN, USER).await.unwrap();
    assert!(!rbac.subject_has_role(USER, ADMIN).await.unwrap());

    // Removing again, or for unknown names, does nothing.
    rbac.remove_role_from_subject(ADMIN, USER).await.unwrap();
    rbac.remove_role_from_subject("roles/ghost", "user:ghost").await.unwrap();
}

#[tokio::test]
async fn test_assign_role_is_idempotent() {
    let rbac = store();
    rbac.assign_role_to_subject(ADMIN, USER).await.unwrap();
    rbac.assign_role_to_subject(ADMIN, USER).await.unwrap();

    let stats = rbac.stats().await.unwrap();
    assert_eq!(stats.roles, 1);
    assert_eq!(stats.subjects, 1);
    assert_eq!(stats.subject_roles, 1);
}

// ============================================================================
// Subject -> Permission
// ============================================================================

#[tokio::test]
async fn test_component_admin_scenario() {
    let rbac = store();
    rbac.assign_permission_to_role(CREATE, ADMIN).await.unwrap();
    rbac.assign_role_to_subject(ADMIN, USER).await.unwrap();

    assert!(rbac.subject_has_permission(USER, CREATE).await.unwrap());
    assert!(!rbac.subject_has_permission(USER, DELETE).await.unwrap());
}

#[tokio::test]
async fn test_subject_has_permission_unregistered() {
    let rbac = store();
    rbac.assign_permission_to_role(CREATE, ADMIN).await.unwrap();
    rbac.assign_role_to_subject(ADMIN, USER).await.unwrap();

    assert!(!rbac.subject_has_permission("user:nobody@example.com", CREATE).await.unwrap());
    assert!(!rbac.subject_has_permission(USER, "service.unknown").await.unwrap());
    assert!(!store().subject_has_permission(USER, CREATE).await.unwrap());
}

#[tokio::test]
async fn test_subject_has_permission_no_cross_talk() {
    let rbac = store();
    rbac.assign_permission_to_role(CREATE, ADMIN).await.unwrap();
    rbac.assign_permission_to_role(DELETE, "roles/service.componentDeleter").await.unwrap();
    rbac.assign_role_to_subject(ADMIN, USER).await.unwrap();
    rbac.assign_role_to_subject("roles/service.componentDeleter", "user:other@example.com")
        .await
        .unwrap();

    assert!(!rbac.subject_has_permission(USER, DELETE).await.unwrap());
    assert!(!rbac.subject_has_permission("user:other@example.com", CREATE).await.unwrap());
}

#[tokio::test]
async fn test_revoking_either_link_revokes_permission() {
    let rbac = store();
    rbac.assign_permission_to_role(CREATE, ADMIN).await.unwrap();
    rbac.assign_role_to_subject(ADMIN, USER).await.unwrap();

    rbac.remove_permission_from_role(CREATE, ADMIN).await.unwrap();
    assert!(!rbac.subject_has_permission(USER, CREATE).await.unwrap());

    rbac.assign_permission_to_role(CREATE, ADMIN).await.unwrap();
    assert!(rbac.subject_has_permission(USER, CREATE).await.unwrap());

    rbac.remove_role_from_subject(ADMIN, USER).await.unwrap();
    assert!(!rbac.subject_has_permission(USER, CREATE).await.unwrap());
}

#[tokio::test]
async fn test_permission_through_any_role() {
    let rbac = store();
    rbac.assign_permission_to_role(CREATE, "roles/a").await.unwrap();
    rbac.assign_permission_to_role(CREATE, "roles/b").await.unwrap();
    rbac.assign_role_to_subject("roles/a", USER).await.unwrap();
    rbac.assign_role_to_subject("roles/b", USER).await.unwrap();

    rbac.remove_role_from_subject("roles/a", USER).await.unwrap();
    assert!(rbac.subject_has_permission(USER, CREATE).await.unwrap());
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_identical_assignments() {
    let rbac = store();

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let rbac = rbac.clone();
            tokio::spawn(async move { rbac.assign_permission_to_role(CREATE, ADMIN).await })
        })
        .collect();

    for result in join_all(handles).await {
        result.unwrap().unwrap();
    }

    let stats = rbac.stats().await.unwrap();
    assert_eq!(stats.permissions, 1);
    assert_eq!(stats.roles, 1);
    assert_eq!(stats.role_permissions, 1);
}

// ============================================================================
// Administration
// ============================================================================

#[tokio::test]
async fn test_delete_permission_cascades() {
    let rbac = store();
    rbac.assign_permission_to_role(CREATE, ADMIN).await.unwrap();
    rbac.assign_role_to_subject(ADMIN, USER).await.unwrap();

    assert!(rbac.delete_permission(CREATE).await.unwrap());
    assert!(!rbac.delete_permission(CREATE).await.unwrap());

    assert!(!rbac.role_has_permission(ADMIN, CREATE).await.unwrap());
    assert!(!rbac.subject_has_permission(USER, CREATE).await.unwrap());
    assert!(rbac.subject_has_role(USER, ADMIN).await.unwrap());
    assert_eq!(rbac.stats().await.unwrap().role_permissions, 0);
}

#[tokio::test]
async fn test_delete_subject_cascades() {
    let rbac = store();
    rbac.assign_role_to_subject(ADMIN, USER).await.unwrap();

    assert!(rbac.delete_subject(USER).await.unwrap());
    assert!(!rbac.subject_has_role(USER, ADMIN).await.unwrap());

    let stats = rbac.stats().await.unwrap();
    assert_eq!(stats.subjects, 0);
    assert_eq!(stats.subject_roles, 0);
    assert_eq!(stats.roles, 1);
}

#[tokio::test]
async fn test_recreated_role_starts_empty() {
    let rbac = store();
    rbac.assign_permission_to_role(CREATE, ADMIN).await.unwrap();
    rbac.assign_role_to_subject(ADMIN, USER).await.unwrap();
    assert!(rbac.delete_role(ADMIN).await.unwrap());

    rbac.assign_role_to_subject(ADMIN, USER).await.unwrap();
    assert!(rbac.subject_has_role(USER, ADMIN).await.unwrap());
    assert!(!rbac.subject_has_permission(USER, CREATE).await.unwrap());
}

#[tokio::test]
async fn test_listings_are_sorted() {
    let rbac = store();
    rbac.assign_permission_to_role("b.read", "roles/reader").await.unwrap();
    rbac.assign_permission_to_role("a.read", "roles/reader").await.unwrap();
    rbac.assign_permission_to_role("a.read", "roles/writer").await.unwrap();
    rbac.assign_permission_to_role("c.write", "roles/writer").await.unwrap();
    rbac.assign_role_to_subject("roles/writer", USER).await.unwrap();
    rbac.assign_role_to_subject("roles/reader", USER).await.unwrap();

    assert_eq!(rbac.role_permissions("roles/reader").await.unwrap(), vec!["a.read", "b.read"]);
    assert_eq!(rbac.subject_roles(USER).await.unwrap(), vec!["roles/reader", "roles/writer"]);
    assert_eq!(
        rbac.subject_permissions(USER).await.unwrap(),
        vec!["a.read", "b.read", "c.write"]
    );

    assert!(rbac.role_permissions("roles/ghost").await.unwrap().is_empty());
    assert!(rbac.subject_roles("user:ghost").await.unwrap().is_empty());
    assert!(rbac.subject_permissions("user:ghost").await.unwrap().is_empty());
}

// ============================================================================
// Closed name sets
// ============================================================================

rbac_names! {
    pub enum ComponentPermission {
        Create => "service.component.create",
        Delete => "service.component.delete",
    }
}

rbac_names! {
    pub enum ComponentRole {
        Admin => "roles/service.componentAdmin",
    }
}

#[tokio::test]
async fn test_closed_name_sets() {
    let rbac: Rbac<ComponentPermission, ComponentRole, str> = Rbac::in_memory();

    rbac.assign_permission_to_role(&ComponentPermission::Create, &ComponentRole::Admin)
        .await
        .unwrap();
    rbac.assign_role_to_subject(&ComponentRole::Admin, USER).await.unwrap();

    assert!(rbac.subject_has_permission(USER, &ComponentPermission::Create).await.unwrap());
    assert!(!rbac.subject_has_permission(USER, &ComponentPermission::Delete).await.unwrap());

    // Names are stored as text, so a string-typed view of the same backend agrees.
    let untyped: Rbac = rbac.retyped();
    assert!(untyped.subject_has_permission(USER, CREATE).await.unwrap());
}

#[test]
fn test_closed_name_parse_rejects_unknown() {
    let err = "service.component.update".parse::<ComponentPermission>().unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidName);
    assert_eq!(ComponentPermission::ALL.len(), 2);
}

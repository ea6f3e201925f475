//! Integration tests for the snapshot arena and structural diffing

use std::collections::BTreeSet;

use sentinel_core::config::ExtractionConfig;
use sentinel_core::domain::{Endpoint, ParamDescriptor};
use sentinel_graph::{GraphStore, InMemoryGraphStore};

fn endpoint(sha: &str, method: &str, path: &str, guards: &[&str]) -> Endpoint {
    Endpoint {
        repo_id: "acme/shop".into(),
        revision_sha: sha.into(),
        method: method.into(),
        path_template: path.into(),
        handler_name: format!("handle_{}", path.replace(['/', '{', '}'], "_")),
        file_path: "app/routes.py".into(),
        declared_guards: guards.iter().map(|g| g.to_string()).collect::<BTreeSet<_>>(),
        parameters: vec![ParamDescriptor {
            name: "order_id".into(),
            type_hint: Some("int".into()),
        }],
        handler_source: String::new(),
    }
}

fn store() -> InMemoryGraphStore {
    InMemoryGraphStore::new(ExtractionConfig::default())
}

#[tokio::test]
async fn commit_is_idempotent_on_repo_and_revision() {
    let store = store();
    let endpoints = vec![endpoint("r1", "GET", "/api/orders/{order_id}", &["verify_token"])];

    let first = store
        .commit_snapshot("acme/shop", "r1", &endpoints)
        .await
        .unwrap();
    let second = store
        .commit_snapshot("acme/shop", "r1", &endpoints)
        .await
        .unwrap();

    assert_eq!(first, second);
    let snapshot = store.snapshot("acme/shop", "r1").await.unwrap();
    assert_eq!(snapshot.routes.len(), 1);
    assert_eq!(snapshot.routes[0].guards.len(), 1);
}

#[tokio::test]
async fn first_scan_classifies_everything_as_added_with_zero_drift() {
    let store = store();
    let endpoints = vec![
        endpoint("r1", "GET", "/api/orders/{order_id}", &[]),
        endpoint("r1", "POST", "/api/orders", &["verify_token"]),
    ];
    store
        .commit_snapshot("acme/shop", "r1", &endpoints)
        .await
        .unwrap();

    let delta = store.diff("acme/shop", None, "r1").await.unwrap();
    assert_eq!(delta.added_routes.len(), 2);
    assert!(delta.removed_routes.is_empty());
    assert_eq!(delta.drift_count(), 0);
}

#[tokio::test]
async fn unchanged_guard_sets_produce_no_drift() {
    let store = store();
    let endpoints_r1 = vec![endpoint("r1", "GET", "/api/items", &["verify_token"])];
    let endpoints_r2 = vec![endpoint("r2", "GET", "/api/items", &["verify_token"])];

    store
        .commit_snapshot("acme/shop", "r1", &endpoints_r1)
        .await
        .unwrap();
    store
        .commit_snapshot("acme/shop", "r2", &endpoints_r2)
        .await
        .unwrap();

    let delta = store.diff("acme/shop", Some("r1"), "r2").await.unwrap();
    assert!(delta.is_empty());
}

#[tokio::test]
async fn removed_guard_is_reported_as_drift() {
    let store = store();
    store
        .commit_snapshot(
            "acme/shop",
            "r1",
            &[endpoint("r1", "GET", "/api/orders/{order_id}", &["verify_token"])],
        )
        .await
        .unwrap();
    store
        .commit_snapshot(
            "acme/shop",
            "r2",
            &[endpoint("r2", "GET", "/api/orders/{order_id}", &[])],
        )
        .await
        .unwrap();

    let delta = store.diff("acme/shop", Some("r1"), "r2").await.unwrap();
    assert_eq!(delta.drift_count(), 1);
    assert_eq!(
        delta.routes_with_removed_guards[0].path_template,
        "/api/orders/{order_id}"
    );
    assert!(delta.routes_with_added_guards.is_empty());
}

#[tokio::test]
async fn readded_guard_is_reported_as_guard_addition() {
    let store = store();
    store
        .commit_snapshot(
            "acme/shop",
            "r1",
            &[endpoint("r1", "GET", "/api/orders/{order_id}", &[])],
        )
        .await
        .unwrap();
    store
        .commit_snapshot(
            "acme/shop",
            "r2",
            &[endpoint("r2", "GET", "/api/orders/{order_id}", &["verify_token"])],
        )
        .await
        .unwrap();

    let delta = store.diff("acme/shop", Some("r1"), "r2").await.unwrap();
    assert_eq!(delta.routes_with_added_guards.len(), 1);
    assert_eq!(delta.drift_count(), 0);
}

#[tokio::test]
async fn guard_swap_is_one_guard_change_not_add_plus_remove_of_route() {
    let store = store();
    store
        .commit_snapshot(
            "acme/shop",
            "r1",
            &[endpoint("r1", "GET", "/api/items", &["verify_token"])],
        )
        .await
        .unwrap();
    store
        .commit_snapshot(
            "acme/shop",
            "r2",
            &[endpoint("r2", "GET", "/api/items", &["require_admin"])],
        )
        .await
        .unwrap();

    let delta = store.diff("acme/shop", Some("r1"), "r2").await.unwrap();
    assert!(delta.added_routes.is_empty());
    assert!(delta.removed_routes.is_empty());
    assert_eq!(delta.routes_with_removed_guards.len(), 1);
    assert_eq!(delta.routes_with_added_guards.len(), 1);
}

#[tokio::test]
async fn added_and_removed_routes_use_identity_keys() {
    let store = store();
    store
        .commit_snapshot(
            "acme/shop",
            "r1",
            &[endpoint("r1", "GET", "/api/old", &[])],
        )
        .await
        .unwrap();
    store
        .commit_snapshot(
            "acme/shop",
            "r2",
            &[endpoint("r2", "GET", "/api/new", &[])],
        )
        .await
        .unwrap();

    let delta = store.diff("acme/shop", Some("r1"), "r2").await.unwrap();
    assert_eq!(delta.added_routes[0].path_template, "/api/new");
    assert_eq!(delta.removed_routes[0].path_template, "/api/old");
}

#[tokio::test]
async fn latest_advances_with_commits_and_reset_clears() {
    let store = store();
    assert_eq!(store.latest("acme/shop").await, None);

    store
        .commit_snapshot("acme/shop", "r1", &[endpoint("r1", "GET", "/a", &[])])
        .await
        .unwrap();
    assert_eq!(store.latest("acme/shop").await.as_deref(), Some("r1"));

    store
        .commit_snapshot("acme/shop", "r2", &[endpoint("r2", "GET", "/a", &[])])
        .await
        .unwrap();
    assert_eq!(store.latest("acme/shop").await.as_deref(), Some("r2"));

    store.reset("acme/shop").await;
    assert_eq!(store.latest("acme/shop").await, None);
    assert!(store.snapshot("acme/shop", "r2").await.is_err());
}

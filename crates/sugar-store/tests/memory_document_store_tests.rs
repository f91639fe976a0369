//! Integration tests for `InMemoryDocumentStore`.

use std::sync::Arc;

use serde_json::json;
use sugar_core::error::DomainError;
use sugar_core::store::{DocumentPatch, DocumentStore, FieldPath};
use sugar_store::memory_document_store::InMemoryDocumentStore;
use sugar_test_support::FixedClock;

fn store() -> InMemoryDocumentStore {
    InMemoryDocumentStore::new(Arc::new(FixedClock::default_instant()))
}

// --- load ---

#[tokio::test]
async fn test_load_returns_none_for_nonexistent_key() {
    let store = store();

    let loaded = store.load("missing").await.unwrap();

    assert!(loaded.is_none());
}

// --- create ---

#[tokio::test]
async fn test_create_then_load_returns_version_one() {
    let store = store();

    store.create("room-a", json!({ "players": [] })).await.unwrap();

    let loaded = store.load("room-a").await.unwrap().unwrap();
    assert_eq!(loaded.version, 1);
    assert_eq!(loaded.body, json!({ "players": [] }));
    assert_eq!(loaded.updated_at, FixedClock::default_instant().0);
}

#[tokio::test]
async fn test_create_existing_key_is_a_conflict() {
    let store = store();
    store.create("room-a", json!({})).await.unwrap();

    let result = store.create("room-a", json!({ "players": [] })).await;

    match result {
        Err(DomainError::ConcurrencyConflict { actual, .. }) => assert_eq!(actual, 1),
        other => panic!("expected ConcurrencyConflict, got {other:?}"),
    }
    assert_eq!(store.load("room-a").await.unwrap().unwrap().body, json!({}));
}

// --- update ---

#[tokio::test]
async fn test_update_missing_key_is_not_found() {
    let store = store();

    let result = store
        .update("room-a", DocumentPatch::new().set(FieldPath::field("isStarted"), json!(true)))
        .await;

    assert!(matches!(result, Err(DomainError::NotFound(key)) if key == "room-a"));
}

#[tokio::test]
async fn test_update_bumps_version_and_merges_nested_fields() {
    let store = store();
    store
        .create("room-a", json!({ "roundsInfo": { "1": {} } }))
        .await
        .unwrap();

    store
        .update(
            "room-a",
            DocumentPatch::new().set(
                FieldPath::field("roundsInfo").child("1").child("a"),
                json!("x"),
            ),
        )
        .await
        .unwrap();
    let updated = store
        .update(
            "room-a",
            DocumentPatch::new().set(
                FieldPath::field("roundsInfo").child("1").child("b"),
                json!("y"),
            ),
        )
        .await
        .unwrap();

    assert_eq!(updated.version, 3);
    assert_eq!(updated.body, json!({ "roundsInfo": { "1": { "a": "x", "b": "y" } } }));
}

#[tokio::test]
async fn test_rejected_update_leaves_document_unchanged() {
    let store = store();
    store.create("room-a", json!({ "activeRound": 2 })).await.unwrap();

    let result = store
        .update(
            "room-a",
            DocumentPatch::new()
                .guard(FieldPath::field("activeRound"), json!(1))
                .set(FieldPath::field("activeRound"), json!(2)),
        )
        .await;

    assert!(matches!(result, Err(DomainError::PreconditionFailed { .. })));
    let loaded = store.load("room-a").await.unwrap().unwrap();
    assert_eq!(loaded.version, 1);
}

#[tokio::test]
async fn test_second_compare_and_set_from_same_version_loses() {
    // Arrange
    let store = store();
    store.create("room-a", json!({ "players": ["a"] })).await.unwrap();

    // Act
    let first = store
        .update(
            "room-a",
            DocumentPatch::new()
                .set(FieldPath::field("players"), json!(["a", "b"]))
                .expect_version(1),
        )
        .await;
    let second = store
        .update(
            "room-a",
            DocumentPatch::new()
                .set(FieldPath::field("players"), json!(["a", "c"]))
                .expect_version(1),
        )
        .await;

    // Assert
    assert!(first.is_ok());
    assert!(matches!(
        second,
        Err(DomainError::ConcurrencyConflict { expected: 1, actual: 2, .. })
    ));
    let loaded = store.load("room-a").await.unwrap().unwrap();
    assert_eq!(loaded.body, json!({ "players": ["a", "b"] }));
}

// --- subscribe ---

#[tokio::test]
async fn test_every_subscriber_receives_the_write() {
    // Arrange
    let store = store();
    store.create("room-a", json!({ "isStarted": false })).await.unwrap();
    let mut first = store.subscribe("room-a").await.unwrap();
    let mut second = store.subscribe("room-a").await.unwrap();

    // Act
    store
        .update("room-a", DocumentPatch::new().set(FieldPath::field("isStarted"), json!(true)))
        .await
        .unwrap();

    // Assert
    let a = first.changed().await.unwrap();
    let b = second.changed().await.unwrap();
    assert_eq!(a.version, 2);
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_subscribe_before_create_sees_creation() {
    let store = store();
    let mut subscription = store.subscribe("room-a").await.unwrap();
    assert!(subscription.latest().is_none());

    store.create("room-a", json!({})).await.unwrap();

    assert_eq!(subscription.changed().await.unwrap().version, 1);
}

#[tokio::test]
async fn test_subscriber_observes_latest_after_burst() {
    let store = store();
    store.create("room-a", json!({ "activeRound": 1 })).await.unwrap();
    let mut subscription = store.subscribe("room-a").await.unwrap();

    for round in 2..=4 {
        store
            .update(
                "room-a",
                DocumentPatch::new().set(FieldPath::field("activeRound"), json!(round)),
            )
            .await
            .unwrap();
    }

    let observed = subscription.changed().await.unwrap();
    assert_eq!(observed.version, 4);
    assert_eq!(observed.body["activeRound"], 4);
}

#[tokio::test]
async fn test_dropping_subscription_releases_it() {
    let store = store();
    store.create("room-a", json!({})).await.unwrap();
    let subscription = store.subscribe("room-a").await.unwrap();
    assert_eq!(store.subscriber_count("room-a"), 1);

    drop(subscription);

    assert_eq!(store.subscriber_count("room-a"), 0);
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reconciler behavior against the in-memory store.

use identity_sync::db::{MemoryUserStore, UserStore};
use identity_sync::models::{CanonicalIdentity, PostalAddress};
use identity_sync::services::{ReconcileError, UserReconciler};
use std::sync::Arc;
use std::time::Duration;

mod common;
use common::{identity, FakeProvider, ProviderMode};

const NUM_CONCURRENT_DELIVERIES: usize = 16;

fn reconciler() -> (UserReconciler, MemoryUserStore, Arc<FakeProvider>) {
    let store = MemoryUserStore::new();
    let provider = Arc::new(FakeProvider::new());
    let reconciler = UserReconciler::new(
        provider.clone(),
        Arc::new(store.clone()),
        Duration::from_millis(200),
    );
    (reconciler, store, provider)
}

#[tokio::test]
async fn test_upsert_twice_is_idempotent() {
    let (reconciler, store, provider) = reconciler();
    provider.put(identity("user_1", "one@example.com"));

    let first = reconciler.upsert("user_1").await.unwrap();
    let second = reconciler.upsert("user_1").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_remove_twice_is_idempotent() {
    let (reconciler, store, provider) = reconciler();
    provider.put(identity("user_1", "one@example.com"));
    reconciler.upsert("user_1").await.unwrap();

    reconciler.remove("user_1").await.unwrap();
    assert!(store.find_by_external_id("user_1").await.unwrap().is_none());

    reconciler.remove("user_1").await.unwrap();
    assert!(store.find_by_external_id("user_1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_last_fetched_state_wins() {
    let (reconciler, store, provider) = reconciler();

    provider.put(identity("user_1", "old@example.com"));
    reconciler.upsert("user_1").await.unwrap();

    provider.put(CanonicalIdentity {
        first_name: Some("Janet".to_string()),
        postal_address: Some(PostalAddress {
            city: Some("Mountain View".to_string()),
            ..Default::default()
        }),
        ..identity("user_1", "new@example.com")
    });
    // A replayed "created" still picks up the latest provider state
    let record = reconciler.upsert("user_1").await.unwrap();

    assert_eq!(record.email, "new@example.com");
    assert_eq!(record.first_name.as_deref(), Some("Janet"));
    assert_eq!(record.address.city.as_deref(), Some("Mountain View"));
    assert_eq!(record.address.street.as_deref(), Some("1 Main St"));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_partial_provider_data_does_not_erase() {
    let (reconciler, _store, provider) = reconciler();
    provider.put(identity("user_1", "one@example.com"));
    let before = reconciler.upsert("user_1").await.unwrap();

    provider.put(CanonicalIdentity {
        external_id: "user_1".to_string(),
        primary_email: Some("one@example.com".to_string()),
        first_name: Some(String::new()),
        ..Default::default()
    });
    let after = reconciler.upsert("user_1").await.unwrap();

    assert_eq!(after, before);
}

#[tokio::test]
async fn test_identity_not_found() {
    let (reconciler, store, _provider) = reconciler();

    let err = reconciler.upsert("user_missing").await.unwrap_err();
    assert!(matches!(err, ReconcileError::IdentityNotFound(ref id) if id == "user_missing"));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_missing_primary_email_not_persisted() {
    let (reconciler, store, provider) = reconciler();
    provider.put(CanonicalIdentity {
        primary_email: Some("   ".to_string()),
        ..identity("user_1", "unused@example.com")
    });

    let err = reconciler.upsert("user_1").await.unwrap_err();
    assert!(matches!(err, ReconcileError::MissingPrimaryEmail));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_provider_timeout() {
    let (reconciler, store, provider) = reconciler();
    provider.set_mode(ProviderMode::Hang);

    let err = reconciler.upsert("user_1").await.unwrap_err();
    assert!(matches!(err, ReconcileError::ProviderTimeout(_)));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_provider_error_propagates() {
    let (reconciler, _store, provider) = reconciler();
    provider.set_mode(ProviderMode::Unavailable);

    let err = reconciler.upsert("user_1").await.unwrap_err();
    assert!(matches!(err, ReconcileError::Provider(_)));
}

#[tokio::test]
async fn test_concurrent_upserts_yield_one_record() {
    let (reconciler, store, provider) = reconciler();
    provider.put(identity("user_race", "race@example.com"));

    let mut handles = vec![];
    for _ in 0..NUM_CONCURRENT_DELIVERIES {
        let reconciler = reconciler.clone();
        handles.push(tokio::spawn(async move {
            reconciler.upsert("user_race").await
        }));
    }

    let mut ids = vec![];
    for handle in handles {
        let record = handle
            .await
            .expect("Task join failed")
            .expect("Upsert failed");
        ids.push(record.id);
    }

    assert_eq!(store.len(), 1);
    ids.dedup();
    assert_eq!(ids.len(), 1, "Every delivery must resolve to the same record");
}

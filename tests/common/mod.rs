// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use identity_sync::config::Config;
use identity_sync::db::MemoryUserStore;
use identity_sync::models::{CanonicalIdentity, PostalAddress};
use identity_sync::routes::create_router;
use identity_sync::services::signature;
use identity_sync::services::{IdentityProvider, ProviderError, UserReconciler};
use identity_sync::AppState;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How the fake provider answers every fetch.
#[allow(dead_code)]
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ProviderMode {
    Normal,
    Unavailable,
    Hang,
}

/// In-memory identity provider with scriptable users and failure modes.
pub struct FakeProvider {
    users: Mutex<HashMap<String, CanonicalIdentity>>,
    mode: Mutex<ProviderMode>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl FakeProvider {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            mode: Mutex::new(ProviderMode::Normal),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn put(&self, identity: CanonicalIdentity) {
        self.users
            .lock()
            .unwrap()
            .insert(identity.external_id.clone(), identity);
    }

    pub fn remove(&self, external_id: &str) {
        self.users.lock().unwrap().remove(external_id);
    }

    pub fn set_mode(&self, mode: ProviderMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    async fn fetch_user(
        &self,
        external_id: &str,
    ) -> Result<Option<CanonicalIdentity>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mode = *self.mode.lock().unwrap();
        match mode {
            ProviderMode::Normal => Ok(self.users.lock().unwrap().get(external_id).cloned()),
            ProviderMode::Unavailable => Err(ProviderError::Status {
                status: 503,
                body: "upstream unavailable: cluster eu-west-3".to_string(),
            }),
            ProviderMode::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(None)
            }
        }
    }
}

/// A complete canonical identity for `external_id`.
#[allow(dead_code)]
pub fn identity(external_id: &str, email: &str) -> CanonicalIdentity {
    CanonicalIdentity {
        external_id: external_id.to_string(),
        primary_email: Some(email.to_string()),
        first_name: Some("Jane".to_string()),
        last_name: Some("Doe".to_string()),
        avatar_url: Some("https://img.example.com/jane.png".to_string()),
        postal_address: Some(PostalAddress {
            street: Some("1 Main St".to_string()),
            city: Some("Palo Alto".to_string()),
            state: Some("CA".to_string()),
            country: Some("US".to_string()),
            postal_code: Some("94301".to_string()),
        }),
    }
}

/// Test harness: router plus handles on its collaborators.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub store: MemoryUserStore,
    pub provider: Arc<FakeProvider>,
}

/// Create a test app with in-memory dependencies.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with_config(Config {
        provider_timeout: Duration::from_millis(200),
        ..Config::default()
    })
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> TestApp {
    let store = MemoryUserStore::new();
    let provider = Arc::new(FakeProvider::new());

    let reconciler = UserReconciler::new(
        provider.clone(),
        Arc::new(store.clone()),
        config.provider_timeout,
    );

    let state = Arc::new(AppState {
        config,
        reconciler,
    });

    TestApp {
        router: create_router(state.clone()),
        state,
        store,
        provider,
    }
}

/// Event body as the provider sends it.
#[allow(dead_code)]
pub fn event_body(event_type: &str, subject_id: &str) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "data": {
            "id": subject_id,
            "object": "user",
            "first_name": "Stale payload name"
        },
        "object": "event",
        "type": event_type
    }))
    .unwrap()
}

/// Build a POST to the webhook path signed with `secret`.
#[allow(dead_code)]
pub fn signed_request(path: &str, secret: &str, message_id: &str, body: Vec<u8>) -> Request<Body> {
    let timestamp = chrono::Utc::now().timestamp();
    let sig = signature::sign(secret, message_id, timestamp, &body).unwrap();

    Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .header("svix-id", message_id)
        .header("svix-timestamp", timestamp.to_string())
        .header("svix-signature", sig)
        .body(Body::from(body))
        .unwrap()
}

/// Read a JSON response body.
#[allow(dead_code)]
pub async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Webhook route for identity provider user events.

use crate::error::Result;
use crate::models::EventType;
use crate::services::reconciler::ReconcileError;
use crate::services::{events, signature, WebhookHeaders};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use serde::Serialize;
use std::sync::Arc;

/// Webhook routes, mounted at the deployment-defined `path`.
pub fn routes(path: &str) -> Router<Arc<AppState>> {
    Router::new().route(path, post(handle_event).options(preflight))
}

/// What the handler did with an accepted event.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WebhookAction {
    Upserted,
    Deleted,
    Ignored,
}

/// Body of every 200 response.
#[derive(Serialize, Debug)]
pub struct WebhookResponse {
    pub success: bool,
    pub action: WebhookAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<&'static str>,
}

impl WebhookResponse {
    fn done(action: WebhookAction) -> Self {
        Self {
            success: true,
            action,
            message: None,
            warning: None,
        }
    }

    fn ignored() -> Self {
        Self {
            message: Some("no action taken"),
            ..Self::done(WebhookAction::Ignored)
        }
    }

    fn identity_not_found() -> Self {
        Self {
            warning: Some("identity_not_found"),
            ..Self::done(WebhookAction::Ignored)
        }
    }
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Handle an incoming webhook delivery (POST).
///
/// Non-2xx responses make the provider redeliver, so harmless events
/// (unknown types, updates for users the provider no longer has) are
/// acknowledged with 200.
async fn handle_event(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>> {
    let webhook_headers = WebhookHeaders::from_header_map(&headers);
    let svix_id = webhook_headers.message_id.unwrap_or_default();

    // Verify over the exact raw bytes before anything looks at the JSON
    let verified = signature::verify_at(
        &body,
        &webhook_headers,
        &state.config.webhook_secret,
        chrono::Utc::now().timestamp(),
        state.config.webhook_tolerance_secs,
    )?;

    let envelope = events::parse(verified)?;
    let event_type = envelope.event_type.as_str();
    let subject_id = envelope.subject_id.as_str();

    tracing::info!(svix_id, event_type, subject_id, "Webhook event verified");

    let result = match &envelope.event_type {
        EventType::UserCreated | EventType::UserUpdated => state
            .reconciler
            .upsert(subject_id)
            .await
            .map(|_| WebhookResponse::done(WebhookAction::Upserted)),
        EventType::UserDeleted => state
            .reconciler
            .remove(subject_id)
            .await
            .map(|()| WebhookResponse::done(WebhookAction::Deleted)),
        EventType::Unhandled(_) => {
            tracing::debug!(svix_id, event_type, "Ignoring unhandled event type");
            Ok(WebhookResponse::ignored())
        }
    };

    match result {
        Ok(response) => Ok(Json(response)),
        Err(ReconcileError::IdentityNotFound(_)) => {
            tracing::warn!(
                svix_id,
                event_type,
                subject_id,
                "Identity provider has no such user, skipping sync"
            );
            Ok(Json(WebhookResponse::identity_not_found()))
        }
        Err(e) => {
            tracing::error!(
                svix_id,
                event_type,
                subject_id,
                error = %e,
                "Failed to process webhook event"
            );
            Err(e.into())
        }
    }
}

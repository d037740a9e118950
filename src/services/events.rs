// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Decoding of verified webhook bodies into typed envelopes.

use crate::models::{EventType, WebhookEnvelope};
use crate::services::signature::VerifiedPayload;
use serde::Deserialize;

/// Event parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Malformed webhook body: {0}")]
    MalformedBody(String),

    #[error("Webhook payload has no subject id")]
    MissingSubjectId,
}

impl ParseError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedBody(_) => "malformed_body",
            Self::MissingSubjectId => "missing_subject_id",
        }
    }
}

/// Wire shape: `{ "type": "...", "data": { "id": "...", ... } }`.
/// Everything else in `data` is ignored; canonical data is fetched live.
#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    data: Option<RawEventData>,
}

#[derive(Deserialize)]
struct RawEventData {
    #[serde(default)]
    id: Option<serde_json::Value>,
}

/// Parse a verified body. Unknown event types are not an error.
pub fn parse(payload: VerifiedPayload<'_>) -> Result<WebhookEnvelope, ParseError> {
    let raw: RawEvent = serde_json::from_slice(payload.as_bytes())
        .map_err(|e| ParseError::MalformedBody(e.to_string()))?;

    let subject_id = raw
        .data
        .and_then(|d| d.id)
        .and_then(|id| id.as_str().map(str::trim).map(str::to_string))
        .filter(|id| !id.is_empty())
        .ok_or(ParseError::MissingSubjectId)?;

    Ok(WebhookEnvelope {
        event_type: EventType::from_wire(&raw.event_type),
        subject_id,
    })
}

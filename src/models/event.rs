// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed webhook event envelope.

use std::fmt;

/// Event types the service reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    UserCreated,
    UserUpdated,
    UserDeleted,
    /// Any other type; acknowledged without action.
    Unhandled(String),
}

impl EventType {
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "user.created" => Self::UserCreated,
            "user.updated" => Self::UserUpdated,
            "user.deleted" => Self::UserDeleted,
            other => Self::Unhandled(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::UserCreated => "user.created",
            Self::UserUpdated => "user.updated",
            Self::UserDeleted => "user.deleted",
            Self::Unhandled(raw) => raw,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A verified, parsed inbound event.
///
/// Only `services::events::parse` builds one, and it only accepts a
/// `VerifiedPayload`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEnvelope {
    pub event_type: EventType,
    /// Identity provider user the event concerns (non-empty)
    pub subject_id: String,
}

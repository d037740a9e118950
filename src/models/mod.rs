// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod event;
pub mod identity;
pub mod user;

pub use event::{EventType, WebhookEnvelope};
pub use identity::CanonicalIdentity;
pub use user::{LocalUserRecord, PostalAddress, UserChanges};

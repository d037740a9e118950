// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider's live view of a user.

use super::user::PostalAddress;

/// User as currently held by the identity provider.
///
/// Fetched live for every upsert; webhook payloads may be partial or stale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalIdentity {
    pub external_id: String,
    /// Resolved primary email. `None` when the provider has no primary
    /// address on file; such an identity is never persisted.
    pub primary_email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
    pub postal_address: Option<PostalAddress>,
}

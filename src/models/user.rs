// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local user record and the changes applied to it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Structured postal address. Every part is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalAddress {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
}

impl PostalAddress {
    fn merge(&mut self, incoming: &PostalAddress) {
        merge_field(&mut self.street, &incoming.street);
        merge_field(&mut self.city, &incoming.city);
        merge_field(&mut self.state, &incoming.state);
        merge_field(&mut self.country, &incoming.country);
        merge_field(&mut self.postal_code, &incoming.postal_code);
    }
}

/// User row in the local store, keyed by `external_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalUserRecord {
    /// Local surrogate key
    pub id: Uuid,
    /// Identity provider user ID (unique)
    pub external_id: String,
    /// Primary email address
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Profile picture URL
    pub avatar_url: Option<String>,
    pub address: PostalAddress,
    pub created_at: DateTime<Utc>,
    /// Advances only when stored content actually changes
    pub updated_at: DateTime<Utc>,
}

/// Validated values to write for one upsert.
///
/// `None` means "not supplied": it never clears a stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserChanges {
    pub external_id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
    pub address: PostalAddress,
}

impl LocalUserRecord {
    /// Build a fresh record for an unseen `external_id`.
    pub fn create(id: Uuid, changes: &UserChanges, now: DateTime<Utc>) -> Self {
        Self {
            id,
            external_id: changes.external_id.clone(),
            email: changes.email.clone(),
            first_name: changes.first_name.clone(),
            last_name: changes.last_name.clone(),
            avatar_url: changes.avatar_url.clone(),
            address: changes.address.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge `changes` into this record in place.
    ///
    /// Returns whether any stored value changed; `updated_at` is only
    /// bumped in that case.
    pub fn merge(&mut self, changes: &UserChanges, now: DateTime<Utc>) -> bool {
        let before = self.clone();

        self.email.clone_from(&changes.email);
        merge_field(&mut self.first_name, &changes.first_name);
        merge_field(&mut self.last_name, &changes.last_name);
        merge_field(&mut self.avatar_url, &changes.avatar_url);
        self.address.merge(&changes.address);

        let changed = *self != before;
        if changed {
            self.updated_at = now;
        }
        changed
    }
}

fn merge_field(current: &mut Option<String>, incoming: &Option<String>) {
    if let Some(value) = incoming {
        *current = Some(value.clone());
    }
}

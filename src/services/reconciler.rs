// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reconciles local user records with the identity provider.
//!
//! Every upsert re-fetches the user's canonical state instead of trusting
//! the webhook payload, so out-of-order or duplicate deliveries converge
//! on whatever the provider reports last.

use crate::db::{StoreError, UserStore};
use crate::models::{CanonicalIdentity, LocalUserRecord, PostalAddress, UserChanges};
use crate::services::clerk::{IdentityProvider, ProviderError};
use std::sync::Arc;
use std::time::Duration;

/// Reconciliation failures.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// The provider has no such user (e.g. an update trailing a delete).
    #[error("Identity provider has no user {0}")]
    IdentityNotFound(String),

    #[error("User has no primary email address")]
    MissingPrimaryEmail,

    #[error("Identity provider did not answer within {0:?}")]
    ProviderTimeout(Duration),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Applies create/update/delete events to the local store.
#[derive(Clone)]
pub struct UserReconciler {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn UserStore>,
    fetch_timeout: Duration,
}

impl UserReconciler {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn UserStore>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            store,
            fetch_timeout,
        }
    }

    /// Create or merge-update the local record for `subject_id`.
    pub async fn upsert(&self, subject_id: &str) -> Result<LocalUserRecord, ReconcileError> {
        let identity = self.fetch_identity(subject_id).await?;
        let changes = to_changes(identity)?;

        let record = self.store.upsert(&changes).await?;

        tracing::info!(
            subject_id,
            user_id = %record.id,
            "User synced from identity provider"
        );
        Ok(record)
    }

    /// Delete the local record for `subject_id`. Absent records are fine.
    pub async fn remove(&self, subject_id: &str) -> Result<(), ReconcileError> {
        let removed = self.store.delete(subject_id).await?;

        if removed {
            tracing::info!(subject_id, "User deleted");
        } else {
            tracing::info!(subject_id, "User already absent, nothing to delete");
        }
        Ok(())
    }

    async fn fetch_identity(&self, subject_id: &str) -> Result<CanonicalIdentity, ReconcileError> {
        let fetched = tokio::time::timeout(self.fetch_timeout, self.provider.fetch_user(subject_id))
            .await
            .map_err(|_| ReconcileError::ProviderTimeout(self.fetch_timeout))?;

        match fetched {
            Ok(Some(identity)) => Ok(identity),
            Ok(None) => Err(ReconcileError::IdentityNotFound(subject_id.to_string())),
            Err(ProviderError::Timeout) => Err(ReconcileError::ProviderTimeout(self.fetch_timeout)),
            Err(e) => Err(e.into()),
        }
    }
}

/// Validate a canonical identity and map it to store changes.
///
/// Blank optional values are treated as absent so they never erase
/// stored data.
pub fn to_changes(identity: CanonicalIdentity) -> Result<UserChanges, ReconcileError> {
    let email = non_blank(identity.primary_email).ok_or(ReconcileError::MissingPrimaryEmail)?;

    let address = identity
        .postal_address
        .map(|a| PostalAddress {
            street: non_blank(a.street),
            city: non_blank(a.city),
            state: non_blank(a.state),
            country: non_blank(a.country),
            postal_code: non_blank(a.postal_code),
        })
        .unwrap_or_default();

    Ok(UserChanges {
        external_id: identity.external_id,
        email,
        first_name: non_blank(identity.first_name),
        last_name: non_blank(identity.last_name),
        avatar_url: non_blank(identity.avatar_url),
        address,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

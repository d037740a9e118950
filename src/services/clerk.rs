// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider client (Clerk Backend API).
//!
//! Handles:
//! - Fetching a user by ID
//! - Resolving the primary email address
//! - Mapping provider errors (404, 401, 429) to typed errors

use crate::models::{CanonicalIdentity, PostalAddress};
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.clerk.com/v1";

/// Identity provider failures.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Identity provider request timed out")]
    Timeout,

    #[error("Identity provider rate limit hit")]
    RateLimited,

    #[error("Identity provider rejected our credentials")]
    Unauthorized,

    #[error("Identity provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Identity provider request failed: {0}")]
    Transport(String),

    #[error("Identity provider response could not be decoded: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Source of canonical user data.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Fetch the live view of a user. `Ok(None)` when the provider has no
    /// such user.
    async fn fetch_user(
        &self,
        external_id: &str,
    ) -> Result<Option<CanonicalIdentity>, ProviderError>;
}

/// Clerk Backend API client.
#[derive(Clone)]
pub struct ClerkClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl ClerkClient {
    /// Create a client authenticating with the backend secret key.
    pub fn new(base_url: &str, secret_key: String, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed building identity provider HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_key,
        })
    }
}

#[async_trait]
impl IdentityProvider for ClerkClient {
    async fn fetch_user(
        &self,
        external_id: &str,
    ) -> Result<Option<CanonicalIdentity>, ProviderError> {
        let url = format!(
            "{}/users/{}",
            self.base_url,
            urlencoding::encode(external_id)
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Ok(None);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                429 => {
                    tracing::warn!("Identity provider rate limit hit (429)");
                    ProviderError::RateLimited
                }
                401 | 403 => ProviderError::Unauthorized,
                code => ProviderError::Status { status: code, body },
            });
        }

        let user: ClerkUser = response.json().await?;
        Ok(Some(user.into_identity()))
    }
}

/// User object returned by `GET /users/{id}`.
#[derive(Debug, Deserialize)]
struct ClerkUser {
    id: String,
    #[serde(default)]
    primary_email_address_id: Option<String>,
    #[serde(default)]
    email_addresses: Vec<ClerkEmailAddress>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default, alias = "primaryAddress")]
    primary_address: Option<ClerkAddress>,
}

#[derive(Debug, Deserialize)]
struct ClerkEmailAddress {
    id: String,
    email_address: String,
}

#[derive(Debug, Deserialize)]
struct ClerkAddress {
    #[serde(default)]
    street1: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default, alias = "postalCode")]
    postal_code: Option<String>,
}

impl ClerkUser {
    fn into_identity(self) -> CanonicalIdentity {
        // Only the address flagged as primary counts, never the first one listed
        let primary_email = self.primary_email_address_id.as_deref().and_then(|primary| {
            self.email_addresses
                .iter()
                .find(|e| e.id == primary)
                .map(|e| e.email_address.clone())
        });

        let postal_address = self.primary_address.map(|a| PostalAddress {
            street: a.street1,
            city: a.city,
            state: a.state,
            country: a.country,
            postal_code: a.postal_code,
        });

        CanonicalIdentity {
            external_id: self.id,
            primary_email,
            first_name: self.first_name,
            last_name: self.last_name,
            avatar_url: self.image_url,
            postal_address,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_email_resolved_by_id() {
        let user: ClerkUser = serde_json::from_value(serde_json::json!({
            "id": "user_1",
            "primary_email_address_id": "idn_2",
            "email_addresses": [
                {"id": "idn_1", "email_address": "old@example.com"},
                {"id": "idn_2", "email_address": "primary@example.com"}
            ],
            "first_name": "Jane",
            "last_name": null,
            "image_url": "https://img.clerk.com/abc"
        }))
        .unwrap();

        let identity = user.into_identity();
        assert_eq!(identity.external_id, "user_1");
        assert_eq!(identity.primary_email.as_deref(), Some("primary@example.com"));
        assert_eq!(identity.last_name, None);
        assert_eq!(identity.postal_address, None);
    }

    #[test]
    fn test_no_primary_email_id_means_no_email() {
        let user: ClerkUser = serde_json::from_value(serde_json::json!({
            "id": "user_1",
            "email_addresses": [{"id": "idn_1", "email_address": "a@example.com"}]
        }))
        .unwrap();

        assert_eq!(user.into_identity().primary_email, None);
    }

    #[test]
    fn test_address_mapping() {
        let user: ClerkUser = serde_json::from_value(serde_json::json!({
            "id": "user_1",
            "primaryAddress": {
                "street1": "1 Main St",
                "city": "Palo Alto",
                "postalCode": "94301"
            }
        }))
        .unwrap();

        let address = user.into_identity().postal_address.unwrap();
        assert_eq!(address.street.as_deref(), Some("1 Main St"));
        assert_eq!(address.postal_code.as_deref(), Some("94301"));
        assert_eq!(address.country, None);
    }
}

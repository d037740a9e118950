// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Svix-style webhook signature verification.
//!
//! The provider signs `"{svix-id}.{svix-timestamp}.{body}"` with
//! HMAC-SHA256 and sends one or more `v1,<base64>` signatures in
//! `svix-signature`. Verification always runs over the exact raw body
//! bytes; parsing happens afterwards on the returned [`VerifiedPayload`].

use axum::http::HeaderMap;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

pub const HEADER_MESSAGE_ID: &str = "svix-id";
pub const HEADER_TIMESTAMP: &str = "svix-timestamp";
pub const HEADER_SIGNATURE: &str = "svix-signature";

/// Allowed skew between `svix-timestamp` and the local clock.
pub const DEFAULT_TOLERANCE_SECS: i64 = 5 * 60;

const SECRET_PREFIX: &str = "whsec_";
const SIGNATURE_VERSION: &str = "v1";

/// Signature verification failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    #[error("Missing svix-id, svix-timestamp or svix-signature header")]
    MissingHeaders,

    #[error("Webhook secret is not configured")]
    MissingSecret,

    #[error("Webhook secret is not valid base64")]
    InvalidSecret,

    #[error("svix-timestamp is not a valid integer")]
    InvalidTimestamp,

    #[error("svix-timestamp is outside the allowed tolerance")]
    TimestampOutOfTolerance,

    #[error("No signature matched the payload")]
    SignatureMismatch,
}

impl VerificationError {
    /// Stable error kind used in response bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingHeaders => "missing_headers",
            Self::MissingSecret | Self::InvalidSecret => "internal error",
            Self::InvalidTimestamp => "invalid_timestamp",
            Self::TimestampOutOfTolerance => "timestamp_out_of_tolerance",
            Self::SignatureMismatch => "invalid_signature",
        }
    }

    /// Operator misconfiguration rather than a problem with the request.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::MissingSecret | Self::InvalidSecret)
    }
}

/// The three transport headers carried by every delivery.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebhookHeaders<'a> {
    pub message_id: Option<&'a str>,
    pub timestamp: Option<&'a str>,
    pub signature: Option<&'a str>,
}

impl<'a> WebhookHeaders<'a> {
    /// Extract the Svix headers. Non-UTF-8 values count as absent.
    pub fn from_header_map(headers: &'a HeaderMap) -> Self {
        let get = move |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
        Self {
            message_id: get(HEADER_MESSAGE_ID),
            timestamp: get(HEADER_TIMESTAMP),
            signature: get(HEADER_SIGNATURE),
        }
    }

    fn require(&self) -> Result<(&'a str, &'a str, &'a str), VerificationError> {
        let present = |v: Option<&'a str>| v.map(str::trim).filter(|v| !v.is_empty());
        match (
            present(self.message_id),
            present(self.timestamp),
            present(self.signature),
        ) {
            (Some(id), Some(ts), Some(sig)) => Ok((id, ts, sig)),
            _ => Err(VerificationError::MissingHeaders),
        }
    }
}

/// Raw body bytes whose signature has been checked.
///
/// Only constructible by [`verify`]/[`verify_at`].
#[derive(Debug, Clone, Copy)]
pub struct VerifiedPayload<'a> {
    body: &'a [u8],
}

impl<'a> VerifiedPayload<'a> {
    pub fn as_bytes(&self) -> &'a [u8] {
        self.body
    }

    #[cfg(test)]
    pub(crate) fn assume_verified(body: &'a [u8]) -> Self {
        Self { body }
    }
}

/// Verify a delivery against the current clock with the default tolerance.
pub fn verify<'a>(
    raw_body: &'a [u8],
    headers: &WebhookHeaders<'_>,
    secret: &str,
) -> Result<VerifiedPayload<'a>, VerificationError> {
    verify_at(
        raw_body,
        headers,
        secret,
        chrono::Utc::now().timestamp(),
        DEFAULT_TOLERANCE_SECS,
    )
}

/// Verify a delivery as of `now` (seconds since epoch).
pub fn verify_at<'a>(
    raw_body: &'a [u8],
    headers: &WebhookHeaders<'_>,
    secret: &str,
    now: i64,
    tolerance_secs: i64,
) -> Result<VerifiedPayload<'a>, VerificationError> {
    // Header presence is checked before touching the secret or any crypto
    let (message_id, timestamp, signature) = headers.require()?;

    let key = decode_secret(secret)?;

    let sent_at: i64 = timestamp
        .parse()
        .map_err(|_| VerificationError::InvalidTimestamp)?;
    if now.abs_diff(sent_at) > tolerance_secs.unsigned_abs() {
        return Err(VerificationError::TimestampOutOfTolerance);
    }

    let expected = compute_signature(&key, message_id, timestamp, raw_body)?;

    let matched = signature
        .split_whitespace()
        .filter_map(|entry| entry.split_once(','))
        .filter(|(version, _)| *version == SIGNATURE_VERSION)
        .filter_map(|(_, sig)| STANDARD.decode(sig).ok())
        .any(|candidate| bool::from(expected.as_slice().ct_eq(candidate.as_slice())));

    if matched {
        Ok(VerifiedPayload { body: raw_body })
    } else {
        Err(VerificationError::SignatureMismatch)
    }
}

/// Produce an `svix-signature` header value for `body`.
pub fn sign(
    secret: &str,
    message_id: &str,
    timestamp: i64,
    body: &[u8],
) -> Result<String, VerificationError> {
    let key = decode_secret(secret)?;
    let mac = compute_signature(&key, message_id, &timestamp.to_string(), body)?;
    Ok(format!("{},{}", SIGNATURE_VERSION, STANDARD.encode(mac)))
}

fn decode_secret(secret: &str) -> Result<Vec<u8>, VerificationError> {
    let secret = secret.trim();
    if secret.is_empty() {
        return Err(VerificationError::MissingSecret);
    }

    let encoded = secret.strip_prefix(SECRET_PREFIX).unwrap_or(secret);
    let key = STANDARD
        .decode(encoded)
        .map_err(|_| VerificationError::InvalidSecret)?;
    if key.is_empty() {
        return Err(VerificationError::InvalidSecret);
    }
    Ok(key)
}

fn compute_signature(
    key: &[u8],
    message_id: &str,
    timestamp: &str,
    body: &[u8],
) -> Result<Vec<u8>, VerificationError> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|_| VerificationError::InvalidSecret)?;
    mac.update(message_id.as_bytes());
    mac.update(b".");
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);
    Ok(mac.finalize().into_bytes().to_vec())
}

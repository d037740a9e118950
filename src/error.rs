// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.
//!
//! Response bodies only ever carry a coarse error kind. Details (subject
//! ids, provider responses, database errors) go to the logs.

use crate::services::{ParseError, ReconcileError, VerificationError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Body text for every 5xx response.
pub const INTERNAL_ERROR: &str = "internal error";

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
}

impl AppError {
    /// HTTP status and body kind for this error.
    pub fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Verification(e) if e.is_config_error() => {
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR)
            }
            AppError::Verification(e) => (StatusCode::BAD_REQUEST, e.kind()),
            AppError::Parse(e) => (StatusCode::BAD_REQUEST, e.kind()),
            AppError::Reconcile(ReconcileError::MissingPrimaryEmail) => {
                (StatusCode::BAD_REQUEST, "missing_primary_email")
            }
            AppError::Reconcile(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_kind();

        match &self {
            AppError::Verification(e) if e.is_config_error() => {
                tracing::error!(error = %e, "Webhook secret misconfigured");
            }
            AppError::Verification(e) => {
                tracing::warn!(error = %e, "Security Alert: Webhook verification failed");
            }
            AppError::Parse(e) => {
                tracing::warn!(error = %e, "Rejected webhook body");
            }
            // Logged by the webhook handler along with the event context
            AppError::Reconcile(_) => {}
        }

        (status, Json(ErrorResponse { error })).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

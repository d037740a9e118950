// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod clerk;
pub mod events;
pub mod reconciler;
pub mod signature;

pub use clerk::{ClerkClient, IdentityProvider, ProviderError};
pub use events::ParseError;
pub use reconciler::{ReconcileError, UserReconciler};
pub use signature::{VerificationError, VerifiedPayload, WebhookHeaders};

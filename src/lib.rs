// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity-Sync: keep local storefront users in step with the identity provider
//!
//! This crate receives signed user webhooks from the identity provider,
//! re-fetches each user's canonical profile and upserts or deletes the
//! matching row in the local user store.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use services::UserReconciler;

/// Shared application state.
///
/// The store is only reachable through the reconciler, which is the sole
/// writer of local user records.
pub struct AppState {
    pub config: Config,
    pub reconciler: UserReconciler,
}

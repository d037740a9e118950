// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local user store.
//!
//! `PgUserStore` is the production backend. `MemoryUserStore` has the
//! same upsert/delete semantics and backs local development and tests.

pub mod memory;
pub mod postgres;

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

use crate::models::{LocalUserRecord, UserChanges};
use async_trait::async_trait;

/// Store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Persistence for local user records, keyed by `external_id`.
///
/// Implementations must make `upsert` atomic per key: concurrent upserts
/// of the same `external_id` yield exactly one record.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert or merge-update the record for `changes.external_id`.
    async fn upsert(&self, changes: &UserChanges) -> Result<LocalUserRecord, StoreError>;

    /// Delete by `external_id`. Returns whether a record was removed.
    async fn delete(&self, external_id: &str) -> Result<bool, StoreError>;

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<LocalUserRecord>, StoreError>;
}

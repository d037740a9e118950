// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process user store.

use super::{StoreError, UserStore};
use crate::models::{LocalUserRecord, UserChanges};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

/// User store backed by a `DashMap`.
///
/// The entry API holds the shard lock across find-or-create-then-write,
/// which gives the same one-winner behavior as the unique index in Postgres.
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<DashMap<String, LocalUserRecord>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn upsert(&self, changes: &UserChanges) -> Result<LocalUserRecord, StoreError> {
        let now = Utc::now();

        let record = match self.users.entry(changes.external_id.clone()) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().merge(changes, now);
                entry.get().clone()
            }
            Entry::Vacant(entry) => entry
                .insert(LocalUserRecord::create(Uuid::new_v4(), changes, now))
                .clone(),
        };

        Ok(record)
    }

    async fn delete(&self, external_id: &str) -> Result<bool, StoreError> {
        Ok(self.users.remove(external_id).is_some())
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<LocalUserRecord>, StoreError> {
        Ok(self.users.get(external_id).map(|r| r.value().clone()))
    }
}

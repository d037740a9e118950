// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Postgres user store.
//!
//! Upserts are a single `INSERT ... ON CONFLICT (external_id) DO UPDATE`
//! statement, so a concurrent delivery for the same user resolves at the
//! unique constraint: one insert wins and the other becomes an update.

use super::{StoreError, UserStore};
use crate::models::{LocalUserRecord, PostalAddress, UserChanges};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

// Optional columns keep their stored value when the incoming one is NULL.
// updated_at only moves when the merged row differs from the stored row.
const UPSERT_USER: &str = r#"
INSERT INTO users (
    id, external_id, email, first_name, last_name, avatar_url,
    street, city, state, country, postal_code, created_at, updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
ON CONFLICT (external_id) DO UPDATE SET
    email       = EXCLUDED.email,
    first_name  = COALESCE(EXCLUDED.first_name, users.first_name),
    last_name   = COALESCE(EXCLUDED.last_name, users.last_name),
    avatar_url  = COALESCE(EXCLUDED.avatar_url, users.avatar_url),
    street      = COALESCE(EXCLUDED.street, users.street),
    city        = COALESCE(EXCLUDED.city, users.city),
    state       = COALESCE(EXCLUDED.state, users.state),
    country     = COALESCE(EXCLUDED.country, users.country),
    postal_code = COALESCE(EXCLUDED.postal_code, users.postal_code),
    updated_at  = CASE
        WHEN ROW(
            users.email, users.first_name, users.last_name, users.avatar_url,
            users.street, users.city, users.state, users.country, users.postal_code
        ) IS DISTINCT FROM ROW(
            EXCLUDED.email,
            COALESCE(EXCLUDED.first_name, users.first_name),
            COALESCE(EXCLUDED.last_name, users.last_name),
            COALESCE(EXCLUDED.avatar_url, users.avatar_url),
            COALESCE(EXCLUDED.street, users.street),
            COALESCE(EXCLUDED.city, users.city),
            COALESCE(EXCLUDED.state, users.state),
            COALESCE(EXCLUDED.country, users.country),
            COALESCE(EXCLUDED.postal_code, users.postal_code)
        )
        THEN EXCLUDED.updated_at
        ELSE users.updated_at
    END
RETURNING id, external_id, email, first_name, last_name, avatar_url,
          street, city, state, country, postal_code, created_at, updated_at
"#;

const SELECT_USER: &str = r#"
SELECT id, external_id, email, first_name, last_name, avatar_url,
       street, city, state, country, postal_code, created_at, updated_at
FROM users
WHERE external_id = $1
"#;

const DELETE_USER: &str = "DELETE FROM users WHERE external_id = $1";

/// Postgres-backed user store.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Connect a pool to `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(database_url)
            .await?;

        tracing::info!(max_connections, "Connected to Postgres");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    /// Close the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    external_id: String,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    avatar_url: Option<String>,
    street: Option<String>,
    city: Option<String>,
    state: Option<String>,
    country: Option<String>,
    postal_code: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for LocalUserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            external_id: row.external_id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            avatar_url: row.avatar_url,
            address: PostalAddress {
                street: row.street,
                city: row.city,
                state: row.state,
                country: row.country,
                postal_code: row.postal_code,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn upsert(&self, changes: &UserChanges) -> Result<LocalUserRecord, StoreError> {
        let row: UserRow = sqlx::query_as(UPSERT_USER)
            .bind(Uuid::new_v4())
            .bind(&changes.external_id)
            .bind(&changes.email)
            .bind(&changes.first_name)
            .bind(&changes.last_name)
            .bind(&changes.avatar_url)
            .bind(&changes.address.street)
            .bind(&changes.address.city)
            .bind(&changes.address.state)
            .bind(&changes.address.country)
            .bind(&changes.address.postal_code)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn delete(&self, external_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(DELETE_USER)
            .bind(external_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<LocalUserRecord>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(SELECT_USER)
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }
}

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;

use crate::{
    cache::{CacheError, CacheStore},
    domain::CacheKey,
};

const PURGE_BATCH_SIZE: i64 = 5_000;

/// Durable store on the `geocode_cache` table
#[derive(Clone)]
pub struct PostgresCache {
    pool: PgPool,
}

impl PostgresCache {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Deletes expired rows in batches, returning how many went away
    #[tracing::instrument(name = "cache::purge_expired", skip(self))]
    pub async fn purge_expired(&self) -> Result<u64, CacheError> {
        let mut deleted = 0u64;

        loop {
            let batch: i64 = sqlx::query_scalar(
                r#"
                WITH expired AS (
                    SELECT key
                    FROM geocode_cache
                    WHERE expires_at <= now()
                    LIMIT $1
                ),
                deleted AS (
                    DELETE FROM geocode_cache
                    USING expired
                    WHERE geocode_cache.key = expired.key
                    RETURNING 1
                )
                SELECT COUNT(*)::bigint FROM deleted
                "#,
            )
            .bind(PURGE_BATCH_SIZE)
            .fetch_one(&self.pool)
            .await?;

            deleted += batch as u64;

            if batch < PURGE_BATCH_SIZE {
                break;
            }
        }

        Ok(deleted)
    }
}

#[async_trait]
impl CacheStore for PostgresCache {
    #[tracing::instrument(name = "cache::get", skip(self))]
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
        let value: Option<Vec<u8>> = sqlx::query_scalar(
            r#"
            SELECT value
            FROM geocode_cache
            WHERE key = $1 AND expires_at > now()
            "#,
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(value)
    }

    #[tracing::instrument(name = "cache::put", skip(self, value))]
    async fn put(&self, key: &CacheKey, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let ttl = time::Duration::try_from(ttl).context("TTL does not fit a timestamp offset")?;
        let expires_at = OffsetDateTime::now_utc() + ttl;

        sqlx::query(
            r#"
            INSERT INTO geocode_cache (key, value, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value, expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(key.as_str())
        .bind(value)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

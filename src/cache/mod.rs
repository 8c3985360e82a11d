use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::CacheKey;

mod memory;
mod postgres;

pub use memory::MemoryCache;
pub use postgres::PostgresCache;

/// Every entry lives for 30 days, refreshes included
pub const CACHE_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 30);

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("database error {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Durable key-value store with per-entry expiry.
///
/// Expired entries must read as absent. A `put` on an existing key replaces
/// the value and restarts its expiry window.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError>;

    async fn put(&self, key: &CacheKey, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;
}

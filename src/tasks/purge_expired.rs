use std::time::Instant;

use anyhow::Result;

use crate::cache::PostgresCache;

pub async fn purge_expired_task(cache: PostgresCache) -> Result<()> {
    tracing::info!("Running expired cache purge...");

    let start = Instant::now();
    let deleted = cache.purge_expired().await?;

    if deleted > 0 {
        tracing::info!(
            "Deleted {} expired entries in {} ms",
            deleted,
            start.elapsed().as_millis()
        );
    } else {
        tracing::info!("Nothing to delete");
    }

    Ok(())
}

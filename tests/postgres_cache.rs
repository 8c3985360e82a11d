//! Needs a reachable Postgres in `DATABASE_URL`; run with `cargo test -- --ignored`.

use std::time::Duration;

use sqlx::PgPool;

use geocache::{
    cache::{CacheStore, PostgresCache},
    domain::Query,
};

fn key(query: &str) -> geocache::domain::CacheKey {
    Query::parse(query).unwrap().cache_key()
}

#[sqlx::test]
#[ignore]
async fn put_then_get(pool: PgPool) {
    let cache = PostgresCache::new(pool);
    let key = key("Tokyo");

    assert_eq!(cache.get(&key).await.unwrap(), None);

    cache
        .put(&key, b"first".to_vec(), Duration::from_secs(60))
        .await
        .unwrap();
    assert_eq!(cache.get(&key).await.unwrap().as_deref(), Some(&b"first"[..]));

    // upsert replaces the value
    cache
        .put(&key, b"second".to_vec(), Duration::from_secs(60))
        .await
        .unwrap();
    assert_eq!(cache.get(&key).await.unwrap().as_deref(), Some(&b"second"[..]));
}

#[sqlx::test]
#[ignore]
async fn expired_rows_are_invisible_and_purged(pool: PgPool) {
    let cache = PostgresCache::new(pool);
    let stale = key("Osaka");
    let fresh = key("Kyoto");

    cache.put(&stale, b"stale".to_vec(), Duration::ZERO).await.unwrap();
    cache
        .put(&fresh, b"fresh".to_vec(), Duration::from_secs(60))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(cache.get(&stale).await.unwrap(), None);
    assert!(cache.get(&fresh).await.unwrap().is_some());

    assert_eq!(cache.purge_expired().await.unwrap(), 1);
    assert_eq!(cache.purge_expired().await.unwrap(), 0);
    assert!(cache.get(&fresh).await.unwrap().is_some());
}

#[sqlx::test]
#[ignore]
async fn overwrite_extends_expiry(pool: PgPool) {
    let cache = PostgresCache::new(pool);
    let key = key("Nagoya");

    cache.put(&key, b"old".to_vec(), Duration::ZERO).await.unwrap();
    cache
        .put(&key, b"new".to_vec(), Duration::from_secs(60))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(cache.get(&key).await.unwrap().as_deref(), Some(&b"new"[..]));
    assert_eq!(cache.purge_expired().await.unwrap(), 0);
}

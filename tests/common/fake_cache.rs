use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use anyhow::anyhow;
use async_trait::async_trait;
use geocache::{
    cache::{CacheError, CacheStore},
    domain::CacheKey,
};

/// HashMap-backed store that remembers the TTL of every write
#[derive(Default)]
pub struct FakeCache {
    data: Mutex<HashMap<String, (Vec<u8>, Duration)>>,
    puts: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FakeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_raw(&self, key: &str, value: &[u8]) {
        self.data
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_vec(), Duration::from_secs(60)));
    }

    pub fn value(&self, key: &str) -> Option<serde_json::Value> {
        let data = self.data.lock().unwrap();
        data.get(key)
            .map(|(bytes, _)| serde_json::from_slice(bytes).unwrap())
    }

    pub fn ttl(&self, key: &str) -> Option<Duration> {
        self.data.lock().unwrap().get(key).map(|(_, ttl)| *ttl)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.lock().unwrap().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.data.lock().unwrap().len()
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CacheStore for FakeCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(anyhow!("Simulated read failure").into());
        }

        let data = self.data.lock().unwrap();
        Ok(data.get(key.as_str()).map(|(bytes, _)| bytes.clone()))
    }

    async fn put(&self, key: &CacheKey, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("Simulated write failure").into());
        }

        self.puts.fetch_add(1, Ordering::SeqCst);
        self.data
            .lock()
            .unwrap()
            .insert(key.as_str().to_string(), (value, ttl));
        Ok(())
    }
}

use std::{sync::Arc, time::Duration};

use anyhow::Context;

use crate::{
    cache::{CACHE_TTL, CacheStore},
    domain::{CacheKey, GeocodeResult, Query},
    provider::{GeoProvider, ProviderError},
    services::{KeyLocks, Lookup, LookupError, LookupObserver, LookupOutcome, NoopObserver},
};

pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Cache-aside geocoding.
///
/// Reads go to the cache store first and fall back to the provider on a
/// miss; a successful provider answer is written back with [`CACHE_TTL`].
/// A cache entry that can't be decoded is reported as an internal error,
/// never treated as a miss.
pub struct GeocodeService {
    cache: Arc<dyn CacheStore>,
    provider: Arc<dyn GeoProvider>,
    observer: Arc<dyn LookupObserver>,
    provider_timeout: Duration,
    key_locks: Option<KeyLocks>,
}

impl GeocodeService {
    pub fn new(cache: Arc<dyn CacheStore>, provider: Arc<dyn GeoProvider>) -> Self {
        Self {
            cache,
            provider,
            observer: Arc::new(NoopObserver),
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
            key_locks: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn LookupObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    /// Collapse concurrent misses on the same key into a single provider call
    pub fn with_miss_coalescing(mut self, enabled: bool) -> Self {
        self.key_locks = enabled.then(KeyLocks::new);
        self
    }

    #[tracing::instrument(name = "services::lookup", skip(self))]
    pub async fn lookup(&self, query: &str) -> LookupOutcome {
        let outcome = self.cached_lookup(query).await;
        self.observe(outcome)
    }

    /// Re-fetches from the provider regardless of the cache, overwriting the
    /// entry (and restarting its expiry) on success
    #[tracing::instrument(name = "services::refresh", skip(self))]
    pub async fn refresh(&self, query: &str) -> LookupOutcome {
        let outcome = match Query::parse(query) {
            Ok(query) => {
                let key = query.cache_key();
                self.fetch_and_store(&query, &key).await
            }
            Err(e) => Err(e.into()),
        };
        self.observe(outcome)
    }

    /// Same cache semantics as [`Self::lookup`]; the caller renders the
    /// coordinates as plain text
    #[tracing::instrument(name = "services::plain", skip(self))]
    pub async fn plain(&self, query: &str) -> LookupOutcome {
        let outcome = self.cached_lookup(query).await;
        self.observe(outcome)
    }

    fn observe(&self, outcome: LookupOutcome) -> LookupOutcome {
        if let Err(e) = &outcome {
            self.observer.failure(e);
        }
        outcome
    }

    async fn cached_lookup(&self, query: &str) -> LookupOutcome {
        let query = Query::parse(query)?;
        let key = query.cache_key();

        if let Some(hit) = self.read_cache(&key).await? {
            return Ok(hit);
        }

        let Some(locks) = &self.key_locks else {
            self.observer.cache_miss(&key);
            return self.fetch_and_store(&query, &key).await;
        };

        let _guard = locks.lock(&key).await;

        // whoever held the lock before us may have filled the entry;
        // a request is counted as one hit or one miss, never both
        if let Some(hit) = self.read_cache(&key).await? {
            return Ok(hit);
        }
        self.observer.cache_miss(&key);

        self.fetch_and_store(&query, &key).await
    }

    async fn read_cache(&self, key: &CacheKey) -> Result<Option<Lookup>, LookupError> {
        let bytes = self
            .cache
            .get(key)
            .await
            .map_err(|e| LookupError::Internal(e.into()))?;

        let Some(bytes) = bytes else {
            return Ok(None);
        };

        let result: GeocodeResult = serde_json::from_slice(&bytes)
            .with_context(|| format!("corrupt cache entry for {key}"))
            .map_err(LookupError::Internal)?;

        self.observer.cache_hit(key);

        Ok(Some(Lookup {
            result,
            from_cache: true,
        }))
    }

    async fn fetch_and_store(&self, query: &Query, key: &CacheKey) -> LookupOutcome {
        let response = tokio::time::timeout(
            self.provider_timeout,
            self.provider.geocode(query.as_str()),
        )
        .await
        .map_err(|_| ProviderError::Timeout(self.provider_timeout.as_millis()))??;

        self.observer.provider_response(query, &response);

        let Some(best) = response.best_match() else {
            return Err(LookupError::NotFound {
                status: response.status.clone(),
                message: response.error_message.clone(),
            });
        };

        let result = GeocodeResult::new(best.formatted_address.clone(), best.lat, best.lng)
            .map_err(|e| ProviderError::InvalidMatch(e.to_string()))?;

        let bytes = serde_json::to_vec(&result)
            .context("failed to serialize geocode result")
            .map_err(LookupError::Internal)?;

        self.cache
            .put(key, bytes, CACHE_TTL)
            .await
            .map_err(|e| LookupError::Internal(e.into()))?;

        Ok(Lookup {
            result,
            from_cache: false,
        })
    }
}

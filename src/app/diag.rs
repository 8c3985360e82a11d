use std::sync::atomic::{AtomicU64, Ordering};

use crate::{
    domain::{CacheKey, Query},
    provider::ProviderResponse,
    services::{FailureKind, LookupError, LookupObserver},
};

/// Process-wide lookup counters
#[derive(Default)]
pub struct Diag {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    provider_calls: AtomicU64,
    failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub provider_calls: u64,
    pub failures: u64,
}

impl Diag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> DiagSnapshot {
        DiagSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            provider_calls: self.provider_calls.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

impl DiagSnapshot {
    /// share of cache reads that were hits, 0 when nothing was read yet
    pub fn hit_ratio(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}

impl LookupObserver for Diag {
    fn cache_hit(&self, key: &CacheKey) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(%key, "cache hit");
    }

    fn cache_miss(&self, key: &CacheKey) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(%key, "cache miss");
    }

    fn provider_response(&self, query: &Query, response: &ProviderResponse) {
        self.provider_calls.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            %query,
            status = %response.status,
            results = response.results.len(),
            error_message = ?response.error_message,
            first = ?response.results.first(),
            "provider response"
        );
    }

    fn failure(&self, error: &LookupError) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        match error.kind() {
            FailureKind::InvalidInput => tracing::debug!(error = %error, "lookup rejected"),
            FailureKind::NotFound => tracing::info!(error = %error, "lookup found nothing"),
            FailureKind::ProviderError | FailureKind::Internal => {
                tracing::error!(error = %error, "lookup failed")
            }
        }
    }
}

use crate::{
    domain::{CacheKey, Query},
    provider::ProviderResponse,
    services::LookupError,
};

/// Hooks the geocode service calls while it works a request.
///
/// Every method defaults to doing nothing.
pub trait LookupObserver: Send + Sync {
    fn cache_hit(&self, _key: &CacheKey) {}

    fn cache_miss(&self, _key: &CacheKey) {}

    fn provider_response(&self, _query: &Query, _response: &ProviderResponse) {}

    fn failure(&self, _error: &LookupError) {}
}

pub struct NoopObserver;

impl LookupObserver for NoopObserver {}

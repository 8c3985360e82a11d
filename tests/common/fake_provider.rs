use std::{
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use geocache::provider::{Candidate, GeoProvider, ProviderError, ProviderResponse};

/// Deterministic provider: answers every query with the configured reply
pub struct FakeProvider {
    reply: Mutex<Result<ProviderResponse, String>>,
    delay: Duration,
    calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl FakeProvider {
    fn with_reply(reply: Result<ProviderResponse, String>) -> Self {
        Self {
            reply: Mutex::new(reply),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn found(address: &str, lat: f64, lng: f64) -> Self {
        Self::with_reply(Ok(ok_response(&[(address, lat, lng)])))
    }

    pub fn found_many(matches: &[(&str, f64, f64)]) -> Self {
        Self::with_reply(Ok(ok_response(matches)))
    }

    pub fn status(status: &str, error_message: Option<&str>) -> Self {
        Self::with_reply(Ok(ProviderResponse {
            status: status.to_string(),
            results: Vec::new(),
            error_message: error_message.map(str::to_string),
        }))
    }

    pub fn failing(message: &str) -> Self {
        Self::with_reply(Err(message.to_string()))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set_found(&self, address: &str, lat: f64, lng: f64) {
        *self.reply.lock().unwrap() = Ok(ok_response(&[(address, lat, lng)]));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

fn ok_response(matches: &[(&str, f64, f64)]) -> ProviderResponse {
    ProviderResponse {
        status: "OK".to_string(),
        results: matches
            .iter()
            .map(|(address, lat, lng)| Candidate {
                formatted_address: address.to_string(),
                lat: *lat,
                lng: *lng,
            })
            .collect(),
        error_message: None,
    }
}

#[async_trait]
impl GeoProvider for FakeProvider {
    async fn geocode(&self, query: &str) -> Result<ProviderResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let reply = self.reply.lock().unwrap().clone();
        reply.map_err(ProviderError::Transport)
    }
}

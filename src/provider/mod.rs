use async_trait::async_trait;
use thiserror::Error;

mod google;

pub use google::{DEFAULT_BASE_URL, GoogleGeocoder};

/// Status the provider reports for a usable answer
pub const STATUS_OK: &str = "OK";

/// One match as reported by the provider
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub formatted_address: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    pub status: String,
    pub results: Vec<Candidate>,
    pub error_message: Option<String>,
}

impl ProviderResponse {
    /// Best match, if the provider considered the lookup successful
    pub fn best_match(&self) -> Option<&Candidate> {
        if self.status != STATUS_OK {
            return None;
        }
        self.results.first()
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("provider answered with HTTP {0}")]
    Http(u16),
    #[error("could not decode the provider response: {0}")]
    Decode(String),
    #[error("no answer within {0} ms")]
    Timeout(u128),
    #[error("provider returned an unusable match: {0}")]
    InvalidMatch(String),
}

/// Forward geocoding capability
#[async_trait]
pub trait GeoProvider: Send + Sync {
    async fn geocode(&self, query: &str) -> Result<ProviderResponse, ProviderError>;
}

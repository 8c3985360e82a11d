use thiserror::Error;

use crate::{
    domain::{GeocodeResult, QueryParseError},
    provider::ProviderError,
};

mod coalesce;
mod geocode;
mod observer;

pub use coalesce::KeyLocks;
pub use geocode::{DEFAULT_PROVIDER_TIMEOUT, GeocodeService};
pub use observer::{LookupObserver, NoopObserver};

/// A successful lookup
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub result: GeocodeResult,
    /// served from the cache store without calling the provider
    pub from_cache: bool,
}

pub type LookupOutcome = Result<Lookup, LookupError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InvalidInput,
    NotFound,
    ProviderError,
    Internal,
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error(transparent)]
    InvalidInput(#[from] QueryParseError),
    #[error(
        "address not found: {status}{}",
        .message.as_ref().map(|m| format!(" - {m}")).unwrap_or_default()
    )]
    NotFound {
        status: String,
        message: Option<String>,
    },
    #[error("geocoding provider request failed: {0}")]
    Provider(#[from] ProviderError),
    #[error("an error occurred: {0:#}")]
    Internal(anyhow::Error),
}

impl LookupError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidInput(_) => FailureKind::InvalidInput,
            Self::NotFound { .. } => FailureKind::NotFound,
            Self::Provider(_) => FailureKind::ProviderError,
            Self::Internal(_) => FailureKind::Internal,
        }
    }
}

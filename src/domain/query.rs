use std::fmt;

use thiserror::Error;

const CACHE_KEY_PREFIX: &str = "geocode:";

/// Free-text place name as supplied by the caller.
///
/// The raw value is kept byte-for-byte: no trimming, no case folding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query(String);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum QueryParseError {
    #[error("address is not specified")]
    Empty,
    #[error("address must not contain NUL characters")]
    ContainsNul,
}

/// Key under which a query's result lives in the cache store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl Query {
    pub fn parse(input: &str) -> Result<Self, QueryParseError> {
        Self::try_from(input.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey(format!("{CACHE_KEY_PREFIX}{}", self.0))
    }
}

impl TryFrom<String> for Query {
    type Error = QueryParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().is_empty() {
            return Err(QueryParseError::Empty);
        }
        // not storable in a Postgres TEXT key
        if value.contains('\0') {
            return Err(QueryParseError::ContainsNul);
        }
        Ok(Self(value))
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

mod geocode;
mod query;

pub use geocode::{CoordinateError, GeocodeResult};
pub use query::{CacheKey, Query, QueryParseError};

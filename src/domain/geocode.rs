use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum CoordinateError {
    #[error("coordinates must be finite numbers")]
    NotFinite,
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("formatted value `{0}` does not match the coordinates")]
    FormattedMismatch(String),
}

/// Normalized answer for a single query.
///
/// `formatted` is derived from the coordinates when the value is built and
/// can't be set on its own. The serialized form doubles as the cache value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredResult")]
pub struct GeocodeResult {
    address: String,
    latitude: f64,
    longitude: f64,
    formatted: String,
}

#[derive(Deserialize)]
struct StoredResult {
    address: String,
    latitude: f64,
    longitude: f64,
    formatted: String,
}

impl GeocodeResult {
    pub fn new(
        address: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(CoordinateError::NotFinite);
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(longitude));
        }

        let formatted = format!(
            "{}, {}",
            render_coordinate(latitude),
            render_coordinate(longitude)
        );

        Ok(Self {
            address: address.into(),
            latitude,
            longitude,
            formatted,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// `"<lat>, <lng>"`
    pub fn formatted(&self) -> &str {
        &self.formatted
    }
}

impl TryFrom<StoredResult> for GeocodeResult {
    type Error = CoordinateError;

    fn try_from(stored: StoredResult) -> Result<Self, Self::Error> {
        let result = Self::new(stored.address, stored.latitude, stored.longitude)?;
        if result.formatted != stored.formatted {
            return Err(CoordinateError::FormattedMismatch(stored.formatted));
        }
        Ok(result)
    }
}

// Same digits serde_json emits for the number fields, so the text form and
// the JSON form never disagree (e.g. `35.0`, not `35`).
fn render_coordinate(value: f64) -> String {
    serde_json::Number::from_f64(value)
        .map(|n| n.to_string())
        .unwrap_or_else(|| value.to_string())
}

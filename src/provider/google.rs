use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::provider::{Candidate, GeoProvider, ProviderError, ProviderResponse};

pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

const REDACTED: &str = "API_KEY_HIDDEN";

/// Client for the Google Maps Geocoding JSON API
pub struct GoogleGeocoder {
    client: Client,
    base_url: Url,
    api_key: String,
    language: Option<String>,
}

#[derive(Deserialize)]
struct GeocodeBody {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeEntry>,
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct GeocodeEntry {
    formatted_address: String,
    geometry: Geometry,
}

#[derive(Deserialize)]
struct Geometry {
    location: Location,
}

#[derive(Deserialize)]
struct Location {
    lat: f64,
    lng: f64,
}

impl GoogleGeocoder {
    pub fn new(
        base_url: Url,
        api_key: impl Into<String>,
        language: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
            language,
        })
    }

    fn request_url(&self, query: &str, key: &str) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("address", query).append_pair("key", key);
            if let Some(language) = &self.language {
                pairs.append_pair("language", language);
            }
        }
        url
    }
}

fn decode(body: &[u8]) -> Result<ProviderResponse, ProviderError> {
    let body: GeocodeBody =
        serde_json::from_slice(body).map_err(|e| ProviderError::Decode(e.to_string()))?;

    Ok(ProviderResponse {
        status: body.status,
        results: body
            .results
            .into_iter()
            .map(|entry| Candidate {
                formatted_address: entry.formatted_address,
                lat: entry.geometry.location.lat,
                lng: entry.geometry.location.lng,
            })
            .collect(),
        error_message: body.error_message,
    })
}

#[async_trait]
impl GeoProvider for GoogleGeocoder {
    #[tracing::instrument(name = "provider::geocode", skip(self))]
    async fn geocode(&self, query: &str) -> Result<ProviderResponse, ProviderError> {
        tracing::debug!(url = %self.request_url(query, REDACTED), "requesting geocode");

        let response = self
            .client
            .get(self.request_url(query, &self.api_key))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Transport("request timed out".to_string())
                } else {
                    // reqwest errors may carry the full URL, key included
                    ProviderError::Transport(e.without_url().to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Http(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Transport(e.without_url().to_string()))?;

        decode(&bytes)
    }
}

impl std::fmt::Debug for GoogleGeocoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleGeocoder")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"[REDACTED]")
            .field("language", &self.language)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn geocoder(language: Option<&str>) -> GoogleGeocoder {
        GoogleGeocoder::new(
            Url::parse(DEFAULT_BASE_URL).unwrap(),
            "secret",
            language.map(str::to_string),
            Duration::from_secs(1),
        )
        .unwrap()
    }

    #[test]
    fn request_url_encodes_query() {
        let url = geocoder(Some("ja")).request_url("Shibuya, Tokyo & more", "secret");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert_eq!(
            pairs,
            vec![
                ("address".to_string(), "Shibuya, Tokyo & more".to_string()),
                ("key".to_string(), "secret".to_string()),
                ("language".to_string(), "ja".to_string()),
            ]
        );
        assert!(url.as_str().starts_with(DEFAULT_BASE_URL));
    }

    #[test]
    fn request_url_without_language() {
        let url = geocoder(None).request_url("Tokyo", REDACTED);
        assert!(!url.as_str().contains("language="));
        assert!(url.as_str().contains("key=API_KEY_HIDDEN"));
    }

    #[test]
    fn debug_hides_api_key() {
        let printed = format!("{:?}", geocoder(None));
        assert!(!printed.contains("secret"));
    }

    #[test]
    fn decode_ok_response() {
        let body = br#"{
            "status": "OK",
            "results": [
                {
                    "formatted_address": "Shibuya, Tokyo, Japan",
                    "geometry": { "location": { "lat": 35.6595, "lng": 139.7005 } },
                    "place_id": "ignored"
                },
                {
                    "formatted_address": "Shibuya Station, Tokyo, Japan",
                    "geometry": { "location": { "lat": 35.658, "lng": 139.7016 } }
                }
            ]
        }"#;

        let res = decode(body).unwrap();
        assert_eq!(res.status, "OK");
        assert_eq!(res.results.len(), 2);
        assert_eq!(
            res.results[0],
            Candidate {
                formatted_address: "Shibuya, Tokyo, Japan".to_string(),
                lat: 35.6595,
                lng: 139.7005,
            }
        );
        assert_eq!(res.error_message, None);
    }

    #[test]
    fn decode_error_response_without_results() {
        let body = br#"{
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid."
        }"#;

        let res = decode(body).unwrap();
        assert_eq!(res.status, "REQUEST_DENIED");
        assert!(res.results.is_empty());
        assert_eq!(
            res.error_message.as_deref(),
            Some("The provided API key is invalid.")
        );
    }

    #[test]
    fn decode_garbage() {
        assert!(matches!(decode(b"<html>"), Err(ProviderError::Decode(_))));
        assert!(matches!(
            decode(br#"{"results": []}"#),
            Err(ProviderError::Decode(_))
        ));
    }
}

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{
    domain::GeocodeResult,
    services::{FailureKind, LookupOutcome},
};

/// JSON body shared by the lookup and refresh endpoints
#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<GeocodeResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_cache: Option<bool>,
}

pub fn to_json(outcome: &LookupOutcome) -> GeocodeResponse {
    match outcome {
        Ok(lookup) => GeocodeResponse {
            success: true,
            data: Some(lookup.result.clone()),
            error: None,
            from_cache: Some(lookup.from_cache),
        },
        Err(e) => GeocodeResponse {
            success: false,
            data: None,
            error: Some(e.to_string()),
            from_cache: None,
        },
    }
}

/// The bare `"<lat>, <lng>"` on success
pub fn to_plain_text(outcome: &LookupOutcome) -> String {
    match outcome {
        Ok(lookup) => lookup.result.formatted().to_string(),
        Err(e) => format!("Error: {e}"),
    }
}

pub fn status_code(outcome: &LookupOutcome) -> StatusCode {
    match outcome {
        Ok(_) => StatusCode::OK,
        Err(e) => match e.kind() {
            FailureKind::InvalidInput => StatusCode::BAD_REQUEST,
            FailureKind::NotFound => StatusCode::NOT_FOUND,
            FailureKind::ProviderError | FailureKind::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        },
    }
}

pub struct JsonReply(pub LookupOutcome);

impl IntoResponse for JsonReply {
    fn into_response(self) -> Response {
        (status_code(&self.0), Json(to_json(&self.0))).into_response()
    }
}

pub struct PlainReply(pub LookupOutcome);

impl IntoResponse for PlainReply {
    fn into_response(self) -> Response {
        (status_code(&self.0), to_plain_text(&self.0)).into_response()
    }
}

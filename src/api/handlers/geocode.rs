use axum::extract::{RawQuery, State};
use url::form_urlencoded;

use crate::{
    api::response::{JsonReply, PlainReply},
    app::AppState,
};

/// First `address` value of the query string, empty when absent.
///
/// Repeated keys, unknown keys and bad percent-escapes never reject the
/// request; validation is left to the service so every mode answers in its
/// own format.
pub fn address_param(raw_query: Option<&str>) -> String {
    raw_query
        .and_then(|raw| {
            form_urlencoded::parse(raw.as_bytes())
                .find(|(key, _)| key == "address")
                .map(|(_, value)| value.into_owned())
        })
        .unwrap_or_default()
}

/// GET /api/geocode?address=...: cached lookup, JSON
pub async fn geocode(State(app): State<AppState>, RawQuery(raw): RawQuery) -> JsonReply {
    let address = address_param(raw.as_deref());
    JsonReply(app.geocoder.lookup(&address).await)
}

/// GET /api/geocode/refresh?address=...: bypasses the cache read, JSON
pub async fn refresh(State(app): State<AppState>, RawQuery(raw): RawQuery) -> JsonReply {
    let address = address_param(raw.as_deref());
    JsonReply(app.geocoder.refresh(&address).await)
}

/// GET /api/geocode/plain?address=...: cached lookup, `"<lat>, <lng>"` as text
pub async fn plain(State(app): State<AppState>, RawQuery(raw): RawQuery) -> PlainReply {
    let address = address_param(raw.as_deref());
    PlainReply(app.geocoder.plain(&address).await)
}

pub async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn first_address_wins() {
        let cases = [
            (None, ""),
            (Some(""), ""),
            (Some("other=1"), ""),
            (Some("address="), ""),
            (Some("address=Tokyo"), "Tokyo"),
            (Some("address=Tokyo&address=Osaka"), "Tokyo"),
            (Some("x=1&address=Shibuya%2C%20Tokyo&address="), "Shibuya, Tokyo"),
            (Some("address=Kyoto+Station"), "Kyoto Station"),
            (Some("address=%E6%9D%B1%E4%BA%AC"), "東京"),
        ];

        for (raw, expected) in cases {
            assert_eq!(address_param(raw), expected, "{raw:?}");
        }
    }

    #[test]
    fn malformed_escapes_are_kept_verbatim() {
        assert_eq!(address_param(Some("address=100%")), "100%");
        assert_eq!(address_param(Some("address=%zzTokyo")), "%zzTokyo");
    }
}

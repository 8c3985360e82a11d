use axum::{Router, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{api::handlers, app::AppState};

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/geocode", get(handlers::geocode))
        .route("/geocode/refresh", get(handlers::refresh))
        .route("/geocode/plain", get(handlers::plain));

    Router::new()
        .nest("/api", api)
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

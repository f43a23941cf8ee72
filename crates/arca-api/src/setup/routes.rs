//! Route configuration and setup

use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

const API_PREFIX: &str = "/api/v0";

/// Multipart framing adds headers and boundaries on top of the file bytes.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    let body_limit = state.config.max_file_size_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route(
            &format!("{API_PREFIX}/assets"),
            post(handlers::assets::upload_asset).get(handlers::assets::list_assets),
        )
        .route(
            &format!("{API_PREFIX}/assets/{{id}}"),
            get(handlers::assets::get_asset).delete(handlers::assets::delete_asset),
        )
        .route("/health", get(handlers::health::health))
        .route("/live", get(handlers::health::liveness))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

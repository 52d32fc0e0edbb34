//! Sitrep server library logic.

pub mod api_reports;
pub mod api_session;
pub mod api_sse;
pub mod background;
pub mod config;
pub mod middleware;

use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Extension, Json, Router,
};
use serde_json::{json, Value};
use sitrep_db::DbPool;
use sitrep_store::RecordStore;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Maximum request body size (64 KiB). Incident reports are small; anything
/// larger is rejected before it reaches a handler.
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (auth lookups, migrations).
    pub pool: DbPool,
    /// The incident record store and its change-notification bus.
    pub store: RecordStore,
    /// Lifetime of issued session tokens, in minutes.
    pub session_ttl_minutes: u32,
}

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route(
            "/api/reports",
            get(api_reports::list_reports_handler).post(api_reports::submit_report_handler),
        )
        .route(
            "/api/units/{unitName}/reports",
            get(api_reports::unit_reports_handler),
        )
        .route("/events/reports", get(api_sse::global_feed_stream_handler))
        .route(
            "/events/units/{unitName}",
            get(api_sse::unit_feed_stream_handler),
        )
        .layer(axum::middleware::from_fn(middleware::auth_middleware));

    Router::new()
        .route("/health", get(health))
        .route(
            "/api/session",
            axum::routing::post(api_session::sign_in_handler)
                .delete(api_session::sign_out_handler),
        )
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}

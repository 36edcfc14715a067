//! Axum router construction for the capture API.
//!
//! Assembles all routes into a single [`Router`] with CORS enabled for the
//! browser-based collection UI, request tracing, and a body size limit.

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Largest accepted request body (1 MiB).
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Build the complete Axum router for the capture API.
///
/// The router includes:
/// - `GET /health` -- liveness probe
/// - `GET /api/captured` -- list the collection
/// - `POST /api/captured` -- capture
/// - `DELETE /api/captured/{id}` -- release
///
/// Unknown routes get a JSON 404. CORS allows any origin; the service
/// has no authentication.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/captured",
            get(handlers::list_captured).post(handlers::capture),
        )
        .route("/api/captured/{id}", delete(handlers::release))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

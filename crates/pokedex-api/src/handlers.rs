//! REST API endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/health` | Liveness probe |
//! | `GET` | `/api/captured` | List the collection, newest first |
//! | `POST` | `/api/captured` | Capture a creature (idempotent) |
//! | `DELETE` | `/api/captured/{id}` | Release a creature |

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use pokedex_core::{CaptureOutcome, parse_path_id};
use pokedex_types::{
    CaptureResponse, CaptureStatus, CapturedRecord, HealthResponse, ReleaseResponse, ReleaseStatus,
};
use serde_json::Value;

use crate::error::{ApiError, UNKNOWN_ROUTE};
use crate::state::AppState;

/// Client-facing message when listing fails.
const LIST_FAILED: &str = "Failed to fetch captured Pokémon.";

/// Client-facing message when capturing fails.
const CAPTURE_FAILED: &str = "Failed to capture Pokémon.";

/// Client-facing message when releasing fails.
const RELEASE_FAILED: &str = "Failed to release Pokémon.";

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Liveness probe. Does not touch the store.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

// ---------------------------------------------------------------------------
// GET /api/captured
// ---------------------------------------------------------------------------

/// List every captured record, most recent first. Each entry is the
/// stored payload with `captured_at` merged in.
pub async fn list_captured(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CapturedRecord>>, ApiError> {
    let records = state
        .engine
        .list()
        .await
        .map_err(|e| ApiError::from_capture(e, LIST_FAILED))?;

    Ok(Json(records))
}

// ---------------------------------------------------------------------------
// POST /api/captured
// ---------------------------------------------------------------------------

/// Capture a creature.
///
/// Responds `201 captured` when this request created the record and
/// `200 already_captured` (with the original `captured_at`) when the id
/// was already in the collection.
pub async fn capture(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<CaptureResponse>), ApiError> {
    let Json(body) = payload.map_err(|rejection| ApiError::from_json_rejection(&rejection))?;

    let outcome = state
        .engine
        .capture(body)
        .await
        .map_err(|e| ApiError::from_capture(e, CAPTURE_FAILED))?;

    let (status, response) = match outcome {
        CaptureOutcome::Captured(record) => (
            StatusCode::CREATED,
            CaptureResponse {
                status: CaptureStatus::Captured,
                pokemon: record.pokemon,
                captured_at: None,
            },
        ),
        CaptureOutcome::AlreadyCaptured(record) => (
            StatusCode::OK,
            CaptureResponse {
                status: CaptureStatus::AlreadyCaptured,
                pokemon: record.pokemon,
                captured_at: Some(record.captured_at),
            },
        ),
    };

    Ok((status, Json(response)))
}

// ---------------------------------------------------------------------------
// DELETE /api/captured/{id}
// ---------------------------------------------------------------------------

/// Release a creature. The id is validated before the engine is called.
pub async fn release(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<ReleaseResponse>, ApiError> {
    let Path(raw) = path.map_err(|rejection| ApiError::from_path_rejection(&rejection))?;
    let id = parse_path_id(&raw)?;

    let removed = state
        .engine
        .release(id)
        .await
        .map_err(|e| ApiError::from_capture(e, RELEASE_FAILED))?;

    Ok(Json(ReleaseResponse {
        status: ReleaseStatus::Released,
        pokemon: removed.pokemon,
    }))
}

// ---------------------------------------------------------------------------
// Fallback
// ---------------------------------------------------------------------------

/// JSON 404 for unknown routes.
pub async fn not_found() -> ApiError {
    ApiError::NotFound(UNKNOWN_ROUTE.to_owned())
}

//! Error types for the API layer.
//!
//! [`ApiError`] unifies all failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`] implementation. Store faults are logged where they
//! are mapped and reach the client only as a generic message.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use pokedex_core::validation::{INVALID_ID, INVALID_PAYLOAD};
use pokedex_core::{CaptureError, ValidationError};
use pokedex_types::{ErrorDetails, ErrorResponse};

/// Message for a release of an id that is not in the collection.
pub const NOT_FOUND: &str = "Pokémon not found.";

/// Message for a conflict that could not be read back.
pub const RECONCILIATION_MISS: &str =
    "Pokémon already existed but could not be retrieved. Please retry.";

/// Message for an oversized request body.
pub const PAYLOAD_TOO_LARGE: &str = "Request body is too large.";

/// Message for requests to unknown routes.
pub const UNKNOWN_ROUTE: &str = "Route not found.";

/// Seconds a client should wait before retrying a transient failure.
const RETRY_AFTER_SECS: u32 = 1;

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request was malformed.
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    /// No record exists for the requested id.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request body exceeded the size limit.
    #[error("payload too large")]
    PayloadTooLarge,

    /// A transient condition; the same request should be retried.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// An internal error occurred. The message is safe to show.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Map an engine failure, using `context` as the client-facing
    /// message for internal errors.
    pub fn from_capture(error: CaptureError, context: &str) -> Self {
        match error {
            CaptureError::Validation(e) => Self::Validation(e),
            CaptureError::NotFound(_) => Self::NotFound(NOT_FOUND.to_owned()),
            CaptureError::ReconciliationMiss(id) => {
                tracing::warn!(pokemon_id = %id, "Reporting reconciliation miss as retryable");
                Self::Unavailable(RECONCILIATION_MISS.to_owned())
            }
            CaptureError::Store(fault) => {
                tracing::error!(
                    operation = fault.operation,
                    error = %fault,
                    "{context}"
                );
                Self::Internal(context.to_owned())
            }
        }
    }

    /// Map a body that could not be read as JSON.
    pub fn from_json_rejection(rejection: &JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::PayloadTooLarge;
        }
        Self::Validation(ValidationError {
            message: INVALID_PAYLOAD.to_owned(),
            field_errors: [("body".to_owned(), vec![rejection.body_text()])]
                .into_iter()
                .collect(),
        })
    }

    /// Map a path segment that could not be extracted.
    pub fn from_path_rejection(rejection: &PathRejection) -> Self {
        Self::Validation(ValidationError {
            message: INVALID_ID.to_owned(),
            field_errors: [("id".to_owned(), vec![rejection.body_text()])]
                .into_iter()
                .collect(),
        })
    }

    /// The HTTP status code for this error.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let retryable = matches!(self, Self::Unavailable(_));

        let body = match self {
            Self::Validation(e) => ErrorResponse {
                details: Some(ErrorDetails {
                    field_errors: e.field_errors,
                }),
                ..ErrorResponse::new(e.message)
            },
            Self::PayloadTooLarge => ErrorResponse::new(PAYLOAD_TOO_LARGE),
            Self::NotFound(msg) | Self::Unavailable(msg) | Self::Internal(msg) => {
                ErrorResponse::new(msg)
            }
        };

        let mut response = (status, Json(body)).into_response();
        if retryable {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(RETRY_AFTER_SECS));
        }
        response
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use pokedex_core::StoreFault;
    use pokedex_types::PokemonId;

    use super::*;

    #[test]
    fn engine_errors_map_to_statuses() {
        let id = PokemonId::new(25).unwrap();
        let cases = [
            (CaptureError::NotFound(id), StatusCode::NOT_FOUND),
            (
                CaptureError::ReconciliationMiss(id),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                CaptureError::Store(StoreFault::new("insert", "connection reset")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(ApiError::from_capture(error, "boom").status(), expected);
        }
    }

    #[test]
    fn internal_message_hides_the_fault() {
        let fault = StoreFault::new("list_all", "password authentication failed for user");
        let error = ApiError::from_capture(CaptureError::Store(fault), "Failed to list.");
        assert!(matches!(error, ApiError::Internal(ref msg) if msg == "Failed to list."));
    }

    #[test]
    fn unavailable_sets_retry_after() {
        let response = ApiError::Unavailable(RECONCILIATION_MISS.to_owned()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[header::RETRY_AFTER], "1");
    }
}

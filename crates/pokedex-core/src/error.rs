//! Error types for the capture engine.

use pokedex_types::PokemonId;

use crate::repository::StoreFault;
use crate::validation::ValidationError;

/// Failures of a capture engine operation.
///
/// A duplicate capture is not represented here: it is a successful
/// [`CaptureOutcome::AlreadyCaptured`](crate::engine::CaptureOutcome).
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// The input was malformed. The store was not touched.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// No record exists for the identifier.
    #[error("no captured record for id {0}")]
    NotFound(PokemonId),

    /// The store reported a conflict, but the conflicting row was gone by
    /// the time it was read back (a concurrent release won the race).
    /// Retrying the request is expected to succeed.
    #[error("record {0} conflicted on insert but was not found afterwards")]
    ReconciliationMiss(PokemonId),

    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreFault),
}

impl CaptureError {
    /// Whether the caller should retry the same request.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::ReconciliationMiss(_))
    }
}

//! The storage port of the capture engine.
//!
//! A [`CaptureRepository`] is the only way the engine reaches persistent
//! state. Each method is a single atomic store operation; the engine never
//! holds locks or transactions across calls. Uniqueness of the identifier
//! is the repository's responsibility and is reported through
//! [`InsertOutcome::Conflict`], never through an error.

use async_trait::async_trait;
use pokedex_types::{CapturedRecord, Pokemon, PokemonId};

/// Result of an insert-if-absent.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    /// The record was created; carries the store-assigned timestamp.
    Inserted(CapturedRecord),
    /// A record with the same identifier already exists.
    Conflict,
}

/// A storage failure that is not a uniqueness conflict.
///
/// Carries the failing operation for logs. The message is never shown to
/// API callers.
#[derive(Debug, thiserror::Error)]
#[error("{operation} failed: {source}")]
pub struct StoreFault {
    /// The repository operation that failed.
    pub operation: &'static str,
    /// The underlying driver error.
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl StoreFault {
    /// Wrap a driver error raised by `operation`.
    pub fn new(
        operation: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            operation,
            source: source.into(),
        }
    }
}

/// Data access for captured records.
#[async_trait]
pub trait CaptureRepository: Send + Sync {
    /// Create a record for `pokemon` unless one already exists for its id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreFault`] for any failure other than the conflict.
    async fn insert(&self, pokemon: Pokemon) -> Result<InsertOutcome, StoreFault>;

    /// Read a single record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreFault`] if the store cannot be read.
    async fn find_by_id(&self, id: PokemonId) -> Result<Option<CapturedRecord>, StoreFault>;

    /// All records, most recently captured first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreFault`] if the store cannot be read.
    async fn list_all(&self) -> Result<Vec<CapturedRecord>, StoreFault>;

    /// Remove a record and return it, or `None` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreFault`] if the delete fails.
    async fn delete_by_id(&self, id: PokemonId) -> Result<Option<CapturedRecord>, StoreFault>;
}

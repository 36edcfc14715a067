//! The idempotent capture protocol.
//!
//! Capture is optimistic: the engine inserts first and lets the store's
//! primary-key constraint decide whether the id already exists. A
//! reported conflict is reconciled by reading the existing row back, so a
//! duplicate capture (retried request, double click, concurrent clients)
//! resolves to [`CaptureOutcome::AlreadyCaptured`] instead of an error.
//!
//! Per-id state machine:
//!
//! ```text
//! Absent --capture--> Captured --release--> Absent
//!                        |
//!                        +--capture--> (AlreadyCaptured, no transition)
//! ```

use std::sync::Arc;

use pokedex_types::{CapturedRecord, PokemonId};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::CaptureError;
use crate::repository::{CaptureRepository, InsertOutcome};
use crate::validation::validate_pokemon;

/// Successful result of [`CaptureEngine::capture`].
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    /// This request created the record.
    Captured(CapturedRecord),
    /// The record already existed; carries the stored version.
    AlreadyCaptured(CapturedRecord),
}

impl CaptureOutcome {
    /// The stored record, regardless of who created it.
    pub const fn record(&self) -> &CapturedRecord {
        match self {
            Self::Captured(record) | Self::AlreadyCaptured(record) => record,
        }
    }
}

/// Applies the capture/release protocol on top of a repository.
///
/// Cheap to clone; all clones share the same repository handle.
#[derive(Clone)]
pub struct CaptureEngine {
    repository: Arc<dyn CaptureRepository>,
}

impl CaptureEngine {
    /// Create an engine over the given repository.
    pub fn new(repository: Arc<dyn CaptureRepository>) -> Self {
        Self { repository }
    }

    /// Validate `body` and store it unless its id is already captured.
    ///
    /// # Errors
    ///
    /// - [`CaptureError::Validation`] if the body is malformed.
    /// - [`CaptureError::ReconciliationMiss`] if a conflicting row vanished
    ///   before it could be read back.
    /// - [`CaptureError::Store`] on storage failure.
    pub async fn capture(&self, body: Value) -> Result<CaptureOutcome, CaptureError> {
        let pokemon = validate_pokemon(body)?;
        let id = pokemon.id();

        match self.repository.insert(pokemon).await? {
            InsertOutcome::Inserted(record) => {
                info!(pokemon_id = %id, name = record.pokemon.name(), "Pokemon captured");
                Ok(CaptureOutcome::Captured(record))
            }
            InsertOutcome::Conflict => match self.repository.find_by_id(id).await? {
                Some(existing) => {
                    debug!(pokemon_id = %id, "Pokemon already captured");
                    Ok(CaptureOutcome::AlreadyCaptured(existing))
                }
                None => {
                    warn!(pokemon_id = %id, "Conflicting record vanished before read-back");
                    Err(CaptureError::ReconciliationMiss(id))
                }
            },
        }
    }

    /// Remove a captured record and return it.
    ///
    /// # Errors
    ///
    /// - [`CaptureError::NotFound`] if no record exists for `id`.
    /// - [`CaptureError::Store`] on storage failure.
    pub async fn release(&self, id: PokemonId) -> Result<CapturedRecord, CaptureError> {
        let removed = self
            .repository
            .delete_by_id(id)
            .await?
            .ok_or(CaptureError::NotFound(id))?;

        info!(pokemon_id = %id, name = removed.pokemon.name(), "Pokemon released");
        Ok(removed)
    }

    /// The whole collection, most recently captured first.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Store`] on storage failure.
    pub async fn list(&self) -> Result<Vec<CapturedRecord>, CaptureError> {
        Ok(self.repository.list_all().await?)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::arithmetic_side_effects
)]
mod tests {
    use async_trait::async_trait;
    use pokedex_types::Pokemon;
    use serde_json::json;

    use super::*;
    use crate::memory::MemoryRepository;
    use crate::repository::StoreFault;

    fn engine() -> CaptureEngine {
        CaptureEngine::new(Arc::new(MemoryRepository::new()))
    }

    fn id(raw: i64) -> PokemonId {
        PokemonId::new(raw).unwrap()
    }

    #[tokio::test]
    async fn capture_then_list_returns_stored_fields() {
        let engine = engine();
        let body = json!({"id": 25, "name": "pikachu", "base_experience": 112});

        let outcome = engine.capture(body.clone()).await.unwrap();
        assert!(matches!(outcome, CaptureOutcome::Captured(_)));

        let listed = engine.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(serde_json::to_value(&listed[0].pokemon).unwrap(), body);
        assert_eq!(listed[0].captured_at, outcome.record().captured_at);
    }

    #[tokio::test]
    async fn duplicate_capture_keeps_original_timestamp() {
        let engine = engine();
        let first = engine
            .capture(json!({"id": 25, "name": "pikachu"}))
            .await
            .unwrap();
        let second = engine
            .capture(json!({"id": 25, "name": "pikachu", "nickname": "sparky"}))
            .await
            .unwrap();

        let CaptureOutcome::AlreadyCaptured(existing) = second else {
            panic!("expected already captured, got {second:?}");
        };
        assert_eq!(existing.captured_at, first.record().captured_at);
        // The stored document is the original, not the retried one.
        assert!(existing.pokemon.fields().get("nickname").is_none());
        assert_eq!(engine.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_payload_is_not_stored() {
        let engine = engine();
        let err = engine.capture(json!({"name": "missingno"})).await.unwrap_err();
        assert!(matches!(err, CaptureError::Validation(_)));

        let err = engine.capture(json!({"id": 132})).await.unwrap_err();
        assert!(matches!(err, CaptureError::Validation(_)));

        assert!(engine.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn release_missing_is_not_found_and_changes_nothing() {
        let engine = engine();
        engine
            .capture(json!({"id": 1, "name": "bulbasaur"}))
            .await
            .unwrap();

        let err = engine.release(id(150)).await.unwrap_err();
        assert!(matches!(err, CaptureError::NotFound(missing) if missing == id(150)));
        assert_eq!(engine.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn release_allows_fresh_capture() {
        let engine = engine();
        let first = engine
            .capture(json!({"id": 25, "name": "pikachu"}))
            .await
            .unwrap();

        let removed = engine.release(id(25)).await.unwrap();
        assert_eq!(removed.id(), id(25));
        assert!(engine.list().await.unwrap().is_empty());

        let again = engine
            .capture(json!({"id": 25, "name": "pikachu"}))
            .await
            .unwrap();
        assert!(matches!(again, CaptureOutcome::Captured(_)));
        assert!(again.record().captured_at > first.record().captured_at);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let engine = engine();
        for (raw, name) in [(1, "bulbasaur"), (4, "charmander"), (7, "squirtle")] {
            engine
                .capture(json!({"id": raw, "name": name}))
                .await
                .unwrap();
        }

        let ids: Vec<i32> = engine
            .list()
            .await
            .unwrap()
            .iter()
            .map(|r| r.id().get())
            .collect();
        assert_eq!(ids, vec![7, 4, 1]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_captures_store_exactly_one_row() {
        let engine = engine();
        let attempts = 32;

        let outcomes = futures::future::join_all((0..attempts).map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.capture(json!({"id": 94, "name": "gengar"})).await })
        }))
        .await;

        let mut captured = 0;
        let mut already = 0;
        for outcome in outcomes {
            match outcome.unwrap().unwrap() {
                CaptureOutcome::Captured(_) => captured += 1,
                CaptureOutcome::AlreadyCaptured(_) => already += 1,
            }
        }

        assert_eq!(captured, 1);
        assert_eq!(already, attempts - 1);
        assert_eq!(engine.list().await.unwrap().len(), 1);
    }

    /// Reports a conflict on every insert but never finds the row, as if a
    /// concurrent release always wins.
    struct VanishingRepository;

    #[async_trait]
    impl CaptureRepository for VanishingRepository {
        async fn insert(&self, _pokemon: Pokemon) -> Result<InsertOutcome, StoreFault> {
            Ok(InsertOutcome::Conflict)
        }

        async fn find_by_id(&self, _id: PokemonId) -> Result<Option<CapturedRecord>, StoreFault> {
            Ok(None)
        }

        async fn list_all(&self) -> Result<Vec<CapturedRecord>, StoreFault> {
            Ok(Vec::new())
        }

        async fn delete_by_id(&self, _id: PokemonId) -> Result<Option<CapturedRecord>, StoreFault> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn conflict_without_row_is_transient() {
        let engine = CaptureEngine::new(Arc::new(VanishingRepository));
        let err = engine
            .capture(json!({"id": 25, "name": "pikachu"}))
            .await
            .unwrap_err();

        assert!(matches!(err, CaptureError::ReconciliationMiss(_)));
        assert!(err.is_transient());
    }
}

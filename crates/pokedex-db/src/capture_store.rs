//! `PostgreSQL` implementation of the capture repository.
//!
//! Every operation is one statement against the pool. Duplicate inserts
//! are detected through the driver's structured error kind
//! ([`sqlx::error::DatabaseError::is_unique_violation`], SQLSTATE `23505`)
//! rather than by matching on error text.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pokedex_core::{CaptureRepository, InsertOutcome, StoreFault};
use pokedex_types::{CapturedRecord, Pokemon, PokemonId};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::error::DbError;

/// Operations on the `captured_pokemon` table.
///
/// Holds its own handle to the pool so it can be shared across request
/// handlers behind an `Arc<dyn CaptureRepository>`.
#[derive(Clone)]
pub struct CaptureStore {
    pool: PgPool,
}

impl CaptureStore {
    /// Create a new capture store bound to a connection pool.
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn try_insert(&self, pokemon: Pokemon) -> Result<InsertOutcome, DbError> {
        let result = sqlx::query_scalar::<_, DateTime<Utc>>(
            r"INSERT INTO captured_pokemon (pokemon_id, data)
              VALUES ($1, $2)
              RETURNING captured_at",
        )
        .bind(pokemon.id().get())
        .bind(Json(pokemon.fields()))
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(captured_at) => Ok(InsertOutcome::Inserted(CapturedRecord {
                pokemon,
                captured_at,
            })),
            Err(e) if is_unique_violation(&e) => Ok(InsertOutcome::Conflict),
            Err(e) => Err(e.into()),
        }
    }

    async fn try_find_by_id(&self, id: PokemonId) -> Result<Option<CapturedRecord>, DbError> {
        sqlx::query_as::<_, CapturedRow>(
            r"SELECT pokemon_id, data, captured_at
              FROM captured_pokemon
              WHERE pokemon_id = $1",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?
        .map(CapturedRow::into_record)
        .transpose()
    }

    async fn try_list_all(&self) -> Result<Vec<CapturedRecord>, DbError> {
        let rows = sqlx::query_as::<_, CapturedRow>(
            r"SELECT pokemon_id, data, captured_at
              FROM captured_pokemon
              ORDER BY captured_at DESC, pokemon_id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(count = rows.len(), "Listed captured pokemon");
        rows.into_iter().map(CapturedRow::into_record).collect()
    }

    async fn try_delete_by_id(&self, id: PokemonId) -> Result<Option<CapturedRecord>, DbError> {
        sqlx::query_as::<_, CapturedRow>(
            r"DELETE FROM captured_pokemon
              WHERE pokemon_id = $1
              RETURNING pokemon_id, data, captured_at",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?
        .map(CapturedRow::into_record)
        .transpose()
    }
}

#[async_trait]
impl CaptureRepository for CaptureStore {
    async fn insert(&self, pokemon: Pokemon) -> Result<InsertOutcome, StoreFault> {
        self.try_insert(pokemon).await.map_err(|e| fault("insert", e))
    }

    async fn find_by_id(&self, id: PokemonId) -> Result<Option<CapturedRecord>, StoreFault> {
        self.try_find_by_id(id).await.map_err(|e| fault("find_by_id", e))
    }

    async fn list_all(&self) -> Result<Vec<CapturedRecord>, StoreFault> {
        self.try_list_all().await.map_err(|e| fault("list_all", e))
    }

    async fn delete_by_id(&self, id: PokemonId) -> Result<Option<CapturedRecord>, StoreFault> {
        self.try_delete_by_id(id).await.map_err(|e| fault("delete_by_id", e))
    }
}

/// Convert a data-layer error into a port fault.
///
/// Connection-level failures are logged here, once per failed operation;
/// the pool discards the broken connection and reconnects on next use.
fn fault(operation: &'static str, error: DbError) -> StoreFault {
    if error.is_connection_fault() {
        tracing::warn!(
            operation,
            error = %error,
            "PostgreSQL connection error, pool will reconnect on next use"
        );
    }
    StoreFault::new(operation, error)
}

/// Whether `error` is the primary-key conflict on `captured_pokemon`.
fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

/// A row from the `captured_pokemon` table.
///
/// Uses runtime types rather than compile-time checked types to
/// avoid requiring a live database during builds.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CapturedRow {
    /// Catalog identifier (primary key).
    pub pokemon_id: i32,
    /// The payload exactly as captured.
    pub data: serde_json::Value,
    /// Server-assigned capture time.
    pub captured_at: DateTime<Utc>,
}

impl CapturedRow {
    /// Convert into a domain record, checking that the document agrees
    /// with its key.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::CorruptRow`] if `data` lacks a valid `id` or
    /// `name`, or if its `id` differs from `pokemon_id`.
    pub fn into_record(self) -> Result<CapturedRecord, DbError> {
        let pokemon_id = self.pokemon_id;
        let pokemon = Pokemon::try_from(self.data).map_err(|e| DbError::CorruptRow {
            pokemon_id,
            reason: e.to_string(),
        })?;

        if pokemon.id().get() != pokemon_id {
            return Err(DbError::CorruptRow {
                pokemon_id,
                reason: format!("payload id {} does not match key", pokemon.id()),
            });
        }

        Ok(CapturedRecord {
            pokemon,
            captured_at: self.captured_at,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::json;

    use super::*;

    fn row(pokemon_id: i32, data: serde_json::Value) -> CapturedRow {
        CapturedRow {
            pokemon_id,
            data,
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn row_converts_to_record() {
        let record = row(25, json!({"id": 25, "name": "pikachu", "height": 4}))
            .into_record()
            .unwrap();
        assert_eq!(record.id().get(), 25);
        assert_eq!(record.pokemon.fields()["height"], 4);
    }

    #[test]
    fn mismatched_key_is_corrupt() {
        let err = row(26, json!({"id": 25, "name": "pikachu"}))
            .into_record()
            .unwrap_err();
        assert!(matches!(err, DbError::CorruptRow { pokemon_id: 26, .. }));
    }

    #[test]
    fn nameless_document_is_corrupt() {
        let err = row(25, json!({"id": 25})).into_record().unwrap_err();
        assert!(matches!(err, DbError::CorruptRow { pokemon_id: 25, .. }));
    }

    #[test]
    fn faults_keep_operation_and_cause() {
        let fault = fault("list_all", DbError::Postgres(sqlx::Error::PoolTimedOut));
        assert_eq!(fault.operation, "list_all");
        assert!(fault.source.to_string().contains("pool timed out"));
    }

    #[test]
    fn non_database_errors_are_not_conflicts() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        assert!(!is_unique_violation(&sqlx::Error::PoolTimedOut));
    }
}

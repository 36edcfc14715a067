//! In-process [`CaptureRepository`].
//!
//! Keeps the collection in a [`BTreeMap`] behind a single
//! [`tokio::sync::RwLock`]. The existence check and the insert happen
//! under one write guard, which gives the same "exactly one row per id"
//! guarantee as the primary-key constraint in `PostgreSQL`.
//!
//! Timestamps come from a strictly increasing clock so newest-first
//! ordering is total even when captures land in the same microsecond.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use pokedex_types::{CapturedRecord, Pokemon, PokemonId};
use tokio::sync::RwLock;

use crate::repository::{CaptureRepository, InsertOutcome, StoreFault};

#[derive(Debug, Default)]
struct Inner {
    rows: BTreeMap<PokemonId, CapturedRecord>,
    last_stamp: Option<DateTime<Utc>>,
}

impl Inner {
    fn next_stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_stamp {
            Some(last) if now <= last => last
                .checked_add_signed(TimeDelta::microseconds(1))
                .unwrap_or(now),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }
}

/// A [`CaptureRepository`] that lives entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    inner: RwLock<Inner>,
}

impl MemoryRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.inner.read().await.rows.len()
    }

    /// Whether the collection is empty.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.rows.is_empty()
    }
}

#[async_trait]
impl CaptureRepository for MemoryRepository {
    async fn insert(&self, pokemon: Pokemon) -> Result<InsertOutcome, StoreFault> {
        let mut inner = self.inner.write().await;
        let id = pokemon.id();
        if inner.rows.contains_key(&id) {
            return Ok(InsertOutcome::Conflict);
        }

        let record = CapturedRecord {
            pokemon,
            captured_at: inner.next_stamp(),
        };
        inner.rows.insert(id, record.clone());
        Ok(InsertOutcome::Inserted(record))
    }

    async fn find_by_id(&self, id: PokemonId) -> Result<Option<CapturedRecord>, StoreFault> {
        Ok(self.inner.read().await.rows.get(&id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<CapturedRecord>, StoreFault> {
        let mut records: Vec<CapturedRecord> =
            self.inner.read().await.rows.values().cloned().collect();
        records.sort_by(|a, b| {
            b.captured_at
                .cmp(&a.captured_at)
                .then_with(|| b.id().cmp(&a.id()))
        });
        Ok(records)
    }

    async fn delete_by_id(&self, id: PokemonId) -> Result<Option<CapturedRecord>, StoreFault> {
        Ok(self.inner.write().await.rows.remove(&id))
    }
}

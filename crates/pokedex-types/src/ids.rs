//! Type-safe wrapper around the catalog identifier.
//!
//! The reference catalog numbers creatures with small positive integers.
//! The identifier doubles as the primary key of the `captured_pokemon`
//! table, whose key column is a `PostgreSQL` `INTEGER`, so the accepted
//! range is `1..=i32::MAX`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Reasons an identifier can be rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidPokemonId {
    /// The input was not a plain base-10 integer.
    #[error("{0:?} is not an integer")]
    Malformed(String),

    /// The input was an integer outside `1..=i32::MAX`.
    #[error("{0} is outside the accepted range 1..={max}", max = i32::MAX)]
    OutOfRange(String),
}

/// Catalog number of a creature, unique across the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PokemonId(i32);

impl PokemonId {
    /// Create an identifier, rejecting zero, negatives, and values that
    /// do not fit the key column.
    pub fn new(raw: i64) -> Result<Self, InvalidPokemonId> {
        match i32::try_from(raw) {
            Ok(id) if id > 0 => Ok(Self(id)),
            _ => Err(InvalidPokemonId::OutOfRange(raw.to_string())),
        }
    }

    /// Parse an identifier from a URL path segment.
    ///
    /// Only ASCII digits are accepted: no sign, no whitespace, no
    /// trailing characters.
    pub fn parse(raw: &str) -> Result<Self, InvalidPokemonId> {
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidPokemonId::Malformed(raw.to_owned()));
        }
        match raw.parse::<i32>() {
            Ok(id) if id > 0 => Ok(Self(id)),
            _ => Err(InvalidPokemonId::OutOfRange(raw.to_owned())),
        }
    }

    /// Return the inner value as stored in the key column.
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl core::fmt::Display for PokemonId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<PokemonId> for i32 {
    fn from(id: PokemonId) -> Self {
        id.0
    }
}

impl TryFrom<i32> for PokemonId {
    type Error = InvalidPokemonId;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        Self::new(i64::from(raw))
    }
}

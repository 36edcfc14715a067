//! The captured payload and its persisted record.
//!
//! A [`Pokemon`] is the document the collection UI submits after resolving
//! a creature against the reference catalog. Only `id` and `name` are
//! interpreted; every other attribute (sprites, types, stats, ...) is kept
//! verbatim so the stored document round-trips exactly as submitted.

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::ids::{InvalidPokemonId, PokemonId};

/// Key of the catalog identifier inside the payload.
pub const ID_FIELD: &str = "id";

/// Key of the display name inside the payload.
pub const NAME_FIELD: &str = "name";

/// Key under which the capture timestamp is exposed in list entries.
pub const CAPTURED_AT_FIELD: &str = "captured_at";

/// Structural problems that prevent a document from being a [`Pokemon`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidPokemon {
    /// The `id` key is absent.
    #[error("missing `id`")]
    MissingId,

    /// The `id` key is present but not an acceptable identifier.
    #[error("invalid `id`: {0}")]
    InvalidId(String),

    /// The `name` key is absent, not a string, or empty.
    #[error("`name` must be a non-empty string")]
    InvalidName,
}

/// A creature document with a guaranteed `id` and non-empty `name`.
///
/// Serializes as the bare JSON object, unknown keys included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Pokemon {
    id: PokemonId,
    fields: Map<String, Value>,
}

impl Pokemon {
    /// Build a payload from an identifier, a name, and extra attributes.
    ///
    /// `id` and `name` in `extra` are overwritten so the document always
    /// agrees with the typed identifier.
    pub fn new(id: PokemonId, name: &str, extra: Map<String, Value>) -> Self {
        let mut fields = extra;
        fields.insert(ID_FIELD.to_owned(), Value::from(id.get()));
        fields.insert(NAME_FIELD.to_owned(), Value::from(name));
        Self { id, fields }
    }

    /// The catalog identifier.
    pub const fn id(&self) -> PokemonId {
        self.id
    }

    /// The display name.
    pub fn name(&self) -> &str {
        self.fields
            .get(NAME_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// All attributes of the document, `id` and `name` included.
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Convert into the plain JSON value stored in the `data` column.
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

/// Classify the JSON value found under `id`.
pub fn id_from_value(value: &Value) -> Result<PokemonId, InvalidPokemonId> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(raw) => PokemonId::new(raw),
            None if n.is_u64() => Err(InvalidPokemonId::OutOfRange(n.to_string())),
            None => Err(InvalidPokemonId::Malformed(n.to_string())),
        },
        other => Err(InvalidPokemonId::Malformed(other.to_string())),
    }
}

impl TryFrom<Map<String, Value>> for Pokemon {
    type Error = InvalidPokemon;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        let id = fields
            .get(ID_FIELD)
            .ok_or(InvalidPokemon::MissingId)
            .and_then(|v| id_from_value(v).map_err(|e| InvalidPokemon::InvalidId(e.to_string())))?;

        match fields.get(NAME_FIELD).and_then(Value::as_str) {
            Some(name) if !name.is_empty() => Ok(Self { id, fields }),
            _ => Err(InvalidPokemon::InvalidName),
        }
    }
}

impl TryFrom<Value> for Pokemon {
    type Error = InvalidPokemon;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Self::try_from(fields),
            _ => Err(InvalidPokemon::MissingId),
        }
    }
}

impl From<Pokemon> for Map<String, Value> {
    fn from(pokemon: Pokemon) -> Self {
        pokemon.fields
    }
}

/// A stored capture: the payload plus the server-assigned timestamp.
///
/// Serializes as the list projection used by `GET /api/captured`: the
/// payload object with `captured_at` merged in.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedRecord {
    /// The document as submitted.
    pub pokemon: Pokemon,
    /// Assigned by the store at insertion; never changes afterwards.
    pub captured_at: DateTime<Utc>,
}

impl CapturedRecord {
    /// The primary key of this record.
    pub const fn id(&self) -> PokemonId {
        self.pokemon.id()
    }
}

impl Serialize for CapturedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = self.pokemon.fields();
        let mut map = serializer.serialize_map(None)?;
        for (key, value) in fields.iter().filter(|(k, _)| k.as_str() != CAPTURED_AT_FIELD) {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry(CAPTURED_AT_FIELD, &self.captured_at)?;
        map.end()
    }
}

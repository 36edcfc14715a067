//! Input validation for capture payloads and path identifiers.
//!
//! Validation only looks at `id` and `name`. Every other attribute of the
//! payload passes through untouched. All field problems are reported at
//! once so the client can fix its request in one round trip.

use std::collections::BTreeMap;

use pokedex_types::pokemon::{ID_FIELD, NAME_FIELD, id_from_value};
use pokedex_types::{Pokemon, PokemonId};
use serde_json::Value;

/// Message used when a capture payload is rejected.
pub const INVALID_PAYLOAD: &str = "Invalid Pokémon payload.";

/// Message used when a path identifier is rejected.
pub const INVALID_ID: &str = "Invalid Pokémon ID.";

/// Malformed input, with per-field messages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Summary suitable for showing to a user.
    pub message: String,
    /// Messages keyed by the offending field.
    pub field_errors: BTreeMap<String, Vec<String>>,
}

impl ValidationError {
    fn new(message: &str) -> Self {
        Self {
            message: message.to_owned(),
            field_errors: BTreeMap::new(),
        }
    }

    fn push(&mut self, field: &str, problem: impl Into<String>) {
        self.field_errors
            .entry(field.to_owned())
            .or_default()
            .push(problem.into());
    }
}

/// Validate a capture request body and turn it into a [`Pokemon`].
///
/// The body must be a JSON object with an integer `id` in `1..=i32::MAX`
/// and a non-empty string `name`.
pub fn validate_pokemon(body: Value) -> Result<Pokemon, ValidationError> {
    let mut error = ValidationError::new(INVALID_PAYLOAD);

    let Value::Object(fields) = body else {
        error.push("body", "Expected a JSON object");
        return Err(error);
    };

    let id = match fields.get(ID_FIELD) {
        None | Some(Value::Null) => {
            error.push(ID_FIELD, "Required");
            None
        }
        Some(value) => match id_from_value(value) {
            Ok(id) => Some(id),
            Err(e) => {
                error.push(ID_FIELD, format!("Expected a positive integer, {e}"));
                None
            }
        },
    };

    let name = match fields.get(NAME_FIELD) {
        None | Some(Value::Null) => {
            error.push(NAME_FIELD, "Required");
            None
        }
        Some(Value::String(name)) if name.is_empty() => {
            error.push(NAME_FIELD, "Must not be empty");
            None
        }
        Some(Value::String(name)) => Some(name.clone()),
        Some(_) => {
            error.push(NAME_FIELD, "Expected string");
            None
        }
    };

    match (id, name) {
        (Some(id), Some(name)) => Ok(Pokemon::new(id, &name, fields)),
        _ => Err(error),
    }
}

/// Parse the `{id}` segment of `/api/captured/{id}`.
pub fn parse_path_id(raw: &str) -> Result<PokemonId, ValidationError> {
    PokemonId::parse(raw).map_err(|e| {
        let mut error = ValidationError::new(INVALID_ID);
        error.push(ID_FIELD, e.to_string());
        error
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn accepts_minimal_payload() {
        let pokemon = validate_pokemon(json!({"id": 25, "name": "pikachu"})).unwrap();
        assert_eq!(pokemon.id().get(), 25);
        assert_eq!(pokemon.name(), "pikachu");
    }

    #[test]
    fn preserves_unknown_fields() {
        let body = json!({
            "id": 6,
            "name": "charizard",
            "types": ["fire", "flying"],
            "stats": [{"base_stat": 78, "stat": {"name": "hp"}}]
        });
        let pokemon = validate_pokemon(body.clone()).unwrap();
        assert_eq!(serde_json::to_value(&pokemon).unwrap(), body);
    }

    #[test]
    fn reports_every_missing_field() {
        let error = validate_pokemon(json!({"height": 4})).unwrap_err();
        assert_eq!(error.message, INVALID_PAYLOAD);
        assert_eq!(error.field_errors["id"], vec!["Required".to_owned()]);
        assert_eq!(error.field_errors["name"], vec!["Required".to_owned()]);
    }

    #[test]
    fn rejects_wrong_types() {
        let error = validate_pokemon(json!({"id": "25", "name": 25})).unwrap_err();
        assert!(error.field_errors.contains_key("id"));
        assert_eq!(error.field_errors["name"], vec!["Expected string".to_owned()]);
    }

    #[test]
    fn rejects_fractional_and_non_positive_ids() {
        for id in [json!(2.5), json!(0), json!(-1), json!(4_294_967_296_u64)] {
            let error = validate_pokemon(json!({"id": id, "name": "x"})).unwrap_err();
            assert!(error.field_errors.contains_key("id"), "id {id} accepted");
        }
    }

    #[test]
    fn rejects_empty_name() {
        let error = validate_pokemon(json!({"id": 1, "name": ""})).unwrap_err();
        assert_eq!(
            error.field_errors["name"],
            vec!["Must not be empty".to_owned()]
        );
    }

    #[test]
    fn rejects_non_object_bodies() {
        for body in [json!([1, 2]), json!("pikachu"), json!(null), json!(25)] {
            let error = validate_pokemon(body).unwrap_err();
            assert!(error.field_errors.contains_key("body"));
        }
    }

    #[test]
    fn path_id_errors_carry_field_detail() {
        assert_eq!(parse_path_id("25").unwrap().get(), 25);

        let error = parse_path_id("pikachu").unwrap_err();
        assert_eq!(error.message, INVALID_ID);
        assert_eq!(error.field_errors["id"].len(), 1);
    }
}

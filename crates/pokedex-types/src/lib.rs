//! Shared type definitions for the Pokedex capture service.
//!
//! This crate is the single source of truth for the types that cross the
//! HTTP boundary. Wire types flow downstream to `TypeScript` via `ts-rs`
//! for the collection UI.
//!
//! # Modules
//!
//! - [`ids`] -- The [`PokemonId`] primary-key wrapper
//! - [`pokemon`] -- The opaque [`Pokemon`] payload and [`CapturedRecord`]
//! - [`responses`] -- JSON response envelopes for every endpoint

pub mod ids;
pub mod pokemon;
pub mod responses;

// Re-export all public types at crate root for convenience.
pub use ids::{InvalidPokemonId, PokemonId};
pub use pokemon::{CapturedRecord, InvalidPokemon, Pokemon};
pub use responses::{
    CaptureResponse, CaptureStatus, ErrorDetails, ErrorResponse, ErrorStatus, HealthResponse,
    ReleaseResponse, ReleaseStatus,
};

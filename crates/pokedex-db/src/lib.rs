//! `PostgreSQL` persistence for the Pokedex capture service.
//!
//! The collection lives in a single table:
//!
//! ```text
//! captured_pokemon
//!     pokemon_id   INTEGER      PRIMARY KEY   -- uniqueness arbiter
//!     data         JSONB        NOT NULL      -- payload, verbatim
//!     captured_at  TIMESTAMPTZ  NOT NULL DEFAULT NOW()
//! ```
//!
//! # Modules
//!
//! - [`postgres`] -- Connection pool, schema bootstrap, and shutdown
//! - [`capture_store`] -- The `PostgreSQL` [`CaptureRepository`](pokedex_core::CaptureRepository)
//! - [`error`] -- Shared error types

pub mod capture_store;
pub mod error;
pub mod postgres;

// Re-export primary types for convenience.
pub use capture_store::{CaptureStore, CapturedRow};
pub use error::DbError;
pub use postgres::{PostgresConfig, PostgresPool};

//! Capture engine for the Pokedex capture service.
//!
//! This crate owns the domain rules of the collection: what a valid
//! capture payload looks like, the idempotent capture protocol, and the
//! lifecycle of the serving process. Storage is reached only through the
//! [`CaptureRepository`] port so the engine can run against `PostgreSQL`
//! in production and against [`MemoryRepository`] in tests.
//!
//! # Protocol
//!
//! ```text
//! capture(payload)
//!     |
//!     +-- validate ----------------------> ValidationError (no store access)
//!     |
//!     +-- repository.insert
//!         |-- Inserted  -----------------> Captured
//!         +-- Conflict --> find_by_id
//!             |-- Some  -----------------> AlreadyCaptured
//!             +-- None  -----------------> ReconciliationMiss (retryable)
//! ```
//!
//! # Modules
//!
//! - [`validation`] -- Payload and path identifier validation
//! - [`repository`] -- The storage port and its typed outcomes
//! - [`engine`] -- The idempotent capture/release protocol
//! - [`memory`] -- In-process repository implementation
//! - [`lifecycle`] -- `Starting -> Serving -> Draining -> Stopped`
//! - [`error`] -- Engine error taxonomy

pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod memory;
pub mod repository;
pub mod validation;

// Re-export primary types for convenience.
pub use engine::{CaptureEngine, CaptureOutcome};
pub use error::CaptureError;
pub use lifecycle::{Lifecycle, LifecycleError, LifecyclePhase};
pub use memory::MemoryRepository;
pub use repository::{CaptureRepository, InsertOutcome, StoreFault};
pub use validation::{ValidationError, parse_path_id, validate_pokemon};

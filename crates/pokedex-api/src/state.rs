//! Shared application state for the API server.

use std::sync::Arc;

use pokedex_core::{CaptureEngine, Lifecycle, MemoryRepository};

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor. Holds no
/// copy of the collection; every request goes to the repository.
#[derive(Clone)]
pub struct AppState {
    /// The capture protocol over the configured repository.
    pub engine: CaptureEngine,
    /// Process lifecycle, shared with the binary's signal handling.
    pub lifecycle: Lifecycle,
}

impl AppState {
    /// Create application state around an engine and lifecycle.
    pub const fn new(engine: CaptureEngine, lifecycle: Lifecycle) -> Self {
        Self { engine, lifecycle }
    }

    /// State backed by a fresh [`MemoryRepository`]. The lifecycle starts
    /// in `Starting`.
    pub fn in_memory() -> Self {
        Self::new(
            CaptureEngine::new(Arc::new(MemoryRepository::new())),
            Lifecycle::new(),
        )
    }
}

//! HTTP API for the Pokedex capture service.
//!
//! This crate provides an Axum HTTP server that exposes the capture
//! engine:
//!
//! | Method | Path | Success |
//! |--------|------|---------|
//! | `GET` | `/health` | `200 {status: "ok"}` |
//! | `GET` | `/api/captured` | `200` newest-first list |
//! | `POST` | `/api/captured` | `201 captured` / `200 already_captured` |
//! | `DELETE` | `/api/captured/{id}` | `200 released` |
//!
//! Handlers hold no business logic: they parse the request, call the
//! [`CaptureEngine`](pokedex_core::CaptureEngine), and translate its
//! outcome into a status code and JSON body. Every failure is rendered
//! through [`ApiError`] as `{status: "error", message}`.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, bind, serve, serve_until_drained};
pub use state::AppState;

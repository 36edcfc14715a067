//! JSON response envelopes for the capture API.
//!
//! Every body carries a `status` discriminator so the collection UI can
//! branch on it without inspecting the HTTP status code.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::pokemon::Pokemon;

/// Outcome of `POST /api/captured`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum CaptureStatus {
    /// A new record was stored.
    Captured,
    /// A record with the same id already existed; nothing was written.
    AlreadyCaptured,
}

/// Body of a successful `POST /api/captured`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CaptureResponse {
    /// Whether this request created the record.
    pub status: CaptureStatus,
    /// The document as stored.
    #[ts(type = "{ id: number, name: string } & Record<string, unknown>")]
    pub pokemon: Pokemon,
    /// Original capture time, reported only for `already_captured`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub captured_at: Option<DateTime<Utc>>,
}

/// Status discriminator of a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ReleaseStatus {
    /// The record was removed.
    Released,
}

/// Body of a successful `DELETE /api/captured/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ReleaseResponse {
    /// Always `released`.
    pub status: ReleaseStatus,
    /// The document that was removed.
    #[ts(type = "{ id: number, name: string } & Record<string, unknown>")]
    pub pokemon: Pokemon,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HealthResponse {
    /// Always `ok` while the process is serving.
    pub status: String,
}

impl HealthResponse {
    /// The healthy response.
    pub fn ok() -> Self {
        Self {
            status: String::from("ok"),
        }
    }
}

/// Status discriminator of an error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ErrorStatus {
    /// Every failure uses the same discriminator.
    Error,
}

/// Per-field validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ErrorDetails {
    /// Messages keyed by the offending field name.
    pub field_errors: BTreeMap<String, Vec<String>>,
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ErrorResponse {
    /// Always `error`.
    pub status: ErrorStatus,
    /// Human-readable summary. Never contains driver internals.
    pub message: String,
    /// Field-level detail for validation failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub details: Option<ErrorDetails>,
}

impl ErrorResponse {
    /// An error body without field detail.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: ErrorStatus::Error,
            message: message.into(),
            details: None,
        }
    }
}

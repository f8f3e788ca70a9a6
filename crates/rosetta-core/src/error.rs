// ── Core error types ──
//
// Recoverable failures raised by the translation layer itself: malformed
// device text handed to a parser, bad version strings, and mapping files
// that cannot be loaded. Device-side failures are NOT errors here -- they
// travel inside `CanonicalResponse` as a `CommandError`.

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Value parsing ────────────────────────────────────────────────
    #[error("invalid duration '{input}'")]
    InvalidDuration { input: String },

    #[error("invalid size '{input}': {reason}")]
    InvalidSize { input: String, reason: String },

    #[error("invalid version '{input}': {reason}")]
    InvalidVersion { input: String, reason: String },

    // ── Command construction ─────────────────────────────────────────
    #[error("command is missing required {0}")]
    MissingField(&'static str),

    // ── Batch translation ────────────────────────────────────────────
    #[error("path count ({paths}) does not match response count ({responses})")]
    BatchLengthMismatch { paths: usize, responses: usize },

    // ── Mapping files ────────────────────────────────────────────────
    #[error("failed to read mappings file {}: {source}", path.display())]
    MappingRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse mappings: {0}")]
    MappingParse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

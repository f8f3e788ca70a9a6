//! CLI error types with miette diagnostics.
//!
//! Library errors and device-reported failures are mapped into user-facing
//! errors with help text and a process exit code.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use rosetta_config::ConfigError;
use rosetta_core::{CommandError, CoreError, ErrorCategory};
use rosetta_port::PortError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const VALIDATION: i32 = 9;
    pub const UNSUPPORTED: i32 = 10;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Input ────────────────────────────────────────────────────────
    #[error("Could not read {}", path.display())]
    #[diagnostic(code(rosetta::input), help("Pass a readable file, or - to read from stdin."))]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid {what}: {reason}")]
    #[diagnostic(code(rosetta::document))]
    Document { what: &'static str, reason: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(rosetta::validation))]
    Validation { field: String, reason: String },

    // ── Translation ──────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(rosetta::translation))]
    Translation(#[from] CoreError),

    #[error(transparent)]
    #[diagnostic(code(rosetta::port))]
    Port(#[from] PortError),

    // ── Device outcomes ──────────────────────────────────────────────
    #[error("Device reported {}: {}", .0.code, .0.message)]
    #[diagnostic(code(rosetta::device))]
    Device(CommandError),

    #[error("Batch command {index} of {total} failed: {code}")]
    #[diagnostic(code(rosetta::batch_failed), help("{message}"))]
    BatchFailed {
        index: usize,
        total: usize,
        code: String,
        message: String,
        category: ErrorCategory,
    },

    // ── Features ─────────────────────────────────────────────────────
    #[error("Feature '{name}' is not registered")]
    #[diagnostic(
        code(rosetta::unknown_feature),
        help("Known features: {available}\nRun: rosetta mappings versions")
    )]
    UnknownFeature { name: String, available: String },

    #[error("Feature '{name}' requires RouterOS {required}, device runs {version}")]
    #[diagnostic(code(rosetta::feature_unavailable))]
    FeatureUnavailable {
        name: String,
        required: String,
        version: String,
    },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(rosetta::config),
        help("Check the config file; `rosetta config path` shows where it is read from.")
    )]
    Config(#[from] ConfigError),

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Document { .. } | Self::Translation(_) | Self::Config(ConfigError::Validation { .. }) => {
                exit_code::VALIDATION
            }
            Self::Validation { .. } => exit_code::USAGE,
            Self::Device(error) => category_exit_code(error.category),
            Self::BatchFailed { category, .. } => category_exit_code(*category),
            Self::UnknownFeature { .. } => exit_code::NOT_FOUND,
            Self::FeatureUnavailable { .. } => exit_code::UNSUPPORTED,
            _ => exit_code::GENERAL,
        }
    }
}

fn category_exit_code(category: ErrorCategory) -> i32 {
    match category {
        ErrorCategory::Validation => exit_code::VALIDATION,
        ErrorCategory::NotFound => exit_code::NOT_FOUND,
        ErrorCategory::Conflict => exit_code::CONFLICT,
        ErrorCategory::Permission => exit_code::PERMISSION,
        ErrorCategory::Connection => exit_code::CONNECTION,
        ErrorCategory::Timeout => exit_code::TIMEOUT,
        ErrorCategory::Unsupported => exit_code::UNSUPPORTED,
        ErrorCategory::Internal => exit_code::GENERAL,
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Document {
            what: "JSON",
            reason: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Document {
            what: "YAML",
            reason: err.to_string(),
        }
    }
}

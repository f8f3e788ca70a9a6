// ── Device-facing error taxonomy ──

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use thiserror::Error;

/// Closed set of failure categories every transport/device error folds into.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Conflict,
    Permission,
    Connection,
    Timeout,
    Internal,
    Unsupported,
}

impl ErrorCategory {
    /// Whether a failure in this category is worth retrying by default.
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Connection | Self::Timeout)
    }
}

/// A failure recognized at the transport or parse boundary.
///
/// Built once where the failure is detected and never mutated afterwards;
/// the `with_*` helpers are only used while constructing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("[{category}] {code}: {message}")]
pub struct CommandError {
    pub code: String,
    pub message: String,
    pub category: ErrorCategory,
    #[serde(default)]
    pub retryable: bool,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub details: IndexMap<String, String>,
}

impl CommandError {
    pub fn new(code: impl Into<String>, message: impl Into<String>, category: ErrorCategory) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            category,
            retryable: false,
            details: IndexMap::new(),
        }
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

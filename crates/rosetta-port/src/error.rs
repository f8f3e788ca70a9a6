// ── Port error types ──
//
// Failures raised by a transport or by the translating layer around it.
// A command the device rejected is not a `PortError`: it comes back as an
// unsuccessful `RouterResult` and is normalized into a `CommandError`.

use rosetta_core::{CoreError, Protocol};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured failure reported by a protocol adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{protocol} {operation}: {message}")]
pub struct AdapterError {
    pub protocol: Protocol,
    pub operation: String,
    pub message: String,
    /// Transport-level failures (dropped session, refused connection) that
    /// may succeed on a second attempt.
    #[serde(default)]
    pub retryable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router_os_error: Option<String>,
}

impl AdapterError {
    pub fn new(protocol: Protocol, operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            protocol,
            operation: operation.into(),
            message: message.into(),
            retryable: false,
            router_os_error: None,
        }
    }

    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

#[derive(Debug, Error)]
pub enum PortError {
    // ── Transport ────────────────────────────────────────────────────
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error("{0}")]
    Transport(String),

    #[error("port is not connected")]
    NotConnected,

    #[error("operation cancelled")]
    Cancelled,

    #[error("no reply scripted for {action} {path}")]
    Unscripted { path: String, action: String },

    // ── Translation ──────────────────────────────────────────────────
    #[error("translation error: {0}")]
    Translation(#[from] CoreError),
}

// ── Translating port ──
//
// Wraps a `RouterPort` so callers speak logical field names end to end:
// translate, dispatch through the adapter bridge, normalize the outcome,
// then reverse-translate the records.

use std::sync::Arc;
use std::time::Duration;

use rosetta_core::classify::{CODE_CANCELLED, CODE_TIMEOUT, classify_message};
use rosetta_core::{
    CanonicalCommand, CanonicalResponse, CommandError, CommandMetadata, DeviceVersion, ErrorCategory, Protocol,
    Record, Translator,
};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::bridge;
use crate::error::PortError;
use crate::port::RouterPort;

pub struct TranslatingPort {
    port: Arc<dyn RouterPort>,
    translator: Arc<Translator>,
    /// Serializes the first version lookup; later calls never take it.
    version_lock: Mutex<()>,
}

impl TranslatingPort {
    pub fn new(port: Arc<dyn RouterPort>, translator: Arc<Translator>) -> Self {
        Self {
            port,
            translator,
            version_lock: Mutex::new(()),
        }
    }

    pub fn port(&self) -> &Arc<dyn RouterPort> {
        &self.port
    }

    pub fn translator(&self) -> &Arc<Translator> {
        &self.translator
    }

    /// Wire format of the underlying port. API-SSL reports as API and
    /// Telnet as SSH.
    pub fn protocol(&self) -> Protocol {
        self.port.protocol().wire_format()
    }

    /// The cached device version, if it has been resolved.
    pub fn version(&self) -> Option<DeviceVersion> {
        self.translator.version()
    }

    // ── Logical operations ───────────────────────────────────────────

    pub async fn query(
        &self,
        cancel: &CancellationToken,
        path: &str,
        filters: Record,
        proplist: Vec<String>,
        metadata: CommandMetadata,
    ) -> Result<CanonicalResponse, PortError> {
        self.sync_version().await;
        let cmd = self.translator.translate_query(path, filters, proplist, metadata)?;
        Ok(self.run(cancel, path, &cmd).await)
    }

    pub async fn get(
        &self,
        cancel: &CancellationToken,
        path: &str,
        id: &str,
        metadata: CommandMetadata,
    ) -> Result<CanonicalResponse, PortError> {
        self.sync_version().await;
        let cmd = self.translator.translate_get(path, id, metadata)?;
        Ok(self.run(cancel, path, &cmd).await)
    }

    pub async fn create(
        &self,
        cancel: &CancellationToken,
        path: &str,
        fields: Record,
        metadata: CommandMetadata,
    ) -> Result<CanonicalResponse, PortError> {
        self.sync_version().await;
        let cmd = self.translator.translate_create(path, fields, metadata)?;
        Ok(self.run(cancel, path, &cmd).await)
    }

    pub async fn update(
        &self,
        cancel: &CancellationToken,
        path: &str,
        id: &str,
        fields: Record,
        metadata: CommandMetadata,
    ) -> Result<CanonicalResponse, PortError> {
        self.sync_version().await;
        let cmd = self.translator.translate_update(path, id, fields, metadata)?;
        Ok(self.run(cancel, path, &cmd).await)
    }

    pub async fn delete(
        &self,
        cancel: &CancellationToken,
        path: &str,
        id: &str,
        metadata: CommandMetadata,
    ) -> Result<CanonicalResponse, PortError> {
        self.sync_version().await;
        let cmd = self.translator.translate_delete(path, id, metadata)?;
        Ok(self.run(cancel, path, &cmd).await)
    }

    /// Execute an already-built command. Records are decoded against the
    /// command's own path.
    pub async fn execute_canonical(&self, cancel: &CancellationToken, cmd: &CanonicalCommand) -> CanonicalResponse {
        self.run(cancel, cmd.path(), cmd).await
    }

    async fn run(&self, cancel: &CancellationToken, path: &str, cmd: &CanonicalCommand) -> CanonicalResponse {
        let resp = self.execute(cancel, cmd).await;
        self.translator.translate_response(path, resp)
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    async fn execute(&self, cancel: &CancellationToken, cmd: &CanonicalCommand) -> CanonicalResponse {
        let native = bridge::to_router_command(cmd);
        let protocol = self.protocol();
        debug!(path = native.path.as_str(), action = native.action.as_str(), protocol = %protocol, "dispatching command");

        let outcome = match cmd.timeout().filter(|limit| !limit.is_zero()) {
            Some(limit) => {
                let child = cancel.child_token();
                match tokio::time::timeout(limit, self.port.execute_command(&child, native)).await {
                    Ok(outcome) => outcome,
                    Err(_elapsed) => {
                        child.cancel();
                        warn!(path = cmd.path(), timeout = %humantime::format_duration(limit), "command timed out");
                        return timeout_response(limit, protocol);
                    }
                }
            }
            None => self.port.execute_command(cancel, native).await,
        };

        match outcome {
            Ok(result) => bridge::from_router_result(result, protocol),
            Err(PortError::Cancelled) => cancelled_response().with_protocol(protocol),
            Err(err) => {
                warn!(error = %err, protocol = %protocol, "port call failed");
                CanonicalResponse::failure(classify_message(&err.to_string(), protocol)).with_protocol(protocol)
            }
        }
    }

    /// Resolve the device version once. A failed lookup is logged and the
    /// translator stays unversioned; the next call tries again.
    async fn sync_version(&self) {
        if self.translator.has_version() {
            return;
        }
        let _guard = self.version_lock.lock().await;
        if self.translator.has_version() {
            return;
        }
        match self.port.info().await {
            Ok(info) => {
                debug!(version = %info.version, "resolved device version");
                self.translator.set_version(Some(info.version));
            }
            Err(err) => warn!(error = %err, "could not resolve device version"),
        }
    }
}

impl std::fmt::Debug for TranslatingPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslatingPort")
            .field("protocol", &self.port.protocol())
            .field("translator", &self.translator)
            .finish_non_exhaustive()
    }
}

pub(crate) fn cancelled_response() -> CanonicalResponse {
    CanonicalResponse::failure(CommandError::new(
        CODE_CANCELLED,
        "operation cancelled",
        ErrorCategory::Timeout,
    ))
}

fn timeout_response(limit: Duration, protocol: Protocol) -> CanonicalResponse {
    let message = format!("command timeout after {}", humantime::format_duration(limit));
    CanonicalResponse::failure(
        CommandError::new(CODE_TIMEOUT, message, ErrorCategory::Timeout)
            .with_retryable(true)
            .with_detail("protocol", protocol.as_ref()),
    )
    .with_protocol(protocol)
}

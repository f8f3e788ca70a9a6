// ── Scripted port ──
//
// In-memory `RouterPort` that answers from registered `(path, action)`
// replies and records every command it receives. Drives the `replay`
// command and the port-layer tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use rosetta_core::{DeviceVersion, Protocol};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{AdapterError, PortError};
use crate::port::{NativeRecord, RouterCommand, RouterInfo, RouterPort, RouterResult, StateQuery, StateResult};

/// What the device "answers" to a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScriptedReply {
    Records {
        records: Vec<NativeRecord>,
    },
    Created {
        id: String,
    },
    Done,
    /// The device rejected the command.
    Failed {
        message: String,
        #[serde(default)]
        retryable: bool,
    },
    /// The transport itself failed.
    Error {
        message: String,
    },
    /// Never answers; only cancellation or a timeout ends the call.
    Hang,
}

/// One scripted answer, as loaded from a fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expectation {
    pub path: String,
    pub action: String,
    pub reply: ScriptedReply,
}

pub struct ScriptedPort {
    protocol: Protocol,
    info: Option<RouterInfo>,
    latency: Duration,
    connected: AtomicBool,
    replies: Mutex<IndexMap<(String, String), ScriptedReply>>,
    sent: Mutex<Vec<RouterCommand>>,
    info_calls: AtomicUsize,
}

impl ScriptedPort {
    pub fn new(protocol: Protocol) -> Self {
        Self {
            protocol,
            info: None,
            latency: Duration::ZERO,
            connected: AtomicBool::new(false),
            replies: Mutex::new(IndexMap::new()),
            sent: Mutex::new(Vec::new()),
            info_calls: AtomicUsize::new(0),
        }
    }

    /// Report `version` from `info()`. Without it, `info()` fails.
    #[must_use]
    pub fn with_version(mut self, version: DeviceVersion) -> Self {
        self.info = Some(RouterInfo::new(version));
        self
    }

    #[must_use]
    pub fn with_info(mut self, info: RouterInfo) -> Self {
        self.info = Some(info);
        self
    }

    /// Delay every answer by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Answer `action` on `path` with `reply`, replacing any earlier reply.
    pub fn expect(&self, path: impl Into<String>, action: impl Into<String>, reply: ScriptedReply) {
        lock(&self.replies).insert((path.into(), action.into()), reply);
    }

    pub fn expect_all(&self, expectations: impl IntoIterator<Item = Expectation>) {
        let mut replies = lock(&self.replies);
        for e in expectations {
            replies.insert((e.path, e.action), e.reply);
        }
    }

    /// Every command received, in arrival order.
    pub fn sent(&self) -> Vec<RouterCommand> {
        lock(&self.sent).clone()
    }

    pub fn info_calls(&self) -> usize {
        self.info_calls.load(Ordering::SeqCst)
    }

    fn reply_for(&self, path: &str, action: &str) -> Option<ScriptedReply> {
        lock(&self.replies).get(&(path.to_owned(), action.to_owned())).cloned()
    }

    fn ensure_connected(&self) -> Result<(), PortError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(PortError::NotConnected)
        }
    }

    /// Wait out the configured latency, or forever for `Hang`.
    async fn answer_delay(&self, cancel: &CancellationToken, hang: bool) -> Result<(), PortError> {
        let delay = async {
            if hang {
                std::future::pending::<()>().await;
            } else if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
        };
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(PortError::Cancelled),
            () = delay => Ok(()),
        }
    }
}

impl std::fmt::Debug for ScriptedPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedPort")
            .field("protocol", &self.protocol)
            .field("connected", &self.is_connected())
            .field("replies", &lock(&self.replies).len())
            .field("sent", &lock(&self.sent).len())
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl RouterPort for ScriptedPort {
    async fn connect(&self) -> Result<(), PortError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), PortError> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn info(&self) -> Result<RouterInfo, PortError> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        self.ensure_connected()?;
        self.info
            .clone()
            .ok_or_else(|| PortError::Transport("device info unavailable".to_owned()))
    }

    async fn execute_command(&self, cancel: &CancellationToken, cmd: RouterCommand) -> Result<RouterResult, PortError> {
        self.ensure_connected()?;
        let start = Instant::now();
        lock(&self.sent).push(cmd.clone());
        debug!(path = cmd.path.as_str(), action = cmd.action.as_str(), "scripted command received");

        let reply = self
            .reply_for(&cmd.path, &cmd.action)
            .ok_or_else(|| PortError::Unscripted {
                path: cmd.path.clone(),
                action: cmd.action.clone(),
            })?;
        self.answer_delay(cancel, reply == ScriptedReply::Hang).await?;

        let result = match reply {
            ScriptedReply::Records { records } => RouterResult::records(records),
            ScriptedReply::Created { id } => RouterResult::created(id),
            ScriptedReply::Done | ScriptedReply::Hang => RouterResult::ok(),
            ScriptedReply::Failed { message, retryable } => {
                let mut err = AdapterError::new(self.protocol, cmd.action.as_str(), message);
                err.retryable = retryable;
                RouterResult::failed(err)
            }
            ScriptedReply::Error { message } => return Err(PortError::Transport(message)),
        };
        Ok(result.with_duration(start.elapsed()))
    }

    async fn query_state(&self, cancel: &CancellationToken, query: StateQuery) -> Result<StateResult, PortError> {
        self.ensure_connected()?;
        let start = Instant::now();
        let reply = self.reply_for(&query.path, "print").ok_or_else(|| PortError::Unscripted {
            path: query.path.clone(),
            action: "print".to_owned(),
        })?;
        self.answer_delay(cancel, reply == ScriptedReply::Hang).await?;

        let ScriptedReply::Records { records } = reply else {
            return Err(PortError::Transport(format!("{} does not hold state records", query.path)));
        };
        let resources: Vec<NativeRecord> = records
            .into_iter()
            .filter(|rec| query.filter.iter().all(|(k, v)| rec.get(k) == Some(v)))
            .take(query.limit.unwrap_or(usize::MAX))
            .map(|rec| project(rec, &query.fields))
            .collect();
        Ok(StateResult {
            count: resources.len(),
            resources,
            duration: start.elapsed(),
        })
    }

    fn protocol(&self) -> Protocol {
        self.protocol
    }
}

fn project(record: NativeRecord, fields: &[String]) -> NativeRecord {
    if fields.is_empty() {
        return record;
    }
    record.into_iter().filter(|(k, _)| fields.contains(k)).collect()
}

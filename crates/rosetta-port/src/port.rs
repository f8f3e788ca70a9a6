// ── RouterPort contract ──
//
// What a per-protocol transport must offer for commands to be executed
// through the translation layer. Native commands and results are
// string-keyed: the transport never sees typed values.

use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use rosetta_core::{DeviceVersion, Protocol};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::PortError;

/// One device record as the transport returns it.
pub type NativeRecord = IndexMap<String, String>;

/// Argument key carrying the comma-joined property list.
pub const PROPLIST_ARG: &str = ".proplist";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterCommand {
    pub path: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub args: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Space-separated `field<op>value` segments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl RouterCommand {
    pub fn new(path: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            action: action.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct RouterResult {
    pub success: bool,
    pub data: Vec<NativeRecord>,
    /// Id of the created or modified item.
    pub id: Option<String>,
    pub error: Option<PortError>,
    pub duration: Duration,
    pub raw_output: Option<String>,
}

impl RouterResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn records(data: Vec<NativeRecord>) -> Self {
        Self {
            success: true,
            data,
            ..Self::default()
        }
    }

    pub fn created(id: impl Into<String>) -> Self {
        Self {
            success: true,
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn failed(error: impl Into<PortError>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Identity and system information a device reports about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterInfo {
    pub version: DeviceVersion,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub identity: String,
    #[serde(default)]
    pub board_name: String,
    #[serde(default)]
    pub architecture: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(default, with = "uptime_text")]
    pub uptime: Duration,
}

impl RouterInfo {
    pub fn new(version: DeviceVersion) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }
}

/// Read-only query against a state path such as `/system/resource`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateQuery {
    pub path: String,
    /// Fields to return; empty means all.
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub filter: IndexMap<String, String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Default)]
pub struct StateResult {
    pub resources: Vec<NativeRecord>,
    pub count: usize,
    pub duration: Duration,
}

/// Connection to one device over one protocol.
///
/// Implementations must honor the cancellation token handed to
/// [`execute_command`](Self::execute_command) and
/// [`query_state`](Self::query_state): once it fires, the call should return
/// [`PortError::Cancelled`] promptly.
#[async_trait]
pub trait RouterPort: Send + Sync {
    async fn connect(&self) -> Result<(), PortError>;

    async fn disconnect(&self) -> Result<(), PortError>;

    fn is_connected(&self) -> bool;

    /// Identity of the device, including the OS version it runs.
    async fn info(&self) -> Result<RouterInfo, PortError>;

    async fn execute_command(&self, cancel: &CancellationToken, cmd: RouterCommand) -> Result<RouterResult, PortError>;

    async fn query_state(&self, cancel: &CancellationToken, query: StateQuery) -> Result<StateResult, PortError>;

    fn protocol(&self) -> Protocol;
}

/// Uptime as human-readable text ("3d 4h") in serialized device info.
mod uptime_text {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}

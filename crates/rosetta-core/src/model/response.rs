// ── Canonical response ──
//
// What every protocol parser and the adapter bridge produce. `error` is set
// iff `success` is false, and then `data` is empty.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use super::command_error::CommandError;
use super::value::Record;

// ── Protocol ────────────────────────────────────────────────────────

/// Wire protocols a RouterOS device can be reached over.
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
#[strum(ascii_case_insensitive)]
pub enum Protocol {
    /// REST API, RouterOS 7.1+.
    #[serde(rename = "REST")]
    #[strum(to_string = "REST")]
    Rest,
    /// Binary API (8728).
    #[serde(rename = "API")]
    #[strum(to_string = "API")]
    Api,
    /// Binary API over TLS (8729).
    #[serde(rename = "API-SSL", alias = "API_SSL")]
    #[strum(to_string = "API-SSL", serialize = "API_SSL", serialize = "apissl")]
    ApiSsl,
    /// CLI over SSH.
    #[serde(rename = "SSH")]
    #[strum(to_string = "SSH", serialize = "cli")]
    Ssh,
    /// CLI over Telnet.
    #[serde(rename = "TELNET", alias = "Telnet")]
    #[strum(to_string = "TELNET")]
    Telnet,
}

impl Protocol {
    /// The protocol whose wire format is actually spoken. TLS does not change
    /// the API sentence format, and Telnet carries the same CLI text as SSH.
    pub fn wire_format(self) -> Self {
        match self {
            Self::ApiSsl => Self::Api,
            Self::Telnet => Self::Ssh,
            other => other,
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            Self::Rest => 80,
            Self::Api => 8728,
            Self::ApiSsl => 8729,
            Self::Ssh => 22,
            Self::Telnet => 23,
        }
    }
}

// ── Payload ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseData {
    Records(Vec<Record>),
    Record(Record),
    /// Unstructured text passed through as-is.
    Raw(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "duration_millis")]
    pub duration: Option<Duration>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub record_count: usize,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub total_count: usize,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl ResponseMetadata {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ── CanonicalResponse ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<CommandError>,
    #[serde(default, skip_serializing_if = "ResponseMetadata::is_empty")]
    pub metadata: ResponseMetadata,
}

impl CanonicalResponse {
    pub fn success(data: Option<ResponseData>) -> Self {
        Self {
            success: true,
            data,
            id: None,
            error: None,
            metadata: ResponseMetadata::default(),
        }
    }

    /// Bare success with nothing to report.
    pub fn ok() -> Self {
        Self::success(None)
    }

    pub fn records(records: Vec<Record>) -> Self {
        let count = records.len();
        let mut resp = Self::success(Some(ResponseData::Records(records)));
        resp.metadata.record_count = count;
        resp
    }

    pub fn record(record: Record) -> Self {
        let mut resp = Self::success(Some(ResponseData::Record(record)));
        resp.metadata.record_count = 1;
        resp
    }

    pub fn raw(text: impl Into<String>) -> Self {
        Self::success(Some(ResponseData::Raw(text.into())))
    }

    pub fn created(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::ok()
        }
    }

    pub fn failure(error: CommandError) -> Self {
        Self {
            success: false,
            data: None,
            id: None,
            error: Some(error),
            metadata: ResponseMetadata::default(),
        }
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.metadata.protocol = Some(protocol);
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.metadata.duration = Some(duration);
        self
    }

    pub fn with_id(mut self, id: Option<String>) -> Self {
        self.id = id;
        self
    }

    /// All records in the payload, whichever shape it has.
    pub fn record_slice(&self) -> &[Record] {
        match &self.data {
            Some(ResponseData::Records(records)) => records,
            Some(ResponseData::Record(record)) => std::slice::from_ref(record),
            Some(ResponseData::Raw(_)) | None => &[],
        }
    }

    pub fn first_record(&self) -> Option<&Record> {
        self.record_slice().first()
    }

    pub fn raw_text(&self) -> Option<&str> {
        match &self.data {
            Some(ResponseData::Raw(text)) => Some(text),
            _ => None,
        }
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}

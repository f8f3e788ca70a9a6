// ── Protocol formatters ──
//
// One formatter per wire format. `format` renders a canonical command into
// what the transport sends; `parse` turns whatever the device answered into
// a canonical response. Device-side failures are successful parses that
// produce a failed `CanonicalResponse`; `Err` is reserved for commands the
// wire format cannot express.

mod api;
mod cli;
mod rest;

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

pub use api::ApiFormatter;
pub use cli::CliFormatter;
pub use rest::RestFormatter;

use crate::error::CoreError;
use crate::model::{CanonicalCommand, CanonicalResponse, Protocol, Value};

pub trait Formatter: Send + Sync {
    /// The wire format this formatter speaks.
    fn protocol(&self) -> Protocol;

    fn format(&self, cmd: &CanonicalCommand) -> Result<Rendered, CoreError>;

    fn parse(&self, raw: &str) -> Result<CanonicalResponse, CoreError>;
}

/// Formatter for the wire format `protocol` actually speaks.
pub fn formatter_for(protocol: Protocol) -> Box<dyn Formatter> {
    match protocol.wire_format() {
        Protocol::Rest => Box::new(RestFormatter),
        Protocol::Api | Protocol::ApiSsl => Box::new(ApiFormatter),
        Protocol::Ssh | Protocol::Telnet => Box::new(CliFormatter),
    }
}

// ── Rendered commands ───────────────────────────────────────────────

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Put,
    Patch,
    Delete,
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestRequest {
    pub method: HttpMethod,
    pub path: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub query: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<IndexMap<String, serde_json::Value>>,
}

/// A command in transport form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rendered {
    /// One line of CLI script.
    Script { script: String },
    /// API sentence: command word followed by attribute and query words.
    Sentence { command: String, words: Vec<String> },
    Request(RestRequest),
}

impl Rendered {
    pub fn as_script(&self) -> Option<&str> {
        match self {
            Self::Script { script } => Some(script),
            _ => None,
        }
    }
}

impl fmt::Display for Rendered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Script { script } => f.write_str(script),
            Self::Sentence { command, words } => {
                f.write_str(command)?;
                for word in words {
                    write!(f, "\n{word}")?;
                }
                Ok(())
            }
            Self::Request(req) => {
                write!(f, "{} {}", req.method, req.path)?;
                let mut sep = '?';
                for (k, v) in &req.query {
                    write!(f, "{sep}{k}={v}")?;
                    sep = '&';
                }
                if let Some(body) = &req.body {
                    let json = serde_json::to_string(body).map_err(|_| fmt::Error)?;
                    write!(f, " {json}")?;
                }
                Ok(())
            }
        }
    }
}

/// Plain device text for a value: `yes`/`no` for booleans, comma-joined lists.
pub(crate) fn device_text(value: &Value) -> String {
    match value {
        Value::Bool(b) => crate::mapping::codec::format_bool(*b).to_owned(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::CanonicalCommand;

    #[test]
    fn selects_formatter_by_wire_format() {
        assert_eq!(formatter_for(Protocol::ApiSsl).protocol(), Protocol::Api);
        assert_eq!(formatter_for(Protocol::Telnet).protocol(), Protocol::Ssh);
        assert_eq!(formatter_for(Protocol::Rest).protocol(), Protocol::Rest);
    }

    #[test]
    fn sentence_display_is_one_word_per_line() {
        let cmd = CanonicalCommand::remove("/ip/address", "*4").build();
        let rendered = ApiFormatter.format(&cmd).unwrap();
        assert_eq!(rendered.to_string(), "/ip/address/remove\n=.id=*4");
    }

    #[test]
    fn request_display_includes_query_and_body() {
        let cmd = CanonicalCommand::set("/interface", "*1").param("mtu", 1500).build();
        let rendered = RestFormatter.format(&cmd).unwrap();
        assert_eq!(rendered.to_string(), r#"PATCH /rest/interface/*1 {"mtu":1500}"#);

        let cmd = CanonicalCommand::print("/interface").filter_eq("type", "ether").build();
        let rendered = RestFormatter.format(&cmd).unwrap();
        assert_eq!(rendered.to_string(), "GET /rest/interface?type=ether");
    }

    #[test]
    fn rendered_serializes_with_kind_tag() {
        let rendered = Rendered::Script {
            script: "/interface print".into(),
        };
        assert_eq!(
            serde_json::to_value(&rendered).unwrap(),
            serde_json::json!({"kind": "script", "script": "/interface print"})
        );
    }
}

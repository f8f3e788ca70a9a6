// ── REST formatter (RouterOS 7.1+) ──

use indexmap::IndexMap;
use serde_json::Value as Json;

use super::{Formatter, HttpMethod, Rendered, RestRequest, device_text};
use crate::classify::category_hint;
use crate::error::CoreError;
use crate::mapping::codec::{format_bool, format_duration};
use crate::model::{Action, CanonicalCommand, CanonicalResponse, CommandError, ErrorCategory, Protocol, Record, Value};

const REST_PREFIX: &str = "/rest";

#[derive(Debug, Clone, Copy, Default)]
pub struct RestFormatter;

impl Formatter for RestFormatter {
    fn protocol(&self) -> Protocol {
        Protocol::Rest
    }

    fn format(&self, cmd: &CanonicalCommand) -> Result<Rendered, CoreError> {
        let action = cmd.action();
        let mut path = format!("{REST_PREFIX}{}", cmd.path());
        if matches!(
            action,
            Action::Get | Action::Set | Action::Remove | Action::Enable | Action::Disable
        ) {
            // Items are addressed in the URL; there is no find-by-filter.
            let id = cmd.id().ok_or(CoreError::MissingField("id"))?;
            path = format!("{path}/{id}");
        }

        let mut query = IndexMap::new();
        let mut body = None;
        let method = match action {
            Action::Print => {
                for filter in cmd.filters() {
                    query.insert(filter.field.clone(), device_text(&filter.value));
                }
                if !cmd.proplist().is_empty() {
                    query.insert(".proplist".to_owned(), cmd.proplist().join(","));
                }
                HttpMethod::Get
            }
            Action::Get => HttpMethod::Get,
            Action::Add => {
                body = Some(json_body(cmd.parameters()));
                HttpMethod::Put
            }
            Action::Set => {
                body = Some(json_body(cmd.parameters()));
                HttpMethod::Patch
            }
            Action::Remove => HttpMethod::Delete,
            Action::Enable | Action::Disable => {
                let flag = format_bool(action == Action::Disable);
                body = Some(IndexMap::from([("disabled".to_owned(), Json::from(flag))]));
                HttpMethod::Patch
            }
            Action::Move => HttpMethod::Post,
        };

        Ok(Rendered::Request(RestRequest {
            method,
            path,
            query,
            body,
        }))
    }

    fn parse(&self, raw: &str) -> Result<CanonicalResponse, CoreError> {
        let resp = if raw.trim().is_empty() {
            CanonicalResponse::ok()
        } else {
            match serde_json::from_str::<Json>(raw) {
                Ok(Json::Array(items)) => CanonicalResponse::records(
                    items
                        .into_iter()
                        .filter_map(|item| match item {
                            Json::Object(obj) => Some(record_from(obj)),
                            _ => None,
                        })
                        .collect(),
                ),
                Ok(Json::Object(obj)) => parse_object(obj),
                Ok(_) | Err(_) => CanonicalResponse::raw(raw),
            }
        };
        Ok(resp.with_protocol(Protocol::Rest))
    }
}

fn json_value(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::from(format_bool(*b)),
        Value::Int(i) => Json::from(*i),
        Value::Str(s) => Json::from(s.as_str()),
        Value::List(items) => Json::from(items.join(",")),
        Value::Duration(d) => Json::from(format_duration(*d)),
    }
}

fn json_body(params: &Record) -> IndexMap<String, Json> {
    params.iter().map(|(k, v)| (k.clone(), json_value(v))).collect()
}

fn record_from(obj: serde_json::Map<String, Json>) -> Record {
    obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect()
}

fn parse_object(mut obj: serde_json::Map<String, Json>) -> CanonicalResponse {
    if let Some(status) = obj.get("error") {
        let status = match status {
            Json::Number(n) => n.as_u64(),
            Json::String(s) => s.parse().ok(),
            _ => None,
        };
        let text = |key: &str| obj.get(key).and_then(Json::as_str).unwrap_or_default().to_owned();
        let (message, detail) = (text("message"), text("detail"));
        let message = if detail.is_empty() {
            message
        } else {
            format!("{message}: {detail}")
        };
        let code = status.map_or_else(|| "REST_ERROR".to_owned(), |s| format!("REST_{s}"));
        let category = status_category(status, &message);
        return CanonicalResponse::failure(CommandError::new(code, message, category));
    }

    if let Some(ret) = obj.remove("ret") {
        let id = match ret {
            Json::String(s) => s,
            other => other.to_string(),
        };
        return CanonicalResponse::created(id);
    }

    CanonicalResponse::record(record_from(obj))
}

fn status_category(status: Option<u64>, message: &str) -> ErrorCategory {
    match status {
        Some(400) => ErrorCategory::Validation,
        Some(401 | 403) => ErrorCategory::Permission,
        Some(404) => ErrorCategory::NotFound,
        Some(409) => ErrorCategory::Conflict,
        Some(408 | 504) => ErrorCategory::Timeout,
        Some(500 | 502 | 503) => ErrorCategory::Internal,
        _ => category_hint(message).unwrap_or(ErrorCategory::Internal),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn request(cmd: &CanonicalCommand) -> RestRequest {
        match RestFormatter.format(cmd).unwrap() {
            Rendered::Request(req) => req,
            other => panic!("expected a request, got {other:?}"),
        }
    }

    #[test]
    fn print_puts_filters_in_query() {
        let req = request(
            &CanonicalCommand::print("/ip/address")
                .filter_eq("interface", "ether1")
                .filter_eq("dynamic", false)
                .proplist(["address", "network"])
                .build(),
        );
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "/rest/ip/address");
        assert_eq!(req.query["interface"], "ether1");
        assert_eq!(req.query["dynamic"], "no");
        assert_eq!(req.query[".proplist"], "address,network");
        assert!(req.body.is_none());
    }

    #[test]
    fn methods_per_action() {
        let cases = [
            (CanonicalCommand::get("/interface", "*1").build(), HttpMethod::Get, "/rest/interface/*1"),
            (CanonicalCommand::add("/interface/vlan").build(), HttpMethod::Put, "/rest/interface/vlan"),
            (CanonicalCommand::set("/interface", "*1").build(), HttpMethod::Patch, "/rest/interface/*1"),
            (CanonicalCommand::remove("/interface", "*1").build(), HttpMethod::Delete, "/rest/interface/*1"),
            (CanonicalCommand::move_item("/ip/firewall/filter", "*5").build(), HttpMethod::Post, "/rest/ip/firewall/filter"),
        ];
        for (cmd, method, path) in cases {
            let req = request(&cmd);
            assert_eq!(req.method, method, "{}", cmd.action());
            assert_eq!(req.path, path);
        }
    }

    #[test]
    fn add_body_formats_values() {
        let req = request(
            &CanonicalCommand::add("/interface/vlan")
                .param("name", "vlan10")
                .param("vlan-id", 10)
                .param("disabled", false)
                .build(),
        );
        let body = req.body.unwrap();
        assert_eq!(body["name"], Json::from("vlan10"));
        assert_eq!(body["vlan-id"], Json::from(10));
        assert_eq!(body["disabled"], Json::from("no"));
    }

    #[test]
    fn disable_patches_flag() {
        let req = request(&CanonicalCommand::disable("/interface", "*2").build());
        assert_eq!(req.method, HttpMethod::Patch);
        assert_eq!(req.body.unwrap()["disabled"], Json::from("yes"));
    }

    #[test]
    fn item_actions_need_an_id() {
        let cmd = CanonicalCommand::builder()
            .path("/interface")
            .action(Action::Set)
            .filter_eq("name", "ether1")
            .build();
        assert!(matches!(RestFormatter.format(&cmd), Err(CoreError::MissingField("id"))));
    }

    #[test]
    fn parses_array_and_object() {
        let list = RestFormatter.parse(r#"[{".id":"*1","name":"ether1"},{".id":"*2","name":"ether2"}]"#).unwrap();
        assert_eq!(list.metadata.record_count, 2);

        let single = RestFormatter.parse(r#"{".id":"*1","mtu":"1500"}"#).unwrap();
        assert_eq!(single.first_record().unwrap()["mtu"], Value::from("1500"));
        assert_eq!(single.metadata.record_count, 1);
    }

    #[test]
    fn parses_created_id() {
        let resp = RestFormatter.parse(r#"{"ret":"*3"}"#).unwrap();
        assert_eq!(resp.id.as_deref(), Some("*3"));
    }

    #[test]
    fn error_status_mapping() {
        let cases = [
            (400, ErrorCategory::Validation),
            (401, ErrorCategory::Permission),
            (403, ErrorCategory::Permission),
            (404, ErrorCategory::NotFound),
            (409, ErrorCategory::Conflict),
            (408, ErrorCategory::Timeout),
            (504, ErrorCategory::Timeout),
            (500, ErrorCategory::Internal),
        ];
        for (status, category) in cases {
            let raw = format!(r#"{{"error":{status},"message":"Something"}}"#);
            let err = RestFormatter.parse(&raw).unwrap().error.unwrap();
            assert_eq!(err.category, category, "{status}");
            assert_eq!(err.code, format!("REST_{status}"));
        }
    }

    #[test]
    fn error_message_joins_detail() {
        let raw = r#"{"error":418,"message":"Bad Request","detail":"no such item"}"#;
        let err = RestFormatter.parse(raw).unwrap().error.unwrap();
        assert_eq!(err.message, "Bad Request: no such item");
        assert_eq!(err.category, ErrorCategory::NotFound);
    }

    #[test]
    fn non_json_is_raw() {
        let resp = RestFormatter.parse("<html>gateway</html>").unwrap();
        assert_eq!(resp.raw_text(), Some("<html>gateway</html>"));
        assert_eq!(resp.metadata.protocol, Some(Protocol::Rest));
    }
}

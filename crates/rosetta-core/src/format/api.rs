// ── Binary API sentence formatter ──
//
// Renders `/path/verb` sentences with `=attr=value` and `?query` words.
// Replies are accepted either as the JSON envelope a transport produces
// (`{"re": [...], "done": {...}, "trap": {...}}`) or as the raw reply
// stream (`!re`, `=key=value`, `!done`, `!trap`).

use indexmap::IndexMap;
use serde::Deserialize;

use super::{Formatter, Rendered, device_text};
use crate::classify::category_hint;
use crate::error::CoreError;
use crate::model::{
    Action, CanonicalCommand, CanonicalResponse, CommandError, ErrorCategory, Filter, FilterOp, Protocol, Record, Value,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct ApiFormatter;

impl Formatter for ApiFormatter {
    fn protocol(&self) -> Protocol {
        Protocol::Api
    }

    fn format(&self, cmd: &CanonicalCommand) -> Result<Rendered, CoreError> {
        let action = cmd.action();
        let mut words = Vec::new();

        if let Some(id) = cmd.id() {
            words.push(format!("=.id={id}"));
        }
        if action.carries_parameters() {
            words.extend(
                cmd.parameters()
                    .iter()
                    .map(|(key, value)| format!("={key}={}", device_text(value))),
            );
        }
        match action {
            Action::Enable => words.push("=disabled=no".to_owned()),
            Action::Disable => words.push("=disabled=yes".to_owned()),
            _ => {}
        }
        words.extend(cmd.filters().iter().map(query_word));
        if !cmd.proplist().is_empty() {
            words.push(format!("=.proplist={}", cmd.proplist().join(",")));
        }

        Ok(Rendered::Sentence {
            command: format!("{}/{}", cmd.path(), verb(action)),
            words,
        })
    }

    fn parse(&self, raw: &str) -> Result<CanonicalResponse, CoreError> {
        let resp = if raw.trim().is_empty() {
            CanonicalResponse::ok()
        } else if let Ok(envelope) = serde_json::from_str::<Envelope>(raw) {
            envelope.into_response()
        } else {
            parse_reply_stream(raw)
        };
        Ok(resp.with_protocol(Protocol::Api))
    }
}

fn verb(action: Action) -> &'static str {
    match action {
        Action::Get | Action::Print => "print",
        Action::Add => "add",
        Action::Set | Action::Enable | Action::Disable => "set",
        Action::Remove => "remove",
        Action::Move => "move",
    }
}

/// The API has no inequality query word; `!=` degrades to `=`.
fn query_word(filter: &Filter) -> String {
    let op = match filter.op {
        FilterOp::Ne => FilterOp::Eq.as_str(),
        other => other.as_str(),
    };
    format!("?{}{op}{}", filter.field, device_text(&filter.value))
}

/// Trap text first, then the numeric trap category.
fn trap_category(category: &str, message: &str) -> ErrorCategory {
    if let Some(hint) = category_hint(message) {
        return hint;
    }
    match category {
        "1" => ErrorCategory::Validation,
        "4" => ErrorCategory::Permission,
        _ => ErrorCategory::Internal,
    }
}

// ── JSON envelope ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    re: Vec<IndexMap<String, serde_json::Value>>,
    #[serde(default)]
    done: Option<IndexMap<String, serde_json::Value>>,
    #[serde(default)]
    trap: Option<Trap>,
}

#[derive(Debug, Deserialize)]
struct Trap {
    #[serde(default)]
    category: Option<serde_json::Value>,
    #[serde(default)]
    message: String,
}

fn json_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl Envelope {
    fn into_response(self) -> CanonicalResponse {
        if let Some(trap) = self.trap {
            let category = trap.category.as_ref().map(json_text).unwrap_or_default();
            return CanonicalResponse::failure(CommandError::new(
                "API_TRAP",
                trap.message.as_str(),
                trap_category(&category, &trap.message),
            ));
        }

        if let Some(ret) = self.done.as_ref().and_then(|done| done.get("ret")) {
            return CanonicalResponse::created(json_text(ret));
        }

        if self.re.is_empty() {
            return CanonicalResponse::ok();
        }
        let records = self
            .re
            .into_iter()
            .map(|re| re.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            .collect();
        CanonicalResponse::records(records)
    }
}

// ── Raw reply stream ────────────────────────────────────────────────

#[derive(Default)]
struct ReplyState {
    records: Vec<Record>,
    current: Option<Record>,
    in_trap: bool,
    trap: Option<(String, String)>,
    ret: Option<String>,
}

impl ReplyState {
    fn flush(&mut self) {
        if let Some(record) = self.current.take() {
            self.records.push(record);
        }
    }

    fn word(&mut self, key: &str, value: &str) {
        if self.in_trap {
            let (category, message) = self.trap.get_or_insert_with(Default::default);
            match key {
                "category" => *category = value.to_owned(),
                "message" => *message = value.to_owned(),
                _ => {}
            }
        } else if key == "ret" {
            self.ret = Some(value.to_owned());
        } else if let Some(record) = self.current.as_mut() {
            record.insert(key.to_owned(), Value::from(value));
        }
    }
}

fn parse_reply_stream(raw: &str) -> CanonicalResponse {
    let mut state = ReplyState::default();

    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match line {
            "!re" => {
                state.flush();
                state.in_trap = false;
                state.current = Some(Record::new());
            }
            "!done" => {
                state.flush();
                state.in_trap = false;
            }
            "!trap" => {
                state.flush();
                state.in_trap = true;
                state.trap.get_or_insert_with(Default::default);
            }
            word => {
                if let Some((key, value)) = word.strip_prefix('=').and_then(|w| w.split_once('=')) {
                    state.word(key, value);
                }
            }
        }
    }
    state.flush();

    if let Some((category, message)) = state.trap {
        let message = if message.is_empty() {
            "command failed".to_owned()
        } else {
            message
        };
        let category = trap_category(&category, &message);
        return CanonicalResponse::failure(CommandError::new("API_ERROR", message, category));
    }
    if let Some(ret) = state.ret {
        return CanonicalResponse::created(ret);
    }
    if state.records.is_empty() {
        CanonicalResponse::ok()
    } else {
        CanonicalResponse::records(state.records)
    }
}

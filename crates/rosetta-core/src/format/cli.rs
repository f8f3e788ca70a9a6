// ── CLI script formatter and output parser ──
//
// Renders single-line RouterOS console commands and recovers records from
// console output. Output parsing is heuristic: it recognizes numbered and
// flagged tables, `key=value` / `key: value` blocks, detail-print rows, and
// bare created-item ids, and passes anything else through as raw text.

use std::sync::LazyLock;

use regex::Regex;

use super::{Formatter, Rendered};
use crate::error::CoreError;
use crate::model::{
    Action, CanonicalCommand, CanonicalResponse, CommandError, ErrorCategory, Filter, Protocol, Record, Value,
};

fn pattern(re: &str) -> Regex {
    Regex::new(re).unwrap_or_else(|e| unreachable!("CLI pattern is a literal: {e}"))
}

static NUMBERED_ROW: LazyLock<Regex> = LazyLock::new(|| pattern(r"^\s*(\d+)\s+"));
static FLAGS: LazyLock<Regex> = LazyLock::new(|| pattern(r"^([XRDI]+)\s+"));
static KEY_VALUE: LazyLock<Regex> = LazyLock::new(|| pattern(r"^\s*([a-zA-Z-]+)\s*[=:]\s*(.*)$"));
static CREATED_ID: LazyLock<Regex> = LazyLock::new(|| pattern(r"^\*[0-9A-Fa-f]+$"));
static TOKEN_ROW: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r#"^\s*(?:[a-zA-Z.][a-zA-Z0-9.-]*=(?:"(?:[^"\\]|\\.)*"|[^\s"]*)\s*)+$"#)
});
static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| pattern(r#"([a-zA-Z.][a-zA-Z0-9.-]*)=("(?:[^"\\]|\\.)*"|[^\s"]*)"#));

/// Lower-cased phrases that mark console output as a failure.
const ERROR_PHRASES: &[&str] = &[
    "bad command name",
    "expected end of command",
    "syntax error",
    "no such item",
    "failure:",
    "input does not match any value",
    "invalid value",
    "already have",
];

const QUOTE_TRIGGERS: &[char] = &[' ', '\t', '\n', '"', '\'', '\\', ';'];

#[derive(Debug, Clone, Copy, Default)]
pub struct CliFormatter;

impl Formatter for CliFormatter {
    fn protocol(&self) -> Protocol {
        Protocol::Ssh
    }

    fn format(&self, cmd: &CanonicalCommand) -> Result<Rendered, CoreError> {
        Ok(Rendered::Script {
            script: build_script(cmd),
        })
    }

    fn parse(&self, raw: &str) -> Result<CanonicalResponse, CoreError> {
        Ok(parse_output(raw).with_protocol(Protocol::Ssh))
    }
}

// ── Formatting ──────────────────────────────────────────────────────

fn build_script(cmd: &CanonicalCommand) -> String {
    let mut parts = vec![console_path(cmd.path()), verb(cmd.action()).to_owned()];
    let action = cmd.action();

    if let Some(id) = cmd.id() {
        parts.push(format!("[find .id={}]", escape_text(id)));
    } else if !cmd.filters().is_empty()
        && matches!(action, Action::Set | Action::Remove | Action::Enable | Action::Disable)
    {
        let conditions: Vec<String> = cmd.filters().iter().map(condition).collect();
        parts.push(format!("[find {}]", conditions.join(" ")));
    }

    if action.carries_parameters() {
        parts.extend(
            cmd.parameters()
                .iter()
                .map(|(key, value)| format!("{key}={}", escape_value(value))),
        );
    }

    match action {
        Action::Enable => parts.push("disabled=no".to_owned()),
        Action::Disable => parts.push("disabled=yes".to_owned()),
        _ => {}
    }

    if matches!(action, Action::Print | Action::Get) && !cmd.filters().is_empty() {
        parts.push("where".to_owned());
        parts.extend(cmd.filters().iter().map(condition));
    }

    parts.join(" ")
}

/// `/interface/ethernet` -> `/interface ethernet`.
fn console_path(path: &str) -> String {
    match path.strip_prefix('/') {
        Some(rest) => format!("/{}", rest.replace('/', " ")),
        None => path.to_owned(),
    }
}

fn verb(action: Action) -> &'static str {
    match action {
        Action::Get | Action::Print => "print",
        Action::Add => "add",
        Action::Set => "set",
        Action::Remove => "remove",
        Action::Enable => "enable",
        Action::Disable => "disable",
        Action::Move => "move",
    }
}

fn condition(filter: &Filter) -> String {
    format!("{}{}{}", filter.field, filter.op.as_str(), escape_value(&filter.value))
}

/// Console form of a value, quoted when it would otherwise split the command.
pub fn escape_value(value: &Value) -> String {
    match value {
        Value::Bool(b) => crate::mapping::codec::format_bool(*b).to_owned(),
        other => escape_text(&other.to_string()),
    }
}

fn escape_text(text: &str) -> String {
    if !text.contains(QUOTE_TRIGGERS) {
        return text.to_owned();
    }
    let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

// ── Parsing ─────────────────────────────────────────────────────────

fn parse_output(text: &str) -> CanonicalResponse {
    if text.trim().is_empty() {
        return CanonicalResponse::ok();
    }

    if let Some(error) = detect_error(text) {
        return CanonicalResponse::failure(error);
    }

    let records = parse_records(text);
    if !records.is_empty() {
        return CanonicalResponse::records(records);
    }

    if let Some(id) = text.lines().map(str::trim).find(|l| CREATED_ID.is_match(l)) {
        return CanonicalResponse::created(id);
    }

    CanonicalResponse::raw(text)
}

fn detect_error(text: &str) -> Option<CommandError> {
    let lower = text.to_lowercase();
    if !ERROR_PHRASES.iter().any(|p| lower.contains(p)) {
        return None;
    }

    let (code, category) = if lower.contains("no such item") {
        ("NOT_FOUND", ErrorCategory::NotFound)
    } else if lower.contains("already have") {
        ("DUPLICATE", ErrorCategory::Conflict)
    } else if lower.contains("invalid value") || lower.contains("syntax error") {
        ("VALIDATION_ERROR", ErrorCategory::Validation)
    } else if lower.contains("bad command") {
        ("BAD_COMMAND", ErrorCategory::Unsupported)
    } else {
        ("CLI_ERROR", ErrorCategory::Internal)
    };

    let message = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or(text);
    Some(CommandError::new(code, message, category))
}

/// Accumulates records line by line.
#[derive(Default)]
struct TableParser {
    records: Vec<Record>,
    current: Option<Record>,
    /// The row's index line held only a `;;;` comment; its columns follow.
    columns_pending: bool,
}

impl TableParser {
    fn flush(&mut self) {
        if let Some(record) = self.current.take() {
            self.records.push(record);
        }
        self.columns_pending = false;
    }

    fn current(&mut self) -> &mut Record {
        self.current.get_or_insert_with(Record::new)
    }

    fn line(&mut self, line: &str) {
        let trimmed = line.trim();
        if trimmed.is_empty()
            || line.starts_with("Flags:")
            || line.starts_with("Columns:")
            || trimmed.starts_with('#')
        {
            return;
        }

        if let Some(caps) = NUMBERED_ROW.captures(line) {
            self.flush();
            let mut record = Record::new();
            record.insert("_index".to_owned(), Value::from(&caps[1]));
            self.current = Some(record);
            self.row(&line[caps[0].len()..]);
            return;
        }

        if let Some(comment) = trimmed.strip_prefix(";;;") {
            self.current()
                .insert("comment".to_owned(), Value::from(comment.trim()));
            return;
        }

        if TOKEN_ROW.is_match(line) {
            insert_tokens(self.current(), line);
            self.columns_pending = false;
            return;
        }

        if let Some(caps) = KEY_VALUE.captures(line) {
            self.current()
                .insert(caps[1].to_owned(), Value::from(caps[2].trim()));
            self.columns_pending = false;
            return;
        }

        let indented = line.starts_with(char::is_whitespace);
        if self.columns_pending && indented {
            if let Some(record) = self.current.as_mut() {
                insert_columns(record, trimmed);
            }
            self.columns_pending = false;
        }
    }

    /// Everything after the row index: flags, then columns or tokens.
    fn row(&mut self, rest: &str) {
        let mut rest = rest;
        let record = self.current();
        if let Some(caps) = FLAGS.captures(rest) {
            let flags = &caps[1];
            record.insert("_flags".to_owned(), Value::from(flags));
            for (letter, field) in [('X', "disabled"), ('R', "running"), ('D', "dynamic"), ('I', "invalid")] {
                record.insert(field.to_owned(), Value::Bool(flags.contains(letter)));
            }
            rest = &rest[caps[0].len()..];
        }

        let rest = rest.trim();
        let comment_only = if let Some(comment) = rest.strip_prefix(";;;") {
            record.insert("comment".to_owned(), Value::from(comment.trim()));
            true
        } else {
            if TOKEN_ROW.is_match(rest) {
                insert_tokens(record, rest);
            } else {
                insert_columns(record, rest);
            }
            false
        };
        self.columns_pending = comment_only;
    }
}

/// Positional columns: the first two are name and type.
fn insert_columns(record: &mut Record, text: &str) {
    let mut fields = text.split_whitespace();
    if let Some(name) = fields.next() {
        record.insert("name".to_owned(), Value::from(name));
    }
    if let Some(kind) = fields.next() {
        record.insert("type".to_owned(), Value::from(kind));
    }
}

fn insert_tokens(record: &mut Record, text: &str) {
    for caps in TOKEN.captures_iter(text) {
        record.insert(caps[1].to_owned(), Value::Str(unquote(&caps[2])));
    }
}

fn unquote(raw: &str) -> String {
    let Some(inner) = raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')) else {
        return raw.to_owned();
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn parse_records(text: &str) -> Vec<Record> {
    let mut parser = TableParser::default();
    for line in text.lines() {
        parser.line(line.trim_end_matches('\r'));
    }
    parser.flush();
    parser.records
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::FilterOp;

    fn script(cmd: &CanonicalCommand) -> String {
        CliFormatter.format(cmd).unwrap().as_script().unwrap().to_owned()
    }

    #[test]
    fn print_with_where_clause() {
        let cmd = CanonicalCommand::print("/interface/ethernet")
            .filter_eq("running", true)
            .filter("mtu", FilterOp::Gt, 1500)
            .build();
        assert_eq!(script(&cmd), "/interface ethernet print where running=yes mtu>1500");
    }

    #[test]
    fn get_prints_by_id() {
        let cmd = CanonicalCommand::get("/ip/address", "*1").build();
        assert_eq!(script(&cmd), "/ip address print [find .id=*1]");
    }

    #[test]
    fn set_by_id_with_quoted_value() {
        let cmd = CanonicalCommand::set("/interface", "*1")
            .param("comment", "hello world")
            .param("mtu", 1400)
            .build();
        assert_eq!(script(&cmd), r#"/interface set [find .id=*1] comment="hello world" mtu=1400"#);
    }

    #[test]
    fn set_by_filter_uses_find() {
        let cmd = CanonicalCommand::builder()
            .path("/interface")
            .action(Action::Set)
            .filter_eq("name", "ether1")
            .param("mtu", 1500)
            .build();
        assert_eq!(script(&cmd), "/interface set [find name=ether1] mtu=1500");
    }

    #[test]
    fn enable_and_disable_append_flag() {
        let enable = CanonicalCommand::enable("/interface", "*2").build();
        let disable = CanonicalCommand::builder()
            .path("/ip/route")
            .action(Action::Disable)
            .filter_eq("comment", "backup link")
            .build();
        assert_eq!(script(&enable), "/interface enable [find .id=*2] disabled=no");
        assert_eq!(script(&disable), r#"/ip route disable [find comment="backup link"] disabled=yes"#);
    }

    #[test]
    fn remove_ignores_parameters() {
        let cmd = CanonicalCommand::remove("/ip/address", "*7").param("ignored", "x").build();
        assert_eq!(script(&cmd), "/ip address remove [find .id=*7]");
    }

    #[test]
    fn add_joins_lists() {
        let cmd = CanonicalCommand::add("/interface/bridge/port")
            .param("bridge", "bridge1")
            .param("trusted", false)
            .param("tagged", vec!["ether2", "ether3"])
            .build();
        assert_eq!(
            script(&cmd),
            "/interface bridge port add bridge=bridge1 trusted=no tagged=ether2,ether3"
        );
    }

    #[test]
    fn escapes_quotes_and_backslashes() {
        assert_eq!(escape_value(&Value::from(r#"say "hi""#)), r#""say \"hi\"""#);
        assert_eq!(escape_value(&Value::from(r"C:\dir")), r#""C:\\dir""#);
        assert_eq!(escape_value(&Value::from("a;b")), r#""a;b""#);
        assert_eq!(escape_value(&Value::from("plain")), "plain");
        assert_eq!(escape_value(&Value::Bool(true)), "yes");
    }

    #[test]
    fn parses_flagged_table_row() {
        let resp = CliFormatter.parse("0 R  ether1  ether").unwrap();
        assert!(resp.success);
        let rec = resp.first_record().unwrap();
        assert_eq!(rec["_index"], Value::from("0"));
        assert_eq!(rec["_flags"], Value::from("R"));
        assert_eq!(rec["running"], Value::Bool(true));
        assert_eq!(rec["disabled"], Value::Bool(false));
        assert_eq!(rec["name"], Value::from("ether1"));
        assert_eq!(rec["type"], Value::from("ether"));
        assert_eq!(resp.metadata.protocol, Some(Protocol::Ssh));
    }

    #[test]
    fn empty_output_is_bare_success() {
        let resp = CliFormatter.parse("  \n").unwrap();
        assert!(resp.success);
        assert!(resp.data.is_none());
    }

    #[test]
    fn created_id_line() {
        let resp = CliFormatter.parse("*1A\n").unwrap();
        assert_eq!(resp.id.as_deref(), Some("*1A"));
        assert!(resp.data.is_none());
    }

    #[test]
    fn unstructured_text_passes_through() {
        let text = "system will reboot shortly";
        let resp = CliFormatter.parse(text).unwrap();
        assert!(resp.success);
        assert_eq!(resp.raw_text(), Some(text));
    }

    #[test]
    fn error_uses_first_non_empty_line() {
        let resp = CliFormatter
            .parse("\n  no such item\n  (line 1 column 20)\n")
            .unwrap();
        let err = resp.error.unwrap();
        assert_eq!(err.code, "NOT_FOUND");
        assert_eq!(err.category, ErrorCategory::NotFound);
        assert_eq!(err.message, "no such item");
        assert!(!err.retryable);
    }
}

// ── Typed value transcoding ──
//
// Device text <-> canonical `Value`, keyed by the declared field type.
// Encoding never fails (values already in device form pass through);
// the duration and size parsers are strict and return errors.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::CoreError;
use crate::model::Value;

const YES: &str = "yes";
const NO: &str = "no";

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: u64 = 24 * SECS_PER_HOUR;
const SECS_PER_WEEK: u64 = 7 * SECS_PER_DAY;

static DEVICE_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\d+)w)?(?:(\d+)d)?(?:(\d+)h)?(?:(\d+)m)?(?:(\d+)s)?$")
        .unwrap_or_else(|e| unreachable!("duration pattern is a literal: {e}"))
});

/// Declared type of a device field.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum FieldType {
    #[default]
    String,
    Int,
    Bool,
    Duration,
    List,
    Mac,
    Ip,
    Size,
}

// ── Encoding (logical -> device) ────────────────────────────────────

/// Format a logical value the way the device expects it for `field_type`.
pub fn encode(value: &Value, field_type: FieldType) -> Value {
    if value.is_null() {
        return Value::Null;
    }
    match field_type {
        FieldType::Bool => Value::Str(encode_bool(value).to_owned()),
        FieldType::Duration => match value {
            Value::Duration(d) => Value::Str(format_duration(*d)),
            Value::Int(secs) => u64::try_from(*secs)
                .map_or_else(|_| value.clone(), |s| Value::Str(format_duration(Duration::from_secs(s)))),
            _ => value.clone(),
        },
        FieldType::List => match value {
            Value::List(items) => Value::Str(format_list(items)),
            Value::Str(_) => value.clone(),
            other => Value::Str(other.to_string()),
        },
        FieldType::Size => match value {
            Value::Str(s) => parse_size(s).map_or_else(|_| value.clone(), Value::Int),
            _ => value.clone(),
        },
        FieldType::String | FieldType::Int | FieldType::Mac | FieldType::Ip => value.clone(),
    }
}

fn encode_bool(value: &Value) -> &'static str {
    let truthy = match value {
        Value::Bool(b) => *b,
        Value::Str(s) => parse_bool(s),
        Value::Int(i) => *i != 0,
        Value::Null | Value::List(_) | Value::Duration(_) => false,
    };
    format_bool(truthy)
}

pub fn format_bool(b: bool) -> &'static str {
    if b { YES } else { NO }
}

/// `NdNhNmNs`, skipping zero components; zero is `0s`.
pub fn format_duration(d: Duration) -> String {
    let mut secs = d.as_secs();
    if secs == 0 {
        return "0s".to_owned();
    }

    let mut out = String::new();
    for (unit, suffix) in [
        (SECS_PER_DAY, 'd'),
        (SECS_PER_HOUR, 'h'),
        (SECS_PER_MINUTE, 'm'),
        (1, 's'),
    ] {
        let count = secs / unit;
        if count > 0 {
            out.push_str(&count.to_string());
            out.push(suffix);
            secs -= count * unit;
        }
    }
    out
}

pub fn format_list(items: &[String]) -> String {
    items.join(",")
}

// ── Decoding (device -> logical) ────────────────────────────────────

/// Decode a device value for `field_type`. Text that does not fit the type
/// is kept as text rather than treated as an error, since device fields
/// are sometimes decorated ("1500 (auto)").
pub fn decode(value: &Value, field_type: FieldType) -> Value {
    let Value::Str(text) = value else {
        return value.clone();
    };
    match field_type {
        FieldType::Bool => Value::Bool(parse_bool(text)),
        FieldType::Int => text
            .trim()
            .parse::<i64>()
            .map_or_else(|_| value.clone(), Value::Int),
        FieldType::Duration => parse_duration(text).map_or_else(|_| value.clone(), Value::Duration),
        FieldType::Size => parse_size(text).map_or_else(|_| value.clone(), Value::Int),
        FieldType::List => Value::List(parse_list(text)),
        FieldType::String | FieldType::Mac | FieldType::Ip => value.clone(),
    }
}

/// Guess a type for a field nobody registered: booleans and integers only.
pub fn infer(value: &Value) -> Value {
    let Value::Str(text) = value else {
        return value.clone();
    };
    match text.to_ascii_lowercase().as_str() {
        "yes" | "true" => return Value::Bool(true),
        "no" | "false" => return Value::Bool(false),
        _ => {}
    }
    text.parse::<i64>().map_or_else(|_| value.clone(), Value::Int)
}

/// `yes`, `true`, and `1` (any case) are true; everything else is false.
pub fn parse_bool(text: &str) -> bool {
    let t = text.trim();
    t.eq_ignore_ascii_case(YES) || t.eq_ignore_ascii_case("true") || t == "1"
}

/// Bare seconds (`3600`) or device format `NwNdNhNmNs`. Empty is zero.
pub fn parse_duration(text: &str) -> Result<Duration, CoreError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Duration::ZERO);
    }
    if let Ok(secs) = text.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let invalid = || CoreError::InvalidDuration {
        input: text.to_owned(),
    };
    let caps = DEVICE_DURATION.captures(text).ok_or_else(invalid)?;

    let mut total: u64 = 0;
    for (group, unit) in [
        (1, SECS_PER_WEEK),
        (2, SECS_PER_DAY),
        (3, SECS_PER_HOUR),
        (4, SECS_PER_MINUTE),
        (5, 1),
    ] {
        if let Some(m) = caps.get(group) {
            let count: u64 = m.as_str().parse().map_err(|_| invalid())?;
            total = count
                .checked_mul(unit)
                .and_then(|secs| total.checked_add(secs))
                .ok_or_else(invalid)?;
        }
    }
    Ok(Duration::from_secs(total))
}

/// Comma-separated list; blanks are dropped, empty text is an empty list.
pub fn parse_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Decimal integer with optional `K`/`M`/`G` suffix (powers of 1024). Empty is zero.
pub fn parse_size(text: &str) -> Result<i64, CoreError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(0);
    }

    let invalid = |reason: &str| CoreError::InvalidSize {
        input: text.to_owned(),
        reason: reason.to_owned(),
    };

    let (digits, multiplier) = match text.chars().last().map(|c| c.to_ascii_uppercase()) {
        Some('K') => (&text[..text.len() - 1], 1024_i64),
        Some('M') => (&text[..text.len() - 1], 1024 * 1024),
        Some('G') => (&text[..text.len() - 1], 1024 * 1024 * 1024),
        _ => (text, 1),
    };

    let base: i64 = digits
        .parse()
        .map_err(|_| invalid("expected a decimal number"))?;
    base.checked_mul(multiplier)
        .ok_or_else(|| invalid("value overflows a 64-bit byte count"))
}

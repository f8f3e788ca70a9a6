// ── Message-based error classification ──
//
// Transport and device failures arrive as opaque text. This table folds
// them into the closed `ErrorCategory` set. Matching is case-sensitive and
// first-match-wins in table order.

use crate::model::{CommandError, ErrorCategory, Protocol};

pub const CODE_NOT_FOUND: &str = "NOT_FOUND";
pub const CODE_DUPLICATE: &str = "DUPLICATE";
pub const CODE_VALIDATION: &str = "VALIDATION_ERROR";
pub const CODE_PERMISSION: &str = "PERMISSION_DENIED";
pub const CODE_TIMEOUT: &str = "TIMEOUT";
pub const CODE_CONNECTION: &str = "CONNECTION_ERROR";
pub const CODE_UNKNOWN: &str = "UNKNOWN";

pub const CODE_CANCELLED: &str = "CANCELLED";
pub const CODE_SKIPPED: &str = "SKIPPED";
pub const CODE_ADAPTER: &str = "ADAPTER_ERROR";
pub const CODE_TRANSLATION: &str = "TRANSLATION_ERROR";

struct Rule {
    keywords: &'static [&'static str],
    code: &'static str,
    category: ErrorCategory,
    retryable: bool,
}

const RULES: &[Rule] = &[
    Rule {
        keywords: &["not found", "no such item"],
        code: CODE_NOT_FOUND,
        category: ErrorCategory::NotFound,
        retryable: false,
    },
    Rule {
        keywords: &["already exists", "duplicate"],
        code: CODE_DUPLICATE,
        category: ErrorCategory::Conflict,
        retryable: false,
    },
    Rule {
        keywords: &["invalid", "bad"],
        code: CODE_VALIDATION,
        category: ErrorCategory::Validation,
        retryable: false,
    },
    Rule {
        keywords: &["permission", "denied"],
        code: CODE_PERMISSION,
        category: ErrorCategory::Permission,
        retryable: false,
    },
    Rule {
        keywords: &["timeout"],
        code: CODE_TIMEOUT,
        category: ErrorCategory::Timeout,
        retryable: true,
    },
    Rule {
        keywords: &["connection", "refused"],
        code: CODE_CONNECTION,
        category: ErrorCategory::Connection,
        retryable: true,
    },
];

/// Classify free-form failure text into a [`CommandError`].
pub fn classify_message(message: &str, protocol: Protocol) -> CommandError {
    let (code, category, retryable) = RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| message.contains(k)))
        .map_or((CODE_UNKNOWN, ErrorCategory::Internal, false), |rule| {
            (rule.code, rule.category, rule.retryable)
        });

    CommandError::new(code, message, category)
        .with_retryable(retryable)
        .with_detail("protocol", protocol.as_ref())
}

/// Case-insensitive hint from trap or error text, consulted by the API and
/// REST parsers before their protocol-specific codes.
pub(crate) fn category_hint(message: &str) -> Option<ErrorCategory> {
    let lower = message.to_lowercase();
    if lower.contains("not found") || lower.contains("no such item") {
        Some(ErrorCategory::NotFound)
    } else if lower.contains("already") || lower.contains("duplicate") {
        Some(ErrorCategory::Conflict)
    } else if lower.contains("invalid") || lower.contains("bad") {
        Some(ErrorCategory::Validation)
    } else {
        None
    }
}

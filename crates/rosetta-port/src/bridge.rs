// ── Adapter bridge ──
//
// Canonical command -> native `RouterCommand` on the way out, native
// `RouterResult` -> `CanonicalResponse` on the way back. Names are not
// touched here: parameters are already device names, and records stay in
// device naming until the translator's reverse pass.

use rosetta_core::classify::{CODE_ADAPTER, classify_message};
use rosetta_core::{CanonicalCommand, CanonicalResponse, CommandError, ErrorCategory, Filter, Protocol, Record, Value};
use tracing::warn;

use crate::error::PortError;
use crate::port::{NativeRecord, PROPLIST_ARG, RouterCommand, RouterResult};

pub fn to_router_command(cmd: &CanonicalCommand) -> RouterCommand {
    let mut native = RouterCommand::new(cmd.path(), cmd.action().to_string());
    native.id = cmd.id().map(str::to_owned);
    native.args = cmd
        .parameters()
        .iter()
        .map(|(key, value)| (key.clone(), value.to_string()))
        .collect();
    if !cmd.filters().is_empty() {
        native.query = Some(filters_to_query(cmd.filters()));
    }
    if !cmd.proplist().is_empty() {
        native.args.insert(PROPLIST_ARG.to_owned(), cmd.proplist().join(","));
    }
    native
}

/// `name=ether1 mtu>=1500`
pub fn filters_to_query(filters: &[Filter]) -> String {
    filters
        .iter()
        .map(|f| format!("{}{}{}", f.field, f.op.as_str(), f.value))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn from_router_result(result: RouterResult, protocol: Protocol) -> CanonicalResponse {
    let RouterResult {
        success,
        data,
        id,
        error,
        duration,
        ..
    } = result;

    let resp = if success && data.is_empty() {
        CanonicalResponse::ok().with_id(id)
    } else if success {
        CanonicalResponse::records(data.into_iter().map(native_record).collect()).with_id(id)
    } else {
        match &error {
            Some(err) => warn!(error = %err, protocol = %protocol, "adapter command failed"),
            None => warn!(protocol = %protocol, "adapter command failed"),
        }
        CanonicalResponse::failure(adapter_error(error.as_ref(), protocol))
    };
    resp.with_protocol(protocol).with_duration(duration)
}

fn native_record(record: NativeRecord) -> Record {
    record.into_iter().map(|(k, v)| (k, Value::Str(v))).collect()
}

fn adapter_error(error: Option<&PortError>, protocol: Protocol) -> CommandError {
    let Some(error) = error else {
        return CommandError::new(CODE_ADAPTER, "command failed", ErrorCategory::Internal);
    };
    let message = error.to_string();
    let (category, retryable) = match error {
        PortError::Adapter(adapter) if adapter.retryable => (ErrorCategory::Connection, true),
        _ => {
            let classified = classify_message(&message, protocol);
            (classified.category, classified.retryable)
        }
    };
    let mut err = CommandError::new(CODE_ADAPTER, message, category).with_retryable(retryable);
    if let PortError::Adapter(adapter) = error {
        if let Some(code) = &adapter.router_os_error {
            err = err.with_detail("routerOsError", code.as_str());
        }
    }
    err
}

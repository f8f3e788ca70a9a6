#![allow(clippy::unwrap_used)]
// Translating port and batch execution against the scripted port:
// version sync, timeouts, error normalization, stop-on-error, cancellation.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

use rosetta_core::version::default_version_registry;
use rosetta_core::{
    CanonicalCommand, CanonicalResponse, CommandMetadata, DeviceVersion, ErrorCategory, Protocol, Record, Translator, Value,
};
use rosetta_port::{
    BatchCommand, BatchExecutor, NativeRecord, PortError, RouterPort, ScriptedPort, ScriptedReply, TranslatingPort,
};

fn row(pairs: &[(&str, &str)]) -> NativeRecord {
    pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
}

fn fields(pairs: &[(&str, Value)]) -> Record {
    pairs.iter().map(|(k, v)| ((*k).to_owned(), v.clone())).collect()
}

async fn scripted(port: ScriptedPort) -> Arc<ScriptedPort> {
    port.connect().await.unwrap();
    Arc::new(port)
}

fn translating(port: &Arc<ScriptedPort>) -> TranslatingPort {
    let translator = Translator::default().with_version_registry(Arc::new(default_version_registry()));
    TranslatingPort::new(port.clone(), Arc::new(translator))
}

async fn list(tp: &TranslatingPort, cancel: &CancellationToken, path: &str) -> Result<CanonicalResponse, PortError> {
    tp.query(cancel, path, Record::new(), Vec::new(), CommandMetadata::default()).await
}

// ── Logical round trip ──────────────────────────────────────────────

#[tokio::test]
async fn test_update_sends_device_arguments() {
    let port = scripted(ScriptedPort::new(Protocol::Api).with_version(DeviceVersion::new(7, 13))).await;
    port.expect("/interface/ethernet", "set", ScriptedReply::Done);
    let tp = translating(&port);

    let resp = tp
        .update(
            &CancellationToken::new(),
            "/interface/ethernet",
            "*1",
            fields(&[("enabled", Value::Bool(false)), ("mtu", Value::Int(1400))]),
            CommandMetadata::default(),
        )
        .await
        .unwrap();
    assert!(resp.success);

    let sent = port.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].id.as_deref(), Some("*1"));
    assert_eq!(sent[0].args, row(&[("disabled", "true"), ("mtu", "1400")]));
}

#[tokio::test]
async fn test_get_decodes_device_record() {
    let port = scripted(ScriptedPort::new(Protocol::Rest).with_version(DeviceVersion::new(7, 13))).await;
    port.expect("/interface/ethernet", "get", ScriptedReply::Records {
        records: vec![row(&[
            (".id", "*1"),
            ("name", "ether1"),
            ("mac-address", "00:11:22:33:44:55"),
            ("mtu", "1400"),
            ("disabled", "yes"),
        ])],
    });
    let tp = translating(&port);

    let resp = tp
        .get(&CancellationToken::new(), "/interface/ethernet", "*1", CommandMetadata::default())
        .await
        .unwrap();
    assert_eq!(
        resp.first_record().unwrap(),
        &fields(&[
            ("id", Value::from("*1")),
            ("name", Value::from("ether1")),
            ("macAddress", Value::from("00:11:22:33:44:55")),
            ("mtu", Value::Int(1400)),
            ("enabled", Value::Bool(false)),
        ])
    );
    assert_eq!(resp.metadata.protocol, Some(Protocol::Rest));
}

#[tokio::test]
async fn test_create_returns_new_id() {
    let port = scripted(ScriptedPort::new(Protocol::ApiSsl).with_version(DeviceVersion::new(7, 13))).await;
    port.expect("/ip/address", "add", ScriptedReply::Created { id: "*A".to_owned() });
    let tp = translating(&port);

    let resp = tp
        .create(
            &CancellationToken::new(),
            "/ip/address",
            fields(&[("address", Value::from("10.0.0.1/24")), ("interface", Value::from("ether2"))]),
            CommandMetadata::default(),
        )
        .await
        .unwrap();
    assert_eq!(resp.id.as_deref(), Some("*A"));
    // API-SSL speaks the API wire format
    assert_eq!(resp.metadata.protocol, Some(Protocol::Api));
}

// ── Version sync ────────────────────────────────────────────────────

#[tokio::test]
async fn test_version_resolved_once_under_concurrency() {
    let port = scripted(ScriptedPort::new(Protocol::Api).with_version(DeviceVersion::new(7, 13))).await;
    port.expect("/interface/wifiwave2", "print", ScriptedReply::Records {
        records: vec![row(&[("name", "wifi1")])],
    });
    let tp = translating(&port);
    let cancel = CancellationToken::new();

    let (a, b, c) = tokio::join!(
        list(&tp, &cancel, "/interface/wireless"),
        list(&tp, &cancel, "/interface/wireless"),
        list(&tp, &cancel, "/interface/wireless"),
    );
    for resp in [a, b, c] {
        let resp = resp.unwrap();
        assert!(resp.success, "{:?}", resp.error);
        assert_eq!(resp.first_record().unwrap()["name"], Value::from("wifi1"));
    }

    assert_eq!(port.info_calls(), 1);
    assert_eq!(tp.version(), Some(DeviceVersion::new(7, 13)));
    assert!(port.sent().iter().all(|c| c.path == "/interface/wifiwave2"));
}

#[tokio::test]
async fn test_version_lookup_failure_does_not_block_commands() {
    let port = scripted(ScriptedPort::new(Protocol::Api)).await;
    port.expect("/interface/wireless", "print", ScriptedReply::Done);
    let tp = translating(&port);
    let cancel = CancellationToken::new();

    for _ in 0..2 {
        let resp = list(&tp, &cancel, "/interface/wireless").await.unwrap();
        assert!(resp.success);
    }
    // unversioned: canonical path, and the lookup is retried on each call
    assert!(tp.version().is_none());
    assert_eq!(port.info_calls(), 2);
    assert_eq!(port.sent()[0].path, "/interface/wireless");
}

// ── Errors and timeouts ─────────────────────────────────────────────

#[tokio::test]
async fn test_transport_error_is_classified() {
    let port = scripted(ScriptedPort::new(Protocol::Ssh).with_version(DeviceVersion::new(6, 49))).await;
    port.expect("/system/resource", "print", ScriptedReply::Error {
        message: "dial tcp 10.0.0.1:22: connection refused".to_owned(),
    });
    let tp = translating(&port);

    let resp = list(&tp, &CancellationToken::new(), "/system/resource").await.unwrap();
    let err = resp.error.unwrap();
    assert_eq!(err.code, "CONNECTION_ERROR");
    assert_eq!(err.category, ErrorCategory::Connection);
    assert!(err.retryable);
    assert_eq!(err.details["protocol"], "SSH");
}

#[tokio::test]
async fn test_device_rejection_is_an_adapter_error() {
    let port = scripted(ScriptedPort::new(Protocol::Api).with_version(DeviceVersion::new(7, 13))).await;
    port.expect("/ip/address", "add", ScriptedReply::Failed {
        message: "failure: already exists".to_owned(),
        retryable: false,
    });
    let tp = translating(&port);

    let resp = tp
        .create(&CancellationToken::new(), "/ip/address", Record::new(), CommandMetadata::default())
        .await
        .unwrap();
    assert!(!resp.success);
    let err = resp.error.unwrap();
    assert_eq!(err.code, "ADAPTER_ERROR");
    assert_eq!(err.category, ErrorCategory::Conflict);
    assert_eq!(err.message, "API add: failure: already exists");
}

#[tokio::test(start_paused = true)]
async fn test_command_timeout() {
    let port = scripted(ScriptedPort::new(Protocol::Api).with_version(DeviceVersion::new(7, 13))).await;
    port.expect("/tool/ping", "print", ScriptedReply::Hang);
    let tp = translating(&port);

    let cmd = CanonicalCommand::print("/tool/ping").timeout(Duration::from_secs(2)).build();
    let resp = tp.execute_canonical(&CancellationToken::new(), &cmd).await;
    let err = resp.error.unwrap();
    assert_eq!(err.code, "TIMEOUT");
    assert_eq!(err.category, ErrorCategory::Timeout);
    assert!(err.retryable);
}

#[tokio::test(start_paused = true)]
async fn test_slow_reply_within_timeout() {
    let port = scripted(
        ScriptedPort::new(Protocol::Api)
            .with_version(DeviceVersion::new(7, 13))
            .with_latency(Duration::from_millis(300)),
    )
    .await;
    port.expect("/interface", "print", ScriptedReply::Done);
    let tp = translating(&port);

    let cmd = CanonicalCommand::print("/interface").timeout(Duration::from_secs(1)).build();
    let resp = tp.execute_canonical(&CancellationToken::new(), &cmd).await;
    assert!(resp.success);
    assert!(resp.metadata.duration.unwrap() >= Duration::from_millis(300));
}

#[tokio::test]
async fn test_cancelled_caller_without_timeout() {
    let port = scripted(ScriptedPort::new(Protocol::Api).with_version(DeviceVersion::new(7, 13))).await;
    port.expect("/tool/ping", "print", ScriptedReply::Hang);
    let tp = translating(&port);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let resp = tp.execute_canonical(&cancel, &CanonicalCommand::print("/tool/ping").build()).await;
    assert_eq!(resp.error.unwrap().code, "CANCELLED");
}

// ── Batches ─────────────────────────────────────────────────────────

fn add_address() -> CanonicalCommand {
    CanonicalCommand::add("/ip/address").param("address", "10.0.0.1/24").build()
}

fn print_interfaces() -> CanonicalCommand {
    CanonicalCommand::print("/interface").build()
}

#[tokio::test]
async fn test_batch_stop_on_error_skips_the_rest() {
    let port = scripted(ScriptedPort::new(Protocol::Api).with_version(DeviceVersion::new(7, 13))).await;
    port.expect("/ip/address", "add", ScriptedReply::Failed {
        message: "invalid value for argument address".to_owned(),
        retryable: false,
    });
    port.expect("/interface", "print", ScriptedReply::Done);
    let tp = translating(&port);

    let batch = vec![
        BatchCommand::new(add_address()).stop_on_error(),
        BatchCommand::new(print_interfaces()),
    ];
    let result = BatchExecutor::new(&tp).execute(&CancellationToken::new(), batch).await;

    assert_eq!(result.failed_index, Some(0));
    assert_eq!(result.results.len(), 2);
    assert_eq!(result.results[0].error.as_ref().unwrap().category, ErrorCategory::Validation);
    let skipped = result.results[1].error.as_ref().unwrap();
    assert_eq!(skipped.code, "SKIPPED");
    assert_eq!(skipped.message, "skipped due to failure at command 0");
    // the second command never reached the transport
    assert_eq!(port.sent().len(), 1);
}

#[tokio::test]
async fn test_batch_continues_without_stop_flag() {
    let port = scripted(ScriptedPort::new(Protocol::Api).with_version(DeviceVersion::new(7, 13))).await;
    port.expect("/ip/address", "add", ScriptedReply::Failed {
        message: "failure: already exists".to_owned(),
        retryable: false,
    });
    port.expect("/interface", "print", ScriptedReply::Done);
    let tp = translating(&port);

    let batch = vec![
        BatchCommand::new(print_interfaces()),
        BatchCommand::new(add_address()),
        BatchCommand::new(print_interfaces()),
        BatchCommand::new(add_address()),
    ];
    let result = BatchExecutor::new(&tp).execute(&CancellationToken::new(), batch).await;

    assert_eq!(result.failed_index, Some(1));
    let outcomes: Vec<bool> = result.results.iter().map(|r| r.success).collect();
    assert_eq!(outcomes, vec![true, false, true, false]);
    assert_eq!(port.sent().len(), 4);
    assert!(!result.all_succeeded());
}

#[tokio::test]
async fn test_batch_precancelled() {
    let port = scripted(ScriptedPort::new(Protocol::Api).with_version(DeviceVersion::new(7, 13))).await;
    port.expect("/interface", "print", ScriptedReply::Done);
    let tp = translating(&port);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let batch = vec![BatchCommand::new(print_interfaces()), BatchCommand::new(add_address())];
    let result = BatchExecutor::new(&tp).execute(&cancel, batch).await;

    assert_eq!(result.failed_index, Some(0));
    for resp in &result.results {
        let err = resp.error.as_ref().unwrap();
        assert_eq!(err.code, "CANCELLED");
        assert_eq!(err.category, ErrorCategory::Timeout);
        assert!(!err.retryable);
    }
    assert!(port.sent().is_empty());
}

#[tokio::test]
async fn test_empty_batch() {
    let port = scripted(ScriptedPort::new(Protocol::Api)).await;
    let tp = translating(&port);
    let result = BatchExecutor::new(&tp).execute(&CancellationToken::new(), Vec::new()).await;
    assert!(result.results.is_empty());
    assert!(result.all_succeeded());
}

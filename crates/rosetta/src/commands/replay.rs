//! `replay`: run a scripted batch fixture through the translating port.
//!
//! The fixture stands in for a device: `expect` lists what it answers to
//! each `(path, action)`, `batch` is the ordered command list to execute.
//!
//! ```yaml
//! protocol: api
//! version: "7.13"
//! expect:
//!   - path: /interface/ethernet
//!     action: set
//!     reply: { kind: done }
//! batch:
//!   - command: { path: /interface/ethernet, action: set, id: "*1", parameters: { mtu: 1400 } }
//!     stopOnError: true
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tabled::Tabled;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use rosetta_core::classify::CODE_UNKNOWN;
use rosetta_core::{Action, CanonicalResponse, CommandError, DeviceVersion, ErrorCategory, Protocol};
use rosetta_port::{BatchCommand, BatchExecutor, Expectation, RouterPort, ScriptedPort, TranslatingPort};

use crate::cli::{OutputFormat, ReplayArgs};
use crate::commands::util;
use crate::config::Context;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Fixture {
    #[serde(default = "default_protocol")]
    protocol: String,
    /// Version the scripted device reports.
    #[serde(default)]
    version: Option<DeviceVersion>,
    /// Delay before every answer, e.g. "50ms".
    #[serde(default)]
    latency: Option<String>,
    #[serde(default)]
    expect: Vec<Expectation>,
    batch: Vec<BatchCommand>,
}

fn default_protocol() -> String {
    "api".into()
}

impl Fixture {
    fn protocol(&self) -> Result<Protocol, CliError> {
        self.protocol.parse().map_err(|_| CliError::Validation {
            field: "protocol".into(),
            reason: format!("unknown protocol '{}'", self.protocol),
        })
    }

    fn latency(&self) -> Result<Option<Duration>, CliError> {
        self.latency
            .as_deref()
            .map(|text| {
                humantime::parse_duration(text).map_err(|e| CliError::Validation {
                    field: "latency".into(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }
}

// ── Report ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplayReport {
    request_id: String,
    protocol: Protocol,
    #[serde(skip_serializing_if = "Option::is_none")]
    failed_index: Option<usize>,
    total_duration: String,
    results: Vec<ReplayEntry>,
}

#[derive(Debug, Serialize)]
struct ReplayEntry {
    index: usize,
    path: String,
    action: Action,
    response: CanonicalResponse,
}

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Result")]
    result: String,
}

fn summarize(resp: &CanonicalResponse) -> String {
    if let Some(err) = &resp.error {
        return format!("{}: {}", err.code, err.message);
    }
    if let Some(id) = &resp.id {
        return format!("id {id}");
    }
    match resp.record_slice().len() {
        0 => String::new(),
        1 => "1 record".to_owned(),
        n => format!("{n} records"),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: &ReplayArgs, ctx: &Context) -> Result<(), CliError> {
    let fixture: Fixture = util::parse_document(&util::read_input(&args.fixture)?)?;
    let protocol = fixture.protocol()?;

    let mut port = ScriptedPort::new(protocol);
    if let Some(version) = fixture.version.clone() {
        port = port.with_version(version);
    }
    if let Some(latency) = fixture.latency()? {
        port = port.with_latency(latency);
    }
    port.expect_all(fixture.expect);
    port.connect().await?;

    // the scripted device's version wins over the configured default
    let translator = ctx.translator()?;
    if fixture.version.is_some() {
        translator.set_version(fixture.version);
    }
    let port = TranslatingPort::new(Arc::new(port), Arc::new(translator));

    let report = run_batch(&port, fixture.batch).await;
    port.port().disconnect().await?;

    let out = match ctx.output {
        OutputFormat::Table | OutputFormat::Plain => output::render_list(
            &ctx.output,
            &report.results,
            |e| entry_row(e, ctx.color),
            |e| format!("{}\t{}", e.index, output::status_label(e.response.success, false)),
        )?,
        _ => output::render_single(&ctx.output, &report, |_| String::new(), |r| r.request_id.clone())?,
    };
    output::print_output(&out, ctx.quiet);

    match first_failure(&report) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Execute the batch under one request id; Ctrl-C cancels what is left.
async fn run_batch(port: &TranslatingPort, batch: Vec<BatchCommand>) -> ReplayReport {
    let request_id = Uuid::new_v4().to_string();
    let commands: Vec<BatchCommand> = batch
        .into_iter()
        .map(|mut batch_cmd| {
            batch_cmd
                .command
                .metadata_mut()
                .request_id
                .get_or_insert_with(|| request_id.clone());
            batch_cmd
        })
        .collect();
    let targets: Vec<(String, Action)> = commands
        .iter()
        .map(|c| (c.command.path().to_owned(), c.command.action()))
        .collect();
    info!(request_id = request_id.as_str(), commands = commands.len(), protocol = %port.protocol(), "replaying batch");

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };
    let result = BatchExecutor::new(port).execute(&cancel, commands).await;
    interrupt.abort();
    debug!(failed_index = ?result.failed_index, "batch finished");

    ReplayReport {
        request_id,
        protocol: port.protocol(),
        failed_index: result.failed_index,
        total_duration: humantime::format_duration(result.total_duration).to_string(),
        results: targets
            .into_iter()
            .zip(result.results)
            .enumerate()
            .map(|(index, ((path, action), response))| ReplayEntry {
                index,
                path,
                action,
                response,
            })
            .collect(),
    }
}

fn first_failure(report: &ReplayReport) -> Option<CliError> {
    let entry = report.results.get(report.failed_index?)?;
    let error = entry
        .response
        .error
        .clone()
        .unwrap_or_else(|| CommandError::new(CODE_UNKNOWN, "command failed", ErrorCategory::Internal));
    Some(CliError::BatchFailed {
        index: entry.index,
        total: report.results.len(),
        code: error.code,
        message: error.message,
        category: error.category,
    })
}

fn entry_row(entry: &ReplayEntry, color: bool) -> EntryRow {
    EntryRow {
        index: entry.index,
        path: entry.path.clone(),
        action: entry.action.to_string(),
        status: output::status_label(entry.response.success, color),
        result: summarize(&entry.response),
    }
}

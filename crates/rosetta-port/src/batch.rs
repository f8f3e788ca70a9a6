// ── Ordered batch execution ──
//
// Commands run strictly one after another on the caller's task so that
// `failed_index` and stop-on-error are well defined. Every input command
// gets exactly one result slot.

use std::time::Duration;

use rosetta_core::classify::CODE_SKIPPED;
use rosetta_core::{CanonicalCommand, CanonicalResponse, CommandError, ErrorCategory};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::translating::{TranslatingPort, cancelled_response};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCommand {
    pub command: CanonicalCommand,
    /// Skip the rest of the batch if this command fails.
    #[serde(default)]
    pub stop_on_error: bool,
}

impl BatchCommand {
    pub fn new(command: CanonicalCommand) -> Self {
        Self {
            command,
            stop_on_error: false,
        }
    }

    pub fn stop_on_error(mut self) -> Self {
        self.stop_on_error = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct BatchResult {
    /// One response per input command, in input order.
    pub results: Vec<CanonicalResponse>,
    pub total_duration: Duration,
    /// Index of the first command that did not succeed.
    pub failed_index: Option<usize>,
}

impl BatchResult {
    pub fn all_succeeded(&self) -> bool {
        self.failed_index.is_none()
    }
}

pub struct BatchExecutor<'a> {
    port: &'a TranslatingPort,
}

impl<'a> BatchExecutor<'a> {
    pub fn new(port: &'a TranslatingPort) -> Self {
        Self { port }
    }

    pub async fn execute(&self, cancel: &CancellationToken, commands: Vec<BatchCommand>) -> BatchResult {
        let start = Instant::now();
        let total = commands.len();
        let mut results = Vec::with_capacity(total);
        let mut failed_index = None;

        for (index, batch_cmd) in commands.into_iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(index, remaining = total - index, "batch cancelled");
                results.extend((index..total).map(|_| cancelled_response()));
                failed_index.get_or_insert(index);
                break;
            }

            let resp = self.port.execute_canonical(cancel, &batch_cmd.command).await;
            let failed = !resp.success;
            results.push(resp);
            if !failed {
                continue;
            }

            failed_index.get_or_insert(index);
            if batch_cmd.stop_on_error {
                debug!(index, skipped = total - index - 1, "stopping batch after failure");
                results.extend((index + 1..total).map(|_| skipped_response(index)));
                break;
            }
        }

        BatchResult {
            results,
            total_duration: start.elapsed(),
            failed_index,
        }
    }
}

fn skipped_response(failed_at: usize) -> CanonicalResponse {
    CanonicalResponse::failure(
        CommandError::new(
            CODE_SKIPPED,
            format!("skipped due to failure at command {failed_at}"),
            ErrorCategory::Internal,
        )
        .with_detail("failedIndex", failed_at.to_string()),
    )
}

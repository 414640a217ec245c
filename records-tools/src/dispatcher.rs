use error_common::{Classify, ErrorKind};
use logger_redacted::PiiRedactor;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::deadline::run_with_deadline;
use crate::error::{ToolError, ToolFailure};
use crate::protocol::{RawToolCall, ToolOutcome};
use crate::queries::RecordQueries;
use crate::tools::{Operation, ToolCall};

/// Default per-call deadline
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// One processed entry of a batch
#[derive(Debug, Clone)]
pub struct DispatchRecord {
    pub call: RawToolCall,
    /// `None` when the name did not match any operation
    pub operation: Option<Operation>,
    pub outcome: ToolOutcome,
}

/// Maps raw tool calls onto record queries.
///
/// Calls run one at a time in the order given. Each call gets its own
/// deadline and a failure never stops the rest of the batch; once the
/// request's cancellation token fires, every remaining call is reported as
/// cancelled without touching the backend.
#[derive(Clone)]
pub struct Dispatcher {
    queries: RecordQueries,
    call_timeout: Duration,
    redactor: PiiRedactor,
}

impl Dispatcher {
    pub fn new(queries: RecordQueries) -> Self {
        Self {
            queries,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            redactor: PiiRedactor::default(),
        }
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Dispatch a single call without a deadline
    pub async fn dispatch(&self, raw: &RawToolCall) -> ToolOutcome {
        let call = ToolCall::parse(raw).map_err(|err| self.rejected(raw, err))?;
        self.queries.execute(&call).await
    }

    /// Dispatch a single call bounded by the per-call deadline and `cancel`
    pub async fn dispatch_with_deadline(
        &self,
        raw: &RawToolCall,
        cancel: &CancellationToken,
    ) -> ToolOutcome {
        let call = ToolCall::parse(raw).map_err(|err| self.rejected(raw, err))?;
        let operation = call.operation();

        debug!(
            operation = %operation,
            arguments = %self.redactor.redact_json(&raw.arguments),
            "Dispatching tool call"
        );

        match run_with_deadline(self.queries.execute(&call), self.call_timeout, cancel).await {
            Ok(outcome) => {
                match &outcome {
                    Ok(_) => info!(operation = %operation, "Tool call succeeded"),
                    Err(failure) => info!(
                        operation = %operation,
                        error_kind = %failure.kind,
                        error = %self.redactor.redact(&failure.message),
                        "Tool call failed"
                    ),
                }
                outcome
            }
            Err(interrupted) => {
                let err = ToolError::from(interrupted);
                warn!(operation = %operation, error_kind = %err.kind(), "Tool call interrupted");
                Err(err.into())
            }
        }
    }

    /// Dispatch a batch sequentially, isolating failures per call
    pub async fn dispatch_batch(
        &self,
        calls: &[RawToolCall],
        cancel: &CancellationToken,
    ) -> Vec<DispatchRecord> {
        let mut records = Vec::with_capacity(calls.len());

        for raw in calls {
            let operation = raw.name.parse::<Operation>().ok();
            let outcome = if cancel.is_cancelled() {
                Err(ToolFailure::new(ErrorKind::Cancelled, ToolError::Cancelled.to_string()))
            } else {
                self.dispatch_with_deadline(raw, cancel).await
            };

            records.push(DispatchRecord {
                call: raw.clone(),
                operation,
                outcome,
            });
        }

        records
    }

    fn rejected(&self, raw: &RawToolCall, err: ToolError) -> ToolFailure {
        warn!(
            tool = %self.redactor.redact(&raw.name),
            error_kind = %err.kind(),
            "Rejected tool call"
        );
        err.into()
    }
}

//! One turn of the interactive query loop

use records_tools::{render_text, run_with_deadline, Dispatcher, ToolError, ToolResult, ToolSelector};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Something printed back to the operator
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// A tool call that was run, with its text-rendered result
    Executed {
        name: String,
        arguments: Value,
        result: String,
    },
    /// The model answered without calling a tool
    Reply(String),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Executed { name, arguments, result } => {
                write!(f, "\nExecuting: {} with {}\n\nResult:\n{}", name, arguments, result)
            }
            Step::Reply(text) => write!(f, "\nResponse: {}", text),
        }
    }
}

/// Send `text` to the selector and run every call it chooses, in order.
///
/// The selection call is bounded by `selection_timeout` and `cancel`. Only
/// a selection failure is an error; failing tool calls show up as
/// `Error: ...` results.
pub async fn answer(
    selector: &dyn ToolSelector,
    dispatcher: &Dispatcher,
    text: &str,
    selection_timeout: Duration,
    cancel: &CancellationToken,
) -> ToolResult<Vec<Step>> {
    let selection = run_with_deadline(selector.select(text), selection_timeout, cancel)
        .await
        .map_err(ToolError::from)??;

    if selection.calls.is_empty() {
        return Ok(selection.reply.map(Step::Reply).into_iter().collect());
    }

    Ok(dispatcher
        .dispatch_batch(&selection.calls, cancel)
        .await
        .into_iter()
        .map(|record| Step::Executed {
            result: render_text(&record.outcome),
            name: record.call.name,
            arguments: record.call.arguments,
        })
        .collect())
}

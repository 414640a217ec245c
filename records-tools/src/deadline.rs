use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::ToolError;

/// Why a deadline-bounded call did not complete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    TimedOut(Duration),
    Cancelled,
}

impl From<Interrupted> for ToolError {
    fn from(interrupted: Interrupted) -> Self {
        match interrupted {
            Interrupted::TimedOut(after) => ToolError::Timeout(after),
            Interrupted::Cancelled => ToolError::Cancelled,
        }
    }
}

/// Run `future` until it completes, `deadline` elapses or `cancel` fires,
/// whichever comes first. A token that is already cancelled wins without
/// polling the future.
pub async fn run_with_deadline<F>(
    future: F,
    deadline: Duration,
    cancel: &CancellationToken,
) -> Result<F::Output, Interrupted>
where
    F: Future,
{
    if cancel.is_cancelled() {
        return Err(Interrupted::Cancelled);
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Interrupted::Cancelled),
        outcome = tokio::time::timeout(deadline, future) => {
            outcome.map_err(|_| Interrupted::TimedOut(deadline))
        }
    }
}

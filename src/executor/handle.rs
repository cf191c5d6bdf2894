use std::sync::Arc;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Final result of one submitted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Task ran to completion.
    Completed,
    /// Task reported an error (or panicked).
    Failed {
        /// Human-readable failure message.
        reason: Arc<str>,
    },
    /// Task acknowledged cancellation and stopped.
    Canceled,
}

impl TaskOutcome {
    /// Maps a task's return value to its outcome.
    ///
    /// `Err(TaskError::Canceled)` is a graceful stop, every other error is a failure.
    pub fn from_result(res: Result<(), TaskError>) -> Self {
        match res {
            Ok(()) => TaskOutcome::Completed,
            Err(TaskError::Canceled) => TaskOutcome::Canceled,
            Err(e) => TaskOutcome::Failed {
                reason: e.to_string().into(),
            },
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskOutcome::Completed => "completed",
            TaskOutcome::Failed { .. } => "failed",
            TaskOutcome::Canceled => "canceled",
        }
    }
}

/// Caller side of a submitted task.
///
/// Dropping the handle does not cancel the task.
#[derive(Debug)]
pub struct TaskHandle {
    token: CancellationToken,
    outcome: oneshot::Receiver<TaskOutcome>,
}

/// Executor side of a submitted task.
///
/// If dropped without [`complete`](Self::complete), the handle resolves to
/// [`TaskOutcome::Failed`].
#[derive(Debug)]
pub struct TaskCompleter {
    token: CancellationToken,
    tx: oneshot::Sender<TaskOutcome>,
}

impl TaskHandle {
    /// Creates a connected handle/completer pair sharing one cancellation token.
    pub fn pair() -> (TaskHandle, TaskCompleter) {
        let token = CancellationToken::new();
        let (tx, rx) = oneshot::channel();
        (
            TaskHandle {
                token: token.clone(),
                outcome: rx,
            },
            TaskCompleter { token, tx },
        )
    }

    /// Asks the executor to stop the task. Completion is still reported through [`outcome`](Self::outcome).
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns the cancellation token observed by the task.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Waits for the task's outcome.
    pub async fn outcome(self) -> TaskOutcome {
        self.outcome.await.unwrap_or_else(|_| TaskOutcome::Failed {
            reason: "executor dropped the task without reporting".into(),
        })
    }
}

impl TaskCompleter {
    /// Token the task must observe for cooperative cancellation.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Reports the outcome. Ignored if the handle is gone.
    pub fn complete(self, outcome: TaskOutcome) {
        let _ = self.tx.send(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dropped_completer_reports_failure() {
        let (handle, completer) = TaskHandle::pair();
        drop(completer);
        assert!(matches!(handle.outcome().await, TaskOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn cancel_reaches_completer_token() {
        let (handle, completer) = TaskHandle::pair();
        let token = completer.token();
        handle.cancel();
        assert!(token.is_cancelled());
        completer.complete(TaskOutcome::Canceled);
        assert_eq!(handle.outcome().await, TaskOutcome::Canceled);
    }

    #[test]
    fn maps_task_results() {
        assert_eq!(TaskOutcome::from_result(Ok(())), TaskOutcome::Completed);
        assert_eq!(
            TaskOutcome::from_result(Err(TaskError::Canceled)),
            TaskOutcome::Canceled
        );
        assert_eq!(
            TaskOutcome::from_result(Err(TaskError::fail("peak list empty"))),
            TaskOutcome::Failed {
                reason: "execution failed: peak list empty".into()
            }
        );
    }
}

//! # Default executor: one tokio task per submitted unit.
//!
//! ## Outcome mapping
//! ```text
//! task.run(token) → Ok(())               → Completed
//!                 → Err(Canceled)        → Canceled
//!                 → Err(Fail)            → Failed
//!                 → panic (caught)       → Failed("task panicked: ...")
//! ```
//!
//! There is no timeout: a task that never returns never reports.

use std::panic::AssertUnwindSafe;

use futures::{FutureExt, future::BoxFuture};
use tokio::runtime::Handle;

use super::{Executor, TaskCompleter, TaskHandle, TaskOutcome};
use crate::error::{ExecutorError, panic_message};
use crate::tasks::TaskRef;

/// Spawns every submitted task on a tokio runtime.
///
/// Without an explicit runtime handle, tasks and drivers are spawned on the
/// ambient runtime. With [`with_runtime`](Self::with_runtime), controllers can be
/// submitted from any thread.
#[derive(Clone, Debug, Default)]
pub struct TokioExecutor {
    runtime: Option<Handle>,
}

impl TokioExecutor {
    /// Executor using the ambient runtime.
    pub fn new() -> Self {
        Self { runtime: None }
    }

    /// Executor bound to a specific runtime.
    pub fn with_runtime(runtime: Handle) -> Self {
        Self {
            runtime: Some(runtime),
        }
    }
}

impl Executor for TokioExecutor {
    fn submit_task(&self, task: TaskRef) -> TaskHandle {
        let (handle, completer) = TaskHandle::pair();
        match self.handle() {
            Ok(rt) => {
                rt.spawn(run_once(task, completer));
            }
            Err(e) => {
                // Dropping the completer resolves the handle as failed.
                tracing::warn!(task = task.name(), error = %e, "task not started");
            }
        }
        handle
    }

    fn spawn_driver(&self, driver: BoxFuture<'static, ()>) -> Result<(), ExecutorError> {
        self.handle()?.spawn(driver);
        Ok(())
    }
}

impl TokioExecutor {
    fn handle(&self) -> Result<Handle, ExecutorError> {
        match &self.runtime {
            Some(rt) => Ok(rt.clone()),
            None => Handle::try_current().map_err(|_| ExecutorError::NoRuntime),
        }
    }
}

/// Runs one task and reports exactly one outcome.
async fn run_once(task: TaskRef, completer: TaskCompleter) {
    let ctx = completer.token();
    let res = AssertUnwindSafe(task.run(ctx)).catch_unwind().await;

    let outcome = match res {
        Ok(r) => TaskOutcome::from_result(r),
        Err(panic_err) => TaskOutcome::Failed {
            reason: format!("task panicked: {}", panic_message(&*panic_err)).into(),
        },
    };
    tracing::trace!(task = task.name(), outcome = outcome.as_label(), "task finished");
    completer.complete(outcome);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TaskError, TaskFn};
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn reports_completion() {
        let task: TaskRef = TaskFn::arc("ok", |_ctx: CancellationToken| async {
            Ok::<(), TaskError>(())
        });
        let handle = TokioExecutor::new().submit_task(task);
        assert_eq!(handle.outcome().await, TaskOutcome::Completed);
    }

    #[tokio::test]
    async fn cancel_is_cooperative() {
        let task: TaskRef = TaskFn::arc("wait", |ctx: CancellationToken| async move {
            ctx.cancelled().await;
            Err::<(), TaskError>(TaskError::Canceled)
        });
        let handle = TokioExecutor::new().submit_task(task);
        handle.cancel();
        assert_eq!(handle.outcome().await, TaskOutcome::Canceled);
    }

    #[tokio::test]
    async fn panic_becomes_failure() {
        let task: TaskRef = TaskFn::arc("boom", |_ctx: CancellationToken| async {
            if true {
                panic!("bad spectrum");
            }
            Ok::<(), TaskError>(())
        });
        let handle = TokioExecutor::new().submit_task(task);
        match handle.outcome().await {
            TaskOutcome::Failed { reason } => assert!(reason.contains("bad spectrum")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn driver_without_runtime_is_an_error() {
        let res = TokioExecutor::new().spawn_driver(Box::pin(async {}));
        assert_eq!(res, Err(ExecutorError::NoRuntime));
    }

    #[test]
    fn configured_runtime_serves_plain_threads() {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let exec = TokioExecutor::with_runtime(rt.handle().clone());

        let (tx, rx) = tokio::sync::oneshot::channel();
        exec.spawn_driver(Box::pin(async move {
            let _ = tx.send(());
        }))
        .unwrap();

        let task: TaskRef = TaskFn::arc("ok", |_ctx: CancellationToken| async {
            Ok::<(), TaskError>(())
        });
        let handle = exec.submit_task(task);

        rt.block_on(async {
            rx.await.unwrap();
            assert_eq!(handle.outcome().await, TaskOutcome::Completed);
        });
    }
}

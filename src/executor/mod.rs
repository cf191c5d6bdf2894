//! # Task execution boundary.
//!
//! Controllers never run tasks themselves. They hand each task to an
//! [`Executor`] and wait for its [`TaskOutcome`] through the returned
//! [`TaskHandle`].
//!
//! ```text
//! Controller ── submit_task(task) ──► Executor ──► (worker context)
//!      ▲                                               │
//!      └──────── TaskHandle::outcome() ◄── TaskCompleter::complete(outcome)
//! ```
//!
//! The executor also hosts the controller's driver loop
//! ([`Executor::spawn_driver`]), so the thread calling
//! [`Controller::execute`](crate::Controller::execute) needs no runtime of its own.
//!
//! [`TokioExecutor`] is the default implementation: one tokio task per
//! submitted unit, with panic isolation.

mod handle;
mod tokio_executor;

use std::sync::Arc;

use futures::future::BoxFuture;

pub use handle::{TaskCompleter, TaskHandle, TaskOutcome};
pub use tokio_executor::TokioExecutor;

use crate::error::ExecutorError;
use crate::tasks::TaskRef;

/// Runs tasks to completion on behalf of controllers.
///
/// `submit_task` must not block: the outcome is reported asynchronously
/// through the handle, possibly from another thread.
pub trait Executor: Send + Sync + 'static {
    /// Starts `task` and returns a handle to cancel it and await its outcome.
    fn submit_task(&self, task: TaskRef) -> TaskHandle;

    /// Starts a controller's driver loop in the background.
    ///
    /// The default spawns on the ambient tokio runtime and fails with
    /// [`ExecutorError::NoRuntime`] when there is none.
    fn spawn_driver(&self, driver: BoxFuture<'static, ()>) -> Result<(), ExecutorError> {
        let rt = tokio::runtime::Handle::try_current().map_err(|_| ExecutorError::NoRuntime)?;
        rt.spawn(driver);
        Ok(())
    }
}

/// Shared handle to an executor.
pub type ExecutorRef = Arc<dyn Executor>;

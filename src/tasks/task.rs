//! # Processing task contract.
//!
//! A controller runs its tasks strictly one after another. Each run receives a
//! fresh [`CancellationToken`], canceled when the owning controller is asked
//! to stop.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Shared handle to a task.
pub type TaskRef = Arc<dyn Task>;

/// One processing step, run once per controller execution.
///
/// ### Result mapping
/// - `Ok(())` → the controller moves on to its next task
/// - `Err(TaskError::Canceled)` → the controller ends `Canceled`
/// - any other `Err` (or a panic) → the controller ends `Error`
///
/// ```
/// use tokio_util::sync::CancellationToken;
/// use async_trait::async_trait;
/// use procvisor::{Task, TaskError};
///
/// struct Smooth {
///     window: usize,
/// }
///
/// #[async_trait]
/// impl Task for Smooth {
///     fn name(&self) -> &str { "smooth" }
///
///     async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
///         for _chunk in 0..self.window {
///             if ctx.is_cancelled() {
///                 return Err(TaskError::Canceled);
///             }
///             tokio::task::yield_now().await;
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Step name, used in diagnostics.
    fn name(&self) -> &str;

    /// Processes until done or until `ctx` is canceled.
    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError>;
}

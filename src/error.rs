//! Error types used by the scheduler, controllers and tasks.
//!
//! This module defines:
//!
//! - [`TaskError`]: errors raised by individual task executions.
//! - [`ListenerError`]: errors raised by a [`StatusListener`](crate::StatusListener) during delivery.
//! - [`ExecutorError`]: an executor could not start a controller driver.
//! - [`SubmitOutcome`]: result of [`Scheduler::submit`](crate::Scheduler::submit).
//!   Submission never fails; it reports what happened instead.
//!
//! Error types provide `as_label` for logging/metrics.

use thiserror::Error;

/// # Errors produced by task execution.
///
/// A task reports one of these to the executor, which maps it to a
/// [`TaskOutcome`](crate::TaskOutcome). The controller never retries.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// Task execution failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Task observed its cancellation token and stopped.
    #[error("context cancelled")]
    Canceled,
}

impl TaskError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use procvisor::TaskError;
    ///
    /// let err = TaskError::Fail { error: "bad scan".into() };
    /// assert_eq!(err.as_label(), "task_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Shorthand for [`TaskError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }
}

/// # Errors produced by a status listener.
///
/// Delivery is isolated: a faulting listener is logged and skipped, the
/// remaining listeners still observe the transition.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListenerError {
    /// Listener could not process the transition.
    #[error("listener fault: {reason}")]
    Fault {
        /// Human-readable reason.
        reason: String,
    },
}

impl ListenerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ListenerError::Fault { .. } => "listener_fault",
        }
    }
}

/// # Errors produced by an executor.
///
/// A controller whose driver cannot be started ends in `Error` instead of
/// holding its slot.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    /// Called outside a tokio runtime and no runtime handle was configured.
    #[error("no tokio runtime available to drive the controller")]
    NoRuntime,
}

impl ExecutorError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ExecutorError::NoRuntime => "executor_no_runtime",
        }
    }
}

/// What [`Scheduler::submit`](crate::Scheduler::submit) did with a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Appended to the waiting queue.
    Queued,
    /// Already waiting or running; nothing changed.
    Duplicate,
    /// Controller already left `Created` and can never run again.
    Rejected,
}

impl SubmitOutcome {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SubmitOutcome::Queued => "submit_queued",
            SubmitOutcome::Duplicate => "submit_duplicate",
            SubmitOutcome::Rejected => "submit_rejected",
        }
    }
}

/// Extracts a printable message from a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

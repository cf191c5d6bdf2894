//! # LogWriter: renders scheduler events through `tracing`.
//!
//! ## Example output (with a fmt subscriber)
//! ```text
//! DEBUG procvisor: submitted controller=ctl-3 name="scan-3" waiting=2 running=5
//! DEBUG procvisor: admitted controller=ctl-1 name="scan-1" waiting=1 running=5
//!  INFO procvisor: evicted controller=ctl-1 name="scan-1" status=finished
//!  WARN procvisor: subscriber panicked subscriber="metrics" info="..."
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let id = e.controller.map(|c| c.to_string());
        let id = id.as_deref().unwrap_or("-");
        let name = e.name.as_deref().unwrap_or("-");
        let status = e.status.map(|s| s.as_label()).unwrap_or("-");

        match e.kind {
            EventKind::ControllerSubmitted => tracing::debug!(
                target: "procvisor",
                controller = id, name, waiting = e.waiting, running = e.running,
                "submitted"
            ),
            EventKind::DuplicateSubmission => tracing::debug!(
                target: "procvisor", controller = id, name, "duplicate submission skipped"
            ),
            EventKind::SubmissionRejected => tracing::debug!(
                target: "procvisor", controller = id, name, status, "submission rejected"
            ),
            EventKind::ControllerAdmitted => tracing::debug!(
                target: "procvisor",
                controller = id, name, waiting = e.waiting, running = e.running,
                "admitted"
            ),
            EventKind::ControllerSkipped => tracing::debug!(
                target: "procvisor", controller = id, name, "canceled while waiting; skipped"
            ),
            EventKind::ControllerEvicted => tracing::info!(
                target: "procvisor",
                controller = id, name, status, waiting = e.waiting, running = e.running,
                "evicted"
            ),
            EventKind::CancelRequested => tracing::debug!(
                target: "procvisor", controller = id, name, "cancel requested"
            ),
            EventKind::WaitingCleared => tracing::info!(
                target: "procvisor", dropped = e.waiting, "waiting queue cleared"
            ),
            EventKind::GateChanged => tracing::info!(
                target: "procvisor", enabled = e.enabled, "admission gate changed"
            ),
            EventKind::SubscriberOverflow => tracing::warn!(
                target: "procvisor",
                subscriber = name, reason = e.reason.as_deref().unwrap_or("-"),
                "subscriber overflow"
            ),
            EventKind::SubscriberPanicked => tracing::warn!(
                target: "procvisor",
                subscriber = name, info = e.reason.as_deref().unwrap_or("unknown"),
                "subscriber panicked"
            ),
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

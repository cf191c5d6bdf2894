//! Status model: lifecycle states and transition records.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// Global counter for controller identities.
static CONTROLLER_SEQ: AtomicU64 = AtomicU64::new(1);

/// Unique controller identity. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControllerId(u64);

impl ControllerId {
    pub(crate) fn next() -> Self {
        Self(CONTROLLER_SEQ.fetch_add(1, AtomicOrdering::Relaxed))
    }

    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctl-{}", self.0)
    }
}

/// Lifecycle state of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerStatus {
    /// Constructed, not yet executed.
    Created,
    /// Driving its task sequence.
    Running,
    /// All tasks completed.
    Finished,
    /// Stopped by a cancel request.
    Canceled,
    /// A task failed.
    Error,
}

impl ControllerStatus {
    /// `Finished`, `Canceled` and `Error` are terminal.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ControllerStatus::Finished | ControllerStatus::Canceled | ControllerStatus::Error
        )
    }

    /// Whether `self → to` is a legal transition.
    pub(crate) fn can_transition(self, to: ControllerStatus) -> bool {
        use ControllerStatus::*;
        matches!(
            (self, to),
            (Created, Running) | (Created, Canceled) | (Running, Finished | Canceled | Error)
        )
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            ControllerStatus::Created => "created",
            ControllerStatus::Running => "running",
            ControllerStatus::Finished => "finished",
            ControllerStatus::Canceled => "canceled",
            ControllerStatus::Error => "error",
        }
    }
}

impl fmt::Display for ControllerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// One observed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    /// Controller that changed.
    pub controller: ControllerId,
    /// State before the transition.
    pub old: ControllerStatus,
    /// State after the transition.
    pub new: ControllerStatus,
}

impl StatusChange {
    /// True when `new` is terminal.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.new.is_terminal()
    }
}

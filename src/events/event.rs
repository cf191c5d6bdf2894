//! # Events emitted by the scheduler and subscriber workers.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use it to restore publish order across receivers.
//!
//! ## Example
//! ```rust
//! use procvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::DuplicateSubmission)
//!     .with_name("scan-42")
//!     .with_occupancy(3, 5);
//!
//! assert_eq!(ev.kind, EventKind::DuplicateSubmission);
//! assert_eq!(ev.name.as_deref(), Some("scan-42"));
//! assert_eq!(ev.waiting, Some(3));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::controller::{Controller, ControllerId, ControllerStatus};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of scheduler events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Submission ===
    /// Controller appended to the waiting queue.
    ///
    /// Sets: `controller`, `name`, `waiting`, `running`
    ControllerSubmitted,

    /// Controller was already waiting or running; nothing changed.
    ///
    /// Sets: `controller`, `name`
    DuplicateSubmission,

    /// Controller already left `Created`; it cannot be scheduled again.
    ///
    /// Sets: `controller`, `name`, `status`
    SubmissionRejected,

    // === Admission ===
    /// Controller moved from waiting to running and started.
    ///
    /// Sets: `controller`, `name`, `waiting`, `running`
    ControllerAdmitted,

    /// Controller reached the queue head with a pending cancel request and was
    /// dropped without occupying a slot.
    ///
    /// Sets: `controller`, `name`
    ControllerSkipped,

    /// Controller left the running set after a terminal transition.
    ///
    /// Sets: `controller`, `name`, `status`, `waiting`, `running`
    ControllerEvicted,

    // === Control ===
    /// Cancel request forwarded to a waiting or running controller.
    ///
    /// Sets: `controller`, `name`
    CancelRequested,

    /// Waiting queue cleared.
    ///
    /// Sets: `waiting` (number of dropped entries)
    WaitingCleared,

    /// Admission gate toggled.
    ///
    /// Sets: `enabled`
    GateChanged,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `name` (subscriber), `reason`
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `name` (subscriber), `reason`
    SubscriberOverflow,
}

/// Scheduler event with optional metadata.
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Controller concerned, if any.
    pub controller: Option<ControllerId>,
    /// Controller or subscriber name.
    pub name: Option<Arc<str>>,
    /// Controller status relevant to the event.
    pub status: Option<ControllerStatus>,
    /// Human-readable reason.
    pub reason: Option<Arc<str>>,
    /// Waiting-queue length after the event.
    pub waiting: Option<u32>,
    /// Running-set size after the event.
    pub running: Option<u32>,
    /// Gate value after the event.
    pub enabled: Option<bool>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            controller: None,
            name: None,
            status: None,
            reason: None,
            waiting: None,
            running: None,
            enabled: None,
        }
    }

    /// Attaches controller id and name.
    #[inline]
    pub fn with_controller(mut self, c: &Controller) -> Self {
        self.controller = Some(c.id());
        self.name = Some(c.name().into());
        self
    }

    #[inline]
    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[inline]
    pub fn with_status(mut self, status: ControllerStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches queue occupancy (saturating to `u32`).
    #[inline]
    pub fn with_occupancy(mut self, waiting: usize, running: usize) -> Self {
        self.waiting = Some(u32::try_from(waiting).unwrap_or(u32::MAX));
        self.running = Some(u32::try_from(running).unwrap_or(u32::MAX));
        self
    }

    #[inline]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_name(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_name(subscriber)
            .with_reason(info)
    }
}

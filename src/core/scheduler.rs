//! # Scheduler: FIFO admission under a concurrency ceiling.
//!
//! The [`Scheduler`] owns the waiting queue and the running set. It never
//! runs work itself: it only subscribes a listener on each admitted
//! controller and calls [`Controller::execute`].
//!
//! ## Admission flow
//! ```text
//! submit(c) ──► waiting.push_back(c) ──► drain()
//!
//! drain():                                   (iterative, one active drainer)
//!   loop {
//!     lock ─► gate closed / ceiling hit / queue empty ─► draining=false, return
//!          └► pop head
//!                ├─ cancel flag set ─► Skip: c.execute() → Canceled (no slot)
//!                └─ otherwise       ─► running.insert(c)
//!                                      c.subscribe(AdmissionListener)
//!                                      c.execute()
//!   }
//!
//! AdmissionListener (terminal transition, any thread):
//!   running.remove(c) ─► publish ControllerEvicted ─► drain()
//! ```
//!
//! ## Rules
//! - The state lock is held only for structural mutation, never across
//!   `execute()`, `request_cancel()` or listener delivery.
//! - `cancel()` never removes anything: removal always follows the terminal transition.
//!   The cancel flag is set under the state lock, so a waiting controller is
//!   either skipped or was already admitted when `cancel()` ran.
//! - Drivers start on the controller's executor, so submission works from
//!   threads outside the runtime when the executor carries a runtime handle.
//! - Disabling the gate never preempts running controllers.
//! - No timeout: a controller whose task never reports keeps its slot.

use std::sync::{Arc, Mutex, Weak};

use tokio_util::sync::CancellationToken;

use super::builder::SchedulerBuilder;
use super::config::SchedulerConfig;
use super::state::{Admission, AdmissionState, Location};
use crate::controller::{Controller, ControllerRef, ControllerStatus, StatusChange, StatusListener};
use crate::error::{ListenerError, SubmitOutcome};
use crate::events::{Bus, Event, EventKind};
use crate::sync::lock;

/// Shared handle to the scheduler. Cheap to clone.
///
/// Construct once at startup with [`Scheduler::builder`] and hand clones to
/// every submission source.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

struct Inner {
    max_concurrent: usize,
    state: Mutex<AdmissionState>,
    bus: Bus,
    token: CancellationToken,
}

impl Scheduler {
    /// Returns a builder for the given configuration.
    pub fn builder(cfg: SchedulerConfig) -> SchedulerBuilder {
        SchedulerBuilder::new(cfg)
    }

    /// Scheduler without subscribers.
    pub fn new(cfg: SchedulerConfig) -> Self {
        SchedulerBuilder::new(cfg).build()
    }

    pub(crate) fn from_parts(cfg: &SchedulerConfig, bus: Bus, token: CancellationToken) -> Self {
        Self {
            inner: Arc::new(Inner {
                max_concurrent: cfg.max_concurrent_clamped(),
                state: Mutex::new(AdmissionState::new(cfg.enabled)),
                bus,
                token,
            }),
        }
    }

    /// Appends `controller` to the waiting queue, then tries to admit.
    ///
    /// Never blocks and never fails. Already waiting or running → [`SubmitOutcome::Duplicate`];
    /// no longer `Created` → [`SubmitOutcome::Rejected`].
    pub fn submit(&self, controller: &ControllerRef) -> SubmitOutcome {
        let (outcome, waiting, running) = {
            let mut st = lock(&self.inner.state);
            let outcome = st.enqueue(ControllerRef::clone(controller));
            (outcome, st.waiting_len(), st.running_len())
        };

        match outcome {
            SubmitOutcome::Queued => {
                self.inner.publish(
                    Event::new(EventKind::ControllerSubmitted)
                        .with_controller(controller)
                        .with_occupancy(waiting, running),
                );
                self.inner.drain();
            }
            SubmitOutcome::Duplicate => {
                tracing::debug!(
                    controller = %controller.id(),
                    name = controller.name(),
                    waiting,
                    "controller already queued or running; skipping"
                );
                self.inner
                    .publish(Event::new(EventKind::DuplicateSubmission).with_controller(controller));
            }
            SubmitOutcome::Rejected => {
                let status = controller.status();
                tracing::debug!(
                    controller = %controller.id(),
                    %status,
                    "controller already executed; not queued"
                );
                self.inner.publish(
                    Event::new(EventKind::SubmissionRejected)
                        .with_controller(controller)
                        .with_status(status),
                );
            }
        }
        outcome
    }

    /// Forwards a cancel request to a waiting or running controller.
    ///
    /// Returns `false` (and does nothing) when the controller is in neither container.
    /// A canceled waiting controller is skipped when it reaches the queue head.
    pub fn cancel(&self, controller: &Controller) -> bool {
        let location = lock(&self.inner.state).mark_canceled(controller);
        match location {
            Some(location) => {
                if location == Location::Running {
                    controller.request_cancel();
                }
                self.inner
                    .publish(Event::new(EventKind::CancelRequested).with_controller(controller));
                true
            }
            None => {
                tracing::debug!(controller = %controller.id(), "cancel target not scheduled");
                false
            }
        }
    }

    /// Cancels every running controller. The waiting queue is left untouched,
    /// so waiting controllers are admitted as slots free up.
    pub fn cancel_all(&self) {
        let running = lock(&self.inner.state).running_snapshot();
        self.inner.cancel_each(&running);
    }

    /// Clears the waiting queue, then cancels every running controller.
    pub fn cancel_all_and_clear_waiting(&self) {
        let (dropped, running) = {
            let mut st = lock(&self.inner.state);
            (st.clear_waiting(), st.running_snapshot())
        };
        self.inner
            .publish(Event::new(EventKind::WaitingCleared).with_occupancy(dropped, running.len()));
        self.inner.cancel_each(&running);
    }

    /// Opens or closes the admission gate. Opening admits up to the ceiling.
    pub fn set_enabled(&self, enabled: bool) {
        lock(&self.inner.state).enabled = enabled;
        self.inner
            .publish(Event::new(EventKind::GateChanged).with_enabled(enabled));
        if enabled {
            self.inner.drain();
        }
    }

    pub fn is_enabled(&self) -> bool {
        lock(&self.inner.state).enabled
    }

    /// Whether `controller` is in the running set.
    pub fn is_running(&self, controller: &Controller) -> bool {
        lock(&self.inner.state).locate(controller.id()) == Some(Location::Running)
    }

    /// Whether `controller` is in the waiting queue.
    pub fn is_waiting(&self, controller: &Controller) -> bool {
        lock(&self.inner.state).locate(controller.id()) == Some(Location::Waiting)
    }

    pub fn waiting_len(&self) -> usize {
        lock(&self.inner.state).waiting_len()
    }

    pub fn running_len(&self) -> usize {
        lock(&self.inner.state).running_len()
    }

    /// Effective concurrency ceiling.
    pub fn max_concurrent(&self) -> usize {
        self.inner.max_concurrent
    }

    /// Runs the admission drain. Submission and `set_enabled(true)` already do this.
    pub fn admit(&self) {
        self.inner.drain();
    }

    /// Receiver for scheduler events published from now on.
    pub fn events(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.inner.bus.subscribe()
    }

    /// Closes the gate, drops waiting controllers, cancels running ones and
    /// stops subscriber delivery.
    pub fn shutdown(&self) {
        self.set_enabled(false);
        self.cancel_all_and_clear_waiting();
        self.inner.token.cancel();
    }
}

impl Inner {
    fn publish(&self, ev: Event) {
        self.bus.publish(ev);
    }

    fn cancel_each(&self, controllers: &[ControllerRef]) {
        for c in controllers {
            c.request_cancel();
            self.publish(Event::new(EventKind::CancelRequested).with_controller(c));
        }
    }

    /// Admits from the queue head until the gate, the ceiling or the queue stops it.
    ///
    /// Only one drain loop runs at a time. A caller that finds one active returns
    /// at once; the active loop re-reads the state on every iteration and so picks
    /// up whatever changed.
    fn drain(self: &Arc<Self>) {
        {
            let mut st = lock(&self.state);
            if st.draining {
                return;
            }
            st.draining = true;
        }
        let mut guard = DrainGuard {
            state: &self.state,
            armed: true,
        };

        loop {
            let (next, waiting, running) = {
                let mut st = lock(&self.state);
                match st.next_admission(self.max_concurrent) {
                    Some(next) => (next, st.waiting_len(), st.running_len()),
                    None => {
                        tracing::trace!(
                            enabled = st.enabled,
                            waiting = st.waiting_len(),
                            running = st.running_len(),
                            max = self.max_concurrent,
                            "admission drain idle"
                        );
                        // Cleared in the same critical section as the final check.
                        st.draining = false;
                        guard.armed = false;
                        return;
                    }
                }
            };

            match next {
                Admission::Skip(c) => {
                    tracing::trace!(controller = %c.id(), "skipping controller canceled while waiting");
                    self.publish(Event::new(EventKind::ControllerSkipped).with_controller(&c));
                    c.execute();
                }
                Admission::Start(c) => {
                    c.subscribe(Arc::new(AdmissionListener {
                        scheduler: Arc::downgrade(self),
                    }));
                    tracing::trace!(controller = %c.id(), waiting, running, "admitting controller");
                    self.publish(
                        Event::new(EventKind::ControllerAdmitted)
                            .with_controller(&c)
                            .with_occupancy(waiting, running),
                    );
                    c.execute();

                    // Executed elsewhere and already terminal: no transition will come.
                    let status = c.status();
                    if status.is_terminal() {
                        self.on_terminal(&c, status);
                    }
                }
            }
        }
    }

    /// Evicts a terminal controller (at most once) and refills the pool.
    fn on_terminal(self: &Arc<Self>, controller: &Controller, status: ControllerStatus) {
        let (evicted, waiting, running) = {
            let mut st = lock(&self.state);
            let evicted = st.evict(controller.id());
            (evicted, st.waiting_len(), st.running_len())
        };
        if evicted.is_none() {
            return;
        }
        drop(evicted);

        self.publish(
            Event::new(EventKind::ControllerEvicted)
                .with_controller(controller)
                .with_status(status)
                .with_occupancy(waiting, running),
        );
        self.drain();
    }
}

/// Resets the `draining` flag if the loop unwinds.
struct DrainGuard<'a> {
    state: &'a Mutex<AdmissionState>,
    armed: bool,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            lock(self.state).draining = false;
        }
    }
}

/// Per-admission subscription evicting the controller on its terminal transition.
struct AdmissionListener {
    scheduler: Weak<Inner>,
}

impl StatusListener for AdmissionListener {
    fn on_status_changed(
        &self,
        controller: &Controller,
        change: StatusChange,
    ) -> Result<(), ListenerError> {
        if !change.is_terminal() {
            return Ok(());
        }
        if let Some(inner) = self.scheduler.upgrade() {
            inner.on_terminal(controller, change.new);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "admission"
    }
}

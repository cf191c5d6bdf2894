//! # Admission state: waiting FIFO + running set.
//!
//! One struct behind one lock, so the two containers are always mutated
//! together.
//!
//! ## Invariants
//! - `waiting ∩ running = ∅`
//! - `running.len() <= max` (enforced by [`AdmissionState::next_admission`])
//! - no duplicates in either container

use std::collections::{HashMap, VecDeque};

use crate::controller::{Controller, ControllerId, ControllerRef, ControllerStatus};
use crate::error::SubmitOutcome;

/// Where a controller currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Location {
    Waiting,
    Running,
}

/// Result of popping the queue head.
pub(crate) enum Admission {
    /// Moved into `running`; must be subscribed and executed.
    Start(ControllerRef),
    /// Canceled while waiting; never enters `running`.
    Skip(ControllerRef),
}

pub(crate) struct AdmissionState {
    waiting: VecDeque<ControllerRef>,
    running: HashMap<ControllerId, ControllerRef>,
    pub(crate) enabled: bool,
    // A drain loop is currently active.
    pub(crate) draining: bool,
}

impl AdmissionState {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            waiting: VecDeque::new(),
            running: HashMap::new(),
            enabled,
            draining: false,
        }
    }

    pub(crate) fn waiting_len(&self) -> usize {
        self.waiting.len()
    }

    pub(crate) fn running_len(&self) -> usize {
        self.running.len()
    }

    pub(crate) fn locate(&self, id: ControllerId) -> Option<Location> {
        if self.running.contains_key(&id) {
            Some(Location::Running)
        } else if self.waiting.iter().any(|c| c.id() == id) {
            Some(Location::Waiting)
        } else {
            None
        }
    }

    /// Sets the cancel flag of a scheduled controller.
    ///
    /// Runs under the state lock: a concurrent drain either sees the flag and
    /// skips the controller, or has already moved it to `running`.
    pub(crate) fn mark_canceled(&self, controller: &Controller) -> Option<Location> {
        let location = self.locate(controller.id())?;
        controller.mark_cancel_requested();
        Some(location)
    }

    pub(crate) fn enqueue(&mut self, controller: ControllerRef) -> SubmitOutcome {
        if self.locate(controller.id()).is_some() {
            return SubmitOutcome::Duplicate;
        }
        if controller.status() != ControllerStatus::Created {
            return SubmitOutcome::Rejected;
        }
        self.waiting.push_back(controller);
        SubmitOutcome::Queued
    }

    /// Pops the queue head if the gate is open and a slot is free.
    pub(crate) fn next_admission(&mut self, max: usize) -> Option<Admission> {
        if !self.enabled || self.running.len() >= max {
            return None;
        }
        let next = self.waiting.pop_front()?;
        if next.is_cancel_requested() {
            return Some(Admission::Skip(next));
        }
        self.running.insert(next.id(), ControllerRef::clone(&next));
        Some(Admission::Start(next))
    }

    /// Removes a controller from `running`. `None` if it was not there.
    pub(crate) fn evict(&mut self, id: ControllerId) -> Option<ControllerRef> {
        self.running.remove(&id)
    }

    /// Empties `waiting`, returning the number of dropped entries.
    pub(crate) fn clear_waiting(&mut self) -> usize {
        let n = self.waiting.len();
        self.waiting.clear();
        n
    }

    pub(crate) fn running_snapshot(&self) -> Vec<ControllerRef> {
        self.running.values().cloned().collect()
    }
}

//! # Scheduler configuration.
//!
//! ## Sentinel values
//! - `max_concurrent = 0` → clamped to 1 (the ceiling is always positive)
//! - `bus_capacity = 0` → clamped to 1

/// Configuration for a [`Scheduler`](crate::Scheduler).
///
/// ## Field semantics
/// - `max_concurrent`: ceiling on simultaneously running controllers (default 5)
/// - `enabled`: initial state of the admission gate (default `false`)
/// - `bus_capacity`: event bus ring buffer size
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Maximum number of controllers in the running set.
    ///
    /// Checked before every admission; never enforced by preemption.
    pub max_concurrent: usize,

    /// Whether admission starts open.
    ///
    /// A disabled scheduler still accepts submissions; they wait until
    /// [`Scheduler::set_enabled`](crate::Scheduler::set_enabled)`(true)`.
    pub enabled: bool,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Receivers lagging behind more than `bus_capacity` events observe `Lagged`.
    pub bus_capacity: usize,
}

impl SchedulerConfig {
    /// Concurrency ceiling, at least 1.
    #[inline]
    pub fn max_concurrent_clamped(&self) -> usize {
        self.max_concurrent.max(1)
    }

    /// Bus capacity, at least 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for SchedulerConfig {
    /// - `max_concurrent = 5`
    /// - `enabled = false`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            max_concurrent: 5,
            enabled: false,
            bus_capacity: 1024,
        }
    }
}

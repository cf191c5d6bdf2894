//! Scheduler core: configuration, admission state and the scheduler itself.
//!
//! The public API from this module is [`Scheduler`], built through
//! [`SchedulerBuilder`] from a [`SchedulerConfig`].
//!
//! Internal modules:
//! - [`state`]: waiting queue + running set behind one lock;
//! - [`scheduler`]: submission, cancellation, gate, admission drain, eviction;
//! - [`builder`]: wires the event bus and subscriber workers.

mod builder;
mod config;
mod scheduler;
mod state;

pub use builder::SchedulerBuilder;
pub use config::SchedulerConfig;
pub use scheduler::Scheduler;

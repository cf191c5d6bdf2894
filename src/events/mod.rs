//! Scheduler events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Scheduler` (submission, admission, cancel, eviction, gate),
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the scheduler's bus listener (fans out to `SubscriberSet`) and
//!   any receiver obtained from [`Scheduler::events`](crate::Scheduler::events).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};

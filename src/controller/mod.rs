//! # Controllers: per-submission state machines.
//!
//! A [`Controller`] owns an ordered sequence of tasks and drives them, one at
//! a time, through an [`Executor`](crate::Executor).
//!
//! ## Lifecycle
//! ```text
//!            execute()                 all tasks Completed
//! Created ─────────────► Running ─────────────────────────► Finished
//!    │                      ├── cancel flag / Canceled ───► Canceled
//!    │                      └── Failed ───────────────────► Error
//!    └── execute() with cancel flag already set ──────────► Canceled
//! ```
//!
//! Every transition is delivered to the subscribed [`StatusListener`]s.
//! Subscriptions are dropped after the terminal delivery.

mod core;
mod listener;
mod status;

pub use self::core::{Controller, ControllerRef};
pub use listener::{StatusListener, SubscriptionId};
pub use status::{ControllerId, ControllerStatus, StatusChange};

//! # Event subscribers.
//!
//! ## Architecture
//! ```text
//! Scheduler ── publish(Event) ──► Bus ──► bus listener ──► SubscriberSet::emit
//!                                                            ┌─────┼─────┐
//!                                                            ▼     ▼     ▼
//!                                                         [queue] [queue] [queue]
//!                                                            │     │     │
//!                                                         worker worker worker
//!                                                            ▼     ▼     ▼
//!                                                        sub.on_event(&Event)
//! ```

mod set;
mod subscriber;

#[cfg(feature = "logging")]
mod log;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;

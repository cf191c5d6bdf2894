//! # Event subscriber trait.
//!
//! Each subscriber gets a **dedicated worker task** and a **bounded queue**
//! (capacity via [`Subscribe::queue_capacity`]). Panics are caught and reported
//! as `EventKind::SubscriberPanicked`. On overflow the event is dropped for that
//! subscriber only and `EventKind::SubscriberOverflow` is published.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use procvisor::{Event, EventKind, Subscribe};
//!
//! struct Occupancy;
//!
//! #[async_trait]
//! impl Subscribe for Occupancy {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::ControllerAdmitted) {
//!             // export ev.running as a gauge, etc.
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "occupancy" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Event subscriber for scheduler observability.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event (FIFO per subscriber).
    async fn on_event(&self, event: &Event);

    /// Name used in overflow/panic events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred queue capacity, clamped to a minimum of 1. Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}

//! # procvisor
//!
//! **Procvisor** is a bounded-concurrency FIFO scheduler for cooperative,
//! cancelable processing controllers.
//!
//! A [`Controller`] bundles an ordered sequence of tasks (one per enabled
//! processing step). The [`Scheduler`] admits controllers in submission order,
//! never lets more than `max_concurrent` of them run at once, and refills a
//! slot as soon as a running controller reaches a terminal state.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   submit(c)          submit(c)          submit(c)
//!       │                  │                  │
//!       ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Scheduler                                                        │
//! │  - waiting: FIFO of Created controllers                           │
//! │  - running: at most max_concurrent controllers                    │
//! │  - enabled: admission gate                                        │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        │ execute()        │ execute()        │ execute()     │
//!        ▼                  ▼                  ▼               │
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   │
//!     │  Controller  │   │  Controller  │   │  Controller  │   │
//!     │ (task seq.)  │   │ (task seq.)  │   │ (task seq.)  │   │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘   │
//!      │ submit_task      │                  │                 │ Publishes
//!      ▼                  ▼                  ▼                 │ Events:
//!     ┌──────────────────────────────────────────────┐         │ - ControllerAdmitted
//!     │  Executor (TokioExecutor by default)         │         │ - ControllerEvicted
//!     └──────────────────────────────────────────────┘         │ - ...
//!      │                                                       │
//!      │ terminal transition ──► AdmissionListener ──► evict + drain
//!      ▼                                                       ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │              (capacity: SchedulerConfig::bus_capacity)            │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber_listener   │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                            (per-sub queues)
//!                         ┌─────────┼─────────┐
//!                         ▼         ▼         ▼
//!                      worker1   worker2   workerN
//! ```
//!
//! ### Lifecycle
//! ```text
//! Controller::new ──► Scheduler::submit ──► waiting
//!
//! drain {
//!   ├─► gate closed, ceiling reached or queue empty ─► stop
//!   ├─► head canceled while waiting ─► execute() → Canceled (no slot)
//!   └─► running.insert(head), subscribe, execute() → Running
//! }
//!
//! Running controller:
//!   for task in tasks {
//!     ├─ cancel flag set ─► Canceled
//!     ├─ executor.submit_task(task), await outcome
//!     │     ├─ Completed ─► next task
//!     │     ├─ Failed    ─► Error
//!     │     └─ Canceled  ─► Canceled
//!   }
//!   all Completed ─► Finished
//!
//! Terminal transition ─► running.remove ─► ControllerEvicted ─► drain
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                         |
//! |-------------------|--------------------------------------------------------------|--------------------------------------------|
//! | **Scheduling**    | FIFO admission under a concurrency ceiling with a gate.      | [`Scheduler`], [`SchedulerBuilder`]        |
//! | **Controllers**   | Ordered task sequences with a five-state lifecycle.          | [`Controller`], [`ControllerStatus`]       |
//! | **Listeners**     | Observe a controller's status transitions.                   | [`StatusListener`], [`StatusChange`]       |
//! | **Execution**     | Pluggable task execution boundary.                           | [`Executor`], [`TokioExecutor`]            |
//! | **Tasks**         | Define tasks as functions or trait objects.                  | [`Task`], [`TaskFn`], [`TaskRef`]          |
//! | **Steps**         | Ordered registry of enabled processing steps.                | [`StepRegistry`]                           |
//! | **Subscriber API**| Hook into scheduler events (logging, metrics, UI).           | [`Subscribe`], [`Event`]                   |
//! | **Errors**        | Typed errors for tasks and listeners.                        | [`TaskError`], [`ListenerError`]           |
//! | **Configuration** | Ceiling, initial gate, bus capacity.                         | [`SchedulerConfig`]                        |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in `LogWriter` subscriber _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use procvisor::{
//!     Controller, ControllerStatus, ExecutorRef, Scheduler, SchedulerConfig, TaskError, TaskFn,
//!     TaskRef, TokioExecutor,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let sched = Scheduler::new(SchedulerConfig {
//!         max_concurrent: 2,
//!         enabled: true,
//!         ..SchedulerConfig::default()
//!     });
//!     let exec: ExecutorRef = Arc::new(TokioExecutor::new());
//!
//!     let centroid: TaskRef = TaskFn::arc("centroid", |ctx: CancellationToken| async move {
//!         if ctx.is_cancelled() {
//!             return Err(TaskError::Canceled);
//!         }
//!         Ok::<_, TaskError>(())
//!     });
//!
//!     let scan = Controller::new("scan-1", vec![centroid], exec);
//!     sched.submit(&scan);
//!     assert_eq!(scan.wait_terminal().await, ControllerStatus::Finished);
//!     assert_eq!(sched.running_len(), 0);
//! }
//! ```
mod controller;
mod core;
mod error;
mod events;
mod executor;
mod steps;
mod subscribers;
mod sync;
mod tasks;

// ---- Public re-exports ----

pub use controller::{
    Controller, ControllerId, ControllerRef, ControllerStatus, StatusChange, StatusListener,
    SubscriptionId,
};
pub use self::core::{Scheduler, SchedulerBuilder, SchedulerConfig};
pub use error::{ExecutorError, ListenerError, SubmitOutcome, TaskError};
pub use events::{Bus, Event, EventKind};
pub use executor::{Executor, ExecutorRef, TaskCompleter, TaskHandle, TaskOutcome, TokioExecutor};
pub use steps::StepRegistry;
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{Task, TaskFn, TaskRef};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::FutureExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::{
    ControllerId, ControllerStatus, StatusChange, StatusListener, SubscriptionId,
    listener::ListenerSet,
};
use crate::error::panic_message;
use crate::executor::{ExecutorRef, TaskOutcome};
use crate::steps::StepRegistry;
use crate::sync::lock;
use crate::tasks::TaskRef;

/// Shared handle to a controller.
pub type ControllerRef = Arc<Controller>;

/// State machine driving one ordered task sequence.
///
/// Equality and hashing use [`ControllerId`]: two controllers never compare
/// equal unless they are the same instance.
///
/// ### Rules
/// - [`execute`](Self::execute) is the only way out of `Created`; further calls are no-ops.
/// - Tasks are submitted one at a time, in order. The cancel flag is checked before each one.
/// - A failed task ends the sequence with `Error`. Completed tasks are never rolled back.
/// - [`request_cancel`](Self::request_cancel) never transitions directly; `Canceled` is
///   delivered once the executor reports the in-flight task's end.
pub struct Controller {
    id: ControllerId,
    name: Arc<str>,
    tasks: Vec<TaskRef>,
    executor: ExecutorRef,

    status: Mutex<ControllerStatus>,
    cancel_requested: AtomicBool,
    in_flight: Mutex<Option<CancellationToken>>,
    completed: AtomicUsize,

    listeners: ListenerSet,
    // Published after listener delivery finished.
    settled: watch::Sender<ControllerStatus>,
}

impl Controller {
    /// Creates a controller in `Created` state.
    pub fn new(
        name: impl Into<Arc<str>>,
        tasks: Vec<TaskRef>,
        executor: ExecutorRef,
    ) -> ControllerRef {
        let (settled, _rx) = watch::channel(ControllerStatus::Created);
        Arc::new(Self {
            id: ControllerId::next(),
            name: name.into(),
            tasks,
            executor,
            status: Mutex::new(ControllerStatus::Created),
            cancel_requested: AtomicBool::new(false),
            in_flight: Mutex::new(None),
            completed: AtomicUsize::new(0),
            listeners: ListenerSet::default(),
            settled,
        })
    }

    /// Creates a controller with one task per enabled processing step, in registry order.
    pub fn from_steps<S>(
        name: impl Into<Arc<str>>,
        steps: &StepRegistry<S>,
        executor: ExecutorRef,
        make_task: impl FnMut(&S) -> TaskRef,
    ) -> ControllerRef {
        let tasks = steps.iter().map(make_task).collect();
        Self::new(name, tasks, executor)
    }

    pub fn id(&self) -> ControllerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of tasks in the sequence.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Number of tasks that reported `Completed` so far.
    pub fn completed_tasks(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Current status.
    pub fn status(&self) -> ControllerStatus {
        *lock(&self.status)
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::SeqCst)
    }

    /// Number of live subscriptions.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Subscribes `listener` to every subsequent transition.
    ///
    /// On an already terminal controller nothing is stored and the returned id is inert.
    pub fn subscribe(&self, listener: Arc<dyn StatusListener>) -> SubscriptionId {
        // Status lock held so a concurrent terminal transition cannot slip
        // between the check and the insert.
        let status = lock(&self.status);
        if status.is_terminal() {
            return self.listeners.detached_id();
        }
        self.listeners.subscribe(listener)
    }

    /// Removes a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Starts the task sequence. No-op unless the controller is `Created`.
    ///
    /// If cancellation was requested beforehand the controller goes straight to
    /// `Canceled` and never runs. The driver loop is started through the
    /// executor; if it cannot be started the controller ends in `Error`.
    pub fn execute(self: &Arc<Self>) {
        let target = if self.is_cancel_requested() {
            ControllerStatus::Canceled
        } else {
            ControllerStatus::Running
        };

        if !self.transition(ControllerStatus::Created, target) {
            tracing::debug!(controller = %self.id, status = %self.status(), "execute ignored");
            return;
        }
        if target.is_terminal() {
            return;
        }

        let me = Arc::clone(self);
        let driver = async move {
            let res = AssertUnwindSafe(me.drive()).catch_unwind().await;
            if let Err(panic_err) = res {
                tracing::warn!(
                    controller = %me.id,
                    info = %panic_message(&*panic_err),
                    "controller driver panicked"
                );
                me.transition(ControllerStatus::Running, ControllerStatus::Error);
            }
        }
        .boxed();

        let spawned = catch_unwind(AssertUnwindSafe(|| self.executor.spawn_driver(driver)));
        let reason = match spawned {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e.to_string(),
            Err(panic_err) => format!("executor panicked: {}", panic_message(&*panic_err)),
        };
        tracing::warn!(controller = %self.id, %reason, "controller driver not started");
        self.transition(ControllerStatus::Running, ControllerStatus::Error);
    }

    /// Sets the cooperative cancel flag and cancels the in-flight task, if any.
    pub fn request_cancel(&self) {
        self.mark_cancel_requested();
        if let Some(token) = lock(&self.in_flight).as_ref() {
            token.cancel();
        }
    }

    /// Sets the cancel flag without touching the in-flight task.
    pub(crate) fn mark_cancel_requested(&self) {
        self.cancel_requested.store(true, Ordering::SeqCst);
    }

    /// Waits until the controller is terminal and its listeners were notified.
    pub async fn wait_terminal(&self) -> ControllerStatus {
        let mut rx = self.settled.subscribe();
        match rx.wait_for(|s| s.is_terminal()).await {
            Ok(s) => *s,
            Err(_) => self.status(),
        }
    }

    async fn drive(&self) {
        for task in &self.tasks {
            if self.is_cancel_requested() {
                self.transition(ControllerStatus::Running, ControllerStatus::Canceled);
                return;
            }

            let handle = self.executor.submit_task(Arc::clone(task));
            *lock(&self.in_flight) = Some(handle.token());
            // A cancel that raced the store above found no token to cancel.
            if self.is_cancel_requested() {
                handle.cancel();
            }

            let outcome = handle.outcome().await;
            lock(&self.in_flight).take();

            match outcome {
                TaskOutcome::Completed => {
                    self.completed.fetch_add(1, Ordering::SeqCst);
                }
                TaskOutcome::Failed { reason } => {
                    tracing::debug!(
                        controller = %self.id,
                        task = task.name(),
                        %reason,
                        "task failed; abandoning sequence"
                    );
                    self.transition(ControllerStatus::Running, ControllerStatus::Error);
                    return;
                }
                TaskOutcome::Canceled => {
                    self.transition(ControllerStatus::Running, ControllerStatus::Canceled);
                    return;
                }
            }
        }
        self.transition(ControllerStatus::Running, ControllerStatus::Finished);
    }

    /// Performs `from → to` if the controller is in `from`, then notifies listeners.
    fn transition(&self, from: ControllerStatus, to: ControllerStatus) -> bool {
        debug_assert!(from.can_transition(to));
        {
            let mut status = lock(&self.status);
            if *status != from {
                return false;
            }
            *status = to;
        }

        let change = StatusChange {
            controller: self.id,
            old: from,
            new: to,
        };
        tracing::trace!(controller = %self.id, old = %from, new = %to, "status changed");
        self.listeners.deliver(self, change);
        self.settled.send_replace(to);
        true
    }
}

impl PartialEq for Controller {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Controller {}

impl Hash for Controller {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("status", &self.status())
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ListenerError, TaskError};
    use crate::executor::TokioExecutor;
    use crate::tasks::TaskFn;
    use std::time::Duration;
    use tokio::sync::Notify;

    fn executor() -> ExecutorRef {
        Arc::new(TokioExecutor::new())
    }

    fn ok_task(name: &'static str, hits: Arc<AtomicUsize>) -> TaskRef {
        TaskFn::arc(name, move |_ctx: CancellationToken| {
            let hits = hits.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Ok::<(), TaskError>(())
            }
        })
    }

    /// Blocks until released or canceled.
    fn gated_task(gate: Arc<Notify>) -> TaskRef {
        TaskFn::arc("gated", move |ctx: CancellationToken| {
            let gate = gate.clone();
            async move {
                tokio::select! {
                    _ = gate.notified() => Ok(()),
                    _ = ctx.cancelled() => Err(TaskError::Canceled),
                }
            }
        })
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<StatusChange>>,
    }

    impl StatusListener for Recorder {
        fn on_status_changed(
            &self,
            _controller: &Controller,
            change: StatusChange,
        ) -> Result<(), ListenerError> {
            self.seen.lock().unwrap().push(change);
            Ok(())
        }
    }

    struct Faulty;

    impl StatusListener for Faulty {
        fn on_status_changed(
            &self,
            _controller: &Controller,
            _change: StatusChange,
        ) -> Result<(), ListenerError> {
            Err(ListenerError::Fault {
                reason: "plot closed".into(),
            })
        }
    }

    struct Panicky;

    impl StatusListener for Panicky {
        fn on_status_changed(
            &self,
            _controller: &Controller,
            _change: StatusChange,
        ) -> Result<(), ListenerError> {
            panic!("listener bug");
        }
    }

    async fn settle(c: &Controller) -> ControllerStatus {
        tokio::time::timeout(Duration::from_secs(5), c.wait_terminal())
            .await
            .expect("controller did not settle")
    }

    #[tokio::test]
    async fn runs_all_tasks_in_order_then_finishes() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let tasks: Vec<TaskRef> = ["a", "b", "c"]
            .into_iter()
            .map(|n| {
                let order = order.clone();
                TaskFn::arc(n, move |_ctx: CancellationToken| {
                    let order = order.clone();
                    async move {
                        order.lock().unwrap().push(n);
                        Ok::<(), TaskError>(())
                    }
                }) as TaskRef
            })
            .collect();

        let c = Controller::new("seq", tasks, executor());
        let rec = Arc::new(Recorder::default());
        c.subscribe(rec.clone());
        c.execute();

        assert_eq!(settle(&c).await, ControllerStatus::Finished);
        assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c"]);
        assert_eq!(c.completed_tasks(), 3);

        let seen = rec.seen.lock().unwrap().clone();
        let news: Vec<_> = seen.iter().map(|s| s.new).collect();
        assert_eq!(
            news,
            vec![ControllerStatus::Running, ControllerStatus::Finished]
        );
        assert_eq!(c.listener_count(), 0);
    }

    #[tokio::test]
    async fn execute_is_idempotent() {
        let hits = Arc::new(AtomicUsize::new(0));
        let c = Controller::new("once", vec![ok_task("t", hits.clone())], executor());
        c.execute();
        c.execute();
        settle(&c).await;
        c.execute();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(c.status(), ControllerStatus::Finished);
    }

    #[tokio::test]
    async fn failure_abandons_remaining_tasks() {
        let hits = Arc::new(AtomicUsize::new(0));
        let failing: TaskRef = TaskFn::arc("bad", |_ctx: CancellationToken| async {
            Err::<(), TaskError>(TaskError::fail("no data points"))
        });
        let c = Controller::new(
            "err",
            vec![ok_task("first", hits.clone()), failing, ok_task("never", hits.clone())],
            executor(),
        );
        c.execute();

        assert_eq!(settle(&c).await, ControllerStatus::Error);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(c.completed_tasks(), 1);
    }

    #[tokio::test]
    async fn cancel_before_execute_never_runs() {
        let hits = Arc::new(AtomicUsize::new(0));
        let c = Controller::new("pre", vec![ok_task("t", hits.clone())], executor());
        let rec = Arc::new(Recorder::default());
        c.subscribe(rec.clone());

        c.request_cancel();
        assert_eq!(c.status(), ControllerStatus::Created);
        c.execute();

        assert_eq!(settle(&c).await, ControllerStatus::Canceled);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        let seen = rec.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].old, ControllerStatus::Created);
        assert_eq!(seen[0].new, ControllerStatus::Canceled);
    }

    #[tokio::test]
    async fn cancel_while_running_is_deferred_to_task_end() {
        let gate = Arc::new(Notify::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let c = Controller::new(
            "running",
            vec![gated_task(gate.clone()), ok_task("after", hits.clone())],
            executor(),
        );
        let rec = Arc::new(Recorder::default());
        c.subscribe(rec.clone());
        c.execute();
        assert_eq!(c.status(), ControllerStatus::Running);

        c.request_cancel();
        assert_eq!(settle(&c).await, ControllerStatus::Canceled);
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        let terminal: Vec<_> = rec
            .seen
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.is_terminal())
            .copied()
            .collect();
        assert_eq!(terminal.len(), 1);
    }

    #[tokio::test]
    async fn completed_work_is_kept_when_canceled_between_tasks() {
        let hits = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());
        let started = Arc::new(Notify::new());
        // Completes even when asked to cancel (ignores the token).
        let stubborn: TaskRef = {
            let gate = gate.clone();
            let started = started.clone();
            TaskFn::arc("stubborn", move |_ctx: CancellationToken| {
                let gate = gate.clone();
                let started = started.clone();
                async move {
                    started.notify_one();
                    gate.notified().await;
                    Ok::<(), TaskError>(())
                }
            })
        };
        let c = Controller::new(
            "partial",
            vec![stubborn, ok_task("next", hits.clone())],
            executor(),
        );
        c.execute();
        started.notified().await;
        c.request_cancel();
        gate.notify_one();

        assert_eq!(settle(&c).await, ControllerStatus::Canceled);
        assert_eq!(c.completed_tasks(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn faulty_listeners_are_isolated() {
        let hits = Arc::new(AtomicUsize::new(0));
        let c = Controller::new("iso", vec![ok_task("t", hits)], executor());
        let rec = Arc::new(Recorder::default());
        c.subscribe(Arc::new(Faulty));
        c.subscribe(Arc::new(Panicky));
        c.subscribe(rec.clone());
        c.execute();

        assert_eq!(settle(&c).await, ControllerStatus::Finished);
        assert_eq!(rec.seen.lock().unwrap().len(), 2);
        assert_eq!(c.status(), ControllerStatus::Finished);
    }

    #[tokio::test]
    async fn subscribe_on_terminal_controller_stores_nothing() {
        let c = Controller::new("done", Vec::new(), executor());
        c.execute();
        assert_eq!(settle(&c).await, ControllerStatus::Finished);

        let id = c.subscribe(Arc::new(Recorder::default()));
        assert_eq!(c.listener_count(), 0);
        assert!(!c.unsubscribe(id));
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let c = Controller::new("unsub", Vec::new(), executor());
        let rec = Arc::new(Recorder::default());
        let id = c.subscribe(rec.clone());
        assert!(c.unsubscribe(id));
        c.execute();
        settle(&c).await;
        assert!(rec.seen.lock().unwrap().is_empty());
    }

    struct PanickingExecutor;

    impl crate::executor::Executor for PanickingExecutor {
        fn submit_task(&self, _task: TaskRef) -> crate::executor::TaskHandle {
            unreachable!("no task is submitted without a driver")
        }

        fn spawn_driver(
            &self,
            _driver: futures::future::BoxFuture<'static, ()>,
        ) -> Result<(), crate::error::ExecutorError> {
            panic!("executor shut down");
        }
    }

    #[test]
    fn execute_without_runtime_ends_in_error() {
        let hits = Arc::new(AtomicUsize::new(0));
        let c = Controller::new("offline", vec![ok_task("t", hits.clone())], executor());
        let rec = Arc::new(Recorder::default());
        c.subscribe(rec.clone());

        c.execute();

        assert_eq!(c.status(), ControllerStatus::Error);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        let news: Vec<_> = rec.seen.lock().unwrap().iter().map(|s| s.new).collect();
        assert_eq!(news, vec![ControllerStatus::Running, ControllerStatus::Error]);
    }

    #[test]
    fn panicking_executor_ends_in_error() {
        let c = Controller::new("broken", Vec::new(), Arc::new(PanickingExecutor));
        c.execute();
        assert_eq!(c.status(), ControllerStatus::Error);
        assert_eq!(c.listener_count(), 0);
    }

    #[test]
    fn identity_is_per_instance() {
        let a = Controller::new("same", Vec::new(), executor());
        let b = Controller::new("same", Vec::new(), executor());
        assert_ne!(*a, *b);
        assert_eq!(*a, *Arc::clone(&a));
    }
}

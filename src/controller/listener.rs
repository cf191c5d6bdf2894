//! # Status listener protocol.
//!
//! ## Rules
//! - Any number of listeners may subscribe to one controller.
//! - Every transition is delivered to the subscriptions present at that moment.
//! - After the terminal delivery all subscriptions are dropped, so a listener sees
//!   at most one terminal transition per subscription.
//! - A listener returning `Err` or panicking is logged and skipped. The remaining
//!   listeners still run and the controller state is unaffected.
//! - Listeners run on whatever context produced the transition (the caller of
//!   `execute()` or an executor worker). No controller lock is held meanwhile.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex};

use crate::controller::{Controller, StatusChange};
use crate::error::{ListenerError, panic_message};
use crate::sync::lock;

/// Observer of controller transitions.
///
/// ### Implementation requirements
/// - Return quickly; delivery is synchronous.
/// - Do not call back into the same controller's `subscribe` from a terminal delivery.
pub trait StatusListener: Send + Sync + 'static {
    /// Called once per transition.
    fn on_status_changed(
        &self,
        controller: &Controller,
        change: StatusChange,
    ) -> Result<(), ListenerError>;

    /// Listener name used in diagnostics.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Handle of one subscription, usable with [`Controller::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Clone)]
struct Subscription {
    id: SubscriptionId,
    listener: Arc<dyn StatusListener>,
}

#[derive(Default)]
struct Entries {
    next_id: u64,
    subs: Vec<Subscription>,
}

/// Subscriptions of one controller.
#[derive(Default)]
pub(crate) struct ListenerSet {
    inner: Mutex<Entries>,
}

impl ListenerSet {
    pub(crate) fn subscribe(&self, listener: Arc<dyn StatusListener>) -> SubscriptionId {
        let mut entries = lock(&self.inner);
        entries.next_id += 1;
        let id = SubscriptionId(entries.next_id);
        entries.subs.push(Subscription { id, listener });
        id
    }

    /// Allocates an id without storing the listener (controller already terminal).
    pub(crate) fn detached_id(&self) -> SubscriptionId {
        let mut entries = lock(&self.inner);
        entries.next_id += 1;
        SubscriptionId(entries.next_id)
    }

    pub(crate) fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut entries = lock(&self.inner);
        let before = entries.subs.len();
        entries.subs.retain(|s| s.id != id);
        entries.subs.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        lock(&self.inner).subs.len()
    }

    /// Delivers `change` outside the lock. Terminal changes consume the subscriptions.
    pub(crate) fn deliver(&self, controller: &Controller, change: StatusChange) {
        let targets: Vec<Subscription> = {
            let mut entries = lock(&self.inner);
            if change.is_terminal() {
                std::mem::take(&mut entries.subs)
            } else {
                entries.subs.clone()
            }
        };

        for sub in targets {
            let res = catch_unwind(AssertUnwindSafe(|| {
                sub.listener.on_status_changed(controller, change)
            }));
            match res {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(
                        controller = %change.controller,
                        listener = sub.listener.name(),
                        label = e.as_label(),
                        error = %e,
                        "status listener failed"
                    );
                }
                Err(panic_err) => {
                    tracing::warn!(
                        controller = %change.controller,
                        listener = sub.listener.name(),
                        info = %panic_message(&*panic_err),
                        "status listener panicked"
                    );
                }
            }
        }
    }
}

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;

use super::{config::SchedulerConfig, scheduler::Scheduler};
use crate::{
    events::{Bus, Event},
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a [`Scheduler`] with optional subscribers.
pub struct SchedulerBuilder {
    cfg: SchedulerConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl SchedulerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: SchedulerConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive scheduler events (submission, admission, eviction, ...)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Builds the scheduler.
    ///
    /// Without subscribers nothing is spawned and this may be called outside a
    /// tokio runtime. With subscribers, the bus listener and one worker per
    /// subscriber are spawned and stop on [`Scheduler::shutdown`].
    pub fn build(self) -> Scheduler {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let token = CancellationToken::new();

        if !self.subscribers.is_empty() {
            // Subscribed before returning so no event published after build is missed.
            let rx = bus.subscribe();
            let set = SubscriberSet::new(self.subscribers, bus.clone());
            tokio::spawn(subscriber_listener(rx, set, token.clone()));
        }
        Scheduler::from_parts(&self.cfg, bus, token)
    }
}

/// Forwards bus events to the subscriber set until shutdown.
async fn subscriber_listener(
    mut rx: broadcast::Receiver<Event>,
    set: SubscriberSet,
    token: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            res = rx.recv() => match res {
                Ok(ev) => set.emit(ev),
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "subscriber listener lagged behind the bus");
                    set.emit(Event::subscriber_overflow("bus", "lagged"));
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
    set.shutdown().await;
}

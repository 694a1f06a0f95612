use std::sync::Arc;

use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::{
    config::Config,
    error::RuntimeError,
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
};
use super::{pool::WorkerPool, scheduler::Scheduler};

/// Builder for constructing a [`Scheduler`] with optional features.
pub struct SchedulerBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    pool: Option<Arc<WorkerPool>>,
}

impl SchedulerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            pool: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (submission, delivery, discards...)
    /// through dedicated workers with bounded queues. Requires a tokio runtime
    /// at [`build`](Self::build) time.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Reuses an existing worker pool instead of spawning a new one.
    pub fn with_pool(mut self, pool: Arc<WorkerPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Builds and returns the Scheduler instance.
    ///
    /// This consumes the builder and initializes all runtime components:
    /// - Event bus for broadcasting
    /// - Worker pool (unless one was provided)
    /// - Subscriber workers and the bus listener feeding them
    pub fn build(self) -> Result<Arc<Scheduler>, RuntimeError> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let token = CancellationToken::new();

        let pool = match self.pool {
            Some(pool) => pool,
            None => Arc::new(WorkerPool::new(&self.cfg)?),
        };

        let set = SubscriberSet::new(self.subscribers, bus.clone());
        let listener = (!set.is_empty()).then(|| subscriber_listener(&bus, set, token.clone()));

        Ok(Arc::new(Scheduler::new_internal(
            self.cfg, pool, bus, token, listener,
        )))
    }
}

/// Forwards bus events to the subscriber set until `token` is cancelled, then
/// flushes what is already buffered and stops the subscriber workers.
fn subscriber_listener(bus: &Bus, set: SubscriberSet, token: CancellationToken) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                ev = rx.recv() => match ev {
                    Ok(ev) => set.emit(Arc::new(ev)),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "subscriber listener lagged behind the bus");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = token.cancelled() => break,
            }
        }
        loop {
            match rx.try_recv() {
                Ok(ev) => set.emit(Arc::new(ev)),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        set.shutdown().await;
    })
}

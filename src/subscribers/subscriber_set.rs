//! # Fan-out of runtime events to subscribers.
//!
//! The scheduler's listener hands every bus event to [`SubscriberSet::emit`] once,
//! already wrapped in an `Arc`. Each subscriber owns a bounded queue drained by its
//! own worker task, so a slow subscriber only loses its own events.
//!
//! ```text
//! listener ── emit(Arc<Event>) ──┬──► queue "log"   ──► worker ──► on_event
//!                                └──► queue "stats" ──► worker ──► on_event
//! ```
//!
//! A full or closed queue drops the event for that subscriber and publishes
//! `SubscriberOverflow`. A panic inside `on_event` publishes `SubscriberPanicked`
//! and the worker moves on to the next event.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::error::panic_message;
use crate::events::{Bus, Event};
use crate::subscribers::Subscribe;

struct Queue {
    name: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
}

/// Subscribers of one scheduler, each behind its own queue and worker.
pub struct SubscriberSet {
    queues: Vec<Queue>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Spawns one worker per subscriber. Needs a tokio runtime unless `subs` is empty.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let (queues, workers) = subs
            .into_iter()
            .map(|sub| {
                let (tx, rx) = mpsc::channel(sub.queue_capacity().max(1));
                let queue = Queue { name: sub.name(), tx };
                (queue, tokio::spawn(drain_queue(sub, rx, bus.clone())))
            })
            .unzip();
        Self {
            queues,
            workers,
            bus,
        }
    }

    /// Returns `true` when no subscriber is registered.
    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    /// Queues `event` for every subscriber without waiting.
    pub fn emit(&self, event: Arc<Event>) {
        for queue in &self.queues {
            let reason = match queue.tx.try_send(Arc::clone(&event)) {
                Ok(()) => continue,
                Err(TrySendError::Full(_)) => "full",
                Err(TrySendError::Closed(_)) => "closed",
            };
            // an overflow report that overflows is not reported again
            if !event.is_subscriber_overflow() {
                self.bus.publish(Event::subscriber_overflow(queue.name, reason));
            }
        }
    }

    /// Closes every queue and waits for the workers to finish what is queued.
    pub async fn shutdown(self) {
        drop(self.queues);
        let workers = self.workers.len();
        for worker in self.workers {
            let _ = worker.await;
        }
        debug!(workers, "subscriber workers stopped");
    }
}

async fn drain_queue(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Event>>, bus: Bus) {
    while let Some(ev) = rx.recv().await {
        let handled = AssertUnwindSafe(sub.on_event(&ev)).catch_unwind().await;
        if let Err(panic) = handled {
            let info = panic_message(&*panic);
            error!(subscriber = sub.name(), panic = %info, "subscriber panicked");
            bus.publish(Event::subscriber_panicked(sub.name(), info));
        }
    }
}

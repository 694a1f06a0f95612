//! # LogWriter: events as `tracing` records
//!
//! A minimal subscriber that writes every [`Event`] through `tracing`, at a level
//! matching its severity. Install any `tracing` subscriber to see the output.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! DEBUG lifetask: submitted task="load-avatar" owner="inbox"
//! INFO  lifetask: deferred task="load-avatar" owner="inbox"
//! WARN  lifetask: discarded task="load-avatar" owner="inbox" reason="owner destroyed while paused"
//! ERROR lifetask: callback panicked task="load-avatar" reason="on_success: boom"
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("-");
        let owner = e.owner.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");

        match e.kind {
            EventKind::TaskSubmitted => debug!(task, owner, "submitted"),
            EventKind::WorkFinished => debug!(task, reason, "work finished"),
            EventKind::TaskDeferred => info!(task, owner, "deferred"),
            EventKind::TaskDelivered => info!(task, owner, reason, "delivered"),
            EventKind::TaskDestroyed => debug!(task, owner, "destroyed"),
            EventKind::TaskDiscarded => warn!(task, owner, reason, "discarded"),
            EventKind::TaskRejected => warn!(task, owner, reason, "rejected"),
            EventKind::CallbackPanicked => error!(task, owner, reason, "callback panicked"),
            EventKind::ShutdownRequested => info!("shutdown requested"),
            EventKind::AllDrainedWithin => info!("all work drained within grace"),
            EventKind::GraceExceeded => warn!(reason, "grace exceeded"),
            EventKind::SubscriberOverflow => warn!(subscriber = task, reason, "subscriber overflow"),
            EventKind::SubscriberPanicked => {
                error!(subscriber = task, reason, "subscriber panicked")
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

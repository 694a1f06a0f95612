//! # Runtime events emitted by the scheduler, task handles and the worker pool.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Task events**: submission, deferral, delivery, discard, destruction
//! - **Shutdown events**: drain outcome
//! - **Subscriber events**: overflow and panics in event subscribers
//!
//! The [`Event`] struct carries metadata such as timestamps, task label, owner label
//! and a human-readable reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Events of one task are published from the owner thread, in the order they happen.
//! `TaskRejected` and the shutdown events come from the caller of the scheduler.
//!
//! ## Example
//! ```rust
//! use lifetask::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TaskDeferred)
//!     .with_task("load-avatar")
//!     .with_owner("inbox");
//!
//! assert_eq!(ev.kind, EventKind::TaskDeferred);
//! assert_eq!(ev.task.as_deref(), Some("load-avatar"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets `task` (subscriber name) and `reason` (panic message).
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets `task` (subscriber name) and `reason`.
    SubscriberOverflow,

    // === Shutdown events ===
    /// Scheduler shutdown started.
    ShutdownRequested,

    /// All drained work finished within the grace period.
    AllDrainedWithin,

    /// Grace period exceeded while draining.
    ///
    /// Sets `reason` (pending count).
    GraceExceeded,

    // === Task events ===
    /// Work was handed to the worker pool.
    ///
    /// Sets `task`, `owner`.
    TaskSubmitted,

    /// `execute` refused to create a task (owner destroyed/detached, pool shut down).
    ///
    /// Sets `task`, `owner`, `reason`.
    TaskRejected,

    /// The outcome of the work function reached the owner thread.
    ///
    /// Sets `task`; `reason` is set on failure.
    WorkFinished,

    /// A result arrived while the owner was paused and was buffered.
    ///
    /// Sets `task`, `owner`.
    TaskDeferred,

    /// Callbacks ran for the task's outcome.
    ///
    /// Sets `task`, `owner`; `reason` is set when the outcome was a failure.
    TaskDelivered,

    /// An outcome was dropped without delivery (owner destroyed).
    ///
    /// Sets `task`, `owner`.
    TaskDiscarded,

    /// The task handle reached its terminal state and released its references.
    ///
    /// Sets `task`, `owner`.
    TaskDestroyed,

    /// A caller-supplied hook or callback panicked; the panic was swallowed.
    ///
    /// Sets `task`, `owner`, `reason` (`"{hook}: {message}"`).
    CallbackPanicked,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Task label, if applicable.
    pub task: Option<Arc<str>>,
    /// Owner lifecycle label, if applicable.
    pub owner: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            owner: None,
            reason: None,
        }
    }

    /// Attaches a task label.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches an owner label.
    #[inline]
    pub fn with_owner(mut self, owner: impl Into<Arc<str>>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::TaskSubmitted);
        let b = Event::new(EventKind::TaskDelivered);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_overflow_helper() {
        let ev = Event::subscriber_overflow("audit", "full");
        assert!(ev.is_subscriber_overflow());
        assert_eq!(ev.task.as_deref(), Some("audit"));
        assert_eq!(ev.reason.as_deref(), Some("subscriber=audit reason=full"));
    }
}

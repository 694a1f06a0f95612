//! # Subscribe: observing what happens to tasks.
//!
//! A subscriber sees every runtime event a scheduler publishes: submissions,
//! deliveries, deferrals, discards and shutdown progress. It runs on the tokio
//! runtime, never on an owner thread, so it cannot touch owner state.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! use async_trait::async_trait;
//! use lifetask::{Event, EventKind, Subscribe};
//!
//! /// Counts results thrown away because their owner went away.
//! #[derive(Default)]
//! struct DroppedResults(AtomicUsize);
//!
//! #[async_trait]
//! impl Subscribe for DroppedResults {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::TaskDiscarded {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "dropped-results"
//!     }
//!
//!     fn queue_capacity(&self) -> usize {
//!         64
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Receives scheduler events through its own bounded queue.
///
/// A slow `on_event` only fills this subscriber's queue; overflowing events are
/// dropped for it and reported as `SubscriberOverflow`. A panic is caught and
/// reported as `SubscriberPanicked`.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event. Events arrive in publish order.
    async fn on_event(&self, event: &Event);

    /// Name carried by this subscriber's overflow and panic events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Queue length before events are dropped (at least 1).
    fn queue_capacity(&self) -> usize {
        1024
    }
}

//! # Owner lifecycle: events, observers, the lifecycle source and the owner thread.
//!
//! - [`LifecycleEvent`] / [`LifecycleState`] - the six transitions and the states they lead to
//! - [`LifecycleObserver`] - receives transitions, one method per event
//! - [`Lifecycle`] - lifecycle source of one owner; dispatches to observers
//! - [`OwnerThread`] - the single-threaded context deliveries run on

mod event;
#[allow(clippy::module_inception)]
mod lifecycle;
mod observer;
mod owner;

pub use event::{LifecycleEvent, LifecycleState};
pub use lifecycle::{Lifecycle, ObserverId};
pub use observer::LifecycleObserver;
pub use owner::OwnerThread;

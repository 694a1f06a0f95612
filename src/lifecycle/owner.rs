//! # Owner thread: the single-threaded context results are delivered on.
//!
//! [`OwnerThread`] wraps a [`tokio::task::LocalSet`]. Lifecycle events and task
//! deliveries run on whichever thread drives it via [`OwnerThread::run_until`].
//!
//! ## Rules
//! - Continuations posted from `execute` run only while the owner thread is driven.
//! - Lifecycles created from an owner thread hold a weak reference back to it;
//!   once the owner thread is dropped they are detached and reject new work.
//! - Dropping the owner thread drops every pending continuation (results are lost).

use std::future::Future;
use std::rc::Rc;
use std::sync::Arc;

use tokio::task::LocalSet;

use super::Lifecycle;

/// Single-threaded dispatcher for lifecycle events and result delivery.
pub struct OwnerThread {
    label: Arc<str>,
    local: LocalSet,
}

impl OwnerThread {
    /// Creates a new owner thread context.
    pub fn new(label: impl Into<Arc<str>>) -> Rc<Self> {
        Rc::new(Self {
            label: label.into(),
            local: LocalSet::new(),
        })
    }

    /// Diagnostic label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Creates a lifecycle bound to this owner thread, in state `Initialized`.
    pub fn lifecycle(self: &Rc<Self>, label: impl Into<Arc<str>>) -> Rc<Lifecycle> {
        Rc::new(Lifecycle::new(label.into(), Rc::downgrade(self)))
    }

    /// Drives the owner thread until `fut` completes.
    ///
    /// Posted continuations make progress only while this is running.
    pub async fn run_until<F: Future>(&self, fut: F) -> F::Output {
        self.local.run_until(fut).await
    }

    /// Queues a continuation on the owner thread.
    pub(crate) fn post<F>(&self, fut: F)
    where
        F: Future<Output = ()> + 'static,
    {
        drop(self.local.spawn_local(fut));
    }
}

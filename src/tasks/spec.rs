//! # Task definition.
//!
//! [`TaskSpec`] bundles what [`Scheduler::execute`](crate::Scheduler::execute) needs
//! for one invocation:
//! - a diagnostic label,
//! - the work function, which runs on a worker thread and must be `Send`,
//! - the owner-thread [`Callbacks`].
//!
//! The work function receives the context passed to `execute` by value. It must not
//! touch owner-thread state; anything it needs travels in the context.

use std::sync::Arc;

use crate::error::TaskError;
use crate::tasks::callbacks::{CallbackFn, Callbacks};

/// Boxed work function: `(context) -> value`, may fail.
pub(crate) type WorkFn<C, T> = Box<dyn FnOnce(C) -> Result<T, TaskError> + Send>;

/// One unit of background work plus its owner-thread callbacks.
pub struct TaskSpec<C, T> {
    label: Arc<str>,
    work: WorkFn<C, T>,
    callbacks: Box<dyn Callbacks<T>>,
}

impl<C, T> TaskSpec<C, T>
where
    C: Send + 'static,
    T: Send + 'static,
{
    /// Creates a spec from a work function and a [`Callbacks`] implementation.
    pub fn new<W, B>(label: impl Into<Arc<str>>, work: W, callbacks: B) -> Self
    where
        W: FnOnce(C) -> Result<T, TaskError> + Send + 'static,
        B: Callbacks<T>,
    {
        Self {
            label: label.into(),
            work: Box::new(work),
            callbacks: Box::new(callbacks),
        }
    }

    /// Creates a spec from a work function and success/failure closures.
    pub fn from_fns<W, S, F>(label: impl Into<Arc<str>>, work: W, on_success: S, on_failure: F) -> Self
    where
        W: FnOnce(C) -> Result<T, TaskError> + Send + 'static,
        S: FnOnce(T) + 'static,
        F: FnOnce(TaskError) + 'static,
    {
        Self::new(label, work, CallbackFn::new(on_success, on_failure))
    }

    pub(crate) fn into_parts(self) -> (Arc<str>, WorkFn<C, T>, Box<dyn Callbacks<T>>) {
        (self.label, self.work, self.callbacks)
    }
}

impl<C, T> std::fmt::Debug for TaskSpec<C, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskSpec").field("label", &self.label).finish_non_exhaustive()
    }
}

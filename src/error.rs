//! Error types used by the lifetask scheduler and by background work.
//!
//! This module defines two main error enums:
//!
//! - [`RuntimeError`] - errors raised by the scheduler or worker pool itself
//!   (misuse of an owner, pool shutdown, drain timeout).
//! - [`TaskError`] - failures of a single unit of work. These never surface as
//!   panics on the owner thread: they travel inside
//!   [`Outcome::Failure`](crate::Outcome::Failure) and reach the failure callback.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logs and events.

use std::fmt::Display;
use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the lifetask runtime.
///
/// All of them are recoverable: a rejected `execute` creates no task and fires
/// no callback, the caller simply receives the error.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The owner lifecycle already reached `Destroyed`; nothing can be attached to it.
    #[error("owner {owner:?} is destroyed")]
    OwnerDestroyed {
        /// Label of the rejected owner.
        owner: String,
    },

    /// The owner thread backing the lifecycle is gone.
    #[error("owner {owner:?} is detached from its owner thread")]
    OwnerDetached {
        /// Label of the rejected owner.
        owner: String,
    },

    /// The worker pool was shut down and accepts no more work.
    #[error("worker pool is shut down")]
    PoolShutdown,

    /// A worker thread could not be spawned while building the pool.
    #[error("failed to spawn worker thread: {error}")]
    WorkerSpawn {
        /// The underlying OS error message.
        error: String,
    },

    /// Drain did not finish within the configured grace period.
    #[error("drain timeout {grace:?} exceeded; {pending} work item(s) still pending")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Queued and running work items left when the grace expired.
        pending: usize,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/events.
    ///
    /// # Example
    /// ```
    /// use lifetask::RuntimeError;
    ///
    /// let err = RuntimeError::OwnerDestroyed { owner: "inbox".into() };
    /// assert_eq!(err.as_label(), "runtime_owner_destroyed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::OwnerDestroyed { .. } => "runtime_owner_destroyed",
            RuntimeError::OwnerDetached { .. } => "runtime_owner_detached",
            RuntimeError::PoolShutdown => "runtime_pool_shutdown",
            RuntimeError::WorkerSpawn { .. } => "runtime_worker_spawn",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::OwnerDestroyed { owner } => format!("owner destroyed: {owner}"),
            RuntimeError::OwnerDetached { owner } => format!("owner detached: {owner}"),
            RuntimeError::PoolShutdown => "pool shut down".to_string(),
            RuntimeError::WorkerSpawn { error } => format!("worker spawn: {error}"),
            RuntimeError::GraceExceeded { grace, pending } => {
                format!("grace exceeded after {grace:?}; pending={pending}")
            }
        }
    }
}

/// # Failures of a single unit of background work.
///
/// Produced on a worker thread and delivered to the failure callback on the owner thread.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The work function returned an error.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The work function panicked; the worker caught it and kept running.
    #[error("work panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// The pool was shut down in abandon mode before the work ran.
    #[error("abandoned by pool shutdown")]
    Abandoned,
}

impl TaskError {
    /// Builds a [`TaskError::Fail`] from any displayable error.
    ///
    /// # Example
    /// ```
    /// use lifetask::TaskError;
    ///
    /// let err = TaskError::fail("no such contact");
    /// assert_eq!(err.as_message(), "error: no such contact");
    /// ```
    pub fn fail(error: impl Display) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/events.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Panicked { .. } => "task_panicked",
            TaskError::Abandoned => "task_abandoned",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Panicked { info } => format!("panic: {info}"),
            TaskError::Abandoned => "abandoned".to_string(),
        }
    }
}

/// Renders a caught panic payload as text.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

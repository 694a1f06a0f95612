//! # Ticket: caller-side view of one `execute`.
//!
//! A [`Ticket`] lets the caller observe a task without keeping it alive: it holds a
//! weak reference, so a handle released after delivery or destroy reports
//! [`TaskState::Destroyed`].

use std::rc::Weak;
use std::sync::Arc;

use crate::core::bridge::Transitions;
use crate::core::handle::TaskState;

/// Weak, owner-thread-only view of a submitted task.
#[derive(Clone)]
pub struct Ticket {
    label: Arc<str>,
    handle: Weak<dyn Transitions>,
}

impl Ticket {
    pub(crate) fn new(label: Arc<str>, handle: Weak<dyn Transitions>) -> Self {
        Self { label, handle }
    }

    /// Diagnostic label of the task.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Current state; `Destroyed` once the handle is gone.
    pub fn state(&self) -> TaskState {
        self.handle
            .upgrade()
            .map_or(TaskState::Destroyed, |h| h.state())
    }

    /// Returns `true` once the task reached its terminal state.
    pub fn is_finished(&self) -> bool {
        self.state() == TaskState::Destroyed
    }
}

impl std::fmt::Debug for Ticket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ticket")
            .field("label", &self.label)
            .field("state", &self.state())
            .finish()
    }
}

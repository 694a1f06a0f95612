//! # LifecycleBridge: owner lifecycle events to task transitions.
//!
//! One bridge is registered per task handle. It forwards the three events a
//! handle cares about and ignores the rest.
//!
//! | lifecycle event | forwarded as        |
//! |-----------------|---------------------|
//! | Resume          | `owner_resumed()`   |
//! | Pause           | `owner_paused()`    |
//! | Destroy         | `owner_destroyed()` |
//! | Create/Start/Stop | logged only       |
//!
//! Nothing is forwarded after the first `Destroy`, even if the lifecycle
//! misbehaves and repeats it.

use std::cell::Cell;
use std::rc::Rc;

use tracing::trace;

use crate::core::handle::TaskState;
use crate::lifecycle::LifecycleObserver;

/// Transition surface of a task handle, independent of its result type.
pub(crate) trait Transitions {
    fn label(&self) -> &str;
    fn state(&self) -> TaskState;
    fn owner_resumed(&self);
    fn owner_paused(&self);
    fn owner_destroyed(&self);
}

pub(crate) struct LifecycleBridge {
    target: Rc<dyn Transitions>,
    destroyed: Cell<bool>,
}

impl LifecycleBridge {
    pub(crate) fn new(target: Rc<dyn Transitions>) -> Self {
        Self {
            target,
            destroyed: Cell::new(false),
        }
    }
}

impl LifecycleObserver for LifecycleBridge {
    fn on_create(&self) {
        trace!(task = self.target.label(), "owner created");
    }

    fn on_start(&self) {
        trace!(task = self.target.label(), "owner started");
    }

    fn on_resume(&self) {
        if !self.destroyed.get() {
            self.target.owner_resumed();
        }
    }

    fn on_pause(&self) {
        if !self.destroyed.get() {
            self.target.owner_paused();
        }
    }

    fn on_stop(&self) {
        trace!(task = self.target.label(), "owner stopped");
    }

    fn on_destroy(&self) {
        if !self.destroyed.replace(true) {
            self.target.owner_destroyed();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Probe {
        calls: RefCell<Vec<&'static str>>,
    }

    impl Transitions for Probe {
        fn label(&self) -> &str {
            "probe"
        }
        fn state(&self) -> TaskState {
            TaskState::Active
        }
        fn owner_resumed(&self) {
            self.calls.borrow_mut().push("resumed");
        }
        fn owner_paused(&self) {
            self.calls.borrow_mut().push("paused");
        }
        fn owner_destroyed(&self) {
            self.calls.borrow_mut().push("destroyed");
        }
    }

    #[test]
    fn test_forwards_only_relevant_events() {
        let probe = Rc::new(Probe::default());
        let bridge = LifecycleBridge::new(probe.clone());

        bridge.on_create();
        bridge.on_start();
        bridge.on_resume();
        bridge.on_pause();
        bridge.on_stop();
        bridge.on_destroy();

        assert_eq!(*probe.calls.borrow(), vec!["resumed", "paused", "destroyed"]);
    }

    #[test]
    fn test_nothing_after_destroy() {
        let probe = Rc::new(Probe::default());
        let bridge = LifecycleBridge::new(probe.clone());

        bridge.on_destroy();
        bridge.on_destroy();
        bridge.on_resume();
        bridge.on_pause();

        assert_eq!(*probe.calls.borrow(), vec!["destroyed"]);
    }
}

//! # Lifecycle source of one owner.
//!
//! [`Lifecycle`] records the owner's current [`LifecycleState`] and dispatches every
//! [`LifecycleEvent`] to its registered observers.
//!
//! ## Rules
//! - Dispatch is synchronous and in registration order, on the owner thread.
//! - Dispatch iterates over a snapshot: observers may (un)register during dispatch;
//!   an observer removed mid-dispatch does not receive the rest of that event.
//! - `add_observer` replays the upward events needed to reach the current state
//!   (`Create`, `Start`, `Resume`), never `Pause`/`Stop`.
//! - `remove_observer` is idempotent.
//! - After `Destroy`, further events are ignored.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::Arc;

use tracing::debug;

use super::{LifecycleEvent, LifecycleObserver, LifecycleState, OwnerThread};

/// Identifier of a registered observer, used to unregister it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Lifecycle source of one owner (a screen, a fragment, a service...).
pub struct Lifecycle {
    label: Arc<str>,
    thread: Weak<OwnerThread>,
    state: Cell<LifecycleState>,
    next_id: Cell<u64>,
    observers: RefCell<Vec<(ObserverId, Rc<dyn LifecycleObserver>)>>,
}

impl Lifecycle {
    pub(crate) fn new(label: Arc<str>, thread: Weak<OwnerThread>) -> Self {
        Self {
            label,
            thread,
            state: Cell::new(LifecycleState::Initialized),
            next_id: Cell::new(0),
            observers: RefCell::new(Vec::new()),
        }
    }

    /// Diagnostic label.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn label_arc(&self) -> Arc<str> {
        Arc::clone(&self.label)
    }

    /// Current state.
    pub fn state(&self) -> LifecycleState {
        self.state.get()
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.observers.borrow().len()
    }

    /// The owner thread this lifecycle delivers on, if it is still alive.
    pub(crate) fn owner_thread(&self) -> Option<Rc<OwnerThread>> {
        self.thread.upgrade()
    }

    /// Registers an observer and brings it up to the current state.
    pub fn add_observer(&self, observer: Rc<dyn LifecycleObserver>) -> ObserverId {
        let id = ObserverId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.observers
            .borrow_mut()
            .push((id, Rc::clone(&observer)));

        for ev in LifecycleEvent::catch_up(self.state.get()) {
            if !self.contains(id) {
                break;
            }
            ev.dispatch(observer.as_ref());
        }
        id
    }

    /// Unregisters an observer. Returns `false` if it was not registered.
    pub fn remove_observer(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.borrow_mut();
        let before = observers.len();
        observers.retain(|(oid, _)| *oid != id);
        observers.len() != before
    }

    /// Moves the owner to the state following `event` and notifies observers.
    pub fn handle_event(&self, event: LifecycleEvent) {
        if self.state.get() == LifecycleState::Destroyed {
            debug!(owner = %self.label, %event, "ignoring lifecycle event after destroy");
            return;
        }
        self.state.set(event.target_state());
        debug!(owner = %self.label, %event, "lifecycle event");

        let snapshot: Vec<(ObserverId, Rc<dyn LifecycleObserver>)> =
            self.observers.borrow().clone();
        for (id, observer) in snapshot {
            if self.contains(id) {
                event.dispatch(observer.as_ref());
            }
        }
    }

    fn contains(&self, id: ObserverId) -> bool {
        self.observers.borrow().iter().any(|(oid, _)| *oid == id)
    }
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("label", &self.label)
            .field("state", &self.state.get())
            .field("observers", &self.observer_count())
            .finish()
    }
}

//! # TaskHandle: per-invocation delivery state machine.
//!
//! Binds one work submission to one owner lifecycle and decides, on the owner thread,
//! whether an arriving outcome is delivered, buffered or discarded.
//!
//! ## Transitions
//! ```text
//!                 paused                      resumed (deliver buffered, if any)
//!   ┌────────┐ ───────────► ┌──────────────────┐ ───────────► ┌────────┐
//!   │ Active │              │ Paused{pending}  │              │ Active │
//!   └───┬────┘ ◄─────────── └────────┬─────────┘              └────────┘
//!       │        resumed             │
//!       │ result: deliver            │ result: pending = Some(outcome)
//!       │ destroyed                  │ destroyed: pending discarded
//!       ▼                            ▼
//!   ┌───────────────────────────────────┐
//!   │ Destroyed (terminal, inert)       │  results arriving here are discarded
//!   └───────────────────────────────────┘
//! ```
//!
//! ## Rules
//! - All methods run on the owner thread; the state lives in a `RefCell`.
//! - The buffered outcome exists only inside `Paused`, so "buffered" and
//!   "active" cannot coexist.
//! - No `RefCell` borrow is held while user callbacks run: callbacks may fire
//!   lifecycle events that re-enter the handle.
//! - Entering `Destroyed` unregisters from the lifecycle, clears the owner id and
//!   drops the callbacks (and everything they captured). It happens at most once.
//! - If `before_delivery` destroys the owner, the outcome is discarded instead of
//!   reaching `on_success`/`on_failure`. `after_delivery` still runs as cleanup.

use std::cell::RefCell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::{Rc, Weak};
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::core::bridge::Transitions;
use crate::error::panic_message;
use crate::events::{Bus, Event, EventKind};
use crate::lifecycle::{Lifecycle, ObserverId};
use crate::tasks::{Callbacks, Outcome};

/// Observable state of a task handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    Active,
    Paused,
    Destroyed,
}

enum Phase<T> {
    Active,
    Paused { pending: Option<Outcome<T>> },
    Destroyed,
}

/// Identifier of the owner: where to unregister from, never keeps the owner alive.
struct OwnerRef {
    lifecycle: Weak<Lifecycle>,
    observer: ObserverId,
}

struct Inner<T> {
    phase: Phase<T>,
    owner: Option<OwnerRef>,
    callbacks: Option<Box<dyn Callbacks<T>>>,
}

pub(crate) struct TaskHandle<T> {
    label: Arc<str>,
    owner_label: Arc<str>,
    bus: Bus,
    inner: RefCell<Inner<T>>,
}

enum Arrival<T> {
    Deliver(Outcome<T>),
    Deferred,
    Discard(Outcome<T>, &'static str),
}

impl<T: 'static> TaskHandle<T> {
    pub(crate) fn new(
        label: Arc<str>,
        owner_label: Arc<str>,
        bus: Bus,
        callbacks: Box<dyn Callbacks<T>>,
    ) -> Rc<Self> {
        Rc::new(Self {
            label,
            owner_label,
            bus,
            inner: RefCell::new(Inner {
                phase: Phase::Active,
                owner: None,
                callbacks: Some(callbacks),
            }),
        })
    }

    /// Records where the handle is registered.
    pub(crate) fn attach(&self, lifecycle: &Rc<Lifecycle>, observer: ObserverId) {
        let mut inner = self.inner.borrow_mut();
        if matches!(inner.phase, Phase::Destroyed) {
            drop(inner);
            lifecycle.remove_observer(observer);
            return;
        }
        inner.owner = Some(OwnerRef {
            lifecycle: Rc::downgrade(lifecycle),
            observer,
        });
    }

    pub(crate) fn task_state(&self) -> TaskState {
        match self.inner.borrow().phase {
            Phase::Active => TaskState::Active,
            Phase::Paused { .. } => TaskState::Paused,
            Phase::Destroyed => TaskState::Destroyed,
        }
    }

    /// Runs the pre-execute hook on the calling thread.
    pub(crate) fn run_pre_execute(&self) {
        let Some(mut callbacks) = self.inner.borrow_mut().callbacks.take() else {
            return;
        };
        self.guard("on_pre_execute", || callbacks.on_pre_execute());

        let mut inner = self.inner.borrow_mut();
        if matches!(inner.phase, Phase::Destroyed) {
            drop(inner);
            drop(callbacks);
        } else {
            inner.callbacks = Some(callbacks);
        }
    }

    /// The work outcome reached the owner thread.
    pub(crate) fn on_result(&self, outcome: Outcome<T>) {
        let arrival = {
            let mut inner = self.inner.borrow_mut();
            match &mut inner.phase {
                Phase::Active => Arrival::Deliver(outcome),
                Phase::Paused { pending } => match pending {
                    None => {
                        *pending = Some(outcome);
                        Arrival::Deferred
                    }
                    Some(_) => Arrival::Discard(outcome, "second result for one handle"),
                },
                Phase::Destroyed => Arrival::Discard(outcome, "owner destroyed before result"),
            }
        };

        match arrival {
            Arrival::Deliver(outcome) => self.deliver(outcome),
            Arrival::Deferred => {
                debug!(task = %self.label, owner = %self.owner_label, "deferring delivery");
                self.publish(Event::new(EventKind::TaskDeferred));
            }
            Arrival::Discard(outcome, reason) => self.discard(outcome, reason),
        }
    }

    /// Enters `Destroyed` and releases everything. Idempotent.
    pub(crate) fn destroy(&self) {
        let (owner, callbacks) = {
            let mut inner = self.inner.borrow_mut();
            if matches!(inner.phase, Phase::Destroyed) {
                return;
            }
            inner.phase = Phase::Destroyed;
            (inner.owner.take(), inner.callbacks.take())
        };
        drop(callbacks);

        if let Some(owner) = owner {
            if let Some(lifecycle) = owner.lifecycle.upgrade() {
                lifecycle.remove_observer(owner.observer);
            }
        }
        debug!(task = %self.label, owner = %self.owner_label, "task destroyed");
        self.publish(Event::new(EventKind::TaskDestroyed));
    }

    fn deliver(&self, outcome: Outcome<T>) {
        let callbacks = self.inner.borrow_mut().callbacks.take();
        let Some(mut callbacks) = callbacks else {
            self.destroy();
            return;
        };
        debug!(task = %self.label, owner = %self.owner_label, "delivering");

        let failure = outcome.error().map(|e| e.as_message());
        self.guard("before_delivery", || callbacks.before_delivery());

        // before_delivery may have destroyed the owner
        if self.task_state() == TaskState::Destroyed {
            self.discard(outcome, "owner destroyed during delivery");
            self.guard("after_delivery", || callbacks.after_delivery());
            return;
        }
        match outcome {
            Outcome::Success(value) => self.guard("on_success", || callbacks.on_success(value)),
            Outcome::Failure(error) => self.guard("on_failure", || callbacks.on_failure(error)),
        }
        self.guard("after_delivery", || callbacks.after_delivery());
        drop(callbacks);

        let mut ev = Event::new(EventKind::TaskDelivered);
        if let Some(msg) = failure {
            ev = ev.with_reason(msg);
        }
        self.publish(ev);
        self.destroy();
    }

    fn discard(&self, outcome: Outcome<T>, reason: &'static str) {
        debug!(task = %self.label, owner = %self.owner_label, reason, "discarding outcome");
        drop(outcome);
        self.publish(Event::new(EventKind::TaskDiscarded).with_reason(reason));
    }

    /// Runs one user hook, swallowing its panic.
    fn guard(&self, hook: &'static str, f: impl FnOnce()) {
        if let Err(panic) = catch_unwind(AssertUnwindSafe(f)) {
            let msg = panic_message(&*panic);
            error!(task = %self.label, owner = %self.owner_label, hook, panic = %msg, "callback panicked");
            self.publish(Event::new(EventKind::CallbackPanicked).with_reason(format!("{hook}: {msg}")));
        }
    }

    fn publish(&self, ev: Event) {
        self.bus.publish(
            ev.with_task(Arc::clone(&self.label))
                .with_owner(Arc::clone(&self.owner_label)),
        );
    }
}

impl<T: 'static> Transitions for TaskHandle<T> {
    fn label(&self) -> &str {
        &self.label
    }

    fn state(&self) -> TaskState {
        self.task_state()
    }

    fn owner_resumed(&self) {
        let pending = {
            let mut inner = self.inner.borrow_mut();
            let pending = match &mut inner.phase {
                Phase::Paused { pending } => pending.take(),
                Phase::Active | Phase::Destroyed => return,
            };
            inner.phase = Phase::Active;
            pending
        };
        if let Some(outcome) = pending {
            debug!(task = %self.label, owner = %self.owner_label, "deferred delivery on resume");
            self.deliver(outcome);
        }
    }

    fn owner_paused(&self) {
        let mut inner = self.inner.borrow_mut();
        if matches!(inner.phase, Phase::Active) {
            inner.phase = Phase::Paused { pending: None };
        }
    }

    fn owner_destroyed(&self) {
        let discarded = match &mut self.inner.borrow_mut().phase {
            Phase::Destroyed => return,
            Phase::Paused { pending } => pending.take(),
            Phase::Active => None,
        };
        if let Some(outcome) = discarded {
            warn!(task = %self.label, owner = %self.owner_label, "owner destroyed with a buffered result");
            self.discard(outcome, "owner destroyed while paused");
        }
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;
    use crate::lifecycle::{LifecycleEvent, OwnerThread};
    use crate::tasks::CallbackFn;
    use std::cell::Cell;

    type Log = Rc<RefCell<Vec<String>>>;

    fn recording(log: &Log) -> Box<dyn Callbacks<u32>> {
        let (a, b, c, d) = (log.clone(), log.clone(), log.clone(), log.clone());
        Box::new(
            CallbackFn::new(
                move |v: u32| a.borrow_mut().push(format!("success {v}")),
                move |e: TaskError| b.borrow_mut().push(format!("failure {}", e.as_message())),
            )
            .with_before_delivery(move || c.borrow_mut().push("before".into()))
            .with_after_delivery(move || d.borrow_mut().push("after".into())),
        )
    }

    fn handle(log: &Log) -> Rc<TaskHandle<u32>> {
        TaskHandle::new("t".into(), "owner".into(), Bus::new(16), recording(log))
    }

    #[test]
    fn test_active_result_delivers_then_destroys() {
        let log = Log::default();
        let h = handle(&log);
        h.on_result(Outcome::Success(42));
        assert_eq!(*log.borrow(), vec!["before", "success 42", "after"]);
        assert_eq!(h.task_state(), TaskState::Destroyed);
    }

    #[test]
    fn test_paused_result_waits_for_resume() {
        let log = Log::default();
        let h = handle(&log);
        h.owner_paused();
        h.on_result(Outcome::Success(7));
        assert!(log.borrow().is_empty());
        assert_eq!(h.task_state(), TaskState::Paused);

        h.owner_paused();
        assert!(log.borrow().is_empty());

        h.owner_resumed();
        assert_eq!(*log.borrow(), vec!["before", "success 7", "after"]);
        assert_eq!(h.task_state(), TaskState::Destroyed);
    }

    #[test]
    fn test_destroy_while_paused_discards() {
        let log = Log::default();
        let h = handle(&log);
        h.owner_paused();
        h.on_result(Outcome::Success(7));
        h.owner_destroyed();
        h.owner_resumed();
        assert!(log.borrow().is_empty());
        assert_eq!(h.task_state(), TaskState::Destroyed);
    }

    #[test]
    fn test_result_after_destroy_is_discarded() {
        let log = Log::default();
        let h = handle(&log);
        h.owner_destroyed();
        h.owner_destroyed();
        h.on_result(Outcome::Failure(TaskError::fail("late")));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_resume_without_pending_stays_active() {
        let log = Log::default();
        let h = handle(&log);
        h.owner_paused();
        h.owner_resumed();
        assert_eq!(h.task_state(), TaskState::Active);
        h.on_result(Outcome::Failure(TaskError::fail("e")));
        assert_eq!(*log.borrow(), vec!["before", "failure error: e", "after"]);
    }

    #[test]
    fn test_panicking_callback_is_contained() {
        let after = Rc::new(Cell::new(false));
        let a = after.clone();
        let cb = CallbackFn::new(|_v: u32| panic!("ui gone"), |_e| {})
            .with_after_delivery(move || a.set(true));
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let h = TaskHandle::new("t".into(), "owner".into(), bus, Box::new(cb));

        h.on_result(Outcome::Success(1));
        assert!(after.get());
        assert_eq!(h.task_state(), TaskState::Destroyed);

        let kinds: Vec<EventKind> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|ev| ev.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::CallbackPanicked,
                EventKind::TaskDelivered,
                EventKind::TaskDestroyed
            ]
        );
    }

    #[test]
    fn test_owner_destroyed_by_before_delivery_discards_result() {
        let thread = OwnerThread::new("main");
        let lc = thread.lifecycle("screen");
        let log = Log::default();
        let (ok, after) = (log.clone(), log.clone());
        let closing = Rc::clone(&lc);
        let cb = CallbackFn::new(
            move |v: u32| ok.borrow_mut().push(format!("success {v}")),
            |_e| {},
        )
        .with_before_delivery(move || closing.handle_event(LifecycleEvent::Destroy))
        .with_after_delivery(move || after.borrow_mut().push("after".into()));

        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let h = TaskHandle::new("t".into(), "owner".into(), bus, Box::new(cb));
        let id = lc.add_observer(Rc::new(crate::core::bridge::LifecycleBridge::new(
            h.clone(),
        )));
        h.attach(&lc, id);

        h.on_result(Outcome::Success(42));
        assert_eq!(*log.borrow(), vec!["after"]);
        assert_eq!(h.task_state(), TaskState::Destroyed);
        assert_eq!(lc.observer_count(), 0);

        let events: Vec<Event> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        let kinds: Vec<EventKind> = events.iter().map(|ev| ev.kind).collect();
        assert_eq!(kinds, vec![EventKind::TaskDestroyed, EventKind::TaskDiscarded]);
        assert_eq!(
            events[1].reason.as_deref(),
            Some("owner destroyed during delivery")
        );
    }

    #[test]
    fn test_destroy_unregisters_and_releases_callbacks() {
        let thread = OwnerThread::new("main");
        let lc = thread.lifecycle("screen");
        let h = handle(&Log::default());
        let id = lc.add_observer(Rc::new(crate::core::bridge::LifecycleBridge::new(
            h.clone(),
        )));
        h.attach(&lc, id);
        assert_eq!(lc.observer_count(), 1);

        lc.handle_event(LifecycleEvent::Destroy);
        assert_eq!(lc.observer_count(), 0);
        assert!(h.inner.borrow().callbacks.is_none());
        assert!(h.inner.borrow().owner.is_none());
    }
}

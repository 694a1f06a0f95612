//! # Owner-thread callbacks of a task.
//!
//! [`Callbacks`] is the owner side of a task: everything here runs on the owner thread,
//! so implementations may hold `!Send` state (`Rc`, `RefCell`, UI handles).
//!
//! ## Order
//! ```text
//! execute() ──► on_pre_execute()            (calling thread, before submission)
//!     ...work runs on a worker...
//! delivery  ──► before_delivery()
//!           ──► on_success(value) | on_failure(error)
//!           ──► after_delivery()           (always, even if a callback panicked)
//! ```
//!
//! Panics raised by any callback are caught, logged and published as
//! `EventKind::CallbackPanicked`; they never reach the caller.

use crate::error::TaskError;

/// Owner-thread hooks of one task. `on_failure` is the only required method.
///
/// # Example
/// ```
/// use lifetask::{Callbacks, TaskError};
///
/// struct Avatar { shown: Option<Vec<u8>> }
///
/// impl Callbacks<Vec<u8>> for Avatar {
///     fn on_success(&mut self, bytes: Vec<u8>) {
///         self.shown = Some(bytes);
///     }
///
///     fn on_failure(&mut self, error: TaskError) {
///         eprintln!("avatar: {error}");
///     }
/// }
/// ```
pub trait Callbacks<T>: 'static {
    /// Runs synchronously inside `execute`, before the work is submitted.
    fn on_pre_execute(&mut self) {}

    /// Runs first during delivery.
    fn before_delivery(&mut self) {}

    /// Receives the value of a successful work function.
    fn on_success(&mut self, _value: T) {}

    /// Receives the failure of the work function.
    fn on_failure(&mut self, error: TaskError);

    /// Runs last during delivery, regardless of success or failure.
    fn after_delivery(&mut self) {}
}

type Hook = Box<dyn FnOnce()>;

/// Closure-backed [`Callbacks`].
///
/// ## Example
/// ```
/// use lifetask::{CallbackFn, TaskError};
///
/// let cb = CallbackFn::new(
///     |n: u32| println!("got {n}"),
///     |e: TaskError| eprintln!("failed: {e}"),
/// )
/// .with_after_delivery(|| println!("done"));
/// # drop(cb);
/// ```
pub struct CallbackFn<T> {
    pre_execute: Option<Hook>,
    before_delivery: Option<Hook>,
    on_success: Option<Box<dyn FnOnce(T)>>,
    on_failure: Option<Box<dyn FnOnce(TaskError)>>,
    after_delivery: Option<Hook>,
}

impl<T: 'static> CallbackFn<T> {
    /// Creates callbacks from a success and a failure handler.
    pub fn new(on_success: impl FnOnce(T) + 'static, on_failure: impl FnOnce(TaskError) + 'static) -> Self {
        Self {
            pre_execute: None,
            before_delivery: None,
            on_success: Some(Box::new(on_success)),
            on_failure: Some(Box::new(on_failure)),
            after_delivery: None,
        }
    }

    /// Creates callbacks that ignore the success value.
    pub fn failure_only(on_failure: impl FnOnce(TaskError) + 'static) -> Self {
        Self {
            pre_execute: None,
            before_delivery: None,
            on_success: None,
            on_failure: Some(Box::new(on_failure)),
            after_delivery: None,
        }
    }

    /// Sets the pre-execute hook.
    pub fn with_pre_execute(mut self, f: impl FnOnce() + 'static) -> Self {
        self.pre_execute = Some(Box::new(f));
        self
    }

    /// Sets the hook that runs before the success/failure callback.
    pub fn with_before_delivery(mut self, f: impl FnOnce() + 'static) -> Self {
        self.before_delivery = Some(Box::new(f));
        self
    }

    /// Sets the hook that runs after the success/failure callback.
    pub fn with_after_delivery(mut self, f: impl FnOnce() + 'static) -> Self {
        self.after_delivery = Some(Box::new(f));
        self
    }
}

impl<T: 'static> Callbacks<T> for CallbackFn<T> {
    fn on_pre_execute(&mut self) {
        if let Some(f) = self.pre_execute.take() {
            f();
        }
    }

    fn before_delivery(&mut self) {
        if let Some(f) = self.before_delivery.take() {
            f();
        }
    }

    fn on_success(&mut self, value: T) {
        if let Some(f) = self.on_success.take() {
            f(value);
        }
    }

    fn on_failure(&mut self, error: TaskError) {
        if let Some(f) = self.on_failure.take() {
            f(error);
        }
    }

    fn after_delivery(&mut self) {
        if let Some(f) = self.after_delivery.take() {
            f();
        }
    }
}

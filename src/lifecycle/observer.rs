//! # Lifecycle observer trait.
//!
//! Observers are registered on a [`Lifecycle`](super::Lifecycle) and called
//! synchronously, in registration order, on the owner thread. Methods take `&self`:
//! observers are shared (`Rc`) and keep their own state in `Cell`/`RefCell`.

/// Receives owner lifecycle transitions. Every method defaults to a no-op.
pub trait LifecycleObserver {
    fn on_create(&self) {}

    fn on_start(&self) {}

    fn on_resume(&self) {}

    fn on_pause(&self) {}

    fn on_stop(&self) {}

    fn on_destroy(&self) {}
}

//! # lifetask
//!
//! **Lifetask** runs blocking work on a background thread pool and delivers each
//! result to owner-thread callbacks, scoped to the owner's lifecycle.
//!
//! An owner is anything with a create/start/resume/pause/stop/destroy lifecycle
//! (a screen, a view, a session). Results never reach an owner that is paused or
//! gone: a result arriving while the owner is paused waits for the next resume, and a
//! result arriving after destroy is dropped together with the callbacks.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  owner thread (OwnerThread / LocalSet)                 worker threads
//! ┌──────────────────────────────────────┐
//! │ Lifecycle ── events ──► observers    │
//! │                  │                   │
//! │           LifecycleBridge            │
//! │                  ▼                   │        ┌─────────────────────┐
//! │ Scheduler::execute ──► TaskHandle    │─submit►│ WorkerPool (FIFO)   │
//! │                          ▲           │        │ catch_unwind(work)  │
//! │   continuation ──────────┘ on_result │◄oneshot┤ Outcome<T>          │
//! └──────────────────────────────────────┘        └─────────────────────┘
//!                   │ publish(Event)
//!                   ▼
//!        Bus (broadcast) ──► subscriber_listener ──► SubscriberSet ──► Subscribe::on_event
//! ```
//!
//! ### Task state machine
//! ```text
//! ACTIVE ── pause ──► PAUSED{pending} ── resume ──► ACTIVE (deliver pending, if any)
//!   │ result: deliver     │ result: buffer
//!   └──── destroy ────────┴──── destroy ──► DESTROYED (pending discarded, callbacks dropped)
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                          |
//! |-------------------|--------------------------------------------------------------|---------------------------------------------|
//! | **Execution**     | Submit work, deliver on the owner thread.                    | [`Scheduler`], [`TaskSpec`], [`Ticket`]     |
//! | **Callbacks**     | Pre-execute and delivery hooks, panics contained.            | [`Callbacks`], [`CallbackFn`]               |
//! | **Lifecycle**     | Owner lifecycle source and observer trait.                   | [`Lifecycle`], [`LifecycleObserver`]        |
//! | **Pool**          | Fixed worker threads, drain or abandon on shutdown.          | [`WorkerPool`], [`ShutdownMode`]            |
//! | **Subscriber API**| Hook into runtime events (logging, metrics, audits).         | [`Subscribe`], [`Event`], [`EventKind`]     |
//! | **Caches**        | TTL caches for work functions.                               | [`TtlCache`], [`AddressCache`]              |
//! | **Errors**        | Typed errors for admission and work failure.                 | [`RuntimeError`], [`TaskError`]             |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use lifetask::{Config, LifecycleEvent, OwnerThread, Scheduler, TaskError, TaskSpec};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scheduler = Scheduler::new(Config::default())?;
//!     let thread = OwnerThread::new("ui");
//!     let screen = thread.lifecycle("message-list");
//!     screen.handle_event(LifecycleEvent::Create);
//!     screen.handle_event(LifecycleEvent::Start);
//!     screen.handle_event(LifecycleEvent::Resume);
//!
//!     let title = Rc::new(RefCell::new(String::new()));
//!     let shown = title.clone();
//!     let ticket = scheduler.execute(
//!         &screen,
//!         "inbox".to_string(),
//!         TaskSpec::from_fns(
//!             "load-title",
//!             |folder: String| Ok::<_, TaskError>(folder.to_uppercase()),
//!             move |t| *shown.borrow_mut() = t,
//!             |e| eprintln!("load failed: {e}"),
//!         ),
//!     )?;
//!
//!     thread
//!         .run_until(async {
//!             while !ticket.is_finished() {
//!                 tokio::task::yield_now().await;
//!             }
//!         })
//!         .await;
//!     assert_eq!(*title.borrow(), "INBOX");
//!     Ok(())
//! }
//! ```
mod cache;
mod config;
mod core;
mod error;
mod events;
mod lifecycle;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use self::cache::{
    email_of, normalize_address, AddressCache, CacheEntry, Clock, ManualClock, SystemClock,
    TtlCache,
};
pub use self::config::{CacheConfig, Config, ShutdownMode};
pub use self::core::{Scheduler, SchedulerBuilder, Submission, TaskState, Ticket, WorkerPool};
pub use self::error::{RuntimeError, TaskError};
pub use self::events::{Bus, Event, EventKind};
pub use self::lifecycle::{
    Lifecycle, LifecycleEvent, LifecycleObserver, LifecycleState, ObserverId, OwnerThread,
};
pub use self::subscribers::{Subscribe, SubscriberSet};
pub use self::tasks::{CallbackFn, Callbacks, Outcome, TaskSpec};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use self::subscribers::LogWriter;

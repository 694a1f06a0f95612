//! # Scheduler: the `execute` facade.
//!
//! The [`Scheduler`] owns the event bus and a shared [`WorkerPool`]. `execute` binds one
//! work function to one owner lifecycle and returns a [`Ticket`].
//!
//! ## Flow of one `execute`
//! ```text
//! execute(owner, context, spec)                               (owner thread)
//!   ├─ admit: owner thread alive? owner not destroyed? pool open?
//!   │         └─ no → TaskRejected + Err(RuntimeError), no task, no callback
//!   ├─ TaskHandle::new ──► owner.add_observer(LifecycleBridge)
//!   ├─ callbacks.on_pre_execute()
//!   ├─ pool.submit(move || work(context)) ──► Submission
//!   └─ owner_thread.post(async {
//!          outcome = submission.await          (worker thread → owner thread)
//!          WorkFinished
//!          handle.on_result(outcome)           deliver | defer | discard
//!      })
//! ```
//!
//! ## Shutdown
//! ```text
//! shutdown()
//!   ├─ ShutdownRequested
//!   ├─ pool.shutdown(cfg.shutdown)           Drain: queued work still runs
//!   │                                        Abandon: queued work → Failure(Abandoned)
//!   ├─ Drain && grace > 0: timeout(grace, pool.drained())
//!   │      ├─ Ok  → AllDrainedWithin
//!   │      └─ Err → GraceExceeded + Err(RuntimeError::GraceExceeded)
//!   └─ cancel runtime token → subscriber listener flushes and stops
//! ```
//!
//! ## Example
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use lifetask::{Config, LifecycleEvent, OwnerThread, Scheduler, TaskSpec, TaskError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scheduler = Scheduler::new(Config { workers: 2, ..Config::default() })?;
//!     let thread = OwnerThread::new("main");
//!     let screen = thread.lifecycle("inbox");
//!     screen.handle_event(LifecycleEvent::Create);
//!     screen.handle_event(LifecycleEvent::Start);
//!     screen.handle_event(LifecycleEvent::Resume);
//!
//!     let got = Rc::new(Cell::new(0u32));
//!     let sink = got.clone();
//!     let ticket = scheduler.execute(
//!         &screen,
//!         21u32,
//!         TaskSpec::from_fns(
//!             "double",
//!             |n: u32| Ok::<_, TaskError>(n * 2),
//!             move |v| sink.set(v),
//!             |e| eprintln!("{e}"),
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
//!     assert_eq!(got.get(), 42);
//!
//!     scheduler.shutdown().await?;
//!     Ok(())
//! }
//! ```

use std::rc::Rc;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::{Config, ShutdownMode};
use crate::core::bridge::{LifecycleBridge, Transitions};
use crate::core::builder::SchedulerBuilder;
use crate::core::handle::{TaskHandle, TaskState};
use crate::core::pool::WorkerPool;
use crate::core::ticket::Ticket;
use crate::error::{RuntimeError, TaskError};
use crate::events::{Bus, Event, EventKind};
use crate::lifecycle::{Lifecycle, LifecycleState, OwnerThread};
use crate::tasks::{CallbackFn, TaskSpec};

/// Lifecycle-scoped task executor.
///
/// Construct once at start-up and inject it where work is started. `execute` must be
/// called on the owner thread of the lifecycle it is given.
pub struct Scheduler {
    cfg: Config,
    pool: Arc<WorkerPool>,
    bus: Bus,
    token: CancellationToken,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    /// Returns a builder for subscribers and a shared pool.
    pub fn builder(cfg: Config) -> SchedulerBuilder {
        SchedulerBuilder::new(cfg)
    }

    /// Creates a scheduler with its own worker pool and no subscribers.
    pub fn new(cfg: Config) -> Result<Arc<Self>, RuntimeError> {
        SchedulerBuilder::new(cfg).build()
    }

    pub(crate) fn new_internal(
        cfg: Config,
        pool: Arc<WorkerPool>,
        bus: Bus,
        token: CancellationToken,
        listener: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            cfg,
            pool,
            bus,
            token,
            listener: Mutex::new(listener),
        }
    }

    /// Runs `spec`'s work on a worker thread with `context` and delivers the outcome to
    /// its callbacks on `owner`'s thread, following the owner's lifecycle.
    ///
    /// Fails fast, without creating a task or running any callback, when the owner is
    /// destroyed, its owner thread is gone, or the pool is shut down.
    ///
    /// The pool is checked again right before the pre-execute hook. A pool shared with
    /// another scheduler can still be shut down from another thread while the hook
    /// runs: the call then returns [`RuntimeError::PoolShutdown`] after the hook.
    pub fn execute<C, T>(
        &self,
        owner: &Rc<Lifecycle>,
        context: C,
        spec: TaskSpec<C, T>,
    ) -> Result<Ticket, RuntimeError>
    where
        C: Send + 'static,
        T: Send + 'static,
    {
        let (label, work, callbacks) = spec.into_parts();
        let thread = self.admit(owner, &label)?;

        let handle = TaskHandle::new(
            Arc::clone(&label),
            owner.label_arc(),
            self.bus.clone(),
            callbacks,
        );
        let transitions: Rc<dyn Transitions> = handle.clone();
        let ticket = Ticket::new(Arc::clone(&label), Rc::downgrade(&transitions));

        let id = owner.add_observer(Rc::new(LifecycleBridge::new(transitions)));
        handle.attach(owner, id);

        // the pool may be shared and closed by another scheduler since admission
        if self.pool.is_shutdown() {
            let e = RuntimeError::PoolShutdown;
            handle.destroy();
            self.reject(owner, &label, &e);
            return Err(e);
        }
        handle.run_pre_execute();
        if handle.task_state() == TaskState::Destroyed {
            debug!(task = %label, owner = owner.label(), "owner destroyed during pre-execute");
            return Ok(ticket);
        }

        let submission = match self.pool.submit(move || work(context)) {
            Ok(submission) => submission,
            Err(e) => {
                handle.destroy();
                self.reject(owner, &label, &e);
                return Err(e);
            }
        };
        debug!(task = %label, owner = owner.label(), "task submitted");
        self.bus.publish(
            Event::new(EventKind::TaskSubmitted)
                .with_task(Arc::clone(&label))
                .with_owner(owner.label_arc()),
        );

        let bus = self.bus.clone();
        let owner_label = owner.label_arc();
        thread.post(async move {
            let outcome = submission.await;
            let mut ev = Event::new(EventKind::WorkFinished)
                .with_task(label)
                .with_owner(owner_label);
            if let Some(err) = outcome.error() {
                ev = ev.with_reason(err.as_message());
            }
            bus.publish(ev);
            handle.on_result(outcome);
        });
        Ok(ticket)
    }

    /// Closure form of [`execute`](Self::execute).
    pub fn execute_fn<C, T, W, S, F>(
        &self,
        owner: &Rc<Lifecycle>,
        label: &str,
        context: C,
        work: W,
        on_success: S,
        on_failure: F,
    ) -> Result<Ticket, RuntimeError>
    where
        C: Send + 'static,
        T: Send + 'static,
        W: FnOnce(C) -> Result<T, TaskError> + Send + 'static,
        S: FnOnce(T) + 'static,
        F: FnOnce(TaskError) + 'static,
    {
        let spec = TaskSpec::new(label, work, CallbackFn::new(on_success, on_failure));
        self.execute(owner, context, spec)
    }

    /// Subscribes to runtime events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// The worker pool, for sharing with another scheduler.
    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }

    /// Configuration this scheduler was built with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Closes the pool and, when draining, waits up to `cfg.grace` for queued and
    /// running work. Subscriber workers are flushed and stopped in either case.
    ///
    /// Results of drained work are still delivered on owner threads that keep running.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.bus.publish(Event::new(EventKind::ShutdownRequested));
        self.pool.shutdown(self.cfg.shutdown);

        let res = match (self.cfg.shutdown, self.cfg.drain_grace()) {
            (ShutdownMode::Drain, Some(grace)) => {
                match tokio::time::timeout(grace, self.pool.drained()).await {
                    Ok(()) => {
                        self.bus.publish(Event::new(EventKind::AllDrainedWithin));
                        Ok(())
                    }
                    Err(_) => {
                        let pending = self.pool.in_flight();
                        warn!(?grace, pending, "grace exceeded while draining");
                        self.bus.publish(
                            Event::new(EventKind::GraceExceeded)
                                .with_reason(format!("{pending} pending")),
                        );
                        Err(RuntimeError::GraceExceeded { grace, pending })
                    }
                }
            }
            _ => Ok(()),
        };

        self.token.cancel();
        let listener = self.listener.lock().take();
        if let Some(listener) = listener {
            let _ = listener.await;
        }
        res
    }

    fn admit(&self, owner: &Lifecycle, label: &Arc<str>) -> Result<Rc<OwnerThread>, RuntimeError> {
        let res = match owner.owner_thread() {
            None => Err(RuntimeError::OwnerDetached {
                owner: owner.label().to_string(),
            }),
            Some(_) if owner.state() == LifecycleState::Destroyed => {
                Err(RuntimeError::OwnerDestroyed {
                    owner: owner.label().to_string(),
                })
            }
            Some(_) if self.pool.is_shutdown() => Err(RuntimeError::PoolShutdown),
            Some(thread) => Ok(thread),
        };
        res.map_err(|e| {
            self.reject(owner, label, &e);
            e
        })
    }

    fn reject(&self, owner: &Lifecycle, label: &Arc<str>, error: &RuntimeError) {
        warn!(task = %label, owner = owner.label(), error = %error, "execute rejected");
        self.bus.publish(
            Event::new(EventKind::TaskRejected)
                .with_task(Arc::clone(label))
                .with_owner(owner.label_arc())
                .with_reason(error.as_label()),
        );
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("cfg", &self.cfg)
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

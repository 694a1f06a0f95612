//! # WorkerPool: fixed-size background thread pool.
//!
//! Runs work functions on dedicated OS threads and hands each result back through a
//! [`Submission`] future. The pool knows nothing about owners or lifecycles.
//!
//! ## Architecture
//! ```text
//! submit(work) ──► [FIFO queue] ──► worker-0 ─┐
//!      │                        ──► worker-1 ─┼──► catch_unwind(work) ──► oneshot ──► Submission
//!      │                        ──► worker-N ─┘
//!      └──► in_flight += 1                           in_flight -= 1 (after send, or on drop)
//! ```
//!
//! ## Rules
//! - Worker count is fixed at construction (`Config::worker_count`).
//! - Errors and panics of a work function become `Outcome::Failure`; workers survive.
//! - `shutdown(Drain)` closes the queue; queued work still runs.
//! - `shutdown(Abandon)` closes the queue and drops queued work; its submissions
//!   resolve to `TaskError::Abandoned`. Work that already started finishes.
//! - Dropping the pool closes the queue without joining the workers.

use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::thread;

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use tokio::sync::{oneshot, watch};
use tracing::{debug, warn};

use crate::config::{Config, ShutdownMode};
use crate::error::{panic_message, RuntimeError, TaskError};
use crate::tasks::Outcome;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed-size pool of worker threads with a shared FIFO queue.
pub struct WorkerPool {
    size: usize,
    sender: Mutex<Option<Sender<Job>>>,
    receiver: Receiver<Job>,
    workers: Mutex<Vec<thread::JoinHandle<()>>>,
    abandoned: Arc<AtomicBool>,
    in_flight: Arc<watch::Sender<usize>>,
}

impl WorkerPool {
    /// Spawns `cfg.worker_count()` worker threads named `{thread_name}-{index}`.
    pub fn new(cfg: &Config) -> Result<Self, RuntimeError> {
        let size = cfg.worker_count();
        let (tx, rx) = channel::unbounded::<Job>();
        let abandoned = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(size);
        for index in 0..size {
            let rx = rx.clone();
            let abandoned = Arc::clone(&abandoned);
            let handle = thread::Builder::new()
                .name(format!("{}-{index}", cfg.thread_name))
                .spawn(move || worker_loop(index, rx, abandoned))
                .map_err(|e| RuntimeError::WorkerSpawn {
                    error: e.to_string(),
                })?;
            workers.push(handle);
        }
        debug!(workers = size, "worker pool started");

        let (in_flight, _) = watch::channel(0usize);
        Ok(Self {
            size,
            sender: Mutex::new(Some(tx)),
            receiver: rx,
            workers: Mutex::new(workers),
            abandoned,
            in_flight: Arc::new(in_flight),
        })
    }

    /// Number of worker threads.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of submitted work items not finished yet (queued + running).
    pub fn in_flight(&self) -> usize {
        *self.in_flight.borrow()
    }

    /// Returns `true` once the queue is closed.
    pub fn is_shutdown(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Queues `work` and returns a future resolving to its outcome.
    pub fn submit<T, F>(&self, work: F) -> Result<Submission<T>, RuntimeError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, TaskError> + Send + 'static,
    {
        let sender = self.sender.lock();
        let Some(sender) = sender.as_ref() else {
            return Err(RuntimeError::PoolShutdown);
        };

        let (tx, rx) = oneshot::channel::<Outcome<T>>();
        let guard = InFlight::enter(Arc::clone(&self.in_flight));
        let job: Job = Box::new(move || {
            let _guard = guard;
            let outcome = match catch_unwind(AssertUnwindSafe(work)) {
                Ok(res) => Outcome::from(res),
                Err(panic) => Outcome::Failure(TaskError::Panicked {
                    info: panic_message(&*panic),
                }),
            };
            let _ = tx.send(outcome);
        });

        sender.send(job).map_err(|_| RuntimeError::PoolShutdown)?;
        Ok(Submission { rx })
    }

    /// Closes the queue. Idempotent; a later call may still upgrade `Drain` to `Abandon`.
    pub fn shutdown(&self, mode: ShutdownMode) {
        let sender = self.sender.lock().take();
        if sender.is_some() {
            debug!(?mode, "worker pool shutting down");
        }
        drop(sender);

        if mode == ShutdownMode::Abandon {
            self.abandoned.store(true, Ordering::Release);
            let mut dropped = 0usize;
            while let Ok(job) = self.receiver.try_recv() {
                drop(job);
                dropped += 1;
            }
            if dropped > 0 {
                warn!(dropped, "abandoned queued work");
            }
        }
    }

    /// Resolves once no submitted work is queued or running.
    pub async fn drained(&self) {
        let mut rx = self.in_flight.subscribe();
        let _ = rx.wait_for(|n| *n == 0).await;
    }

    /// Blocks until every worker thread exited. Call after [`shutdown`](Self::shutdown).
    pub fn join(&self) {
        let workers = std::mem::take(&mut *self.workers.lock());
        for handle in workers {
            if handle.join().is_err() {
                warn!("worker thread panicked outside of a job");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.sender.lock().take();
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("size", &self.size)
            .field("in_flight", &self.in_flight())
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}

fn worker_loop(index: usize, rx: Receiver<Job>, abandoned: Arc<AtomicBool>) {
    while let Ok(job) = rx.recv() {
        if abandoned.load(Ordering::Acquire) {
            drop(job);
            continue;
        }
        job();
    }
    debug!(worker = index, "worker exited");
}

/// Counts one work item as in flight until dropped.
struct InFlight(Arc<watch::Sender<usize>>);

impl InFlight {
    fn enter(counter: Arc<watch::Sender<usize>>) -> Self {
        counter.send_modify(|n| *n += 1);
        Self(counter)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.send_modify(|n| *n = n.saturating_sub(1));
    }
}

/// Future of one submitted work item.
///
/// Resolves to `Failure(TaskError::Abandoned)` if the work was dropped unrun.
#[must_use = "the outcome is lost if the submission is dropped"]
pub struct Submission<T> {
    rx: oneshot::Receiver<Outcome<T>>,
}

impl<T> Future for Submission<T> {
    type Output = Outcome<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|res| res.unwrap_or(Outcome::Failure(TaskError::Abandoned)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::sync::mpsc;
    use std::time::Duration;

    fn pool(workers: usize) -> WorkerPool {
        WorkerPool::new(&Config {
            workers,
            thread_name: "test-worker".into(),
            ..Config::default()
        })
        .expect("pool")
    }

    #[test]
    fn test_runs_work_off_thread() {
        let pool = pool(2);
        let caller = thread::current().id();
        let sub = pool
            .submit(move || Ok(thread::current().id() != caller))
            .expect("submit");
        assert_eq!(block_on(sub), Outcome::Success(true));
    }

    #[test]
    fn test_worker_threads_are_named() {
        let pool = pool(1);
        let sub = pool
            .submit(|| Ok(thread::current().name().map(str::to_owned)))
            .expect("submit");
        assert_eq!(
            block_on(sub),
            Outcome::Success(Some("test-worker-0".to_string()))
        );
    }

    #[test]
    fn test_error_and_panic_become_failures() {
        let pool = pool(1);
        let failed = pool
            .submit(|| Err::<u8, _>(TaskError::fail("nope")))
            .expect("submit");
        assert_eq!(block_on(failed), Outcome::Failure(TaskError::fail("nope")));

        let panicked = pool
            .submit(|| -> Result<u8, TaskError> { panic!("boom") })
            .expect("submit");
        assert_eq!(
            block_on(panicked),
            Outcome::Failure(TaskError::Panicked {
                info: "boom".into()
            })
        );

        // the single worker survived the panic
        let again = pool.submit(|| Ok(7)).expect("submit");
        assert_eq!(block_on(again), Outcome::Success(7));
    }

    #[test]
    fn test_submit_after_shutdown_is_rejected() {
        let pool = pool(1);
        pool.shutdown(ShutdownMode::Drain);
        assert!(pool.is_shutdown());
        assert!(matches!(
            pool.submit(|| Ok(1)),
            Err(RuntimeError::PoolShutdown)
        ));
        pool.join();
    }

    #[test]
    fn test_drain_runs_queued_work() {
        let pool = pool(1);
        let subs: Vec<_> = (0..4)
            .map(|i| pool.submit(move || Ok(i)).expect("submit"))
            .collect();
        pool.shutdown(ShutdownMode::Drain);
        pool.join();

        let values: Vec<_> = subs.into_iter().map(block_on).collect();
        assert_eq!(
            values,
            (0..4).map(Outcome::Success).collect::<Vec<_>>()
        );
        assert_eq!(pool.in_flight(), 0);
    }

    #[test]
    fn test_abandon_drops_queued_work() {
        let pool = pool(1);
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let running = pool
            .submit(move || {
                started_tx.send(()).expect("started");
                release_rx.recv().expect("release");
                Ok("finished")
            })
            .expect("submit");
        let queued = pool.submit(|| Ok("never")).expect("submit");

        started_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("first job started");
        pool.shutdown(ShutdownMode::Abandon);
        assert_eq!(block_on(queued), Outcome::Failure(TaskError::Abandoned));

        release_tx.send(()).expect("release");
        assert_eq!(block_on(running), Outcome::Success("finished"));
        pool.join();
        assert_eq!(pool.in_flight(), 0);
    }
}

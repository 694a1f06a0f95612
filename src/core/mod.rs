//! Runtime core: pool, task handles and the scheduler facade.
//!
//! The public API from this module is [`Scheduler`] (with its builder), the shared
//! [`WorkerPool`], and the caller-side [`Ticket`].
//!
//! Internal modules:
//! - [`pool`]: fixed-size worker threads and the `Submission` future;
//! - [`handle`]: per-invocation delivery state machine;
//! - [`bridge`]: lifecycle observer forwarding owner transitions to a handle;
//! - [`scheduler`]: admission, submission and owner-thread continuation;
//! - [`builder`]: wires bus, pool and subscribers.

mod bridge;
mod builder;
mod handle;
mod pool;
mod scheduler;
mod ticket;

pub use builder::SchedulerBuilder;
pub use handle::TaskState;
pub use pool::{Submission, WorkerPool};
pub use scheduler::Scheduler;
pub use ticket::Ticket;

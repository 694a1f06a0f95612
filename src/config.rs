//! # Runtime configuration.
//!
//! Provides [`Config`] centralized settings for the scheduler and its worker pool,
//! and [`CacheConfig`] for the address caches.
//!
//! ## Sentinel values
//! - `workers = 0` → one worker per host processor (`num_cpus::get()`)
//! - `grace = 0s` → drain does not wait for pending work
//! - `bus_capacity` is clamped to a minimum of 1

use std::time::Duration;

/// What happens to queued work when the pool shuts down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShutdownMode {
    /// Queued work still runs; shutdown waits (up to `grace`) for it to finish.
    #[default]
    Drain,
    /// Queued work is dropped and resolves to `TaskError::Abandoned`.
    /// Work that already started runs to completion.
    Abandon,
}

/// Global configuration for the scheduler runtime.
///
/// ## Field semantics
/// - `workers`: Worker thread count (`0` = host processor count)
/// - `thread_name`: Prefix for worker thread names (`{thread_name}-{index}`)
/// - `shutdown`: Drain or abandon queued work on shutdown
/// - `grace`: Maximum wait for drained work (`0s` = no wait)
/// - `bus_capacity`: Event bus ring buffer size (min 1)
#[derive(Clone, Debug)]
pub struct Config {
    /// Number of worker threads.
    ///
    /// - `0` = one per available processor
    /// - `n > 0` = exactly `n`
    pub workers: usize,

    /// Prefix for worker thread names.
    pub thread_name: String,

    /// Shutdown behavior for queued work.
    pub shutdown: ShutdownMode,

    /// Maximum time [`Scheduler::shutdown`](crate::Scheduler::shutdown) waits for drained work.
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,
}

impl Config {
    /// Returns the effective number of worker threads.
    #[inline]
    pub fn worker_count(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get().max(1)
        } else {
            self.workers
        }
    }

    /// Returns the drain grace period as an `Option`.
    ///
    /// - `None` → do not wait
    /// - `Some(d)` → wait up to `d`
    #[inline]
    pub fn drain_grace(&self) -> Option<Duration> {
        if self.grace == Duration::ZERO {
            None
        } else {
            Some(self.grace)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `workers = 0` (host processor count)
    /// - `thread_name = "lifetask-worker"`
    /// - `shutdown = Drain`
    /// - `grace = 10s`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            workers: 0,
            thread_name: "lifetask-worker".to_string(),
            shutdown: ShutdownMode::default(),
            grace: Duration::from_secs(10),
            bus_capacity: 1024,
        }
    }
}

/// Time-to-live settings for [`AddressCache`](crate::AddressCache).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    /// TTL for resolved records (short).
    pub record_ttl: Duration,
    /// TTL for lookup references (long).
    pub lookup_ttl: Duration,
}

impl Default for CacheConfig {
    /// `record_ttl = 60s`, `lookup_ttl = 120min`.
    fn default() -> Self {
        Self {
            record_ttl: Duration::from_secs(60),
            lookup_ttl: Duration::from_secs(120 * 60),
        }
    }
}

//! # Caches shared by work functions.
//!
//! - [`TtlCache`] - concurrent map with per-entry expiry
//! - [`CacheEntry`] - value + creation timestamp
//! - [`AddressCache`] - record and lookup caches keyed by mail address
//! - [`Clock`] - time source ([`SystemClock`], [`ManualClock`])
//!
//! Caches are plain values: construct them at start-up, wrap in `Arc`, and move a
//! clone into the work context.

mod address;
mod clock;
mod ttl;

pub use address::{email_of, normalize_address, AddressCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use ttl::{CacheEntry, TtlCache};

//! # Address-keyed caches.
//!
//! Two [`TtlCache`]s keyed by a mail address:
//! - **records**: resolved data for an address (display name, avatar bytes...),
//!   short TTL (`CacheConfig::record_ttl`, 60 s by default);
//! - **lookups**: reference to an address-book entry, long TTL
//!   (`CacheConfig::lookup_ttl`, 120 min by default).
//!
//! Keys are normalized with [`normalize_address`] so `"Ann <ANN@x.org>"` and
//! `" Ann <ann@x.org> "` share one entry. Lookups are keyed by the bare email.

use std::sync::Arc;

use crate::config::CacheConfig;

use super::clock::{Clock, SystemClock};
use super::ttl::TtlCache;

/// Normalizes `Name <email>` / `email` for use as a cache key.
///
/// Trims, collapses inner whitespace in the name and lowercases the email part.
pub fn normalize_address(address: &str) -> String {
    let address = address.trim();
    match split_address(address) {
        (Some(name), email) => format!("{} <{}>", collapse(name), email.to_lowercase()),
        (None, email) => email.to_lowercase(),
    }
}

/// The bare, lowercased email of `Name <email>` / `email`.
pub fn email_of(address: &str) -> String {
    split_address(address.trim()).1.to_lowercase()
}

fn split_address(address: &str) -> (Option<&str>, &str) {
    match (address.rfind('<'), address.ends_with('>')) {
        (Some(open), true) => {
            let name = address[..open].trim().trim_matches('"').trim();
            let email = address[open + 1..address.len() - 1].trim();
            ((!name.is_empty()).then_some(name), email)
        }
        _ => (None, address),
    }
}

fn collapse(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Record cache plus lookup cache for mail addresses.
#[derive(Debug)]
pub struct AddressCache<R, L> {
    records: TtlCache<String, R>,
    lookups: TtlCache<String, L>,
}

impl<R: Clone, L: Clone> AddressCache<R, L> {
    pub fn new(cfg: CacheConfig) -> Self {
        Self::with_clock(cfg, Arc::new(SystemClock))
    }

    pub fn with_clock(cfg: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            records: TtlCache::with_clock(cfg.record_ttl, Arc::clone(&clock)),
            lookups: TtlCache::with_clock(cfg.lookup_ttl, clock),
        }
    }

    /// Cached record for `address`; `None` when absent or expired.
    pub fn record(&self, address: &str) -> Option<R> {
        self.records.get(normalize_address(address).as_str())
    }

    pub fn put_record(&self, address: &str, record: R) {
        self.records.put(normalize_address(address), record);
    }

    /// Cached record, or `resolve` it and cache the result.
    pub fn record_or_resolve(&self, address: &str, resolve: impl FnOnce() -> R) -> R {
        self.records
            .get_or_insert_with(normalize_address(address), resolve)
    }

    /// Cached lookup reference for the email of `address`.
    pub fn lookup(&self, address: &str) -> Option<L> {
        self.lookups.get(email_of(address).as_str())
    }

    pub fn put_lookup(&self, address: &str, lookup: L) {
        self.lookups.put(email_of(address), lookup);
    }

    /// Empties both caches.
    pub fn clear(&self) {
        self.records.clear();
        self.lookups.clear();
    }

    pub fn records(&self) -> &TtlCache<String, R> {
        &self.records
    }

    pub fn lookups(&self) -> &TtlCache<String, L> {
        &self.lookups
    }
}

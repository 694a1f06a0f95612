//! # Task abstractions.
//!
//! - [`Outcome`] - tagged result of a work function
//! - [`Callbacks`] - owner-thread hooks (trait)
//! - [`CallbackFn`] - closure-backed callbacks
//! - [`TaskSpec`] - label + work function + callbacks for one `execute`

mod callbacks;
mod outcome;
mod spec;

pub use callbacks::{CallbackFn, Callbacks};
pub use outcome::Outcome;
pub use spec::TaskSpec;

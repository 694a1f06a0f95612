//! # Outcome of one unit of background work.

use crate::error::TaskError;

/// Tagged result of a work function: produced on a worker thread, consumed
/// exactly once by delivery on the owner thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Success(T),
    Failure(TaskError),
}

impl<T> Outcome<T> {
    /// Returns the failure, if any.
    pub fn error(&self) -> Option<&TaskError> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(e) => Some(e),
        }
    }
}

impl<T> From<Result<T, TaskError>> for Outcome<T> {
    fn from(res: Result<T, TaskError>) -> Self {
        match res {
            Ok(v) => Outcome::Success(v),
            Err(e) => Outcome::Failure(e),
        }
    }
}

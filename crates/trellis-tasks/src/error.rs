//! Task error types.

use std::time::Duration;

use thiserror::Error;

/// An operation exceeded its time limit.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("operation timed out after {limit:?}")]
pub struct TimeoutError {
    /// The limit that was exceeded.
    pub limit: Duration,
}

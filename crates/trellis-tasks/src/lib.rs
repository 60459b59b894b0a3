//! Async task helpers for Trellis
//!
//! Small combinators the TUI shell uses for background work: fail-together
//! parallel fan-out (optionally bounded by a concurrency limit), retry with
//! exponential backoff, condition polling with a deadline, and a timeout
//! wrapper.
//!
//! All helpers are plain `async fn`s over caller-supplied futures; nothing
//! here spawns.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
mod parallel;
mod poll;
mod retry;

pub use error::TimeoutError;
pub use parallel::{run_parallel, run_parallel_with_limit};
pub use poll::{poll_until, run_with_timeout};
pub use retry::{RetryPolicy, retry_with_backoff};

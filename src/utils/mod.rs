//! Shared utility functions.
//!
//! - `parallel`: bounded-concurrency batch execution
//! - `retry`: exponential-backoff retry for single external calls

mod parallel;
mod retry;

pub use parallel::parallel_process;
pub use retry::retry_with_backoff;

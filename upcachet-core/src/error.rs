//! Error types for the core.

use thiserror::Error;

use upcachet_adapters::AdapterError;

/// Errors that stop the scheduler.
///
/// Failures inside a poll are logged and retried on the next tick; only
/// startup problems and a crashed task surface here.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Account details could not be fetched at startup.
    #[error("error getting account details: {0}")]
    AccountDetails(#[source] AdapterError),

    /// The scheduler task panicked or was cancelled.
    #[error("scheduler task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

//! # Scheduler Error Types

use thiserror::Error;

/// Errors raised when work cannot be handed to a scheduler.
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// The scheduler was shut down; no further work is accepted.
    #[error("scheduler has been shut down")]
    ShutDown,

    /// A worker or driver thread could not be started.
    #[error("failed to spawn scheduler thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Result type for scheduling operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;

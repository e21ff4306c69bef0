//! Scheduler error types.

use repocast_protocols::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Unknown or unregistered job.
    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Invalid cron expression '{expr}': {reason}")]
    InvalidSchedule { expr: String, reason: String },

    /// The job body panicked; the panic was recorded and reported.
    #[error("Job '{name}' panicked: {message}")]
    Panicked { name: String, message: String },

    /// The run task ended without producing an outcome.
    #[error("Job '{name}' was aborted: {reason}")]
    Aborted { name: String, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SchedulerError {
    pub(crate) fn invalid_schedule(expr: &str, reason: impl Into<String>) -> Self {
        SchedulerError::InvalidSchedule {
            expr: expr.to_string(),
            reason: reason.into(),
        }
    }
}

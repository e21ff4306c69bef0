//! Job settings, run outcomes and execution records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the ingestion job.
pub const JOB_COLLECT: &str = "collect";

/// Name of the publishing job.
pub const JOB_MESSAGE: &str = "message";

/// Maximum stored output length, in characters.
pub const MAX_OUTPUT_CHARS: usize = 10_000;

/// Suffix appended to outputs cut at [`MAX_OUTPUT_CHARS`].
pub const TRUNCATION_MARKER: &str = "... [truncated due to length]";

/// Total length of a truncated output, marker included.
const TRUNCATED_OUTPUT_CHARS: usize = 9_980;

/// Outcome of a single job run.
///
/// Persisted as its numeric code: `0` failed, `1` ok, `2` partial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum JobStatus {
    Failed,
    Ok,
    Partial,
}

impl JobStatus {
    pub fn code(self) -> u8 {
        match self {
            JobStatus::Failed => 0,
            JobStatus::Ok => 1,
            JobStatus::Partial => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(JobStatus::Failed),
            1 => Some(JobStatus::Ok),
            2 => Some(JobStatus::Partial),
            _ => None,
        }
    }
}

impl From<JobStatus> for u8 {
    fn from(status: JobStatus) -> Self {
        status.code()
    }
}

impl TryFrom<u8> for JobStatus {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        JobStatus::from_code(code).ok_or_else(|| format!("invalid job status code {}", code))
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            JobStatus::Failed => "failed",
            JobStatus::Ok => "ok",
            JobStatus::Partial => "partial",
        };
        f.write_str(label)
    }
}

/// Persisted schedule for a named job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSetting {
    pub name: String,
    /// Cron expression; empty means "never scheduled".
    pub schedule: String,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

impl JobSetting {
    pub fn new(name: impl Into<String>, schedule: impl Into<String>, is_active: bool) -> Self {
        Self {
            name: name.into(),
            schedule: schedule.into(),
            is_active,
            updated_at: Utc::now(),
        }
    }
}

/// Status and message a job body hands back to the execution wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub status: JobStatus,
    pub message: String,
}

impl JobOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Ok,
            message: message.into(),
        }
    }

    pub fn partial(message: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Partial,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Failed,
            message: message.into(),
        }
    }
}

/// One row of execution history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub status: JobStatus,
    pub output: String,
}

impl ExecutionRecord {
    /// Create a record stamped with the current time. The output is truncated.
    pub fn new(name: impl Into<String>, status: JobStatus, output: &str) -> Self {
        Self {
            name: name.into(),
            timestamp: Utc::now(),
            status,
            output: truncate_output(output),
        }
    }
}

/// Bound an execution output to the stored length.
///
/// Outputs up to [`MAX_OUTPUT_CHARS`] are kept verbatim. Longer outputs are
/// cut so that the result, marker included, is exactly 9,980 characters.
pub fn truncate_output(output: &str) -> String {
    if output.chars().count() <= MAX_OUTPUT_CHARS {
        return output.to_string();
    }

    let keep = TRUNCATED_OUTPUT_CHARS - TRUNCATION_MARKER.chars().count();
    let mut truncated: String = output.chars().take(keep).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;

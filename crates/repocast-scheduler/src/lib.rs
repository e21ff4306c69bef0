//! # Repocast Scheduler
//!
//! Runs the collect and message jobs on cron schedules.
//!
//! - [`SchedulerRegistry`] - one timer per job name, reconfigured atomically
//! - [`JobRunner`] - runs a job in its own task through the execution wrapper
//!   and reports panics
//! - [`JobAdmin`] - persists schedule/status changes, then reconfigures
//! - [`jobs`] - the job bodies and their shared [`JobContext`]

mod admin;
pub mod cron_timer;
mod error;
pub mod jobs;
mod registry;
mod runner;
pub mod wrapper;

#[cfg(test)]
mod test_support;

pub use admin::JobAdmin;
pub use cron_timer::{normalize_cron, parse_schedule, CronTimer};
pub use error::SchedulerError;
pub use jobs::{JobContext, JobKind};
pub use registry::{JobState, SchedulerRegistry};
pub use runner::{JobPanic, JobRunner};

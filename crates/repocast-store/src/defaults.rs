//! Built-in job settings written on first boot.

use repocast_protocols::{JobSetting, JOB_COLLECT, JOB_MESSAGE};

/// Saturdays at 13:13 UTC.
pub const COLLECT_SCHEDULE: &str = "13 13 * * 6";

/// Daily at 12:12 UTC.
pub const MESSAGE_SCHEDULE: &str = "12 12 * * *";

/// Default settings of the built-in jobs. Both start inactive.
pub fn default_job_settings() -> Vec<JobSetting> {
    vec![
        JobSetting::new(JOB_COLLECT, COLLECT_SCHEDULE, false),
        JobSetting::new(JOB_MESSAGE, MESSAGE_SCHEDULE, false),
    ]
}

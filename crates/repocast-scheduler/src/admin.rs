//! Job administration: persist a setting change, then reconfigure the
//! scheduler from storage.

use std::sync::Arc;
use tracing::info;

use repocast_protocols::{JobSetting, SettingsStore};

use crate::cron_timer::parse_schedule;
use crate::error::SchedulerError;
use crate::registry::{JobState, SchedulerRegistry};

pub struct JobAdmin {
    store: Arc<dyn SettingsStore>,
    registry: Arc<SchedulerRegistry>,
}

impl JobAdmin {
    pub fn new(registry: Arc<SchedulerRegistry>) -> Self {
        Self {
            store: registry.context().store.clone(),
            registry,
        }
    }

    pub fn registry(&self) -> &Arc<SchedulerRegistry> {
        &self.registry
    }

    /// Persisted settings of all jobs.
    pub async fn settings(&self) -> Result<Vec<JobSetting>, SchedulerError> {
        Ok(self.store.get_all_job_settings().await?)
    }

    /// Live scheduler state of all registered jobs.
    pub async fn states(&self) -> Vec<JobState> {
        self.registry.statuses().await
    }

    /// Replace the schedule of `name`, keeping its activity.
    pub async fn update_schedule(
        &self,
        name: &str,
        schedule: &str,
    ) -> Result<JobSetting, SchedulerError> {
        let current = self.current(name).await?;
        parse_schedule(schedule)?;

        let setting = self
            .store
            .upsert_job_setting(name, schedule.trim(), current.is_active)
            .await?;
        self.registry.reload_from_store(name).await?;

        info!("Schedule of job '{}' set to '{}'", name, setting.schedule);
        Ok(setting)
    }

    /// Activate or deactivate `name`, keeping its schedule.
    pub async fn update_status(
        &self,
        name: &str,
        is_active: bool,
    ) -> Result<JobSetting, SchedulerError> {
        let current = self.current(name).await?;

        let setting = self
            .store
            .upsert_job_setting(name, &current.schedule, is_active)
            .await?;
        self.registry.reload_from_store(name).await?;

        info!(
            "Job '{}' {}",
            name,
            if is_active { "activated" } else { "deactivated" }
        );
        Ok(setting)
    }

    async fn current(&self, name: &str) -> Result<JobSetting, SchedulerError> {
        self.store
            .get_job_setting(name)
            .await?
            .ok_or_else(|| SchedulerError::NotFound(name.to_string()))
    }
}

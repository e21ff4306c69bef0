//! Settings and history store protocol.

use async_trait::async_trait;

use crate::endpoint::EndpointConfig;
use crate::error::StoreError;
use crate::history::HistoryQuery;
use crate::job::{ExecutionRecord, JobSetting, JobStatus};
use crate::settings::{CollectSettings, PromptSettings, PromptSettingsUpdate};

/// Persistence for job settings, execution history, collect/prompt
/// settings and endpoint definitions.
///
/// The scheduler and job bodies depend only on this trait.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Returns the backend ID.
    fn id(&self) -> &str;

    /// Write built-in defaults for anything not yet stored.
    async fn initialize_defaults(&self) -> Result<(), StoreError>;

    /// Get the setting of one job.
    async fn get_job_setting(&self, name: &str) -> Result<Option<JobSetting>, StoreError>;

    /// Get all job settings, ordered by name.
    async fn get_all_job_settings(&self) -> Result<Vec<JobSetting>, StoreError>;

    /// Create or replace the setting of a job.
    async fn upsert_job_setting(
        &self,
        name: &str,
        schedule: &str,
        is_active: bool,
    ) -> Result<JobSetting, StoreError>;

    /// Append one execution record. The output is truncated.
    async fn log_execution(
        &self,
        name: &str,
        status: JobStatus,
        output: &str,
    ) -> Result<(), StoreError>;

    /// Count records matching the query filters.
    async fn count_execution_history(&self, query: &HistoryQuery) -> Result<usize, StoreError>;

    /// Get records matching the query, sorted and windowed.
    async fn get_execution_history(
        &self,
        query: &HistoryQuery,
    ) -> Result<Vec<ExecutionRecord>, StoreError>;

    async fn get_collect_settings(&self) -> Result<CollectSettings, StoreError>;

    async fn update_collect_settings(&self, settings: &CollectSettings) -> Result<(), StoreError>;

    async fn get_prompt_settings(&self) -> Result<PromptSettings, StoreError>;

    /// Apply a partial update to the prompt settings.
    async fn update_prompt_settings(
        &self,
        update: &PromptSettingsUpdate,
    ) -> Result<PromptSettings, StoreError>;

    async fn get_endpoint(&self, name: &str) -> Result<Option<EndpointConfig>, StoreError>;

    /// Get all endpoints, ordered by name.
    async fn get_all_endpoints(&self) -> Result<Vec<EndpointConfig>, StoreError>;

    /// Create or replace an endpoint definition.
    async fn save_endpoint(&self, endpoint: &EndpointConfig) -> Result<(), StoreError>;

    /// Delete an endpoint definition. Missing names are an error.
    async fn delete_endpoint(&self, name: &str) -> Result<(), StoreError>;
}

/// Reject empty job names before they reach storage.
pub fn validate_job_name(name: &str) -> Result<(), StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::InvalidInput(
            "job name cannot be empty".to_string(),
        ));
    }
    Ok(())
}

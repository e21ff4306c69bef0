//! In-memory settings store.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use repocast_protocols::{
    validate_job_name, CollectSettings, EndpointConfig, ExecutionRecord, HistoryQuery, JobSetting,
    JobStatus, PromptSettings, PromptSettingsUpdate, SettingsStore, SortOrder, StoreError,
};

use crate::defaults::default_job_settings;

#[derive(Default)]
struct Inner {
    jobs: BTreeMap<String, JobSetting>,
    history: Vec<ExecutionRecord>,
    collect: Option<CollectSettings>,
    prompt: Option<PromptSettings>,
    endpoints: BTreeMap<String, EndpointConfig>,
}

/// Store keeping everything in process memory. Contents are lost on drop.
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    /// Matching records in query order, before windowing.
    fn filtered(&self, query: &HistoryQuery) -> Vec<&ExecutionRecord> {
        // Insertion index breaks timestamp ties.
        let mut rows: Vec<(usize, &ExecutionRecord)> = self
            .history
            .iter()
            .enumerate()
            .filter(|(_, r)| query.matches(r))
            .collect();
        rows.sort_by(|(ia, a), (ib, b)| a.timestamp.cmp(&b.timestamp).then(ia.cmp(ib)));
        if query.sort == SortOrder::Desc {
            rows.reverse();
        }
        rows.into_iter().map(|(_, r)| r).collect()
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    fn id(&self) -> &str {
        "memory"
    }

    async fn initialize_defaults(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        for setting in default_job_settings() {
            inner.jobs.entry(setting.name.clone()).or_insert(setting);
        }
        if inner.collect.is_none() {
            inner.collect = Some(CollectSettings::default());
        }
        if inner.prompt.is_none() {
            inner.prompt = Some(PromptSettings::default());
        }
        Ok(())
    }

    async fn get_job_setting(&self, name: &str) -> Result<Option<JobSetting>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.jobs.get(name).cloned())
    }

    async fn get_all_job_settings(&self) -> Result<Vec<JobSetting>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.jobs.values().cloned().collect())
    }

    async fn upsert_job_setting(
        &self,
        name: &str,
        schedule: &str,
        is_active: bool,
    ) -> Result<JobSetting, StoreError> {
        validate_job_name(name)?;
        let setting = JobSetting::new(name, schedule, is_active);
        let mut inner = self.inner.write().await;
        inner.jobs.insert(name.to_string(), setting.clone());
        Ok(setting)
    }

    async fn log_execution(
        &self,
        name: &str,
        status: JobStatus,
        output: &str,
    ) -> Result<(), StoreError> {
        validate_job_name(name)?;
        let record = ExecutionRecord::new(name, status, output);
        let mut inner = self.inner.write().await;
        inner.history.push(record);
        Ok(())
    }

    async fn count_execution_history(&self, query: &HistoryQuery) -> Result<usize, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.history.iter().filter(|r| query.matches(r)).count())
    }

    async fn get_execution_history(
        &self,
        query: &HistoryQuery,
    ) -> Result<Vec<ExecutionRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .filtered(query)
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect())
    }

    async fn get_collect_settings(&self) -> Result<CollectSettings, StoreError> {
        let inner = self.inner.read().await;
        inner
            .collect
            .clone()
            .ok_or_else(|| StoreError::NotFound("collect settings".to_string()))
    }

    async fn update_collect_settings(&self, settings: &CollectSettings) -> Result<(), StoreError> {
        let mut updated = settings.clone();
        updated.updated_at = Utc::now();
        let mut inner = self.inner.write().await;
        inner.collect = Some(updated);
        Ok(())
    }

    async fn get_prompt_settings(&self) -> Result<PromptSettings, StoreError> {
        let inner = self.inner.read().await;
        inner
            .prompt
            .clone()
            .ok_or_else(|| StoreError::NotFound("prompt settings".to_string()))
    }

    async fn update_prompt_settings(
        &self,
        update: &PromptSettingsUpdate,
    ) -> Result<PromptSettings, StoreError> {
        let mut inner = self.inner.write().await;
        let settings = inner
            .prompt
            .as_mut()
            .ok_or_else(|| StoreError::NotFound("prompt settings".to_string()))?;
        update.apply(settings);
        Ok(settings.clone())
    }

    async fn get_endpoint(&self, name: &str) -> Result<Option<EndpointConfig>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.endpoints.get(name).cloned())
    }

    async fn get_all_endpoints(&self) -> Result<Vec<EndpointConfig>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.endpoints.values().cloned().collect())
    }

    async fn save_endpoint(&self, endpoint: &EndpointConfig) -> Result<(), StoreError> {
        if endpoint.name.trim().is_empty() {
            return Err(StoreError::InvalidInput(
                "endpoint name cannot be empty".to_string(),
            ));
        }
        let mut saved = endpoint.clone();
        saved.updated_at = Some(Utc::now());
        let mut inner = self.inner.write().await;
        inner.endpoints.insert(saved.name.clone(), saved);
        Ok(())
    }

    async fn delete_endpoint(&self, name: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        match inner.endpoints.remove(name) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(format!("endpoint '{}'", name))),
        }
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;

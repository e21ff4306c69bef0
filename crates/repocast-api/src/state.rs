//! Shared handler state.

use std::sync::Arc;

use repocast_executor::ApiExecutor;
use repocast_protocols::SettingsStore;
use repocast_scheduler::JobAdmin;

/// State shared across handlers.
#[derive(Clone)]
pub struct ApiState {
    pub admin: Arc<JobAdmin>,
    pub store: Arc<dyn SettingsStore>,
    pub executor: Arc<ApiExecutor>,
    /// Bearer token required on admin routes; open when `None`.
    pub api_token: Option<String>,
}

impl ApiState {
    pub fn new(admin: Arc<JobAdmin>, executor: Arc<ApiExecutor>) -> Self {
        Self {
            store: admin.registry().context().store.clone(),
            admin,
            executor,
            api_token: None,
        }
    }

    /// Require `token` on admin routes. Empty tokens leave them open.
    pub fn with_api_token(mut self, token: Option<String>) -> Self {
        self.api_token = token.filter(|t| !t.trim().is_empty());
        self
    }
}

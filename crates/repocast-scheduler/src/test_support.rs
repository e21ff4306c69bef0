//! Shared fixtures for job and registry tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use repocast_config::ImageConfig;
use repocast_content::{ContentServiceClient, SocialifyRenderer};
use repocast_executor::{ApiExecutor, EndpointRegistry};
use repocast_protocols::{
    EndpointConfig, RepositoryItem, RepositoryPage, RepositoryQuery, RepositorySource,
    SettingsStore, SourceError,
};
use repocast_store::MemoryStore;

use crate::jobs::JobContext;

/// Image settings rooted in `dir`, rendering from `renderer_url` without delay.
pub(crate) fn image_config(dir: &TempDir, renderer_url: &str) -> ImageConfig {
    ImageConfig {
        dir: dir.path().join("gh_project_img"),
        placeholder: dir.path().join("banner.jpg"),
        attempts: 2,
        retry_interval_seconds: 0,
        renderer_url: renderer_url.to_string(),
        ..Default::default()
    }
}

/// Context whose content service and renderer both live at `server_uri`.
pub(crate) async fn context(
    server_uri: &str,
    store: Arc<MemoryStore>,
    endpoints: Vec<EndpointConfig>,
    images: ImageConfig,
) -> Arc<JobContext> {
    context_with_source(server_uri, store, endpoints, images, None).await
}

/// Like [`context`], with repositories served by `source` when given.
pub(crate) async fn context_with_source(
    server_uri: &str,
    store: Arc<MemoryStore>,
    endpoints: Vec<EndpointConfig>,
    images: ImageConfig,
    source: Option<Arc<dyn RepositorySource>>,
) -> Arc<JobContext> {
    let client = Arc::new(
        ContentServiceClient::new(server_uri, "test-token")
            .unwrap()
            .with_request_timeout(Duration::from_secs(5)),
    );
    let source = source.unwrap_or_else(|| client.clone() as Arc<dyn RepositorySource>);
    let renderer = Arc::new(SocialifyRenderer::new(images.renderer_url.clone()).unwrap());
    let executor = Arc::new(ApiExecutor::new(EndpointRegistry::new(endpoints)).unwrap());
    let store: Arc<dyn SettingsStore> = store;

    Arc::new(JobContext {
        store,
        executor,
        source,
        generator: client,
        renderer,
        images,
    })
}

/// A store holding the built-in defaults.
pub(crate) async fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.initialize_defaults().await.unwrap();
    store
}

/// In-memory repository source. URLs answer 200 unless a probe status is set.
#[derive(Default)]
pub(crate) struct FakeSource {
    items: Mutex<Vec<(String, RepositoryItem)>>,
    probes: Mutex<HashMap<String, u16>>,
    deleted: Mutex<Vec<String>>,
    fetches: Mutex<usize>,
}

impl FakeSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_item(self, language: &str, url: &str, text: &str) -> Self {
        {
            let mut items = self.items.lock().unwrap();
            let id = items.len() as i64 + 1;
            items.push((
                language.to_string(),
                RepositoryItem {
                    id,
                    posted: false,
                    url: url.to_string(),
                    text: text.to_string(),
                    date_added: None,
                    date_posted: None,
                },
            ));
        }
        self
    }

    pub(crate) fn with_probe(self, url: &str, status: u16) -> Self {
        self.probes.lock().unwrap().insert(url.to_string(), status);
        self
    }

    pub(crate) fn posted(&self) -> Vec<String> {
        self.items
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, item)| item.posted)
            .map(|(_, item)| item.url.clone())
            .collect()
    }

    pub(crate) fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub(crate) fn fetches(&self) -> usize {
        *self.fetches.lock().unwrap()
    }
}

#[async_trait]
impl RepositorySource for FakeSource {
    async fn fetch(&self, query: &RepositoryQuery) -> Result<RepositoryPage, SourceError> {
        *self.fetches.lock().unwrap() += 1;
        let items: Vec<RepositoryItem> = self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|(language, item)| {
                language == &query.text_language && item.posted == query.posted
            })
            .take(query.limit as usize)
            .map(|(_, item)| item.clone())
            .collect();
        Ok(RepositoryPage {
            total_items: items.len() as i64,
            items,
            ..Default::default()
        })
    }

    async fn mark_posted(&self, url: &str, posted: bool) -> Result<bool, SourceError> {
        let mut items = self.items.lock().unwrap();
        let mut found = false;
        for (_, item) in items.iter_mut().filter(|(_, item)| item.url == url) {
            item.posted = posted;
            found = true;
        }
        Ok(found)
    }

    async fn delete(&self, url: &str) -> Result<(), SourceError> {
        self.items.lock().unwrap().retain(|(_, item)| item.url != url);
        self.deleted.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn check_url(&self, url: &str) -> Result<u16, SourceError> {
        Ok(self.probes.lock().unwrap().get(url).copied().unwrap_or(200))
    }
}

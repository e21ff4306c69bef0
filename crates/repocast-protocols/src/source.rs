//! External content collaborators: the repository source, the generation
//! trigger and the cover image renderer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::SourceError;
use crate::generate::{GenerateRequest, GenerateResponse};

/// A repository summary awaiting (or past) publication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryItem {
    pub id: i64,
    #[serde(default)]
    pub posted: bool,
    pub url: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub date_added: Option<String>,
    #[serde(default)]
    pub date_posted: Option<String>,
}

impl RepositoryItem {
    /// `owner/repo` path of a GitHub URL.
    pub fn repo_path(&self) -> &str {
        let trimmed = self
            .url
            .strip_prefix("https://github.com/")
            .unwrap_or(&self.url);
        trimmed.trim_end_matches('/')
    }
}

/// Selection of repository items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryQuery {
    pub limit: u32,
    pub posted: bool,
    pub sort_order: String,
    pub sort_by: String,
    pub text_language: String,
}

impl RepositoryQuery {
    /// The oldest unposted item in `language`.
    pub fn next_unposted(language: impl Into<String>) -> Self {
        Self {
            limit: 1,
            posted: false,
            sort_order: "ASC".to_string(),
            sort_by: "date_added".to_string(),
            text_language: language.into(),
        }
    }
}

/// A page of repository items with upstream counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryPage {
    #[serde(default)]
    pub all: i64,
    #[serde(default)]
    pub posted: i64,
    #[serde(default)]
    pub unposted: i64,
    #[serde(default)]
    pub items: Vec<RepositoryItem>,
    #[serde(default)]
    pub page: i64,
    #[serde(default)]
    pub page_size: i64,
    #[serde(default)]
    pub total_pages: i64,
    #[serde(default)]
    pub total_items: i64,
}

impl RepositoryPage {
    pub fn first(&self) -> Option<&RepositoryItem> {
        self.items.first()
    }
}

/// Source of repository items owned by the upstream content service.
#[async_trait]
pub trait RepositorySource: Send + Sync {
    /// Fetch items matching the query.
    async fn fetch(&self, query: &RepositoryQuery) -> Result<RepositoryPage, SourceError>;

    /// Set the posted flag of the item with `url`. Returns whether upstream accepted it.
    async fn mark_posted(&self, url: &str, posted: bool) -> Result<bool, SourceError>;

    /// Delete the item with `url` upstream.
    async fn delete(&self, url: &str) -> Result<(), SourceError>;

    /// Probe `url` without following redirects and return the status code.
    async fn check_url(&self, url: &str) -> Result<u16, SourceError>;
}

/// Trigger for the upstream content-generation pipeline.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, SourceError>;
}

/// Renders a cover image for a repository.
#[async_trait]
pub trait CoverImageProvider: Send + Sync {
    /// Render the image for `repo_path` (`owner/repo`) into `dest`.
    async fn render(&self, repo_path: &str, dest: &Path) -> Result<(), SourceError>;
}

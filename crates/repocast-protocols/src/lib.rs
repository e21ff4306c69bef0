//! # Repocast Protocols
//!
//! Shared data model and collaborator interfaces for Repocast.
//! Contains only type and trait definitions - no implementations.
//!
//! ## Core Traits
//!
//! - [`SettingsStore`] - Job settings, execution history and endpoint persistence
//! - [`RepositorySource`] - Upstream repository items awaiting publication
//! - [`ContentGenerator`] - Upstream content-generation trigger
//! - [`CoverImageProvider`] - Generated cover images for repositories

pub mod endpoint;
pub mod error;
pub mod generate;
pub mod history;
pub mod job;
pub mod settings;
pub mod source;
pub mod store;

pub use endpoint::{
    AuthType, ContentType, EndpointConfig, EndpointRequest, EndpointResponse, ResponseType,
    DEFAULT_TIMEOUT_SECS,
};
pub use error::{ExecutorError, SourceError, StoreError};
pub use generate::{GenerateRequest, GenerateResponse, LlmConfig, LlmMessage};
pub use history::{HistoryPage, HistoryQuery, PageInfo, SortOrder};
pub use job::{
    truncate_output, ExecutionRecord, JobOutcome, JobSetting, JobStatus, JOB_COLLECT, JOB_MESSAGE,
    MAX_OUTPUT_CHARS, TRUNCATION_MARKER,
};
pub use settings::{CollectSettings, PromptSettings, PromptSettingsUpdate};
pub use source::{
    ContentGenerator, CoverImageProvider, RepositoryItem, RepositoryPage, RepositoryQuery,
    RepositorySource,
};
pub use store::{validate_job_name, SettingsStore};

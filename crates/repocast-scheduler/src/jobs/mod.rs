//! Job bodies and the context they run against.
//!
//! Jobs never return errors: every failure becomes a [`JobOutcome`] with a
//! human-readable message.

pub mod collect;
pub mod message;

use std::fmt;
use std::sync::Arc;

use repocast_config::ImageConfig;
use repocast_executor::ApiExecutor;
use repocast_protocols::{
    ContentGenerator, CoverImageProvider, JobOutcome, RepositorySource, SettingsStore,
    JOB_COLLECT, JOB_MESSAGE,
};

/// The known jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    /// Triggers upstream content generation.
    Collect,
    /// Publishes one repository to every enabled endpoint.
    Message,
}

impl JobKind {
    pub const ALL: [JobKind; 2] = [JobKind::Collect, JobKind::Message];

    pub fn name(self) -> &'static str {
        match self {
            JobKind::Collect => JOB_COLLECT,
            JobKind::Message => JOB_MESSAGE,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Run the job body once.
    pub async fn run(self, ctx: &JobContext) -> JobOutcome {
        match self {
            JobKind::Collect => collect::run(ctx).await,
            JobKind::Message => message::run(ctx).await,
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Collaborators shared by all job runs.
pub struct JobContext {
    pub store: Arc<dyn SettingsStore>,
    pub executor: Arc<ApiExecutor>,
    pub source: Arc<dyn RepositorySource>,
    pub generator: Arc<dyn ContentGenerator>,
    pub renderer: Arc<dyn CoverImageProvider>,
    pub images: ImageConfig,
}

//! Spawns wrapped job runs and reports panics.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, warn};

use repocast_protocols::JobOutcome;

use crate::error::SchedulerError;
use crate::jobs::{JobContext, JobKind};
use crate::wrapper::{panic_message, run_recorded};

/// A job run that panicked after its failure was recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPanic {
    pub name: String,
    pub message: String,
}

/// Runs jobs in their own tasks through the execution wrapper.
pub struct JobRunner {
    context: Arc<JobContext>,
    panics: mpsc::UnboundedSender<JobPanic>,
}

impl JobRunner {
    /// Create a runner and the receiver its panics are reported on.
    pub fn new(context: Arc<JobContext>) -> (Self, mpsc::UnboundedReceiver<JobPanic>) {
        let (panics, receiver) = mpsc::unbounded_channel();
        (Self { context, panics }, receiver)
    }

    pub fn context(&self) -> &Arc<JobContext> {
        &self.context
    }

    /// Run `kind` once and wait for its outcome.
    pub async fn run(&self, kind: JobKind) -> Result<JobOutcome, SchedulerError> {
        let ctx = self.context.clone();
        self.spawn_recorded(kind.name(), async move { kind.run(&ctx).await })
            .await
    }

    pub(crate) async fn spawn_recorded<F>(
        &self,
        name: &str,
        body: F,
    ) -> Result<JobOutcome, SchedulerError>
    where
        F: Future<Output = JobOutcome> + Send + 'static,
    {
        let store = self.context.store.clone();
        let task_name = name.to_string();
        let handle =
            tokio::spawn(async move { run_recorded(store.as_ref(), &task_name, body).await });

        match handle.await {
            Ok(outcome) => Ok(outcome),
            Err(e) if e.is_panic() => {
                let message = panic_message(e.into_panic().as_ref());
                error!("Job '{}' crashed: {}", name, message);
                let report = JobPanic {
                    name: name.to_string(),
                    message: message.clone(),
                };
                if self.panics.send(report).is_err() {
                    warn!("No listener for panic of job '{}'", name);
                }
                Err(SchedulerError::Panicked {
                    name: name.to_string(),
                    message,
                })
            }
            Err(e) => Err(SchedulerError::Aborted {
                name: name.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

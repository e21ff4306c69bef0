//! Job execution wrapper.
//!
//! Every run goes through [`run_recorded`], which writes exactly one
//! execution record per run. A panicking body is recorded as failed with the
//! panic value in the output, and the panic is then resumed.

use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tracing::{error, info, warn};

use repocast_protocols::{JobOutcome, JobStatus, SettingsStore};

/// Run `body`, record its outcome under `name` and return it.
///
/// Panics inside `body` are recorded, logged and resumed.
pub async fn run_recorded<F>(store: &dyn SettingsStore, name: &str, body: F) -> JobOutcome
where
    F: Future<Output = JobOutcome>,
{
    info!("Starting job '{}'", name);

    match AssertUnwindSafe(body).catch_unwind().await {
        Ok(outcome) => {
            record(store, name, &outcome).await;
            outcome
        }
        Err(payload) => {
            let message = format!("Job panicked: {}", panic_message(payload.as_ref()));
            error!("Job '{}' panicked: {}", name, message);
            record(store, name, &JobOutcome::failed(&message)).await;
            std::panic::resume_unwind(payload)
        }
    }
}

async fn record(store: &dyn SettingsStore, name: &str, outcome: &JobOutcome) {
    match outcome.status {
        JobStatus::Ok => info!("Job '{}' finished: {}", name, outcome.message),
        JobStatus::Partial => warn!("Job '{}' partially succeeded: {}", name, outcome.message),
        JobStatus::Failed => error!("Job '{}' failed: {}", name, outcome.message),
    }

    if let Err(e) = store
        .log_execution(name, outcome.status, &outcome.message)
        .await
    {
        error!("Failed to record execution of job '{}': {}", name, e);
    }
}

/// Text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repocast_protocols::HistoryQuery;
    use repocast_store::MemoryStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_records_outcome() {
        let store = MemoryStore::new();
        let outcome = run_recorded(&store, "collect", async {
            JobOutcome::partial("Partially collected 1 repositories. Failed: 1.")
        })
        .await;
        assert_eq!(outcome.status, JobStatus::Partial);

        let history = store
            .get_execution_history(&HistoryQuery::new())
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].name, "collect");
        assert_eq!(history[0].status, JobStatus::Partial);
    }

    async fn panicking_body() -> JobOutcome {
        panic!("image directory vanished")
    }

    #[tokio::test]
    async fn test_panic_is_recorded_and_resumed() {
        let store = Arc::new(MemoryStore::new());
        let task_store = store.clone();

        let handle = tokio::spawn(async move {
            run_recorded(task_store.as_ref(), "message", panicking_body()).await
        });

        let err = handle.await.unwrap_err();
        assert!(err.is_panic());
        assert_eq!(
            panic_message(err.into_panic().as_ref()),
            "image directory vanished"
        );

        let history = store
            .get_execution_history(&HistoryQuery::new())
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, JobStatus::Failed);
        assert!(history[0].output.contains("image directory vanished"));
    }

    #[test]
    fn test_panic_message_payloads() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(owned.as_ref()), "owned");
        let other: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(other.as_ref()), "unknown panic payload");
    }
}

//! Tests for the collect job.

use super::*;
use crate::test_support::{context, image_config, seeded_store};
use repocast_protocols::JobStatus;
use repocast_store::MemoryStore;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const AUTO_GENERATE: &str = "/think-root/api/auto-generate/";

fn response(status: &str, added: &[&str], dont_added: &[&str], error: &str) -> GenerateResponse {
    GenerateResponse {
        status: status.to_string(),
        added: added.iter().map(|s| s.to_string()).collect(),
        dont_added: dont_added.iter().map(|s| s.to_string()).collect(),
        error_message: error.to_string(),
    }
}

#[test]
fn test_classify_ok() {
    let outcome = classify(&response("ok", &["a", "b"], &[], ""));
    assert_eq!(outcome, JobOutcome::ok("Collected 2 repositories."));

    let outcome = classify(&response("ok", &["a"], &["b", "c"], ""));
    assert_eq!(
        outcome.message,
        "Collected 1 repositories. Already exists 2 repositories."
    );
}

#[test]
fn test_classify_partial() {
    let outcome = classify(&response("partial", &["a"], &["b"], "rate limited"));
    assert_eq!(outcome.status, JobStatus::Partial);
    assert_eq!(
        outcome.message,
        "Partially collected 1 repositories. Failed: 1. Error: rate limited"
    );
}

#[test]
fn test_classify_error() {
    let outcome = classify(&response("error", &[], &["x/y", "z/w"], "LLM unavailable"));
    assert_eq!(outcome.status, JobStatus::Failed);
    assert_eq!(
        outcome.message,
        "API error: LLM unavailable. Failed repositories: [x/y z/w]"
    );

    let outcome = classify(&response("error", &[], &[], ""));
    assert_eq!(
        outcome.message,
        "API returned error status without error message"
    );
}

#[test]
fn test_classify_unknown_status() {
    let outcome = classify(&response("queued", &[], &[], ""));
    assert_eq!(outcome, JobOutcome::failed("API returned unknown status: queued"));
}

#[tokio::test]
async fn test_run_sends_stored_settings() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(AUTO_GENERATE))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(json!({
            "max_repos": 5,
            "resource": "github",
            "period": "past_24_hours",
            "llm_provider": "openrouter",
            "llm_output_language": "en,uk"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "added": ["https://github.com/a/b", "https://github.com/c/d"],
            "dont_added": ["https://github.com/e/f"],
            "error_message": ""
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let ctx = context(
        &server.uri(),
        seeded_store().await,
        vec![],
        image_config(&dir, &server.uri()),
    )
    .await;

    let outcome = run(&ctx).await;
    assert_eq!(
        outcome,
        JobOutcome::ok("Collected 2 repositories. Already exists 1 repositories.")
    );
}

#[tokio::test]
async fn test_run_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let ctx = context(
        &server.uri(),
        seeded_store().await,
        vec![],
        image_config(&dir, &server.uri()),
    )
    .await;

    let outcome = run(&ctx).await;
    assert_eq!(outcome.status, JobStatus::Failed);
    assert_eq!(
        outcome.message,
        "API returned HTTP error: 500 Internal Server Error"
    );
}

#[tokio::test]
async fn test_run_without_settings() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let ctx = context(
        &server.uri(),
        Arc::new(MemoryStore::new()),
        vec![],
        image_config(&dir, &server.uri()),
    )
    .await;

    let outcome = run(&ctx).await;
    assert_eq!(outcome.status, JobStatus::Failed);
    assert!(outcome.message.starts_with("Failed to get collect settings"));
}

use super::*;
use chrono::NaiveDate;
use repocast_protocols::{AuthType, ContentType, TRUNCATION_MARKER};
use tempfile::TempDir;

async fn store() -> SqliteStore {
    let store = SqliteStore::in_memory().await.unwrap();
    store.initialize_defaults().await.unwrap();
    store
}

#[tokio::test]
async fn test_backend_id() {
    let store = SqliteStore::in_memory().await.unwrap();
    assert_eq!(store.id(), "sqlite");
}

#[tokio::test]
async fn test_defaults() {
    let store = store().await;

    let collect = store.get_job_setting("collect").await.unwrap().unwrap();
    assert_eq!(collect.schedule, "13 13 * * 6");
    assert!(!collect.is_active);
    let message = store.get_job_setting("message").await.unwrap().unwrap();
    assert_eq!(message.schedule, "12 12 * * *");

    let settings = store.get_collect_settings().await.unwrap();
    assert_eq!(settings, CollectSettings {
        updated_at: settings.updated_at,
        ..CollectSettings::default()
    });

    let prompt = store.get_prompt_settings().await.unwrap();
    assert_eq!(prompt.llm_output_language, "en,uk");
    assert_eq!(prompt.temperature, 0.2);
}

#[tokio::test]
async fn test_defaults_keep_existing_rows() {
    let store = store().await;
    store
        .upsert_job_setting("collect", "0 0 * * *", true)
        .await
        .unwrap();
    store
        .update_prompt_settings(&PromptSettingsUpdate {
            model: Some("custom/model".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    store.initialize_defaults().await.unwrap();

    let collect = store.get_job_setting("collect").await.unwrap().unwrap();
    assert_eq!(collect.schedule, "0 0 * * *");
    assert!(collect.is_active);
    assert_eq!(
        store.get_prompt_settings().await.unwrap().model,
        "custom/model"
    );
}

#[tokio::test]
async fn test_missing_settings_before_defaults() {
    let store = SqliteStore::in_memory().await.unwrap();
    assert!(matches!(
        store.get_collect_settings().await,
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        store.update_prompt_settings(&PromptSettingsUpdate::default()).await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_upsert_job_setting() {
    let store = store().await;
    let saved = store
        .upsert_job_setting("message", "*/10 * * * *", true)
        .await
        .unwrap();
    assert_eq!(saved.schedule, "*/10 * * * *");

    let all = store.get_all_job_settings().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].name, "message");
    assert!(all[1].is_active);
    assert_eq!(all[1].schedule, "*/10 * * * *");
}

#[tokio::test]
async fn test_history_truncation() {
    let store = store().await;
    let output = "y".repeat(15_000);
    store
        .log_execution("collect", JobStatus::Partial, &output)
        .await
        .unwrap();

    let rows = store
        .get_execution_history(&HistoryQuery::new())
        .await
        .unwrap();
    assert_eq!(rows[0].status, JobStatus::Partial);
    assert_eq!(rows[0].output.chars().count(), 9_980);
    assert!(rows[0].output.ends_with(TRUNCATION_MARKER));
}

#[tokio::test]
async fn test_history_order_and_window() {
    let store = store().await;
    for i in 0..4 {
        store
            .log_execution("message", JobStatus::Ok, &format!("run {}", i))
            .await
            .unwrap();
    }
    store
        .log_execution("collect", JobStatus::Failed, "boom")
        .await
        .unwrap();

    let query = HistoryQuery::new().with_name("message");
    assert_eq!(store.count_execution_history(&query).await.unwrap(), 4);

    let latest = store
        .get_execution_history(&query.clone().with_window(0, 2))
        .await
        .unwrap();
    assert_eq!(latest[0].output, "run 3");
    assert_eq!(latest[1].output, "run 2");

    let oldest = store
        .get_execution_history(&query.with_sort(SortOrder::Asc).with_window(3, 10))
        .await
        .unwrap();
    assert_eq!(oldest.len(), 1);
    assert_eq!(oldest[0].output, "run 3");

    let failed = HistoryQuery::new().with_status(JobStatus::Failed);
    assert_eq!(store.count_execution_history(&failed).await.unwrap(), 1);
}

#[tokio::test]
async fn test_history_date_range() {
    let store = store().await;
    store
        .log_execution("message", JobStatus::Ok, "today")
        .await
        .unwrap();

    let today = Utc::now().date_naive();
    let inclusive = HistoryQuery::new().with_date_range(Some(today), Some(today));
    assert_eq!(store.count_execution_history(&inclusive).await.unwrap(), 1);

    let past = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let before = HistoryQuery::new().with_date_range(None, Some(past));
    assert_eq!(store.count_execution_history(&before).await.unwrap(), 0);
}

#[tokio::test]
async fn test_collect_settings_round_trip() {
    let store = store().await;
    let mut settings = store.get_collect_settings().await.unwrap();
    settings.max_repos = 9;
    settings.period = "past_week".to_string();
    store.update_collect_settings(&settings).await.unwrap();

    let stored = store.get_collect_settings().await.unwrap();
    assert_eq!(stored.max_repos, 9);
    assert_eq!(stored.period, "past_week");
}

#[tokio::test]
async fn test_endpoint_crud() {
    let store = store().await;
    let endpoint = EndpointConfig::new("twitter", "https://x.example.com/{env.X_PATH}")
        .with_bearer_auth("X_TOKEN")
        .with_content_type(ContentType::Multipart)
        .with_generated_image(true)
        .with_header("X-Client", "repocast");
    store.save_endpoint(&endpoint).await.unwrap();
    store
        .save_endpoint(&EndpointConfig::new("bluesky", "https://bsky.example.com").with_enabled(false))
        .await
        .unwrap();

    let loaded = store.get_endpoint("twitter").await.unwrap().unwrap();
    assert_eq!(loaded.auth_type, AuthType::Bearer);
    assert_eq!(loaded.content_type, ContentType::Multipart);
    assert!(loaded.uses_generated_image);
    assert_eq!(loaded.headers["X-Client"], "repocast");
    assert!(loaded.updated_at.is_some());

    let names: Vec<_> = store
        .get_all_endpoints()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, vec!["bluesky", "twitter"]);

    store.delete_endpoint("bluesky").await.unwrap();
    assert!(matches!(
        store.delete_endpoint("bluesky").await,
        Err(StoreError::NotFound(_))
    ));
    assert!(store.get_endpoint("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_persistence_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("repocast.db");

    {
        let store = SqliteStore::open(&path).await.unwrap();
        store.initialize_defaults().await.unwrap();
        store
            .upsert_job_setting("message", "0 9 * * *", true)
            .await
            .unwrap();
        store
            .log_execution("message", JobStatus::Ok, "Published to: twitter")
            .await
            .unwrap();
    }

    let store = SqliteStore::open(&path).await.unwrap();
    let message = store.get_job_setting("message").await.unwrap().unwrap();
    assert_eq!(message.schedule, "0 9 * * *");
    assert!(message.is_active);
    let rows = store
        .get_execution_history(&HistoryQuery::new())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].output, "Published to: twitter");
}

//! Process bootstrap: tracing, storage, collaborators and the scheduler.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use repocast_api::{ApiServer, ApiServerConfig, ApiState};
use repocast_config::{Config, ConfigValidator, LoggingConfig};
use repocast_content::{files, ContentServiceClient, SocialifyRenderer};
use repocast_executor::{ApiExecutor, EndpointRegistry};
use repocast_protocols::{EndpointConfig, RepositorySource, SettingsStore};
use repocast_scheduler::{JobAdmin, JobContext, JobPanic, SchedulerRegistry};
use repocast_store::open_store;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Initialize tracing with console output and daily rolling log files.
pub(crate) fn init_tracing(logging: &LoggingConfig) -> Result<(), BoxError> {
    std::fs::create_dir_all(&logging.dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("repocast")
        .filename_suffix("log")
        .max_log_files(logging.max_files.max(1))
        .build(&logging.dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Flushes buffered lines on exit.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .try_init()?;

    Ok(())
}

/// Validate `config`, logging warnings. Fails on the first error set.
pub(crate) fn validate(config: &Config) -> Result<(), BoxError> {
    let result = ConfigValidator::validate(config)?;
    for warning in &result.warnings {
        warn!("Config warning at {}: {}", warning.path, warning.message);
    }
    result.into_error()?;
    Ok(())
}

/// Everything a job run needs, wired from configuration.
pub(crate) struct Runtime {
    pub registry: Arc<SchedulerRegistry>,
    pub executor: Arc<ApiExecutor>,
    pub panics: mpsc::UnboundedReceiver<JobPanic>,
}

pub(crate) async fn bootstrap(config: &Config) -> Result<Runtime, BoxError> {
    let store = open_store(&config.storage.backend, &config.storage.path).await?;
    store.initialize_defaults().await?;
    info!(
        "Settings store ready ({} at {})",
        store.id(),
        config.storage.path.display()
    );

    seed_endpoints(store.as_ref(), config).await?;

    let registry = EndpointRegistry::from_store(store.as_ref()).await?;
    info!(
        "Loaded {} endpoint(s), {} enabled",
        registry.len(),
        registry.enabled().len()
    );
    let executor = Arc::new(ApiExecutor::new(registry)?);

    let service = &config.content_service;
    let client = Arc::new(
        ContentServiceClient::new(service.base_url.clone(), service.bearer_token.clone())?
            .with_request_timeout(service.request_timeout())
            .with_generation_timeout(service.generation_timeout()),
    );
    let renderer = Arc::new(SocialifyRenderer::new(config.images.renderer_url.clone())?);

    files::ensure_dir(&config.images.dir).await?;

    let source: Arc<dyn RepositorySource> = client.clone();
    let context = Arc::new(JobContext {
        store,
        executor: executor.clone(),
        source,
        generator: client,
        renderer,
        images: config.images.clone(),
    });

    let (registry, panics) = SchedulerRegistry::new(context);
    Ok(Runtime {
        registry,
        executor,
        panics,
    })
}

/// Save the configured endpoint definitions when the store holds none.
async fn seed_endpoints(store: &dyn SettingsStore, config: &Config) -> Result<(), BoxError> {
    if !store.get_all_endpoints().await?.is_empty() {
        return Ok(());
    }

    let definitions = endpoint_definitions(config)?;
    for endpoint in &definitions {
        ConfigValidator::validate_endpoint(endpoint)?.into_error()?;
        store.save_endpoint(endpoint).await?;
    }
    if !definitions.is_empty() {
        info!("Seeded {} endpoint(s) from configuration", definitions.len());
    }
    Ok(())
}

/// Endpoints from `endpoints_file` overlaid by the `[endpoints]` tables.
fn endpoint_definitions(config: &Config) -> Result<Vec<EndpointConfig>, BoxError> {
    let mut merged = BTreeMap::new();

    if let Some(ref path) = config.endpoints_file {
        let file = EndpointRegistry::from_file(path)?;
        info!("Read {} endpoint(s) from {}", file.len(), path.display());
        for endpoint in file.all() {
            merged.insert(endpoint.name.clone(), endpoint.clone());
        }
    }
    for endpoint in config.endpoint_definitions() {
        merged.insert(endpoint.name.clone(), endpoint);
    }

    Ok(merged.into_values().collect())
}

/// Run the scheduler and the admin API until Ctrl-C or a job panic.
pub(crate) async fn run_server(config: Config) -> Result<(), BoxError> {
    info!("Starting Repocast v{}", env!("CARGO_PKG_VERSION"));

    let Runtime {
        registry,
        executor,
        mut panics,
    } = bootstrap(&config).await?;

    let started = registry.start_from_store().await?;
    info!("Scheduler started with {} active job(s)", started);

    let admin = Arc::new(JobAdmin::new(registry.clone()));
    let state = ApiState::new(admin, executor).with_api_token(config.server.api_token.clone());
    let server = ApiServer::new(
        ApiServerConfig::new(config.server.host.clone(), config.server.port),
        state,
    );

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut server_task = tokio::spawn(async move {
        server
            .run(async move {
                let _ = stop_rx.await;
            })
            .await
    });

    let (outcome, server_done): (Result<(), BoxError>, bool) = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            (Ok(()), false)
        }
        Some(panic) = panics.recv() => {
            error!("Job '{}' panicked: {}", panic.name, panic.message);
            (Err(format!("job '{}' panicked: {}", panic.name, panic.message).into()), false)
        }
        joined = &mut server_task => {
            let result = match joined {
                Ok(Ok(())) => Err("admin API stopped unexpectedly".into()),
                Ok(Err(e)) => Err(e),
                Err(e) => Err(e.into()),
            };
            (result, true)
        }
    };

    registry.shutdown().await;
    let _ = stop_tx.send(());
    if !server_done {
        match tokio::time::timeout(Duration::from_secs(10), server_task).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => warn!("Admin API stopped with error: {}", e),
            Ok(Err(e)) => warn!("Admin API task failed: {}", e),
            Err(_) => warn!("Admin API did not stop within 10s"),
        }
    }

    info!("Repocast stopped");
    outcome
}

/// Run one job through the wrapper and print its outcome.
pub(crate) async fn run_job(config: Config, name: &str) -> Result<(), BoxError> {
    let Runtime { registry, .. } = bootstrap(&config).await?;
    registry.start_from_store().await?;

    let outcome = registry.run_now(name).await;
    registry.shutdown().await;
    let outcome = outcome?;

    println!("{}: {}", outcome.status, outcome.message);
    Ok(())
}

/// Validate the configuration and print the result.
pub(crate) fn check_config(config: &Config) -> Result<(), BoxError> {
    let result = ConfigValidator::validate(config)?;
    for warning in &result.warnings {
        println!("warning: {}: {}", warning.path, warning.message);
    }
    for error in &result.errors {
        println!("error: {}: {}", error.path, error.message);
    }

    result.into_error()?;

    let definitions = endpoint_definitions(config)?;
    for endpoint in &definitions {
        ConfigValidator::validate_endpoint(endpoint)?.into_error()?;
    }
    println!(
        "Configuration is valid ({} endpoint definition(s))",
        definitions.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use repocast_config::ConfigLoader;
    use tempfile::TempDir;

    fn memory_config(dir: &TempDir) -> Config {
        let mut config = ConfigLoader::load_str(
            r#"
[storage]
backend = "memory"

[content_service]
base_url = "http://127.0.0.1:9"
bearer_token = "test-token"

[endpoints.telegram]
url = "https://api.telegram.org/bot{env.TG_TOKEN}/sendMessage"
method = "POST"
"#,
        )
        .unwrap();
        config.images.dir = dir.path().join("images");
        config
    }

    #[tokio::test]
    async fn test_bootstrap_seeds_endpoints_and_defaults() {
        let dir = TempDir::new().unwrap();
        let config = memory_config(&dir);

        let runtime = bootstrap(&config).await.unwrap();
        let registry = runtime.executor.registry().await;
        assert_eq!(registry.len(), 1);
        assert!(registry.get("telegram").is_some());
        assert!(config.images.dir.exists());

        let started = runtime.registry.start_from_store().await.unwrap();
        assert_eq!(started, 0);
        let states = runtime.registry.statuses().await;
        assert_eq!(states.len(), 2);
        runtime.registry.shutdown().await;
    }

    #[tokio::test]
    async fn test_bootstrap_seeds_from_endpoint_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("apis.yml");
        std::fs::write(
            &file,
            r#"
apis:
  telegram:
    url: "https://old.example/send"
    method: POST
  mastodon:
    url: "https://mastodon.example/api/v1/statuses"
    method: POST
    auth_type: bearer
    token_env_var: MASTODON_TOKEN
    text_language: uk
"#,
        )
        .unwrap();

        let mut config = memory_config(&dir);
        config.endpoints_file = Some(file);

        let runtime = bootstrap(&config).await.unwrap();
        let registry = runtime.executor.registry().await;
        let names: Vec<&str> = registry.all().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["mastodon", "telegram"]);
        assert_eq!(registry.get("mastodon").unwrap().text_language, "uk");
        assert_eq!(
            registry.get("telegram").unwrap().url,
            "https://api.telegram.org/bot{env.TG_TOKEN}/sendMessage"
        );
    }

    #[tokio::test]
    async fn test_bootstrap_fails_on_missing_endpoint_file() {
        let dir = TempDir::new().unwrap();
        let mut config = memory_config(&dir);
        config.endpoints_file = Some(dir.path().join("missing.yml"));

        assert!(bootstrap(&config).await.is_err());
        assert!(check_config(&config).is_err());
    }

    #[tokio::test]
    async fn test_seed_rejects_invalid_endpoint() {
        let dir = TempDir::new().unwrap();
        let mut config = memory_config(&dir);
        if let Some(endpoint) = config.endpoints.get_mut("telegram") {
            endpoint.method = "FETCH".to_string();
        }

        assert!(bootstrap(&config).await.is_err());
    }

    #[test]
    fn test_shipped_default_config_is_valid() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config/default.toml");
        let config = ConfigLoader::load(&path).unwrap();
        assert_eq!(config.endpoint_definitions().len(), 2);
        assert!(check_config(&config).is_ok());
    }

    #[test]
    fn test_check_config() {
        let dir = TempDir::new().unwrap();
        let mut config = memory_config(&dir);
        assert!(check_config(&config).is_ok());

        config.server.port = 0;
        assert!(check_config(&config).is_err());
    }
}

//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use repocast_protocols::EndpointConfig;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub content_service: ContentServiceConfig,

    #[serde(default)]
    pub images: ImageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// `.yaml`/`.yml` or TOML file with an `apis` table, also used to seed
    /// an empty store. Tables under `[endpoints]` win on name clashes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoints_file: Option<PathBuf>,

    /// Endpoint definitions used to seed an empty store.
    #[serde(default)]
    pub endpoints: BTreeMap<String, EndpointConfig>,
}

impl Config {
    /// Endpoint definitions with names taken from their table keys.
    pub fn endpoint_definitions(&self) -> Vec<EndpointConfig> {
        self.endpoints
            .iter()
            .map(|(name, endpoint)| {
                let mut endpoint = endpoint.clone();
                endpoint.name = name.clone();
                endpoint
            })
            .collect()
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// - `CONTENT_SERVICE_URL`, `CONTENT_SERVICE_TOKEN`: replace when non-empty.
    /// - `CONTENT_SERVICE_TIMEOUT`: generation timeout in seconds; an
    ///   unparsable value falls back to the default, `0` disables the timeout.
    /// - `API_PORT`: server port when it parses.
    /// - `PUBLIC_BASE_URL`: public URL prefix of generated images.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty("CONTENT_SERVICE_URL") {
            self.content_service.base_url = url;
        }
        if let Some(token) = non_empty("CONTENT_SERVICE_TOKEN") {
            self.content_service.bearer_token = token;
        }
        if let Some(timeout) = non_empty("CONTENT_SERVICE_TIMEOUT") {
            self.content_service.generation_timeout_seconds = timeout
                .trim()
                .parse()
                .unwrap_or_else(|_| default_generation_timeout());
        }
        if let Some(port) = non_empty("API_PORT").and_then(|p| p.trim().parse().ok()) {
            self.server.port = port;
        }
        if let Some(base) = non_empty("PUBLIC_BASE_URL") {
            self.images.public_base_url = Some(base);
        }
    }
}

/// Admin server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token required by the admin routes. Open when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_token: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Settings store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend type ("sqlite" or "memory").
    #[serde(default = "default_backend")]
    pub backend: String,

    /// SQLite database path.
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_storage_path(),
        }
    }
}

fn default_backend() -> String {
    "sqlite".to_string()
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("data/repocast.db")
}

/// Upstream content service (repository items and generation trigger).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentServiceConfig {
    #[serde(default)]
    pub base_url: String,

    #[serde(default)]
    pub bearer_token: String,

    /// Timeout of repository calls.
    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: u64,

    /// Timeout of the generation trigger; 0 disables it.
    #[serde(default = "default_generation_timeout")]
    pub generation_timeout_seconds: u64,
}

impl ContentServiceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// `None` when the generation call must not time out.
    pub fn generation_timeout(&self) -> Option<Duration> {
        match self.generation_timeout_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

impl Default for ContentServiceConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            bearer_token: String::new(),
            timeout_seconds: default_request_timeout(),
            generation_timeout_seconds: default_generation_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    30
}

fn default_generation_timeout() -> u64 {
    300
}

/// Generated cover images.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Scratch directory; emptied after every publishing run.
    #[serde(default = "default_image_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_image_file_name")]
    pub file_name: String,

    /// Static image used when rendering fails.
    #[serde(default = "default_placeholder")]
    pub placeholder: PathBuf,

    /// Public URL prefix under which `dir` is served.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_base_url: Option<String>,

    #[serde(default = "default_attempts")]
    pub attempts: u32,

    #[serde(default = "default_retry_interval")]
    pub retry_interval_seconds: u64,

    #[serde(default = "default_renderer_url")]
    pub renderer_url: String,
}

impl ImageConfig {
    pub fn image_path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_seconds)
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            dir: default_image_dir(),
            file_name: default_image_file_name(),
            placeholder: default_placeholder(),
            public_base_url: None,
            attempts: default_attempts(),
            retry_interval_seconds: default_retry_interval(),
            renderer_url: default_renderer_url(),
        }
    }
}

fn default_image_dir() -> PathBuf {
    PathBuf::from("./tmp/gh_project_img")
}

fn default_image_file_name() -> String {
    "image.png".to_string()
}

fn default_placeholder() -> PathBuf {
    PathBuf::from("./assets/banner.jpg")
}

fn default_attempts() -> u32 {
    5
}

fn default_retry_interval() -> u64 {
    20
}

fn default_renderer_url() -> String {
    "https://socialify.git.ci".to_string()
}

/// Log file output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,

    /// Number of daily log files kept.
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_max_log_files() -> usize {
    30
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;

//! Outbound API endpoint definitions and the request/response pair the
//! generic executor works with.
//!
//! An endpoint is pure data: url template, method, auth scheme, payload
//! encoding and success criterion. Adding an integration means adding a row,
//! not code.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::time::Duration;

/// Timeout applied when an endpoint does not configure one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Authentication scheme for an endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    #[default]
    #[serde(alias = "")]
    None,
    Bearer,
    ApiKey,
}

/// Request body encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    #[default]
    Json,
    Multipart,
}

/// How a successful response body is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    Json,
    #[default]
    #[serde(other)]
    Text,
}

/// Configuration of one outbound integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Unique name. Filled from the table key when loaded from a file.
    #[serde(default)]
    pub name: String,

    /// URL template with `{param}` and `{env.NAME}` placeholders.
    pub url: String,

    #[serde(default = "default_method")]
    pub method: String,

    /// Static headers; values may contain `{env.NAME}`.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    #[serde(default)]
    pub auth_type: AuthType,

    /// Environment variable holding the credential.
    #[serde(default)]
    pub token_env_var: String,

    /// Header carrying the credential for `api_key` auth.
    #[serde(default)]
    pub token_header: String,

    #[serde(default)]
    pub content_type: ContentType,

    /// Timeout in seconds; 0 means [`DEFAULT_TIMEOUT_SECS`].
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// The only status code counted as success.
    #[serde(default = "default_success_code")]
    pub success_code: u16,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub response_type: ResponseType,

    /// Language of the repository text published here.
    #[serde(default = "default_text_language")]
    pub text_language: String,

    /// Whether posts to this endpoint carry the generated cover image.
    #[serde(default, alias = "socialify_image")]
    pub uses_generated_image: bool,

    /// Extra JSON fields sent with every JSON post.
    #[serde(default)]
    pub default_json_body: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_method() -> String {
    "POST".to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_success_code() -> u16 {
    200
}

fn default_enabled() -> bool {
    true
}

fn default_text_language() -> String {
    "en".to_string()
}

impl EndpointConfig {
    /// Create an enabled JSON endpoint with default settings.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            method: default_method(),
            headers: BTreeMap::new(),
            auth_type: AuthType::None,
            token_env_var: String::new(),
            token_header: String::new(),
            content_type: ContentType::Json,
            timeout: default_timeout(),
            success_code: default_success_code(),
            enabled: true,
            response_type: ResponseType::Text,
            text_language: default_text_language(),
            uses_generated_image: false,
            default_json_body: BTreeMap::new(),
            updated_at: None,
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_bearer_auth(mut self, env_var: impl Into<String>) -> Self {
        self.auth_type = AuthType::Bearer;
        self.token_env_var = env_var.into();
        self
    }

    pub fn with_api_key_auth(
        mut self,
        env_var: impl Into<String>,
        header: impl Into<String>,
    ) -> Self {
        self.auth_type = AuthType::ApiKey;
        self.token_env_var = env_var.into();
        self.token_header = header.into();
        self
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    pub fn with_success_code(mut self, code: u16) -> Self {
        self.success_code = code;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    pub fn with_text_language(mut self, language: impl Into<String>) -> Self {
        self.text_language = language.into();
        self
    }

    pub fn with_generated_image(mut self, uses_image: bool) -> Self {
        self.uses_generated_image = uses_image;
        self
    }

    pub fn with_default_json_field(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_json_body.insert(key.into(), value.into());
        self
    }

    /// Effective request timeout.
    pub fn timeout_duration(&self) -> Duration {
        if self.timeout == 0 {
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        } else {
            Duration::from_secs(self.timeout)
        }
    }

    /// Effective text language, `en` when unset.
    pub fn language(&self) -> &str {
        if self.text_language.trim().is_empty() {
            "en"
        } else {
            &self.text_language
        }
    }
}

/// A logical request against a named endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EndpointRequest {
    pub endpoint: String,
    pub url_params: HashMap<String, String>,
    /// Field map marshalled for JSON endpoints.
    pub json_body: Option<serde_json::Value>,
    /// Raw JSON bytes, used when no field map is given.
    pub raw_body: Option<Vec<u8>>,
    /// Multipart text fields, written first.
    pub form_fields: BTreeMap<String, String>,
    /// Multipart file fields: field name to file path.
    pub file_fields: BTreeMap<String, PathBuf>,
}

impl EndpointRequest {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    pub fn with_url_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.url_params.insert(key.into(), value.into());
        self
    }

    pub fn with_json_body(mut self, body: serde_json::Value) -> Self {
        self.json_body = Some(body);
        self
    }

    pub fn with_raw_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.raw_body = Some(body.into());
        self
    }

    pub fn with_form_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form_fields.insert(key.into(), value.into());
        self
    }

    pub fn with_file_field(mut self, key: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.file_fields.insert(key.into(), path.into());
        self
    }
}

/// Normalized result of an executed request.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointResponse {
    pub endpoint: String,
    pub success: bool,
    pub status_code: u16,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub response_time: Duration,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
#[path = "endpoint_tests.rs"]
mod tests;

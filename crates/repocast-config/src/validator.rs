//! Configuration validation.

use regex::Regex;

use repocast_protocols::{AuthType, EndpointConfig};

use crate::error::ConfigError;
use crate::schema::Config;

const VALID_METHODS: [&str; 5] = ["GET", "POST", "PUT", "DELETE", "PATCH"];
const VALID_BACKENDS: [&str; 2] = ["sqlite", "memory"];

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Collapse errors into a single [`ConfigError`], if any.
    pub fn into_error(self) -> Result<(), ConfigError> {
        match self.errors.first() {
            None => Ok(()),
            Some(first) => Err(ConfigError::InvalidValue {
                field: first.path.clone(),
                message: self
                    .errors
                    .iter()
                    .map(|e| format!("{}: {}", e.path, e.message))
                    .collect::<Vec<_>>()
                    .join("; "),
            }),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_server(config, &mut result);
        Self::validate_storage(config, &mut result);
        Self::validate_content_service(config, &mut result);
        Self::validate_images(config, &mut result);

        for endpoint in config.endpoint_definitions() {
            Self::check_endpoint(&endpoint, &format!("endpoints.{}", endpoint.name), &mut result)?;
        }

        Ok(result)
    }

    /// Validate a single endpoint definition.
    pub fn validate_endpoint(endpoint: &EndpointConfig) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();
        Self::check_endpoint(endpoint, &endpoint.name, &mut result)?;
        Ok(result)
    }

    fn validate_server(config: &Config, result: &mut ValidationResult) {
        if config.server.port == 0 {
            result.add_error(ValidationError::new("server.port", "Port cannot be 0"));
        }

        if config.server.host.is_empty() {
            result.add_error(ValidationError::new("server.host", "Host cannot be empty"));
        }

        if config.server.api_token.as_deref().is_some_and(str::is_empty) {
            result.add_warning(ValidationWarning::new(
                "server.api_token",
                "api_token is empty, admin routes are unprotected",
            ));
        }
    }

    fn validate_storage(config: &Config, result: &mut ValidationResult) {
        if !VALID_BACKENDS.contains(&config.storage.backend.as_str()) {
            result.add_error(ValidationError::new(
                "storage.backend",
                format!(
                    "Unknown storage backend '{}', valid values: {:?}",
                    config.storage.backend, VALID_BACKENDS
                ),
            ));
        }

        if config.storage.backend == "sqlite" && config.storage.path.as_os_str().is_empty() {
            result.add_error(ValidationError::new(
                "storage.path",
                "SQLite backend requires a database path",
            ));
        }

        if config.storage.backend == "memory" {
            result.add_warning(ValidationWarning::new(
                "storage.backend",
                "Memory backend loses settings and history on restart",
            ));
        }
    }

    fn validate_content_service(config: &Config, result: &mut ValidationResult) {
        let service = &config.content_service;
        if service.base_url.is_empty() {
            result.add_warning(ValidationWarning::new(
                "content_service.base_url",
                "base_url is not set, collect and message jobs will fail",
            ));
        } else if !is_http_url(&service.base_url) {
            result.add_error(ValidationError::new(
                "content_service.base_url",
                "base_url must start with http:// or https://",
            ));
        }

        if service.bearer_token.is_empty() {
            result.add_warning(ValidationWarning::new(
                "content_service.bearer_token",
                "bearer_token is not set, may need to be set via CONTENT_SERVICE_TOKEN",
            ));
        }

        if service.timeout_seconds == 0 {
            result.add_error(ValidationError::new(
                "content_service.timeout_seconds",
                "timeout_seconds must be greater than 0",
            ));
        }
    }

    fn validate_images(config: &Config, result: &mut ValidationResult) {
        let images = &config.images;
        if images.attempts == 0 {
            result.add_error(ValidationError::new(
                "images.attempts",
                "attempts must be greater than 0",
            ));
        }

        if images.file_name.is_empty() {
            result.add_error(ValidationError::new(
                "images.file_name",
                "file_name cannot be empty",
            ));
        }

        if let Some(ref base) = images.public_base_url {
            if !is_http_url(base) {
                result.add_error(ValidationError::new(
                    "images.public_base_url",
                    "public_base_url must start with http:// or https://",
                ));
            }
        }

        if !images.placeholder.exists() {
            result.add_warning(ValidationWarning::new(
                "images.placeholder",
                format!("Placeholder image does not exist: {:?}", images.placeholder),
            ));
        }
    }

    fn check_endpoint(
        endpoint: &EndpointConfig,
        prefix: &str,
        result: &mut ValidationResult,
    ) -> Result<(), ConfigError> {
        let name_re = Regex::new(r"^[a-zA-Z0-9_-]+$")
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        let field = |name: &str| format!("{}.{}", prefix, name);

        if !name_re.is_match(&endpoint.name) {
            result.add_error(ValidationError::new(
                field("name"),
                "name must contain only letters, digits, '_' or '-'",
            ));
        }

        if endpoint.url.trim().is_empty() {
            result.add_error(ValidationError::new(field("url"), "url cannot be empty"));
        }

        if !VALID_METHODS.contains(&endpoint.method.to_uppercase().as_str()) {
            result.add_error(ValidationError::new(
                field("method"),
                format!("method must be one of {:?}", VALID_METHODS),
            ));
        }

        if endpoint.timeout == 0 {
            result.add_error(ValidationError::new(
                field("timeout"),
                "timeout must be greater than 0",
            ));
        }

        if !(100..=599).contains(&endpoint.success_code) {
            result.add_error(ValidationError::new(
                field("success_code"),
                "success_code must be between 100 and 599",
            ));
        }

        match endpoint.auth_type {
            AuthType::None => {}
            AuthType::Bearer => {
                if endpoint.token_env_var.is_empty() {
                    result.add_error(ValidationError::new(
                        field("token_env_var"),
                        "bearer auth requires token_env_var",
                    ));
                }
            }
            AuthType::ApiKey => {
                if endpoint.token_env_var.is_empty() {
                    result.add_error(ValidationError::new(
                        field("token_env_var"),
                        "api_key auth requires token_env_var",
                    ));
                }
                if endpoint.token_header.is_empty() {
                    result.add_error(ValidationError::new(
                        field("token_header"),
                        "api_key auth requires token_header",
                    ));
                }
            }
        }

        Ok(())
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;

//! Generic API executor errors.
//!
//! Every variant aborts the request before anything is sent, except
//! [`ExecutorError::Request`] and [`ExecutorError::ReadBody`] which report
//! transport failures.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("API endpoint '{0}' not found in configuration")]
    EndpointNotFound(String),

    #[error("API endpoint '{0}' is disabled")]
    EndpointDisabled(String),

    #[error("Unsupported HTTP method '{0}'")]
    UnsupportedMethod(String),

    #[error("bearer token not found in environment variable '{0}'")]
    MissingBearerToken(String),

    #[error("API key not found in environment variable '{0}'")]
    MissingApiKey(String),

    #[error("failed to open file '{path}': {message}")]
    FileOpen { path: String, message: String },

    #[error("Invalid header '{name}': {message}")]
    InvalidHeader { name: String, message: String },

    #[error("Failed to encode request body: {0}")]
    Encode(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Failed to read response body: {0}")]
    ReadBody(String),
}

impl ExecutorError {
    /// Whether the error is a configuration problem rather than a transport failure.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, ExecutorError::Request(_) | ExecutorError::ReadBody(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_not_found_message() {
        let err = ExecutorError::EndpointNotFound("twitter".to_string());
        assert_eq!(
            err.to_string(),
            "API endpoint 'twitter' not found in configuration"
        );
    }

    #[test]
    fn test_endpoint_disabled_message() {
        let err = ExecutorError::EndpointDisabled("bluesky".to_string());
        assert_eq!(err.to_string(), "API endpoint 'bluesky' is disabled");
    }

    #[test]
    fn test_missing_credentials_messages() {
        let bearer = ExecutorError::MissingBearerToken("X_TOKEN".to_string());
        assert!(bearer.to_string().contains("X_TOKEN"));
        let key = ExecutorError::MissingApiKey("X_KEY".to_string());
        assert!(key.to_string().contains("API key not found"));
    }

    #[test]
    fn test_file_open_message() {
        let err = ExecutorError::FileOpen {
            path: "/tmp/missing.png".to_string(),
            message: "No such file or directory".to_string(),
        };
        assert!(err.to_string().contains("/tmp/missing.png"));
    }

    #[test]
    fn test_is_configuration() {
        assert!(ExecutorError::EndpointDisabled("a".to_string()).is_configuration());
        assert!(!ExecutorError::Request("timeout".to_string()).is_configuration());
        assert!(!ExecutorError::ReadBody("eof".to_string()).is_configuration());
    }
}

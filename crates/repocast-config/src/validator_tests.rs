use super::*;
use repocast_protocols::ContentType;

fn endpoint() -> EndpointConfig {
    EndpointConfig::new("twitter", "https://x.example.com/post")
}

#[test]
fn test_validate_default_config() {
    let config = Config::default();
    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(
        result
            .warnings
            .iter()
            .any(|w| w.path == "content_service.base_url")
    );
}

#[test]
fn test_validate_invalid_port() {
    let mut config = Config::default();
    config.server.port = 0;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(!result.is_valid());
    assert!(result.errors.iter().any(|e| e.path == "server.port"));
}

#[test]
fn test_validate_unknown_backend() {
    let mut config = Config::default();
    config.storage.backend = "postgres".to_string();

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.errors.iter().any(|e| e.path == "storage.backend"));
}

#[test]
fn test_validate_invalid_base_url() {
    let mut config = Config::default();
    config.content_service.base_url = "content.local".to_string();

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(
        result
            .errors
            .iter()
            .any(|e| e.path == "content_service.base_url")
    );
}

#[test]
fn test_validate_zero_attempts() {
    let mut config = Config::default();
    config.images.attempts = 0;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.errors.iter().any(|e| e.path == "images.attempts"));
}

#[test]
fn test_validate_endpoint_ok() {
    let result = ConfigValidator::validate_endpoint(&endpoint()).unwrap();
    assert!(result.is_valid());
}

#[test]
fn test_validate_endpoint_bad_name() {
    let mut bad = endpoint();
    bad.name = "x post".to_string();
    let result = ConfigValidator::validate_endpoint(&bad).unwrap();
    assert!(result.errors.iter().any(|e| e.path.ends_with(".name")));
}

#[test]
fn test_validate_endpoint_bad_method_and_code() {
    let bad = endpoint().with_method("TRACE").with_success_code(42);
    let result = ConfigValidator::validate_endpoint(&bad).unwrap();
    assert!(result.errors.iter().any(|e| e.path.ends_with(".method")));
    assert!(result.errors.iter().any(|e| e.path.ends_with(".success_code")));
}

#[test]
fn test_validate_endpoint_lowercase_method_accepted() {
    let ok = endpoint().with_method("patch");
    assert!(ConfigValidator::validate_endpoint(&ok).unwrap().is_valid());
}

#[test]
fn test_validate_endpoint_zero_timeout() {
    let bad = endpoint().with_timeout(0);
    let result = ConfigValidator::validate_endpoint(&bad).unwrap();
    assert!(result.errors.iter().any(|e| e.path.ends_with(".timeout")));
}

#[test]
fn test_validate_endpoint_auth_requirements() {
    let mut bearer = endpoint().with_bearer_auth("");
    bearer.token_env_var.clear();
    let result = ConfigValidator::validate_endpoint(&bearer).unwrap();
    assert!(result.errors.iter().any(|e| e.path.ends_with(".token_env_var")));

    let api_key = endpoint().with_api_key_auth("X_KEY", "");
    let result = ConfigValidator::validate_endpoint(&api_key).unwrap();
    assert!(result.errors.iter().any(|e| e.path.ends_with(".token_header")));
}

#[test]
fn test_validate_config_endpoints_use_table_path() {
    let mut config = Config::default();
    config.endpoints.insert(
        "bluesky".to_string(),
        EndpointConfig::new("", "")
            .with_content_type(ContentType::Multipart)
            .with_success_code(700),
    );

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.errors.iter().any(|e| e.path == "endpoints.bluesky.url"));
    assert!(
        result
            .errors
            .iter()
            .any(|e| e.path == "endpoints.bluesky.success_code")
    );
}

#[test]
fn test_into_error() {
    let bad = endpoint().with_timeout(0).with_success_code(1000);
    let result = ConfigValidator::validate_endpoint(&bad).unwrap();
    let err = result.into_error().unwrap_err();
    let display = err.to_string();
    assert!(display.contains("timeout"));
    assert!(display.contains("success_code"));

    let ok = ConfigValidator::validate_endpoint(&endpoint()).unwrap();
    assert!(ok.into_error().is_ok());
}

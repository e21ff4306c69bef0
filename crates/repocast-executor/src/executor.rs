//! Generic API executor.

use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use repocast_protocols::{
    AuthType, ContentType, EndpointConfig, EndpointRequest, EndpointResponse, ExecutorError,
    ResponseType,
};

use crate::placeholder::{substitute_env, substitute_params};
use crate::registry::EndpointRegistry;

/// Request body ready to send.
enum Body {
    Json(Option<Vec<u8>>),
    Multipart(Form),
}

/// Executes [`EndpointRequest`]s against the endpoints of a registry.
pub struct ApiExecutor {
    registry: RwLock<Arc<EndpointRegistry>>,
    client: Client,
}

impl ApiExecutor {
    pub fn new(registry: EndpointRegistry) -> Result<Self, ExecutorError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ExecutorError::Request(e.to_string()))?;
        Ok(Self::with_client(registry, client))
    }

    pub fn with_client(registry: EndpointRegistry, client: Client) -> Self {
        Self {
            registry: RwLock::new(Arc::new(registry)),
            client,
        }
    }

    /// Current endpoint table.
    pub async fn registry(&self) -> Arc<EndpointRegistry> {
        self.registry.read().await.clone()
    }

    /// Replace the endpoint table as a whole. Calls in flight keep the old one.
    pub async fn reload(&self, registry: EndpointRegistry) {
        info!("Reloading endpoint registry with {} endpoints", registry.len());
        *self.registry.write().await = Arc::new(registry);
    }

    /// Execute one request.
    ///
    /// Lookup, URL resolution, body encoding, headers and auth are resolved
    /// in that order before anything is sent. Success means the response
    /// status equals the endpoint's `success_code`.
    pub async fn execute(&self, request: &EndpointRequest) -> Result<EndpointResponse, ExecutorError> {
        let registry = self.registry().await;
        let endpoint = registry
            .get(&request.endpoint)
            .ok_or_else(|| ExecutorError::EndpointNotFound(request.endpoint.clone()))?;
        if !endpoint.enabled {
            return Err(ExecutorError::EndpointDisabled(endpoint.name.clone()));
        }

        let url = substitute_env(&substitute_params(&endpoint.url, &request.url_params));
        let method = parse_method(&endpoint.method)?;
        let body = build_body(endpoint, request).await?;
        let headers = build_headers(endpoint, &body)?;

        debug!("Executing {} {} for endpoint {}", method, url, endpoint.name);

        let mut builder = self
            .client
            .request(method, url.as_str())
            .timeout(endpoint.timeout_duration());
        builder = match body {
            Body::Json(Some(bytes)) => builder.body(bytes),
            Body::Json(None) => builder,
            Body::Multipart(form) => builder.multipart(form),
        };
        builder = builder.headers(headers);

        let started = Instant::now();
        let response = builder
            .send()
            .await
            .map_err(|e| ExecutorError::Request(e.to_string()))?;
        let status_code = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ExecutorError::ReadBody(e.to_string()))?;
        let response_time = started.elapsed();

        let success = status_code == endpoint.success_code;
        let json = if success && endpoint.response_type == ResponseType::Json {
            match serde_json::from_str(&body) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Endpoint {} returned invalid JSON: {}", endpoint.name, e);
                    None
                }
            }
        } else {
            None
        };
        let error = (!success).then(|| {
            format!(
                "Unexpected status code {}, expected {}",
                status_code, endpoint.success_code
            )
        });

        info!(
            "Endpoint {} responded {} in {:?} (success: {})",
            endpoint.name, status_code, response_time, success
        );

        Ok(EndpointResponse {
            endpoint: endpoint.name.clone(),
            success,
            status_code,
            body,
            json,
            error,
            response_time,
            timestamp: Utc::now(),
        })
    }
}

fn parse_method(method: &str) -> Result<Method, ExecutorError> {
    match method.to_uppercase().as_str() {
        "GET" => Ok(Method::GET),
        "POST" => Ok(Method::POST),
        "PUT" => Ok(Method::PUT),
        "DELETE" => Ok(Method::DELETE),
        "PATCH" => Ok(Method::PATCH),
        _ => Err(ExecutorError::UnsupportedMethod(method.to_string())),
    }
}

/// Encode the body. Multipart files are read fully first, so a missing
/// file aborts the request before anything is sent.
async fn build_body(endpoint: &EndpointConfig, request: &EndpointRequest) -> Result<Body, ExecutorError> {
    match endpoint.content_type {
        ContentType::Json => {
            let bytes = match (&request.json_body, &request.raw_body) {
                (Some(value), _) => {
                    Some(serde_json::to_vec(value).map_err(|e| ExecutorError::Encode(e.to_string()))?)
                }
                (None, Some(raw)) => Some(raw.clone()),
                (None, None) => None,
            };
            Ok(Body::Json(bytes))
        }
        ContentType::Multipart => {
            let mut form = Form::new();
            for (key, value) in &request.form_fields {
                form = form.text(key.clone(), value.clone());
            }
            for (field, path) in &request.file_fields {
                let bytes = tokio::fs::read(path).await.map_err(|e| ExecutorError::FileOpen {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
                let file_name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| field.clone());
                form = form.part(field.clone(), Part::bytes(bytes).file_name(file_name));
            }
            Ok(Body::Multipart(form))
        }
    }
}

/// Content-Type first, then static headers, then auth, so credentials
/// cannot be overridden by configuration.
fn build_headers(endpoint: &EndpointConfig, body: &Body) -> Result<HeaderMap, ExecutorError> {
    let mut headers = HeaderMap::new();

    let content_type = match body {
        Body::Json(_) => "application/json".to_string(),
        Body::Multipart(form) => format!("multipart/form-data; boundary={}", form.boundary()),
    };
    headers.insert(CONTENT_TYPE, header_value("Content-Type", &content_type)?);

    for (name, value) in &endpoint.headers {
        let header = HeaderName::from_bytes(name.as_bytes()).map_err(|e| ExecutorError::InvalidHeader {
            name: name.clone(),
            message: e.to_string(),
        })?;
        headers.insert(header, header_value(name, &substitute_env(value))?);
    }

    match endpoint.auth_type {
        AuthType::None => {}
        AuthType::Bearer => {
            let token = credential(&endpoint.token_env_var)
                .ok_or_else(|| ExecutorError::MissingBearerToken(endpoint.token_env_var.clone()))?;
            headers.insert(
                AUTHORIZATION,
                header_value("Authorization", &format!("Bearer {}", token))?,
            );
        }
        AuthType::ApiKey => {
            let token = credential(&endpoint.token_env_var)
                .ok_or_else(|| ExecutorError::MissingApiKey(endpoint.token_env_var.clone()))?;
            let header = HeaderName::from_bytes(endpoint.token_header.as_bytes()).map_err(|e| {
                ExecutorError::InvalidHeader {
                    name: endpoint.token_header.clone(),
                    message: e.to_string(),
                }
            })?;
            headers.insert(header, header_value(&endpoint.token_header, &token)?);
        }
    }

    Ok(headers)
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, ExecutorError> {
    HeaderValue::from_str(value).map_err(|e| ExecutorError::InvalidHeader {
        name: name.to_string(),
        message: e.to_string(),
    })
}

/// Non-empty value of the credential variable.
fn credential(env_var: &str) -> Option<String> {
    if env_var.is_empty() {
        return None;
    }
    std::env::var(env_var).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;

//! Content service client.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::redirect::Policy;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use repocast_protocols::{
    ContentGenerator, GenerateRequest, GenerateResponse, RepositoryPage, RepositoryQuery,
    RepositorySource, SourceError,
};

const GET_REPOSITORY: &str = "/think-root/api/get-repository/";
const UPDATE_POSTED: &str = "/think-root/api/update-posted/";
const DELETE_REPOSITORY: &str = "/think-root/api/delete-repository/";
const AUTO_GENERATE: &str = "/think-root/api/auto-generate/";

/// Language every item is guaranteed to have text in.
const FALLBACK_LANGUAGE: &str = "uk";
const MISSING_LANGUAGE_MESSAGE: &str = "no text available for language";

#[derive(Debug, Deserialize)]
struct RepositoryEnvelope {
    #[serde(default)]
    data: RepositoryPage,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
struct StatusEnvelope {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Serialize)]
struct PostedUpdate<'a> {
    url: &'a str,
    posted: bool,
}

#[derive(Debug, Serialize)]
struct RepositoryUrl<'a> {
    url: &'a str,
}

/// Client of the upstream content service.
pub struct ContentServiceClient {
    base_url: String,
    token: String,
    client: Client,
    probe_client: Client,
    request_timeout: Duration,
    generation_timeout: Option<Duration>,
}

impl ContentServiceClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, SourceError> {
        let client = Client::builder()
            .build()
            .map_err(|e| SourceError::Request(e.to_string()))?;
        let probe_client = Client::builder()
            .redirect(Policy::none())
            .build()
            .map_err(|e| SourceError::Request(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client,
            probe_client,
            request_timeout: Duration::from_secs(30),
            generation_timeout: Some(Duration::from_secs(300)),
        })
    }

    /// Timeout of repository calls and URL probes.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Timeout of the generation trigger; `None` waits indefinitely.
    pub fn with_generation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.generation_timeout = timeout;
        self
    }

    async fn call<B, R>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        timeout: Option<Duration>,
    ) -> Result<R, SourceError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method, &url)
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "*/*")
            .json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SourceError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Http {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        response
            .json::<R>()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))
    }

    async fn fetch_once(&self, query: &RepositoryQuery) -> Result<RepositoryEnvelope, SourceError> {
        self.call(Method::POST, GET_REPOSITORY, query, Some(self.request_timeout))
            .await
    }
}

#[async_trait]
impl RepositorySource for ContentServiceClient {
    async fn fetch(&self, query: &RepositoryQuery) -> Result<RepositoryPage, SourceError> {
        let mut envelope = self.fetch_once(query).await?;

        if envelope.status == "error"
            && envelope.message.contains(MISSING_LANGUAGE_MESSAGE)
            && query.text_language != FALLBACK_LANGUAGE
        {
            warn!(
                "No text in '{}', falling back to '{}'",
                query.text_language, FALLBACK_LANGUAGE
            );
            let fallback = RepositoryQuery {
                text_language: FALLBACK_LANGUAGE.to_string(),
                ..query.clone()
            };
            envelope = self.fetch_once(&fallback).await?;
        }

        if envelope.status == "error" {
            return Err(SourceError::Upstream(envelope.message));
        }
        Ok(envelope.data)
    }

    async fn mark_posted(&self, url: &str, posted: bool) -> Result<bool, SourceError> {
        let envelope: StatusEnvelope = self
            .call(
                Method::PATCH,
                UPDATE_POSTED,
                &PostedUpdate { url, posted },
                Some(self.request_timeout),
            )
            .await?;
        if envelope.status != "ok" {
            warn!("Marking {} as posted rejected: {}", url, envelope.message);
        }
        Ok(envelope.status == "ok")
    }

    async fn delete(&self, url: &str) -> Result<(), SourceError> {
        let envelope: StatusEnvelope = self
            .call(
                Method::DELETE,
                DELETE_REPOSITORY,
                &RepositoryUrl { url },
                Some(self.request_timeout),
            )
            .await?;
        if envelope.status != "ok" {
            return Err(SourceError::Upstream(format!(
                "failed to delete repository {}: {}",
                url, envelope.message
            )));
        }
        info!("Deleted repository {}", url);
        Ok(())
    }

    async fn check_url(&self, url: &str) -> Result<u16, SourceError> {
        let response = self
            .probe_client
            .head(url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| SourceError::Request(e.to_string()))?;
        Ok(response.status().as_u16())
    }
}

#[async_trait]
impl ContentGenerator for ContentServiceClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, SourceError> {
        info!(
            "Requesting generation of up to {} repositories",
            request.max_repos
        );
        self.call(Method::POST, AUTO_GENERATE, request, self.generation_timeout)
            .await
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

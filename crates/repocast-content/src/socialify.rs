//! Socialify cover image renderer.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use url::Url;

use repocast_protocols::{CoverImageProvider, SourceError};

use crate::files;

/// Background patterns picked from at random.
pub const PATTERNS: [&str; 5] = [
    "Diagonal Stripes",
    "Charlie Brown",
    "Brick Wall",
    "Circuit Board",
    "Formal Invitation",
];

const BROWSER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) Repocast/1.0";

/// Renders repository cards through a Socialify instance.
pub struct SocialifyRenderer {
    base_url: String,
    client: Client,
}

impl SocialifyRenderer {
    pub fn new(base_url: impl Into<String>) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| SourceError::Request(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// PNG URL for `repo_path` (`owner/repo`) with the given background pattern.
    pub fn image_url(&self, repo_path: &str, pattern: &str) -> Result<Url, SourceError> {
        Url::parse_with_params(
            &format!("{}/{}/png", self.base_url, repo_path.trim_matches('/')),
            &[
                ("description", "0"),
                ("font", "Jost"),
                ("forks", "1"),
                ("issues", "1"),
                ("language", "1"),
                ("name", "1"),
                ("owner", "1"),
                ("pattern", pattern),
                ("pulls", "1"),
                ("stargazers", "1"),
                ("theme", "Light"),
            ],
        )
        .map_err(|e| SourceError::Request(format!("Invalid image URL: {}", e)))
    }
}

fn random_pattern() -> &'static str {
    PATTERNS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(PATTERNS[0])
}

#[async_trait]
impl CoverImageProvider for SocialifyRenderer {
    async fn render(&self, repo_path: &str, dest: &Path) -> Result<(), SourceError> {
        let url = self.image_url(repo_path, random_pattern())?;
        debug!("Rendering cover image from {}", url);

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, BROWSER_AGENT)
            .header(ACCEPT, "image/png")
            .send()
            .await
            .map_err(|e| SourceError::Request(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(SourceError::Http {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SourceError::Request(e.to_string()))?;
        files::write_file(dest, &bytes).await?;
        debug!("Cover image written to {:?} ({} bytes)", dest, bytes.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_image_url() {
        let renderer = SocialifyRenderer::new("https://socialify.git.ci/").unwrap();
        let url = renderer.image_url("rust-lang/rust", "Brick Wall").unwrap();
        assert_eq!(url.path(), "/rust-lang/rust/png");
        let query = url.query().unwrap();
        assert!(query.starts_with("description=0&font=Jost&forks=1"));
        assert!(query.contains("pattern=Brick+Wall"));
        assert!(query.ends_with("theme=Light"));
    }

    #[test]
    fn test_random_pattern_covers_all_patterns() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            let pattern = random_pattern();
            assert!(PATTERNS.contains(&pattern));
            seen.insert(pattern);
        }
        assert_eq!(seen.len(), PATTERNS.len());
    }

    #[tokio::test]
    async fn test_render_writes_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/owner/repo/png"))
            .and(query_param("theme", "Light"))
            .and(header("accept", "image/png"))
            .and(header("user-agent", BROWSER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"\x89PNG".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("img/image.png");
        let renderer = SocialifyRenderer::new(server.uri()).unwrap();
        renderer.render("owner/repo", &dest).await.unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"\x89PNG");
    }

    #[tokio::test]
    async fn test_render_non_ok_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("image.png");
        let renderer = SocialifyRenderer::new(server.uri()).unwrap();
        let err = renderer.render("owner/repo", &dest).await.unwrap_err();

        assert!(matches!(err, SourceError::Http { status: 202, .. }));
        assert!(!dest.exists());
    }
}

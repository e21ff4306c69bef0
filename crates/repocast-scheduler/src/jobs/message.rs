//! Message job: publish one live repository to every enabled endpoint.
//!
//! A run prepares the cover image once, fans out to the enabled endpoints in
//! name order, marks the first published repository as posted and always
//! empties the image directory. Any endpoint success with no failures is `ok`,
//! mixed results are `partial` and no success is `failed`.

use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, info, warn};

use repocast_config::ImageConfig;
use repocast_content::files;
use repocast_protocols::{
    ContentType, EndpointConfig, EndpointRequest, JobOutcome, RepositoryItem, RepositoryQuery,
    RepositorySource,
};

use super::JobContext;

const NO_ENDPOINTS: &str = "No enabled API endpoints configured";
const NO_REPOSITORIES: &str = "No repositories available";
const NO_VALID_REPOSITORIES: &str = "No valid repositories remained";

/// Status code of a live repository URL.
const LIVE_STATUS: u16 = 200;

pub async fn run(ctx: &JobContext) -> JobOutcome {
    let registry = ctx.executor.registry().await;
    let endpoints = registry.enabled();
    if endpoints.is_empty() {
        return JobOutcome::failed(NO_ENDPOINTS);
    }

    let image_path = ctx.images.image_path();
    if let Some(endpoint) = endpoints.iter().find(|e| e.uses_generated_image) {
        if let Err(e) = prepare_image(ctx, endpoint.language(), &image_path).await {
            let outcome = JobOutcome::failed(format!("Failed to prepare image: {}", e));
            return clean_up(ctx, outcome).await;
        }
    }

    let mut published: Vec<(&str, String)> = Vec::new();
    let mut failures: Vec<(&str, String)> = Vec::new();
    for endpoint in &endpoints {
        match publish(ctx, endpoint, &image_path).await {
            Ok(url) => {
                info!("Published {} to {}", url, endpoint.name);
                published.push((endpoint.name.as_str(), url));
            }
            Err(reason) => {
                warn!("Publishing to {} failed: {}", endpoint.name, reason);
                failures.push((endpoint.name.as_str(), reason));
            }
        }
    }

    let mut outcome = summarize(&published, &failures);

    if let Some((_, url)) = published.first() {
        match ctx.source.mark_posted(url, true).await {
            Ok(true) => debug!("Marked {} as posted", url),
            Ok(false) => {
                outcome = fail_with(
                    outcome,
                    "Failed to mark repository as posted: update rejected upstream".to_string(),
                );
            }
            Err(e) => {
                outcome = fail_with(
                    outcome,
                    format!("Failed to mark repository as posted: {}", e),
                );
            }
        }
    }

    clean_up(ctx, outcome).await
}

/// Render the cover image, falling back to the placeholder.
async fn prepare_image(ctx: &JobContext, language: &str, dest: &Path) -> std::io::Result<()> {
    match ctx.source.fetch(&RepositoryQuery::next_unposted(language)).await {
        Ok(page) => match page.first() {
            Some(item) => {
                if render_with_retry(ctx, item.repo_path(), dest).await {
                    return Ok(());
                }
            }
            None => warn!("No repository to render a cover image for"),
        },
        Err(e) => warn!("Failed to get repository for cover image: {}", e),
    }

    info!("Using placeholder image {:?}", ctx.images.placeholder);
    files::copy_file(&ctx.images.placeholder, dest).await?;
    Ok(())
}

/// Fixed-interval retry over the renderer.
async fn render_with_retry(ctx: &JobContext, repo_path: &str, dest: &Path) -> bool {
    let attempts = ctx.images.attempts.max(1);
    for attempt in 1..=attempts {
        match ctx.renderer.render(repo_path, dest).await {
            Ok(()) => {
                debug!("Cover image for {} rendered on attempt {}", repo_path, attempt);
                return true;
            }
            Err(e) => {
                warn!(
                    "Cover image attempt {}/{} for {} failed: {}",
                    attempt, attempts, repo_path, e
                );
                if attempt < attempts {
                    tokio::time::sleep(ctx.images.retry_interval()).await;
                }
            }
        }
    }
    false
}

/// Publish one live repository to `endpoint`. Returns the published URL.
async fn publish(
    ctx: &JobContext,
    endpoint: &EndpointConfig,
    image_path: &Path,
) -> Result<String, String> {
    let item = next_live_item(ctx.source.as_ref(), endpoint.language()).await?;
    let request = build_request(endpoint, &item, image_path, &ctx.images);

    match ctx.executor.execute(&request).await {
        Ok(response) if response.success => Ok(item.url),
        Ok(response) => Err(response
            .error
            .unwrap_or_else(|| format!("status {}", response.status_code))),
        Err(e) => Err(e.to_string()),
    }
}

/// Oldest unposted item whose URL answers 200. Dead items are deleted upstream.
///
/// Runs until a live item is found or the source has none left.
pub(crate) async fn next_live_item(
    source: &dyn RepositorySource,
    language: &str,
) -> Result<RepositoryItem, String> {
    let query = RepositoryQuery::next_unposted(language);
    let mut removed = 0usize;

    loop {
        let page = source
            .fetch(&query)
            .await
            .map_err(|e| format!("Failed to get repository: {}", e))?;

        let Some(item) = page.items.into_iter().next() else {
            return Err(if removed == 0 {
                NO_REPOSITORIES.to_string()
            } else {
                NO_VALID_REPOSITORIES.to_string()
            });
        };

        match source.check_url(&item.url).await {
            Ok(LIVE_STATUS) => return Ok(item),
            Ok(status) => warn!("Repository {} answered {}, deleting", item.url, status),
            Err(e) => warn!("Repository {} could not be probed ({}), deleting", item.url, e),
        }

        source
            .delete(&item.url)
            .await
            .map_err(|e| format!("Failed to delete repository {}: {}", item.url, e))?;
        removed += 1;
    }
}

/// Request carrying `item` in the encoding `endpoint` expects.
pub(crate) fn build_request(
    endpoint: &EndpointConfig,
    item: &RepositoryItem,
    image_path: &Path,
    images: &ImageConfig,
) -> EndpointRequest {
    let request = EndpointRequest::new(&endpoint.name);

    match endpoint.content_type {
        ContentType::Multipart => {
            let request = request
                .with_form_field("text", &item.text)
                .with_form_field("url", &item.url);
            if endpoint.uses_generated_image {
                request.with_file_field("image", image_path)
            } else {
                request
            }
        }
        ContentType::Json => {
            let mut body: Map<String, Value> = endpoint
                .default_json_body
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            body.insert("text".to_string(), Value::String(item.text.clone()));
            body.insert("url".to_string(), Value::String(item.url.clone()));

            if endpoint.uses_generated_image {
                if let Some(base) = images.public_base_url.as_deref() {
                    body.insert(
                        "image_url".to_string(),
                        Value::String(format!(
                            "{}/{}",
                            base.trim_end_matches('/'),
                            images.file_name
                        )),
                    );
                }
            }
            request.with_json_body(Value::Object(body))
        }
    }
}

fn summarize(published: &[(&str, String)], failures: &[(&str, String)]) -> JobOutcome {
    let mut parts = Vec::new();
    if !published.is_empty() {
        let names: Vec<&str> = published.iter().map(|(name, _)| *name).collect();
        parts.push(format!("Published to: {}", names.join(", ")));
    }
    if !failures.is_empty() {
        let reasons: Vec<String> = failures
            .iter()
            .map(|(name, reason)| format!("{} ({})", name, reason))
            .collect();
        parts.push(format!("Failed: {}", reasons.join("; ")));
    }
    let message = parts.join(". ");

    if published.is_empty() {
        JobOutcome::failed(message)
    } else if failures.is_empty() {
        JobOutcome::ok(message)
    } else {
        JobOutcome::partial(message)
    }
}

fn fail_with(outcome: JobOutcome, note: String) -> JobOutcome {
    if outcome.message.is_empty() {
        JobOutcome::failed(note)
    } else {
        JobOutcome::failed(format!("{}. {}", outcome.message, note))
    }
}

async fn clean_up(ctx: &JobContext, outcome: JobOutcome) -> JobOutcome {
    match files::clear_directory(&ctx.images.dir).await {
        Ok(removed) => {
            debug!("Cleaned up {} image files", removed);
            outcome
        }
        Err(e) => fail_with(outcome, format!("Failed to clean up images: {}", e)),
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;

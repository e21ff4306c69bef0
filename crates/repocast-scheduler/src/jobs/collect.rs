//! Collect job: one generation request built from stored settings, with the
//! upstream status classified into the run outcome.

use tracing::{debug, error, info};

use repocast_protocols::{GenerateRequest, GenerateResponse, JobOutcome};

use super::JobContext;

pub async fn run(ctx: &JobContext) -> JobOutcome {
    let collect = match ctx.store.get_collect_settings().await {
        Ok(settings) => settings,
        Err(e) => return JobOutcome::failed(format!("Failed to get collect settings: {}", e)),
    };
    let prompt = match ctx.store.get_prompt_settings().await {
        Ok(settings) => settings,
        Err(e) => return JobOutcome::failed(format!("Failed to get prompt settings: {}", e)),
    };

    let request = GenerateRequest::from_settings(&collect, &prompt);
    debug!(
        "Collect request: {} repositories from {} ({}), output languages {}",
        request.max_repos, request.resource, request.period, request.llm_output_language
    );

    match ctx.generator.generate(&request).await {
        Ok(response) => classify(&response),
        Err(e) => {
            error!("Generation request failed: {}", e);
            JobOutcome::failed(e.to_string())
        }
    }
}

/// Map the upstream response onto a run outcome.
pub fn classify(response: &GenerateResponse) -> JobOutcome {
    let added = response.added.len();
    let skipped = response.dont_added.len();

    match response.status.as_str() {
        "ok" => {
            info!("Collected {} new repositories, {} already known", added, skipped);
            let mut message = format!("Collected {} repositories.", added);
            if skipped > 0 {
                message.push_str(&format!(" Already exists {} repositories.", skipped));
            }
            JobOutcome::ok(message)
        }
        "partial" => {
            info!("Partially collected {} repositories, {} failed", added, skipped);
            let mut message = format!(
                "Partially collected {} repositories. Failed: {}.",
                added, skipped
            );
            if !response.error_message.is_empty() {
                message.push_str(&format!(" Error: {}", response.error_message));
            }
            JobOutcome::partial(message)
        }
        "error" => {
            let mut message = if response.error_message.is_empty() {
                "API returned error status without error message".to_string()
            } else {
                format!("API error: {}", response.error_message)
            };
            if skipped > 0 {
                message.push_str(&format!(
                    ". Failed repositories: [{}]",
                    response.dont_added.join(" ")
                ));
            }
            JobOutcome::failed(message)
        }
        other => {
            let mut message = format!("API returned unknown status: {}", other);
            if !response.error_message.is_empty() {
                message.push_str(&format!(". Error message: {}", response.error_message));
            }
            JobOutcome::failed(message)
        }
    }
}

#[cfg(test)]
#[path = "collect_tests.rs"]
mod tests;

//! Collect and prompt settings forwarded to the content-generation service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Parameters of a collection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectSettings {
    pub max_repos: u32,
    pub resource: String,
    pub since: String,
    pub spoken_language_code: String,
    pub period: String,
    pub language: String,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Default for CollectSettings {
    fn default() -> Self {
        Self {
            max_repos: 5,
            resource: "github".to_string(),
            since: "daily".to_string(),
            spoken_language_code: "en".to_string(),
            period: "past_24_hours".to_string(),
            language: "All".to_string(),
            updated_at: Utc::now(),
        }
    }
}

const DEFAULT_PROMPT: &str = "You are an assistant that writes short, engaging social media posts \
about open-source GitHub repositories. Describe what the project does, who it is for and what \
makes it stand out in two or three sentences. Do not use hashtags or emojis and do not invent \
features that are not mentioned in the repository.";

/// LLM parameters used when generating repository summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptSettings {
    pub use_direct_url: bool,
    pub llm_provider: String,
    pub temperature: f64,
    /// System prompt.
    pub content: String,
    pub model: String,
    /// Comma separated output languages, e.g. `en,uk`.
    pub llm_output_language: String,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            use_direct_url: true,
            llm_provider: "openrouter".to_string(),
            temperature: 0.2,
            content: DEFAULT_PROMPT.to_string(),
            model: "openai/gpt-4o-mini-search-preview".to_string(),
            llm_output_language: "en,uk".to_string(),
            updated_at: Utc::now(),
        }
    }
}

/// Partial update of [`PromptSettings`]; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptSettingsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_direct_url: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_output_language: Option<String>,
}

impl PromptSettingsUpdate {
    /// Apply the update and bump `updated_at`.
    pub fn apply(&self, settings: &mut PromptSettings) {
        if let Some(v) = self.use_direct_url {
            settings.use_direct_url = v;
        }
        if let Some(ref v) = self.llm_provider {
            settings.llm_provider = v.clone();
        }
        if let Some(v) = self.temperature {
            settings.temperature = v;
        }
        if let Some(ref v) = self.content {
            settings.content = v.clone();
        }
        if let Some(ref v) = self.model {
            settings.model = v.clone();
        }
        if let Some(ref v) = self.llm_output_language {
            settings.llm_output_language = v.clone();
        }
        settings.updated_at = Utc::now();
    }
}

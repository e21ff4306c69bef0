//! Wire types of the content-generation trigger.

use serde::{Deserialize, Deserializer, Serialize};

use crate::settings::{CollectSettings, PromptSettings};

/// A chat message in the LLM configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: String,
    pub content: String,
}

/// LLM model parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub temperature: f64,
    pub messages: Vec<LlmMessage>,
}

/// Body of a generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub max_repos: u32,
    pub resource: String,
    pub since: String,
    pub spoken_language_code: String,
    pub period: String,
    pub language: String,
    pub use_direct_url: bool,
    pub llm_provider: String,
    pub llm_output_language: String,
    pub llm_config: LlmConfig,
}

impl GenerateRequest {
    /// Assemble a request from stored settings; the prompt becomes the system message.
    pub fn from_settings(collect: &CollectSettings, prompt: &PromptSettings) -> Self {
        Self {
            max_repos: collect.max_repos,
            resource: collect.resource.clone(),
            since: collect.since.clone(),
            spoken_language_code: collect.spoken_language_code.clone(),
            period: collect.period.clone(),
            language: collect.language.clone(),
            use_direct_url: prompt.use_direct_url,
            llm_provider: prompt.llm_provider.clone(),
            llm_output_language: prompt.llm_output_language.clone(),
            llm_config: LlmConfig {
                model: prompt.model.clone(),
                temperature: prompt.temperature,
                messages: vec![LlmMessage {
                    role: "system".to_string(),
                    content: prompt.content.clone(),
                }],
            },
        }
    }
}

/// Response of a generation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub added: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dont_added: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub error_message: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

//! Endpoint registry.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use repocast_protocols::{EndpointConfig, SettingsStore};

use crate::error::RegistryError;

/// `apis` table of an endpoint file.
#[derive(Debug, Default, Deserialize)]
struct ApisDocument {
    #[serde(default)]
    apis: BTreeMap<String, EndpointConfig>,
}

/// Immutable table of endpoint definitions keyed by name.
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    endpoints: BTreeMap<String, EndpointConfig>,
}

impl EndpointRegistry {
    pub fn new(endpoints: impl IntoIterator<Item = EndpointConfig>) -> Self {
        Self {
            endpoints: endpoints
                .into_iter()
                .map(|endpoint| (endpoint.name.clone(), endpoint))
                .collect(),
        }
    }

    /// Load every endpoint held by the store.
    pub async fn from_store(store: &dyn SettingsStore) -> Result<Self, RegistryError> {
        let endpoints = store.get_all_endpoints().await?;
        debug!("Loaded {} endpoints from {} store", endpoints.len(), store.id());
        Ok(Self::new(endpoints))
    }

    /// Load an `apis` table from a `.yaml`/`.yml` or TOML file.
    pub fn from_file(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path)?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        if is_yaml {
            Self::from_yaml_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, RegistryError> {
        let doc: ApisDocument = toml::from_str(content)?;
        Ok(Self::from_table(doc.apis))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, RegistryError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let doc: ApisDocument = serde_yml::from_str(content)?;
        Ok(Self::from_table(doc.apis))
    }

    /// Table keys are the endpoint names.
    fn from_table(table: BTreeMap<String, EndpointConfig>) -> Self {
        Self::new(table.into_iter().map(|(name, mut endpoint)| {
            endpoint.name = name;
            endpoint
        }))
    }

    pub fn get(&self, name: &str) -> Option<&EndpointConfig> {
        self.endpoints.get(name)
    }

    /// Enabled endpoints in name order.
    pub fn enabled(&self) -> Vec<&EndpointConfig> {
        self.endpoints.values().filter(|e| e.enabled).collect()
    }

    /// All endpoints in name order.
    pub fn all(&self) -> impl Iterator<Item = &EndpointConfig> {
        self.endpoints.values()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;

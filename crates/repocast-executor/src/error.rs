//! Registry loading errors.

use thiserror::Error;

use repocast_protocols::StoreError;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Failed to read endpoint file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML endpoint table: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid YAML endpoint table: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("Failed to load endpoints from store: {0}")]
    Store(#[from] StoreError),
}

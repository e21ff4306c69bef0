//! Configuration loader.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::ConfigError;
use crate::schema::Config;

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a file if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::NotFound(_)) => Ok(Config::default()),
            other => other,
        }
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let mut config: Config = toml::from_str(&expanded)?;
        Self::check_endpoint_names(&config)?;
        Self::expand_paths(&mut config);
        Ok(config)
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;

        let mut result = content.to_string();
        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// An explicit `name` inside `[endpoints.<key>]` must match the key.
    fn check_endpoint_names(config: &Config) -> Result<(), ConfigError> {
        for (key, endpoint) in &config.endpoints {
            if !endpoint.name.is_empty() && &endpoint.name != key {
                return Err(ConfigError::InvalidFormat(format!(
                    "endpoint table '{}' declares name '{}'",
                    key, endpoint.name
                )));
            }
        }
        Ok(())
    }

    /// Expand shell-style paths (e.g., `~/.repocast`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }

    /// Expand `~` in every filesystem path of the configuration.
    fn expand_paths(config: &mut Config) {
        let expand = |path: &mut PathBuf| {
            *path = PathBuf::from(Self::expand_path(&path.to_string_lossy()));
        };

        expand(&mut config.storage.path);
        expand(&mut config.logging.dir);
        expand(&mut config.images.dir);
        expand(&mut config.images.placeholder);
        if let Some(ref mut file) = config.endpoints_file {
            expand(file);
        }
    }
}

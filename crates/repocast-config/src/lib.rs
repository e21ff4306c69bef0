//! # Repocast Config
//!
//! Configuration management for Repocast: the TOML schema, a loader with
//! `${VAR}` expansion and environment overrides, and validation of both the
//! file and individual endpoint definitions.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};

//! # Repocast Executor
//!
//! The endpoint registry and the generic API executor.
//!
//! Every outbound integration is an [`EndpointConfig`] row: url template,
//! method, auth scheme, payload encoding and success code. The executor turns
//! an [`EndpointRequest`] into one HTTP call per that row and returns a
//! normalized [`EndpointResponse`].
//!
//! [`EndpointConfig`]: repocast_protocols::EndpointConfig
//! [`EndpointRequest`]: repocast_protocols::EndpointRequest
//! [`EndpointResponse`]: repocast_protocols::EndpointResponse

mod error;
mod executor;
mod placeholder;
mod registry;

pub use error::RegistryError;
pub use executor::ApiExecutor;
pub use placeholder::{substitute_env, substitute_env_with, substitute_params};
pub use registry::EndpointRegistry;

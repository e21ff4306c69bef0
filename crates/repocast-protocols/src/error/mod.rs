//! Error types for the Repocast protocol layer.

mod executor;
mod source;
mod store;

pub use executor::*;
pub use source::*;
pub use store::*;

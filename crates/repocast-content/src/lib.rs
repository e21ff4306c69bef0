//! # Repocast Content
//!
//! HTTP clients for the external collaborators of the publishing jobs:
//!
//! - [`ContentServiceClient`] - repository items, URL probing and the
//!   generation trigger
//! - [`SocialifyRenderer`] - repository cover images
//!
//! plus the scratch-file helpers in [`files`].

mod client;
pub mod files;
mod socialify;

pub use client::ContentServiceClient;
pub use socialify::{SocialifyRenderer, PATTERNS};

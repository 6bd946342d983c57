//! wkmp-rec library interface
//!
//! Prompt-driven music recommendation: concurrent AI and web-search sources
//! fused, ranked and verified, then resolved against a streaming catalog.

pub mod analyzer;
pub mod clients;
pub mod config;
pub mod error;
pub mod fusion;
pub mod model_output;
pub mod pipeline;
pub mod resolver;
pub mod sources;
pub mod types;

#[cfg(test)]
mod test_support;

pub use crate::config::RecConfig;
pub use crate::error::{ClientError, ClientResult, RecommendationError};
pub use crate::pipeline::RecommendationPipeline;
pub use crate::types::{AbstractSong, ResolvedTrack};

//! End-to-end self-attention pipeline.
//!
//! [`AttentionPipeline`] chains the tokenizer, embedding table, query/key/value
//! projection and attention kernel:
//!
//! ```text
//! sentence -> vocabulary/ids -> embeddings -> Q, K, V -> weights -> context
//! ```
//!
//! Every intermediate is kept in [`PipelineOutput`] so callers can print or
//! inspect each stage.

pub mod config;
pub mod pipeline;

use thiserror::Error;

pub use config::PipelineConfig;
pub use pipeline::{run_sentence, AttentionPipeline, PipelineOutput, Projection};

/// Failures raised by any stage of the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("tokenizer: {0}")]
    Tokenizer(#[from] tokenizer::Error),
    #[error("projection: {0}")]
    Layer(#[from] layers::LayerError),
    #[error("attention: {0}")]
    Attention(#[from] attention::AttentionError),
    #[error("tensor: {0}")]
    Tensor(#[from] candle_core::Error),
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

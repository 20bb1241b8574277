//! Core traits and types shared across attention implementations.
//!
//! Implementations accept query, key and value tensors shaped either
//! `[seq_len, dim]` (single head) or `[heads, seq_len, dim]` (one slice per
//! head). Queries and keys must share their trailing width `d_key`; values may
//! use a different width `d_value`. Every intermediate is returned so callers
//! can inspect how the weights were derived.

pub mod config;
pub mod errors;

use candle_core::Tensor;

pub use config::{Config, DEFAULT_MASK_FILL};
pub use errors::AttentionError;

/// Intermediates and results of one attention pass.
///
/// All score-like tensors are shaped `[.., q_len, k_len]`; `context` is
/// shaped `[.., q_len, d_value]`.
#[derive(Debug, Clone)]
pub struct AttentionOutput {
    /// Raw similarities `queries · keysᵀ`.
    pub scores: Tensor,
    /// Additive causal mask `[q_len, k_len]`, when masking was requested.
    pub mask: Option<Tensor>,
    /// Scores after the mask was added, when masking was requested.
    pub masked_scores: Option<Tensor>,
    /// Row-stochastic attention weights.
    pub weights: Tensor,
    /// Weighted sums of value vectors.
    pub context: Tensor,
}

impl AttentionOutput {
    /// Selects one head from a batched output.
    pub fn head(&self, index: usize) -> Result<AttentionOutput, AttentionError> {
        if self.scores.rank() != 3 {
            return Err(AttentionError::shape(format!(
                "head selection needs [heads, q_len, k_len] scores, got {:?}",
                self.scores.dims()
            )));
        }
        let heads = self.scores.dim(0)?;
        if index >= heads {
            return Err(AttentionError::shape(format!(
                "head index {index} out of range for {heads} heads"
            )));
        }
        Ok(AttentionOutput {
            scores: self.scores.get(index)?,
            mask: self.mask.clone(),
            masked_scores: self
                .masked_scores
                .as_ref()
                .map(|scores| scores.get(index))
                .transpose()?,
            weights: self.weights.get(index)?,
            context: self.context.get(index)?,
        })
    }
}

/// Unified interface for attention kernels.
///
/// * `q` and `k` share the trailing width used for the `1 / sqrt(d_key)`
///   scale.
/// * `k` and `v` share the sequence length.
/// * Rank-3 inputs must agree on the leading head dimension.
/// * When [`Config::causal`] is set, query `i` only sees keys `j <= i`.
pub trait Attention {
    fn attend(
        &self,
        q: &Tensor,
        k: &Tensor,
        v: &Tensor,
        config: &Config,
    ) -> Result<AttentionOutput, AttentionError>;
}

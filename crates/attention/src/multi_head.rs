//! Multi-head wrapper over the exact kernel.
//!
//! Each head owns its own queries, keys and values, stacked along a leading
//! axis: `q, k: [heads, seq_len, d_key]`, `v: [heads, seq_len, d_value]`. The
//! kernel runs once over the batched head axis; the per-head context vectors
//! are returned as `[heads, seq_len, d_value]` without concatenation or an
//! output projection.

use candle_core::Tensor;

use crate::core::{Attention, AttentionError, AttentionOutput, Config};
use crate::reference::ExactAttention;

#[derive(Debug)]
pub struct MultiHeadAttention {
    heads: usize,
    kernel: ExactAttention,
}

impl MultiHeadAttention {
    pub fn new(heads: usize) -> Result<Self, AttentionError> {
        if heads == 0 {
            return Err(AttentionError::InvalidConfig {
                context: "multi-head attention requires at least one head".to_string(),
            });
        }
        Ok(Self {
            heads,
            kernel: ExactAttention::new(),
        })
    }

    pub fn heads(&self) -> usize {
        self.heads
    }

    fn expect_heads(&self, name: &str, tensor: &Tensor) -> Result<(), AttentionError> {
        match tensor.dims() {
            [heads, _, _] if *heads == self.heads => Ok(()),
            dims => Err(AttentionError::InvalidShape {
                context: format!(
                    "{name} must have shape [{}, seq_len, dim], got {dims:?}",
                    self.heads
                ),
            }),
        }
    }
}

impl Attention for MultiHeadAttention {
    fn attend(
        &self,
        q: &Tensor,
        k: &Tensor,
        v: &Tensor,
        config: &Config,
    ) -> Result<AttentionOutput, AttentionError> {
        self.expect_heads("q", q)?;
        self.expect_heads("k", k)?;
        self.expect_heads("v", v)?;
        self.kernel.attend(q, k, v, config)
    }
}

//! Reference scaled dot-product attention kernel.
//!
//! The computation follows the textbook order:
//!
//! 1. `scores = q · kᵀ`
//! 2. optional causal mask added to the scores
//! 3. scaling by `1 / sqrt(d_key)`
//! 4. softmax over the key axis
//! 5. `context = weights · v`
//!
//! Inputs in `f16`/`bf16` are promoted to `f32` for the whole computation and
//! the returned tensors are cast back to the query dtype.

use std::sync::OnceLock;

use candle_core::{DType, Tensor};
use candle_nn::ops::softmax_last_dim;

use crate::core::{Attention, AttentionError, AttentionOutput, Config};
use crate::masks::build_causal_mask;

/// Portable attention kernel favouring clarity over throughput.
#[derive(Debug, Default)]
pub struct ExactAttention {
    first_call: OnceLock<()>,
}

/// Dimensions resolved from validated q/k/v tensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    heads: Option<usize>,
    q_len: usize,
    k_len: usize,
    d_key: usize,
    d_value: usize,
}

impl ExactAttention {
    pub fn new() -> Self {
        Self::default()
    }

    fn layout(q: &Tensor, k: &Tensor, v: &Tensor) -> Result<Layout, AttentionError> {
        if !q.device().same_device(k.device()) || !q.device().same_device(v.device()) {
            return Err(AttentionError::shape("q, k, v must reside on the same device"));
        }
        let dtype = q.dtype();
        if dtype != k.dtype() || dtype != v.dtype() {
            return Err(AttentionError::shape("q, k, v must share the same dtype"));
        }
        if !matches!(dtype, DType::F32 | DType::F16 | DType::BF16) {
            return Err(AttentionError::shape(format!(
                "q, k, v must be floating point, got {dtype:?}"
            )));
        }

        let rank = q.rank();
        if k.rank() != rank || v.rank() != rank {
            return Err(AttentionError::shape(format!(
                "q, k, v must share a rank, got {:?}, {:?}, {:?}",
                q.dims(),
                k.dims(),
                v.dims()
            )));
        }

        let (heads, q_dims, k_dims, v_dims) = match rank {
            2 => (None, q.dims2()?, k.dims2()?, v.dims2()?),
            3 => {
                let (qh, q_len, d_q) = q.dims3()?;
                let (kh, k_len, d_k) = k.dims3()?;
                let (vh, v_len, d_v) = v.dims3()?;
                if kh != qh || vh != qh {
                    return Err(AttentionError::shape(format!(
                        "head dimension mismatch: q {qh}, k {kh}, v {vh}"
                    )));
                }
                (Some(qh), (q_len, d_q), (k_len, d_k), (v_len, d_v))
            }
            _ => {
                return Err(AttentionError::shape(format!(
                    "q must have shape [seq_len, dim] or [heads, seq_len, dim], got {:?}",
                    q.dims()
                )))
            }
        };

        let (q_len, d_query) = q_dims;
        let (k_len, d_key) = k_dims;
        let (v_len, d_value) = v_dims;
        if d_query != d_key {
            return Err(AttentionError::shape(format!(
                "q and k must share their trailing width, got {d_query} and {d_key}"
            )));
        }
        if v_len != k_len {
            return Err(AttentionError::shape(format!(
                "k and v must share the sequence length, got {k_len} and {v_len}"
            )));
        }
        if heads == Some(0) || q_len == 0 || k_len == 0 || d_key == 0 || d_value == 0 {
            return Err(AttentionError::shape(format!(
                "dimensions must be non-zero, got q {:?} k {:?} v {:?}",
                q.dims(),
                k.dims(),
                v.dims()
            )));
        }

        Ok(Layout {
            heads,
            q_len,
            k_len,
            d_key,
            d_value,
        })
    }
}

impl Attention for ExactAttention {
    fn attend(
        &self,
        q: &Tensor,
        k: &Tensor,
        v: &Tensor,
        config: &Config,
    ) -> Result<AttentionOutput, AttentionError> {
        config.validate()?;
        let layout = Self::layout(q, k, v)?;

        if self.first_call.set(()).is_ok() {
            log::info!(
                "attention::reference init causal={} mask_fill={:e} dtype={:?}",
                config.causal,
                config.mask_fill,
                q.dtype()
            );
        }
        log::debug!(
            "attend heads={:?} q_len={} k_len={} d_key={} d_value={}",
            layout.heads,
            layout.q_len,
            layout.k_len,
            layout.d_key,
            layout.d_value
        );

        let dtype = q.dtype();
        let q = q.to_dtype(DType::F32)?.contiguous()?;
        let k = k.to_dtype(DType::F32)?;
        let v = v.to_dtype(DType::F32)?.contiguous()?;

        let k_t = k.t()?.contiguous()?;
        let scores = q.matmul(&k_t)?;

        let (mask, masked_scores) = if config.causal {
            let mask = build_causal_mask(q.device(), layout.q_len, layout.k_len, config.mask_fill)?;
            let masked = scores.broadcast_add(&mask)?;
            (Some(mask), Some(masked))
        } else {
            (None, None)
        };

        let scale = 1.0 / (layout.d_key as f64).sqrt();
        let scaled = masked_scores.as_ref().unwrap_or(&scores).affine(scale, 0.0)?;
        let weights = softmax_last_dim(&scaled.contiguous()?)?;
        let context = weights.matmul(&v)?;

        let cast = |tensor: Tensor| tensor.to_dtype(dtype);
        Ok(AttentionOutput {
            scores: cast(scores)?,
            mask,
            masked_scores: masked_scores.map(cast).transpose()?,
            weights: cast(weights)?,
            context: cast(context)?,
        })
    }
}

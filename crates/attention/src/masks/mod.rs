//! Mask utilities shared by attention implementations.
//!
//! Masks produced here are additive `f32` tensors shaped `[q_len, k_len]`:
//! `0.0` where attention is permitted and a large negative sentinel otherwise.
//! They broadcast over any leading head axis of the scores.

pub mod causal;

use candle_core::DType;

/// Dtype shared by all additive masks.
pub const MASK_DTYPE: DType = DType::F32;

pub use causal::{build_causal_mask, causal_keep_matrix};

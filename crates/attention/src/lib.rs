//! Scaled dot-product self-attention primitives.
//!
//! The crate computes attention over queries, keys and values shaped
//! `[seq_len, dim]` for a single head or `[heads, seq_len, dim]` for several
//! independent heads. Queries and keys share the width `d_key`, which sets
//! the `1 / sqrt(d_key)` scale; values may have a different width `d_value`.
//!
//! Causal masking is opt-in through [`Config::causal`]. The mask is additive
//! and applied before scaling and softmax, so every query row still sums to
//! one while future positions receive negligible weight.

pub mod core;
pub mod masks;
pub mod multi_head;
pub mod reference;

pub use crate::core::{Attention, AttentionError, AttentionOutput, Config};
pub use multi_head::MultiHeadAttention;
pub use reference::ExactAttention;

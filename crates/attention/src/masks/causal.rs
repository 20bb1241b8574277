//! Builders for causal attention masks.

use candle_core::{Device, Result, Tensor};

/// Construct an additive causal mask for the supplied sequence lengths.
///
/// Entries where `k > q` receive `fill`; all others are `0.0`. When
/// `k_len > q_len`, queries are assumed to align with the most recent `q_len`
/// keys, allowing access to the extended prefix.
pub fn build_causal_mask(device: &Device, q_len: usize, k_len: usize, fill: f32) -> Result<Tensor> {
    let offset = k_len.saturating_sub(q_len);
    let mut data = vec![0f32; q_len * k_len];
    for q in 0..q_len {
        let max_k = q + offset;
        for k in (max_k + 1)..k_len {
            data[q * k_len + k] = fill;
        }
    }
    Tensor::from_vec(data, (q_len, k_len), device)
}

/// Lower-triangular `1/0` matrix describing which positions are kept.
pub fn causal_keep_matrix(device: &Device, q_len: usize, k_len: usize) -> Result<Tensor> {
    let offset = k_len.saturating_sub(q_len);
    let data: Vec<f32> = (0..q_len)
        .flat_map(|q| (0..k_len).map(move |k| if k <= q + offset { 1.0 } else { 0.0 }))
        .collect();
    Tensor::from_vec(data, (q_len, k_len), device)
}

//! Query/key/value projections.
//!
//! [`QkvProjection`] owns three [`Linear`] maps and turns embeddings shaped
//! `(seq, embedding_size)` into queries `(seq, d_query)`, keys `(seq, d_key)`
//! and values `(seq, d_value)`.
//!
//! [`MultiHeadProjection`] stacks one independent triple per head along a
//! leading axis, e.g. `W_query: (heads, d_query, embedding_size)`. The
//! embedded sequence is broadcast to `(heads, seq, embedding_size)` and every
//! head is projected with a single batched matmul, so all outputs carry the
//! head axis: `(heads, seq, d_*)`.

use candle_core::{DType, Device, Tensor};

use crate::{
    checks,
    init::ParamInit,
    linear::{Linear, LinearInit},
    LayerError, Result,
};

/// Widths of the embedding and of the three projected spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionDims {
    pub embedding_size: usize,
    pub d_query: usize,
    pub d_key: usize,
    pub d_value: usize,
}

impl ProjectionDims {
    pub fn validate(&self) -> Result<()> {
        if self.embedding_size == 0 || self.d_query == 0 || self.d_key == 0 || self.d_value == 0 {
            return Err(LayerError::InvalidConfig(format!(
                "projection dimensions must be non-zero, got {self:?}"
            )));
        }
        if self.d_query != self.d_key {
            return Err(LayerError::InvalidConfig(format!(
                "queries and keys must share a width to be compared, got d_query={} d_key={}",
                self.d_query, self.d_key
            )));
        }
        Ok(())
    }
}

/// Projected queries, keys and values.
#[derive(Debug, Clone)]
pub struct Qkv {
    pub queries: Tensor,
    pub keys: Tensor,
    pub values: Tensor,
}

/// Single-head query/key/value projection.
#[derive(Debug, Clone)]
pub struct QkvProjection {
    dims: ProjectionDims,
    query: Linear,
    key: Linear,
    value: Linear,
}

impl QkvProjection {
    /// Samples the three weight matrices in query, key, value order.
    pub fn new(
        dims: ProjectionDims,
        policy: &LinearInit,
        init: &mut ParamInit,
        device: &Device,
    ) -> Result<Self> {
        dims.validate()?;
        let query = Linear::with_init(dims.embedding_size, dims.d_query, policy, init, device)?;
        let key = Linear::with_init(dims.embedding_size, dims.d_key, policy, init, device)?;
        let value = Linear::with_init(dims.embedding_size, dims.d_value, policy, init, device)?;
        Ok(Self {
            dims,
            query,
            key,
            value,
        })
    }

    /// Builds the projection from supplied `(d_*, embedding_size)` matrices.
    pub fn from_weights(w_query: Tensor, w_key: Tensor, w_value: Tensor) -> Result<Self> {
        let query = Linear::new(w_query)?;
        let key = Linear::new(w_key)?;
        let value = Linear::new(w_value)?;
        if query.in_dim() != key.in_dim() || query.in_dim() != value.in_dim() {
            return Err(LayerError::InvalidShape {
                name: "qkv.weights",
                details: format!(
                    "weights must share the embedding width, got {}, {}, {}",
                    query.in_dim(),
                    key.in_dim(),
                    value.in_dim()
                ),
            });
        }
        let dims = ProjectionDims {
            embedding_size: query.in_dim(),
            d_query: query.out_dim(),
            d_key: key.out_dim(),
            d_value: value.out_dim(),
        };
        dims.validate()?;
        Ok(Self {
            dims,
            query,
            key,
            value,
        })
    }

    pub fn dims(&self) -> ProjectionDims {
        self.dims
    }

    pub fn w_query(&self) -> &Tensor {
        self.query.weight()
    }

    pub fn w_key(&self) -> &Tensor {
        self.key.weight()
    }

    pub fn w_value(&self) -> &Tensor {
        self.value.weight()
    }

    /// Projects `(seq, embedding_size)` embeddings.
    pub fn forward(&self, embedded: &Tensor) -> Result<Qkv> {
        checks::expect_rank("qkv.input", embedded, 2)?;
        let qkv = Qkv {
            queries: self.query.forward(embedded)?,
            keys: self.key.forward(embedded)?,
            values: self.value.forward(embedded)?,
        };
        log::debug!(
            "projected q={:?} k={:?} v={:?}",
            qkv.queries.dims(),
            qkv.keys.dims(),
            qkv.values.dims()
        );
        Ok(qkv)
    }
}

/// Per-head query/key/value projections stacked along a leading head axis.
#[derive(Debug, Clone)]
pub struct MultiHeadProjection {
    heads: usize,
    dims: ProjectionDims,
    w_query: Tensor,
    w_key: Tensor,
    w_value: Tensor,
}

impl MultiHeadProjection {
    /// Samples `(heads, d_*, embedding_size)` weights in query, key, value order.
    pub fn new(
        heads: usize,
        dims: ProjectionDims,
        policy: &LinearInit,
        init: &mut ParamInit,
        device: &Device,
    ) -> Result<Self> {
        if heads == 0 {
            return Err(LayerError::InvalidConfig(
                "multi-head projection requires at least one head".into(),
            ));
        }
        dims.validate()?;
        let prefix = [heads];
        let w_query = policy.sample(&prefix, dims.d_query, dims.embedding_size, init, device)?;
        let w_key = policy.sample(&prefix, dims.d_key, dims.embedding_size, init, device)?;
        let w_value = policy.sample(&prefix, dims.d_value, dims.embedding_size, init, device)?;
        Ok(Self {
            heads,
            dims,
            w_query,
            w_key,
            w_value,
        })
    }

    /// Builds the projection from stacked `(heads, d_*, embedding_size)` weights.
    pub fn from_weights(w_query: Tensor, w_key: Tensor, w_value: Tensor) -> Result<Self> {
        for (name, weight) in [
            ("multihead.w_query", &w_query),
            ("multihead.w_key", &w_key),
            ("multihead.w_value", &w_value),
        ] {
            checks::expect_rank(name, weight, 3)?;
            checks::expect_non_empty(name, weight)?;
            checks::expect_dtype_in(name, weight, &[DType::F32])?;
        }
        let (heads, d_query, embedding_size) = w_query.dims3()?;
        let (key_heads, d_key, key_emb) = w_key.dims3()?;
        let (value_heads, d_value, value_emb) = w_value.dims3()?;
        if key_heads != heads || value_heads != heads {
            return Err(LayerError::InvalidShape {
                name: "multihead.weights",
                details: format!(
                    "head counts differ: query {heads}, key {key_heads}, value {value_heads}"
                ),
            });
        }
        if key_emb != embedding_size || value_emb != embedding_size {
            return Err(LayerError::InvalidShape {
                name: "multihead.weights",
                details: format!(
                    "embedding widths differ: query {embedding_size}, key {key_emb}, value {value_emb}"
                ),
            });
        }
        let dims = ProjectionDims {
            embedding_size,
            d_query,
            d_key,
            d_value,
        };
        dims.validate()?;
        Ok(Self {
            heads,
            dims,
            w_query,
            w_key,
            w_value,
        })
    }

    pub fn heads(&self) -> usize {
        self.heads
    }

    pub fn dims(&self) -> ProjectionDims {
        self.dims
    }

    /// Returns the projection owned by a single head.
    pub fn head(&self, index: usize) -> Result<QkvProjection> {
        if index >= self.heads {
            return Err(LayerError::InvalidConfig(format!(
                "head index {index} out of range for {} heads",
                self.heads
            )));
        }
        QkvProjection::from_weights(
            self.w_query.get(index)?,
            self.w_key.get(index)?,
            self.w_value.get(index)?,
        )
    }

    /// Projects `(seq, embedding_size)` embeddings once per head.
    pub fn forward(&self, embedded: &Tensor) -> Result<Qkv> {
        checks::expect_rank("multihead.input", embedded, 2)?;
        checks::expect_non_empty("multihead.input", embedded)?;
        checks::expect_last_dim("multihead.input", embedded, self.dims.embedding_size)?;

        let (seq_len, embedding_size) = embedded.dims2()?;
        let repeated = embedded
            .unsqueeze(0)?
            .broadcast_as((self.heads, seq_len, embedding_size))?
            .contiguous()?;

        let project = |weight: &Tensor| -> Result<Tensor> {
            let weight_t = weight.transpose(1, 2)?.contiguous()?;
            Ok(repeated.matmul(&weight_t)?)
        };
        let qkv = Qkv {
            queries: project(&self.w_query)?,
            keys: project(&self.w_key)?,
            values: project(&self.w_value)?,
        };
        log::debug!(
            "projected {} heads q={:?} k={:?} v={:?}",
            self.heads,
            qkv.queries.dims(),
            qkv.keys.dims(),
            qkv.values.dims()
        );
        Ok(qkv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims() -> ProjectionDims {
        ProjectionDims {
            embedding_size: 4,
            d_query: 8,
            d_key: 8,
            d_value: 16,
        }
    }

    #[test]
    fn single_head_shapes() -> Result<()> {
        let device = Device::Cpu;
        let mut init = ParamInit::seeded(42);
        let projection = QkvProjection::new(dims(), &LinearInit::default(), &mut init, &device)?;
        let embedded = init.normal((4, 4), 0.0, 1.0, &device)?;

        let qkv = projection.forward(&embedded)?;

        assert_eq!(qkv.queries.dims(), &[4, 8]);
        assert_eq!(qkv.keys.dims(), &[4, 8]);
        assert_eq!(qkv.values.dims(), &[4, 16]);
        Ok(())
    }

    #[test]
    fn multi_head_matches_per_head_projection() -> Result<()> {
        let device = Device::Cpu;
        let mut init = ParamInit::seeded(9);
        let projection =
            MultiHeadProjection::new(3, dims(), &LinearInit::default(), &mut init, &device)?;
        let embedded = init.normal((4, 4), 0.0, 1.0, &device)?;

        let qkv = projection.forward(&embedded)?;
        assert_eq!(qkv.queries.dims(), &[3, 4, 8]);
        assert_eq!(qkv.keys.dims(), &[3, 4, 8]);
        assert_eq!(qkv.values.dims(), &[3, 4, 16]);

        for head in 0..3 {
            let single = projection.head(head)?.forward(&embedded)?;
            let diff = qkv
                .values
                .get(head)?
                .sub(&single.values)?
                .abs()?
                .max_all()?
                .to_vec0::<f32>()?;
            assert!(diff < 1e-5, "head {head} diverged by {diff}");
        }
        Ok(())
    }

    #[test]
    fn mismatched_query_key_widths_are_rejected() {
        let bad = ProjectionDims {
            d_key: 4,
            ..dims()
        };
        assert!(matches!(bad.validate(), Err(LayerError::InvalidConfig(_))));
    }

    #[test]
    fn from_weights_checks_embedding_width() -> Result<()> {
        let device = Device::Cpu;
        let w_query = Tensor::zeros((8, 4), DType::F32, &device)?;
        let w_key = Tensor::zeros((8, 4), DType::F32, &device)?;
        let w_value = Tensor::zeros((16, 5), DType::F32, &device)?;
        assert!(matches!(
            QkvProjection::from_weights(w_query, w_key, w_value),
            Err(LayerError::InvalidShape { .. })
        ));
        Ok(())
    }
}

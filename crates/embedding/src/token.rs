//! Token embedding table.

use candle_core::{bail, DType, Device, Error, Result, Tensor};
use layers::{checks, ParamInit};

/// Configuration for building a token embedding table.
#[derive(Debug, Clone)]
pub struct TokenEmbeddingConfig {
    /// Size of the vocabulary (number of distinct tokens).
    pub vocab_size: usize,
    /// Dimensionality of each embedding vector.
    pub embedding_size: usize,
    /// Device hosting the table.
    pub device: Device,
}

/// Lookup table mapping token ids to `embedding_size`-wide vectors.
#[derive(Debug, Clone)]
pub struct TokenEmbedding {
    config: TokenEmbeddingConfig,
    weight: Tensor,
}

impl TokenEmbedding {
    /// Builds a new table and samples the entries from `N(0, 1)`.
    pub fn new(config: TokenEmbeddingConfig, init: &mut ParamInit) -> Result<Self> {
        Self::validate_config(&config)?;
        let weight = init
            .normal(
                (config.vocab_size, config.embedding_size),
                0.0,
                1.0,
                &config.device,
            )
            .map_err(Error::wrap)?;
        Ok(Self { config, weight })
    }

    /// Wraps a caller-supplied `(vocab_size, embedding_size)` table.
    pub fn from_weight(config: TokenEmbeddingConfig, weight: Tensor) -> Result<Self> {
        Self::validate_config(&config)?;
        checks::expect_shape(
            "embedding.weight",
            &weight,
            &[config.vocab_size, config.embedding_size],
        )
        .map_err(Error::wrap)?;
        checks::expect_dtype_in("embedding.weight", &weight, &[DType::F32]).map_err(Error::wrap)?;
        let weight = weight.to_device(&config.device)?;
        Ok(Self { config, weight })
    }

    /// Returns the embedding configuration.
    pub fn config(&self) -> &TokenEmbeddingConfig {
        &self.config
    }

    /// Returns the underlying weight tensor.
    pub fn weight(&self) -> &Tensor {
        &self.weight
    }

    /// Looks up embeddings for the provided token ids.
    ///
    /// Inputs shaped `(seq,)` produce `(seq, embedding_size)`; inputs shaped
    /// `(batch, seq)` produce `(batch, seq, embedding_size)`.
    pub fn forward(&self, token_ids: &Tensor) -> Result<Tensor> {
        self.validate_token_ids(token_ids)?;
        let dims = token_ids.dims().to_vec();

        let flat = token_ids.to_dtype(DType::U32)?.flatten_all()?;
        self.ensure_id_range(&flat)?;

        let gathered = self.weight.index_select(&flat, 0)?;
        let mut output_dims = dims;
        output_dims.push(self.config.embedding_size);
        gathered.reshape(output_dims)
    }

    /// Convenience wrapper around [`forward`](Self::forward) for host-side ids.
    pub fn lookup(&self, ids: &[u32]) -> Result<Tensor> {
        let token_ids = Tensor::from_slice(ids, ids.len(), &self.config.device)?;
        self.forward(&token_ids)
    }

    fn validate_config(config: &TokenEmbeddingConfig) -> Result<()> {
        if config.vocab_size == 0 {
            bail!("token embedding requires vocab_size > 0");
        }
        if config.embedding_size == 0 {
            bail!("token embedding requires embedding_size > 0");
        }
        Ok(())
    }

    fn validate_token_ids(&self, token_ids: &Tensor) -> Result<()> {
        let dims = token_ids.dims();
        match dims {
            [seq] if *seq > 0 => {}
            [batch, seq] if *batch > 0 && *seq > 0 => {}
            [_] | [_, _] => {
                return Err(Error::Msg("token_ids must not be empty".into()));
            }
            _ => {
                return Err(Error::Msg(
                    "token_ids must be shaped [seq] or [batch, seq]".into(),
                ))
            }
        }

        if token_ids.dtype().is_int() {
            Ok(())
        } else {
            Err(Error::Msg(format!(
                "token_ids expected integer dtype but received {:?}",
                token_ids.dtype()
            )))
        }
    }

    fn ensure_id_range(&self, flat_ids: &Tensor) -> Result<()> {
        let ids = flat_ids.to_vec1::<u32>()?;
        let vocab = self.config.vocab_size;
        if let Some(&bad) = ids.iter().find(|&&id| id as usize >= vocab) {
            log::debug!("rejecting token id {bad} for vocab of {vocab}");
            return Err(Error::Msg(format!(
                "token id {} exceeds vocab size {}",
                bad, vocab
            )));
        }
        Ok(())
    }
}

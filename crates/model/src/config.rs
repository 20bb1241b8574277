use attention::core::{Config as AttentionConfig, DEFAULT_MASK_FILL};
use candle_core::Device;
use layers::{LinearInit, ProjectionDims};
use tokenizer::TokenizerConfig;

use crate::{PipelineError, Result};

/// High-level configuration for assembling the attention pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub embedding_size: usize,
    pub d_query: usize,
    pub d_key: usize,
    pub d_value: usize,
    /// `None` selects a single projection triple; `Some(h)` stacks `h` heads.
    pub heads: Option<usize>,
    pub causal: bool,
    pub mask_fill: f32,
    /// Seed for embedding and projection parameters; entropy when `None`.
    pub seed: Option<u64>,
    pub tokenizer: TokenizerConfig,
    pub weight_init: LinearInit,
    pub device: Device,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            embedding_size: 4,
            d_query: 8,
            d_key: 8,
            d_value: 16,
            heads: None,
            causal: false,
            mask_fill: DEFAULT_MASK_FILL,
            seed: None,
            tokenizer: TokenizerConfig::default(),
            weight_init: LinearInit::default(),
            device: Device::Cpu,
        }
    }
}

impl PipelineConfig {
    /// Single-head, unmasked self-attention.
    pub fn single_head() -> Self {
        Self::default()
    }

    /// Single-head self-attention with a causal mask.
    pub fn masked() -> Self {
        Self {
            causal: true,
            ..Self::default()
        }
    }

    /// Multi-head self-attention with `heads` independent projections.
    pub fn multi_head(heads: usize) -> Self {
        Self {
            heads: Some(heads),
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn projection_dims(&self) -> ProjectionDims {
        ProjectionDims {
            embedding_size: self.embedding_size,
            d_query: self.d_query,
            d_key: self.d_key,
            d_value: self.d_value,
        }
    }

    pub fn attention_config(&self) -> AttentionConfig {
        AttentionConfig {
            causal: self.causal,
            mask_fill: self.mask_fill,
        }
    }

    /// Validate structural invariants before any parameter is sampled.
    pub fn validate(&self) -> Result<()> {
        self.projection_dims().validate()?;
        if self.heads == Some(0) {
            return Err(PipelineError::InvalidConfig(
                "heads must be greater than zero".into(),
            ));
        }
        self.attention_config().validate()?;
        self.tokenizer.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_select_variants() {
        assert!(!PipelineConfig::single_head().causal);
        assert!(PipelineConfig::masked().causal);
        assert_eq!(PipelineConfig::multi_head(3).heads, Some(3));
        assert_eq!(PipelineConfig::default().with_seed(4).seed, Some(4));
    }

    #[test]
    fn validation_rejects_bad_dimensions() {
        let zero_heads = PipelineConfig::multi_head(0);
        assert!(matches!(
            zero_heads.validate(),
            Err(PipelineError::InvalidConfig(_))
        ));

        let narrow_keys = PipelineConfig {
            d_key: 4,
            ..PipelineConfig::default()
        };
        assert!(matches!(narrow_keys.validate(), Err(PipelineError::Layer(_))));

        let positive_fill = PipelineConfig {
            mask_fill: 1.0,
            ..PipelineConfig::masked()
        };
        assert!(matches!(
            positive_fill.validate(),
            Err(PipelineError::Attention(_))
        ));
    }
}

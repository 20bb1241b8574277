use std::{fmt, fs, path::Path};

use clap::ValueEnum;
use layers::LinearInit;
use model::PipelineConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokenizer::TokenizerConfig;

/// Sentence used by the fixed walkthroughs.
pub const DEFAULT_SENTENCE: &str = "The sky is blue";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("{0}")]
    Format(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// The three attention walkthroughs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Variant {
    /// Single-head self-attention.
    Single,
    /// Single-head self-attention with a causal mask.
    Masked,
    /// Multi-head self-attention, one Q/K/V triple per head.
    MultiHead,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Variant::Single => "self-attention",
            Variant::Masked => "masked self-attention",
            Variant::MultiHead => "multi-head self-attention",
        })
    }
}

/// Hyperparameters of a walkthrough, loadable from TOML or JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoConfig {
    pub sentence: String,
    pub embedding_size: usize,
    pub d_query: usize,
    pub d_key: usize,
    pub d_value: usize,
    /// Head count used by the multi-head variant.
    pub heads: usize,
    /// Overrides the variant's masking default when set.
    pub causal: Option<bool>,
    pub seed: Option<u64>,
    pub mask_fill: f32,
    /// Policy for the query, key and value projection weights.
    pub weight_init: LinearInit,
    pub tokenizer: TokenizerConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        let pipeline = PipelineConfig::default();
        Self {
            sentence: DEFAULT_SENTENCE.to_string(),
            embedding_size: pipeline.embedding_size,
            d_query: pipeline.d_query,
            d_key: pipeline.d_key,
            d_value: pipeline.d_value,
            heads: 3,
            causal: None,
            seed: None,
            mask_fill: pipeline.mask_fill,
            weight_init: pipeline.weight_init,
            tokenizer: pipeline.tokenizer,
        }
    }
}

impl DemoConfig {
    /// Reads a `.toml` (default) or `.json` configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config: DemoConfig = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&contents)?,
            Some("toml") | None => toml::from_str(&contents)?,
            Some(other) => {
                return Err(ConfigError::Format(format!(
                    "unsupported configuration extension '{other}'"
                )));
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks the settings shared by every variant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        collect(self.problems())
    }

    /// Checks the settings `variant` actually uses.
    pub fn validate_for(&self, variant: Variant) -> Result<(), ConfigError> {
        let mut errors = self.problems();
        if variant == Variant::MultiHead && self.heads == 0 {
            errors.push("heads must be greater than 0".to_string());
        }
        collect(errors)
    }

    fn problems(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.sentence.trim().is_empty() {
            errors.push("sentence must not be empty".to_string());
        }
        for (name, value) in [
            ("embedding_size", self.embedding_size),
            ("d_query", self.d_query),
            ("d_key", self.d_key),
            ("d_value", self.d_value),
        ] {
            if value == 0 {
                errors.push(format!("{name} must be greater than 0"));
            }
        }
        if self.d_query != self.d_key {
            errors.push(format!(
                "d_query ({}) must equal d_key ({})",
                self.d_query, self.d_key
            ));
        }
        if self.mask_fill.is_nan() || self.mask_fill >= 0.0 {
            errors.push(format!("mask_fill must be negative, got {}", self.mask_fill));
        }
        if let LinearInit::Uniform { low, high } = self.weight_init {
            if !(low < high) || !(high - low).is_finite() {
                errors.push(format!("weight_init bounds [{low}, {high}) are not a finite range"));
            }
        }
        if let LinearInit::Normal { mean, std } = self.weight_init {
            if !mean.is_finite() || !std.is_finite() || std < 0.0 {
                errors.push(format!("weight_init normal(mean={mean}, std={std}) is invalid"));
            }
        }
        if let Err(err) = self.tokenizer.validate() {
            errors.push(err.to_string());
        }
        errors
    }

    /// Resolves the pipeline configuration for `variant`.
    pub fn to_pipeline_config(&self, variant: Variant) -> PipelineConfig {
        let heads = match variant {
            Variant::MultiHead => Some(self.heads),
            Variant::Single | Variant::Masked => None,
        };
        PipelineConfig {
            embedding_size: self.embedding_size,
            d_query: self.d_query,
            d_key: self.d_key,
            d_value: self.d_value,
            heads,
            causal: self.causal.unwrap_or(variant == Variant::Masked),
            mask_fill: self.mask_fill,
            seed: self.seed,
            tokenizer: self.tokenizer.clone(),
            weight_init: self.weight_init.clone(),
            ..PipelineConfig::default()
        }
    }
}

fn collect(errors: Vec<String>) -> Result<(), ConfigError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(errors.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_walkthroughs() {
        let config = DemoConfig::default();
        assert_eq!(config.sentence, DEFAULT_SENTENCE);
        assert_eq!(
            (config.embedding_size, config.d_query, config.d_key, config.d_value),
            (4, 8, 8, 16)
        );
        assert_eq!(config.heads, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn variants_resolve_heads_and_masking() {
        let config = DemoConfig::default();
        let single = config.to_pipeline_config(Variant::Single);
        assert_eq!((single.heads, single.causal), (None, false));
        let masked = config.to_pipeline_config(Variant::Masked);
        assert_eq!((masked.heads, masked.causal), (None, true));
        let multi = config.to_pipeline_config(Variant::MultiHead);
        assert_eq!((multi.heads, multi.causal), (Some(3), false));

        let forced = DemoConfig {
            causal: Some(true),
            ..DemoConfig::default()
        };
        assert!(forced.to_pipeline_config(Variant::MultiHead).causal);
    }

    #[test]
    fn validation_reports_every_problem() {
        let config = DemoConfig {
            sentence: "  ".into(),
            heads: 0,
            d_key: 4,
            mask_fill: 5.0,
            ..DemoConfig::default()
        };
        let message = config
            .validate_for(Variant::MultiHead)
            .unwrap_err()
            .to_string();
        assert!(message.contains("sentence"));
        assert!(message.contains("heads"));
        assert!(message.contains("d_key"));
        assert!(message.contains("mask_fill"));
    }

    #[test]
    fn head_count_only_matters_for_multi_head() {
        let config = DemoConfig {
            heads: 0,
            ..DemoConfig::default()
        };
        assert!(config.validate().is_ok());
        assert!(config.validate_for(Variant::Single).is_ok());
        assert!(config.validate_for(Variant::Masked).is_ok());
        assert!(matches!(
            config.validate_for(Variant::MultiHead),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn weight_init_reaches_the_pipeline() {
        let config = DemoConfig {
            weight_init: LinearInit::XavierUniform,
            ..DemoConfig::default()
        };
        assert_eq!(
            config.to_pipeline_config(Variant::Single).weight_init,
            LinearInit::XavierUniform
        );

        let broken = DemoConfig {
            weight_init: LinearInit::Uniform {
                low: 0.0,
                high: f32::INFINITY,
            },
            ..DemoConfig::default()
        };
        let message = broken.validate().unwrap_err().to_string();
        assert!(message.contains("weight_init"));
    }
}

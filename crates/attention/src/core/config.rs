//! Configuration options shared by all attention implementations.

use super::errors::AttentionError;

/// Additive value written above the diagonal of a causal mask.
///
/// Any sufficiently large negative number works; after scaling and softmax the
/// masked weights underflow to zero.
pub const DEFAULT_MASK_FILL: f32 = -1e9;

/// Configuration driving attention behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Prevent each query from attending to keys at later positions.
    pub causal: bool,
    /// Additive sentinel applied to masked scores. `f32::NEG_INFINITY` is
    /// accepted as well.
    pub mask_fill: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            causal: false,
            mask_fill: DEFAULT_MASK_FILL,
        }
    }
}

impl Config {
    /// Unmasked attention with default settings.
    pub fn unmasked() -> Self {
        Self::default()
    }

    /// Causally masked attention with the default sentinel.
    pub fn causal() -> Self {
        Self {
            causal: true,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), AttentionError> {
        if self.mask_fill.is_nan() || self.mask_fill >= 0.0 {
            return Err(AttentionError::InvalidConfig {
                context: format!("mask_fill must be negative, got {}", self.mask_fill),
            });
        }
        Ok(())
    }
}

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Normalisation applied to sentences before they are split into words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Characters removed from the sentence before splitting.
    pub strip_chars: Vec<char>,
    /// When `false`, words are lowercased before ranking and lookup.
    pub case_sensitive: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            strip_chars: vec![','],
            case_sensitive: true,
        }
    }
}

impl TokenizerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.strip_chars.iter().any(|c| c.is_whitespace()) {
            return Err(Error::InvalidConfig(
                "strip_chars must not contain whitespace",
            ));
        }
        Ok(())
    }
}

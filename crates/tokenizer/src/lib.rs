//! Word-level vocabulary utilities for the attention walkthroughs.
//!
//! Sentences are normalised by stripping the characters listed in
//! [`TokenizerConfig::strip_chars`] and splitting on whitespace. Every distinct
//! word is then assigned an index equal to its rank in the sorted list of
//! distinct words, so the resulting indices always form a permutation of
//! `0..N`.
//!
//! # Ordering
//!
//! Words are compared byte-wise (`str`'s `Ord`), which makes the ordering case
//! sensitive: `"The"` sorts before `"blue"`. Setting
//! [`TokenizerConfig::case_sensitive`] to `false` lowercases words before they
//! are ranked or encoded.

pub mod config;
pub mod errors;
pub mod pretokenizer;
pub mod vocab;

pub use config::TokenizerConfig;
pub use errors::{Error, Result};
pub use pretokenizer::pretokenize;
pub use vocab::Vocabulary;

/// Builds a vocabulary for `sentence` and encodes it in one pass.
pub fn tokenize(sentence: &str, cfg: &TokenizerConfig) -> Result<(Vocabulary, Vec<u32>)> {
    let vocab = Vocabulary::from_sentence(sentence, cfg)?;
    let ids = vocab.encode_sentence(sentence, cfg)?;
    Ok((vocab, ids))
}

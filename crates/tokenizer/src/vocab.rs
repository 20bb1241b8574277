use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::config::TokenizerConfig;
use crate::errors::{Error, Result};
use crate::pretokenizer::pretokenize;

/// Immutable mapping between words and their sorted-rank indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    words: Vec<String>,
    ids: HashMap<String, u32>,
}

impl Vocabulary {
    /// Builds a vocabulary from already pre-tokenized words.
    pub fn from_words<S: AsRef<str>>(words: &[S]) -> Result<Self> {
        let distinct: BTreeSet<&str> = words.iter().map(|word| word.as_ref()).collect();
        if distinct.is_empty() {
            return Err(Error::EmptyInput);
        }

        let words: Vec<String> = distinct.into_iter().map(str::to_string).collect();
        let ids = words
            .iter()
            .enumerate()
            .map(|(idx, word)| (word.clone(), idx as u32))
            .collect();

        log::debug!("vocabulary built with {} distinct words", words.len());
        Ok(Self { words, ids })
    }

    /// Normalises `sentence` and builds a vocabulary from its distinct words.
    pub fn from_sentence(sentence: &str, cfg: &TokenizerConfig) -> Result<Self> {
        cfg.validate()?;
        Self::from_words(&pretokenize(sentence, cfg))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn id(&self, word: &str) -> Option<u32> {
        self.ids.get(word).copied()
    }

    pub fn word(&self, id: u32) -> Option<&str> {
        self.words.get(id as usize).map(String::as_str)
    }

    /// Iterates `(word, id)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.words
            .iter()
            .enumerate()
            .map(|(idx, word)| (word.as_str(), idx as u32))
    }

    /// Maps each word to its index, failing on the first unknown word.
    pub fn encode<S: AsRef<str>>(&self, words: &[S]) -> Result<Vec<u32>> {
        if words.is_empty() {
            return Err(Error::EmptyInput);
        }
        words
            .iter()
            .map(|word| {
                let word = word.as_ref();
                self.id(word)
                    .ok_or_else(|| Error::UnknownWord(word.to_string()))
            })
            .collect()
    }

    /// Normalises `sentence` with `cfg` and encodes the resulting words.
    pub fn encode_sentence(&self, sentence: &str, cfg: &TokenizerConfig) -> Result<Vec<u32>> {
        self.encode(&pretokenize(sentence, cfg))
    }

    /// Maps ids back to words.
    pub fn decode(&self, ids: &[u32]) -> Result<Vec<&str>> {
        ids.iter()
            .map(|&id| {
                self.word(id).ok_or(Error::UnknownId {
                    id,
                    len: self.len(),
                })
            })
            .collect()
    }
}

impl fmt::Display for Vocabulary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (idx, (word, id)) in self.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{word}: {id}")?;
        }
        f.write_str("}")
    }
}

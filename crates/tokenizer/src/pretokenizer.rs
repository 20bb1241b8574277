use crate::config::TokenizerConfig;

/// Strips configured characters and splits `sentence` on whitespace.
///
/// Word order and duplicates are preserved.
pub fn pretokenize(sentence: &str, cfg: &TokenizerConfig) -> Vec<String> {
    let cleaned: String = sentence
        .chars()
        .filter(|c| !cfg.strip_chars.contains(c))
        .collect();

    cleaned
        .split_whitespace()
        .map(|word| {
            if cfg.case_sensitive {
                word.to_string()
            } else {
                word.to_lowercase()
            }
        })
        .collect()
}

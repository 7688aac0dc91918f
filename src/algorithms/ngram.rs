//! Character n-gram extraction
//!
//! Splits names into overlapping fixed-length substrings that form the
//! feature vocabulary of the TF-IDF vector space.
//!
//! # N-gram Size Limits
//!
//! Valid n-gram sizes are in the range 1-32 (inclusive).
//! - `n = 0` returns empty results
//! - `n > 32` is clamped to 32

use ahash::AHashMap;

/// Maximum valid n-gram size. Values above this are clamped.
pub const MAX_NGRAM_SIZE: usize = 32;

/// Default n-gram length used for name features.
pub const DEFAULT_NGRAM_SIZE: usize = 3;

/// Characters dropped before windows are taken.
pub const NGRAM_STRIPPED_CHARS: [char; 4] = [',', '-', '.', '/'];

#[inline]
fn clamp_ngram_size(n: usize) -> usize {
    n.min(MAX_NGRAM_SIZE)
}

/// Extract n-grams from a name.
///
/// Windows are taken over characters without padding, so strings shorter
/// than `n` produce no n-grams at all.
///
/// # Arguments
/// * `n` - N-gram size (1-32). Values of 0 return empty vec, values >32 are clamped.
#[must_use]
pub fn extract_ngrams(s: &str, n: usize) -> Vec<String> {
    let n = clamp_ngram_size(n);
    if n == 0 {
        return vec![];
    }

    let chars: Vec<char> = s
        .chars()
        .filter(|c| !NGRAM_STRIPPED_CHARS.contains(c))
        .collect();

    if chars.len() < n {
        return vec![];
    }

    chars.windows(n).map(|w| w.iter().collect()).collect()
}

/// Count occurrences of each n-gram in a name.
#[must_use]
pub fn ngram_counts(s: &str, n: usize) -> AHashMap<String, usize> {
    let mut counts = AHashMap::new();
    for ngram in extract_ngrams(s, n) {
        *counts.entry(ngram).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_trigrams() {
        assert_eq!(extract_ngrams("jon snow", 3), vec!["jon", "on ", "n s", " sn", "sno", "now"]);
    }

    #[test]
    fn test_strips_punctuation() {
        assert_eq!(extract_ngrams("a.b-c", 2), vec!["ab", "bc"]);
    }

    #[test]
    fn test_short_and_zero() {
        assert!(extract_ngrams("jo", 3).is_empty());
        assert!(extract_ngrams("", 3).is_empty());
        assert!(extract_ngrams("jon", 0).is_empty());
    }

    #[test]
    fn test_counts_repeats() {
        let counts = ngram_counts("aaaa", 2);
        assert_eq!(counts.get("aa"), Some(&3));
        assert_eq!(counts.len(), 1);
    }
}

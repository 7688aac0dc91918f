//! Text algorithms used by the resolver
//!
//! Normalization, n-gram features and the TF-IDF vector space, plus the
//! rule-based name-match tiers used by downstream enrichment.

pub mod cosine;
pub mod match_tier;
pub mod ngram;
pub mod normalize;

pub use cosine::{cosine_similarity, SparseVector, TfIdfSpace};
pub use match_tier::{classify_name_match, MatchTier};
pub use ngram::{extract_ngrams, DEFAULT_NGRAM_SIZE, MAX_NGRAM_SIZE};
pub use normalize::{normalize_name, NormalizedName, Suffix};

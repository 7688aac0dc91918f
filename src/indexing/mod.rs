//! Indexing structures for candidate blocking
//!
//! - N-gram postings: restrict pairwise scoring to names that share at
//!   least one n-gram feature

pub mod ngram_index;

pub use ngram_index::NgramIndex;

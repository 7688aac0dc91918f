//! Error types for resolution runs

use std::io;

use thiserror::Error;

/// Errors that can abort a resolution run.
///
/// Degenerate names are never errors; everything here is either a bad
/// configuration or a failure of the surrounding I/O.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Similarity threshold outside `[0.0, 1.0)`
    #[error("threshold must be a finite number in range [0.0, 1.0), got {0}")]
    InvalidThreshold(f64),

    /// N-gram size of zero or above the supported maximum
    #[error("ngram_size must be in range 1..={max}, got {got}")]
    InvalidNgramSize { got: usize, max: usize },

    /// Input header lacks a required column
    #[error("missing column '{0}' in input header")]
    MissingColumn(String),

    /// A data row is shorter than the header
    #[error("row {row} has no value for column '{column}'")]
    ShortRow { row: usize, column: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ResolveError>;

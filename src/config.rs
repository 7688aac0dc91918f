//! Resolver configuration
//!
//! Every field has a default, so a TOML file only needs the keys it changes:
//!
//! ```toml
//! merge = "relabel"
//!
//! [scorer]
//! threshold = 0.8
//! candidates = "exhaustive"
//!
//! [ingest]
//! jurisdiction_prefixes = ["us_ban_"]
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::cluster::MergeStrategy;
use crate::error::Result;
use crate::record::IngestConfig;
use crate::scorer::ScorerConfig;

/// Settings for one resolution run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    pub scorer: ScorerConfig,
    pub merge: MergeStrategy,
    /// Process partitions on the rayon pool
    pub parallel: bool,
    pub ingest: IngestConfig,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            scorer: ScorerConfig::default(),
            merge: MergeStrategy::default(),
            parallel: true,
            ingest: IngestConfig::default(),
        }
    }
}

impl ResolverConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.scorer.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolveError;
    use crate::scorer::CandidateStrategy;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(ResolverConfig::from_toml_str("").unwrap(), ResolverConfig::default());
    }

    #[test]
    fn test_partial_document() {
        let config = ResolverConfig::from_toml_str(
            r#"
            merge = "relabel"
            parallel = false

            [scorer]
            threshold = 0.8
            candidates = "exhaustive"
            "#,
        )
        .unwrap();
        assert_eq!(config.merge, MergeStrategy::Relabel);
        assert!(!config.parallel);
        assert_eq!(config.scorer.threshold, 0.8);
        assert_eq!(config.scorer.ngram_size, 3);
        assert_eq!(config.scorer.candidates, CandidateStrategy::Exhaustive);
        assert_eq!(config.ingest, IngestConfig::default());
    }

    #[test]
    fn test_rejects_invalid_values() {
        let err = ResolverConfig::from_toml_str("[scorer]\nthreshold = 1.5").unwrap_err();
        assert!(matches!(err, ResolveError::InvalidThreshold(_)));

        let err = ResolverConfig::from_toml_str("thresold = 0.5").unwrap_err();
        assert!(matches!(err, ResolveError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resolve.toml");
        fs::write(&path, "[scorer]\nngram_size = 2\n").unwrap();
        assert_eq!(ResolverConfig::load(&path).unwrap().scorer.ngram_size, 2);

        let missing = ResolverConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(missing, ResolveError::Io(_)));
    }
}

//! Candidate pair scoring within one partition
//!
//! Fits a TF-IDF space over a partition's unique names and emits every
//! ordered pair of distinct names whose cosine similarity is strictly above
//! the threshold.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::algorithms::cosine::TfIdfSpace;
use crate::algorithms::ngram::{DEFAULT_NGRAM_SIZE, MAX_NGRAM_SIZE};
use crate::error::{ResolveError, Result};
use crate::indexing::NgramIndex;
use crate::PARALLEL_THRESHOLD;

/// Default similarity threshold; pairs must score strictly above it.
pub const DEFAULT_THRESHOLD: f64 = 0.75;

/// How candidate pairs are generated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStrategy {
    /// Score every name against every other name (O(N^2))
    Exhaustive,
    /// Only score names that share an n-gram. Same output for any
    /// threshold >= 0, since names without a shared n-gram score 0.
    #[default]
    Blocked,
}

/// Scorer parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScorerConfig {
    /// Character n-gram length
    pub ngram_size: usize,
    /// Exclusive lower bound on pair scores, in `[0.0, 1.0)`
    pub threshold: f64,
    pub candidates: CandidateStrategy,
    /// Emit `(b, a)` alongside `(a, b)`; clustering treats them the same
    pub emit_both_directions: bool,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            ngram_size: DEFAULT_NGRAM_SIZE,
            threshold: DEFAULT_THRESHOLD,
            candidates: CandidateStrategy::default(),
            emit_both_directions: true,
        }
    }
}

impl ScorerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.ngram_size == 0 || self.ngram_size > MAX_NGRAM_SIZE {
            return Err(ResolveError::InvalidNgramSize {
                got: self.ngram_size,
                max: MAX_NGRAM_SIZE,
            });
        }
        if !self.threshold.is_finite() || !(0.0..1.0).contains(&self.threshold) {
            return Err(ResolveError::InvalidThreshold(self.threshold));
        }
        Ok(())
    }
}

/// Candidate edge between two distinct names of one partition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchPair {
    pub name_a: String,
    pub name_b: String,
    pub partition_key: String,
    /// Cosine similarity in `(threshold, 1.0]`
    pub score: f64,
}

/// Index-based form of a [`MatchPair`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredEdge {
    pub a: usize,
    pub b: usize,
    pub score: f64,
}

/// Emits candidate match pairs for a partition
#[derive(Debug, Clone)]
pub struct SimilarityScorer {
    config: ScorerConfig,
}

impl SimilarityScorer {
    pub fn new(config: ScorerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// Score a partition's unique names and return its candidate pairs.
    ///
    /// Pairs come out sorted by (position of `name_a`, position of `name_b`)
    /// in `names`. Fewer than two names yield no pairs.
    pub fn score_partition(&self, partition_key: &str, names: &[String]) -> Vec<MatchPair> {
        self.score_edges(names)
            .into_iter()
            .map(|edge| MatchPair {
                name_a: names[edge.a].clone(),
                name_b: names[edge.b].clone(),
                partition_key: partition_key.to_string(),
                score: edge.score,
            })
            .collect()
    }

    /// Score a partition and return index-based edges.
    pub fn score_edges(&self, names: &[String]) -> Vec<ScoredEdge> {
        if names.len() < 2 {
            return Vec::new();
        }

        let space = TfIdfSpace::fit(names, self.config.ngram_size);
        let index = match self.config.candidates {
            CandidateStrategy::Blocked => Some(NgramIndex::build(&space)),
            CandidateStrategy::Exhaustive => None,
        };

        let row = |i: usize| self.score_row(&space, index.as_ref(), names, i);
        let mut edges: Vec<ScoredEdge> = if names.len() >= PARALLEL_THRESHOLD {
            (0..names.len()).into_par_iter().flat_map_iter(row).collect()
        } else {
            (0..names.len()).flat_map(row).collect()
        };
        edges.sort_unstable_by_key(|edge| (edge.a, edge.b));

        debug!(
            names = names.len(),
            vocabulary = space.vocabulary_size(),
            pairs = edges.len(),
            "scored partition"
        );
        edges
    }

    fn score_row(
        &self,
        space: &TfIdfSpace,
        index: Option<&NgramIndex>,
        names: &[String],
        i: usize,
    ) -> Vec<ScoredEdge> {
        let scores: Vec<(usize, f64)> = match index {
            Some(index) => index.scores(space, i),
            None => (0..names.len())
                .map(|j| (j, space.similarity_at(i, j)))
                .collect(),
        };

        scores
            .into_iter()
            .filter(|&(j, score)| {
                j != i
                    && (self.config.emit_both_directions || i < j)
                    && score > self.config.threshold
                    && names[i] != names[j]
            })
            .map(|(j, score)| ScoredEdge { a: i, b: j, score })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn chain() -> Vec<String> {
        names(&[
            "christopher montgomery",
            "christopher montgomerie",
            "christophor montgomerie",
            "elizabeth warren",
        ])
    }

    fn scorer(candidates: CandidateStrategy) -> SimilarityScorer {
        SimilarityScorer::new(ScorerConfig {
            candidates,
            ..ScorerConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_spelling_variants_match() {
        let input = chain();
        let pairs = scorer(CandidateStrategy::Blocked).score_partition("nd", &input);
        let linked = |a: &str, b: &str| pairs.iter().any(|p| p.name_a == a && p.name_b == b);

        assert!(linked("christopher montgomery", "christopher montgomerie"));
        assert!(linked("christopher montgomerie", "christophor montgomerie"));
        // ~0.65 on its own, below the default threshold
        assert!(!linked("christopher montgomery", "christophor montgomerie"));
        assert_eq!(pairs.len(), 4);
        assert!(pairs.iter().all(|p| p.partition_key == "nd"));
        assert!(pairs.iter().all(|p| p.score > DEFAULT_THRESHOLD && p.score <= 1.0));
    }

    #[test]
    fn test_threshold_is_exclusive_lower_bound() {
        let input = names(&["jon snow", "jon c snow", "jon clark snow"]);
        // ~0.51, ~0.37 and ~0.39 under this partition's weights
        assert!(scorer(CandidateStrategy::Blocked).score_edges(&input).is_empty());

        let loose = SimilarityScorer::new(ScorerConfig {
            threshold: 0.3,
            ..ScorerConfig::default()
        })
        .unwrap();
        assert_eq!(loose.score_edges(&input).len(), 6);
    }

    #[test]
    fn test_both_directions_and_symmetry() {
        let edges = scorer(CandidateStrategy::Blocked).score_edges(&chain());
        assert_eq!(edges.len(), 4);
        for edge in &edges {
            let reverse = edges
                .iter()
                .find(|e| e.a == edge.b && e.b == edge.a)
                .expect("reverse edge");
            assert_eq!(reverse.score, edge.score);
        }
    }

    #[test]
    fn test_single_direction() {
        let input = chain();
        let scorer = SimilarityScorer::new(ScorerConfig {
            emit_both_directions: false,
            ..ScorerConfig::default()
        })
        .unwrap();
        let edges = scorer.score_edges(&input);
        assert_eq!(edges.len(), 2);
        assert!(edges.iter().all(|e| e.a < e.b));
    }

    #[test]
    fn test_blocked_equals_exhaustive() {
        let input = names(&[
            "jon snow",
            "jon c snow",
            "jon clark snow",
            "joan snowe",
            "arya stark",
            "ary stark",
            "al",
            "",
        ]);
        for threshold in [0.0, 0.3, 0.75] {
            let config = |candidates| ScorerConfig {
                threshold,
                candidates,
                ..ScorerConfig::default()
            };
            let blocked = SimilarityScorer::new(config(CandidateStrategy::Blocked)).unwrap();
            let exhaustive = SimilarityScorer::new(config(CandidateStrategy::Exhaustive)).unwrap();
            assert_eq!(blocked.score_edges(&input), exhaustive.score_edges(&input));
        }
    }

    #[test]
    fn test_sorted_output() {
        let mut input = chain();
        input.reverse();
        let edges = scorer(CandidateStrategy::Exhaustive).score_edges(&input);
        assert!(!edges.is_empty());
        let keys: Vec<(usize, usize)> = edges.iter().map(|e| (e.a, e.b)).collect();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_large_partition_matches_pairwise_scan() {
        let firsts = ["christopher", "elizabeth", "jonathan", "margaret", "bartholomew", "catherine"];
        let lasts = [
            "montgomery", "montgomerie", "fitzgerald", "fitzgeralds", "thompson", "thomson",
            "richardson", "richards", "washington", "worthington", "harrington", "herrington",
            "kowalski", "kowalsky", "anderson", "andersen", "williams", "williamson", "robertson",
            "robinson",
        ];
        let input: Vec<String> = (0..firsts.len() * lasts.len())
            .map(|i| format!("{} {}", firsts[i % firsts.len()], lasts[i / firsts.len()]))
            .collect();
        assert!(input.len() >= PARALLEL_THRESHOLD);

        let space = TfIdfSpace::fit(&input, DEFAULT_NGRAM_SIZE);
        let mut expected = Vec::new();
        for a in 0..input.len() {
            for b in 0..input.len() {
                let score = space.similarity_at(a, b);
                if a != b && score > DEFAULT_THRESHOLD {
                    expected.push(ScoredEdge { a, b, score });
                }
            }
        }
        assert!(!expected.is_empty());

        for candidates in [CandidateStrategy::Blocked, CandidateStrategy::Exhaustive] {
            assert_eq!(scorer(candidates).score_edges(&input), expected);
        }
    }

    #[test]
    fn test_degenerate_partitions() {
        let scorer = scorer(CandidateStrategy::Blocked);
        assert!(scorer.score_partition("nd", &[]).is_empty());
        assert!(scorer.score_partition("nd", &names(&["jon snow"])).is_empty());
        assert!(scorer.score_partition("nd", &names(&["", "al"])).is_empty());
    }

    #[test]
    fn test_invalid_config() {
        let bad = |threshold, ngram_size| {
            SimilarityScorer::new(ScorerConfig {
                threshold,
                ngram_size,
                ..ScorerConfig::default()
            })
        };
        assert!(matches!(bad(1.0, 3), Err(ResolveError::InvalidThreshold(_))));
        assert!(matches!(bad(-0.1, 3), Err(ResolveError::InvalidThreshold(_))));
        assert!(matches!(bad(f64::NAN, 3), Err(ResolveError::InvalidThreshold(_))));
        assert!(matches!(bad(0.75, 0), Err(ResolveError::InvalidNgramSize { .. })));
        assert!(matches!(bad(0.75, 33), Err(ResolveError::InvalidNgramSize { .. })));
        assert!(bad(0.0, 1).is_ok());
    }
}

//! nameresolve - Identity resolution for person names
//!
//! Groups free-text name records that refer to the same person within a
//! jurisdiction and stamps every record with a stable group id.
//!
//! # Pipeline
//! - Normalization: canonical lowercase name, generational suffix, token count
//! - Partitioning: names are only compared inside their jurisdiction
//! - Scoring: character n-gram TF-IDF cosine similarity, blocked through an
//!   inverted n-gram index
//! - Clustering: connected components of the match graph, labeled with
//!   globally unique ids
//!
//! ```
//! use nameresolve::{RawRecord, Resolver, ResolverConfig};
//!
//! let resolver = Resolver::new(ResolverConfig::default()).unwrap();
//! let resolution = resolver.resolve(vec![
//!     RawRecord::new("Jon Snow", "us_ban_nd"),
//!     RawRecord::new("Snow, Jon", "us_ban_sd"),
//! ]);
//! assert!(resolution.records.iter().all(|r| r.group_id > 0));
//! ```

pub mod algorithms;
pub mod cluster;
pub mod config;
pub mod error;
pub mod indexing;
pub mod io;
pub mod metrics;
pub mod partition;
pub mod record;
pub mod resolver;
pub mod scorer;

pub use algorithms::{normalize_name, NormalizedName, Suffix};
pub use cluster::{ClusterAssigner, GroupAssignment, GroupId, IdAllocator, MergeStrategy};
pub use config::ResolverConfig;
pub use error::{ResolveError, Result};
pub use record::{RawRecord, Record};
pub use resolver::{Resolution, ResolutionStats, ResolvedIdentity, Resolver};
pub use scorer::{CandidateStrategy, MatchPair, ScorerConfig, SimilarityScorer};

/// Minimum partition size for scoring rows in parallel.
///
/// Below this, scoring a partition is cheaper than handing its rows to the
/// thread pool.
pub(crate) const PARALLEL_THRESHOLD: usize = 100;

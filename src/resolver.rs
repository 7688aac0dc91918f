//! End-to-end resolution run
//!
//! ingest → partition → score → cluster → label. Partitions share no state
//! while they are scored and clustered, so that phase runs on the rayon
//! pool; group ids are handed out afterwards, one block per partition in
//! key order, which keeps ids globally unique and the output identical to a
//! sequential run.

use ahash::AHashMap;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, info_span, warn};

use crate::algorithms::normalize::Suffix;
use crate::cluster::{ClusterAssigner, Clustering, GroupAssignment, GroupId, IdAllocator};
use crate::config::ResolverConfig;
use crate::error::Result;
use crate::partition::{partition, Partition};
use crate::record::{ingest, Ingested, RawRecord, Record};
use crate::scorer::{MatchPair, SimilarityScorer};

/// Counters describing one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionStats {
    pub input_rows: usize,
    pub duplicates_dropped: usize,
    pub records: usize,
    pub partitions: usize,
    pub unique_names: usize,
    pub candidate_pairs: usize,
    pub groups: usize,
}

/// A resolved group, as handed to downstream enrichment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedIdentity {
    pub group_id: GroupId,
    pub partition_key: String,
    /// Member name with the most tokens; ties go to the longer, then the earlier name
    pub canonical_name: String,
    /// First suffix found among the members, in record order
    pub suffix: Suffix,
    /// Record ids of the members
    pub members: Vec<usize>,
}

/// Output of a run
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Every kept record, in input order, with its group id set
    pub records: Vec<Record>,
    /// Candidate pairs of all partitions, in partition-key order
    pub pairs: Vec<MatchPair>,
    pub stats: ResolutionStats,
}

impl Resolution {
    /// One entry per group, ordered by group id.
    pub fn identities(&self) -> Vec<ResolvedIdentity> {
        let mut groups: BTreeMap<GroupId, Vec<&Record>> = BTreeMap::new();
        for record in &self.records {
            groups.entry(record.group_id).or_default().push(record);
        }

        groups
            .into_iter()
            .filter_map(|(group_id, members)| {
                let first = members.first()?;
                let canonical = members.iter().fold(*first, |best, record| {
                    let key = |r: &Record| (r.name_token_count, r.normalized_name.len());
                    if key(record) > key(best) {
                        record
                    } else {
                        best
                    }
                });
                Some(ResolvedIdentity {
                    group_id,
                    partition_key: first.partition_key.clone(),
                    canonical_name: canonical.normalized_name.clone(),
                    suffix: members
                        .iter()
                        .map(|r| r.suffix)
                        .find(|s| *s != Suffix::None)
                        .unwrap_or_default(),
                    members: members.iter().map(|r| r.id).collect(),
                })
            })
            .collect()
    }
}

struct PartitionOutcome {
    key: String,
    pairs: Vec<MatchPair>,
    clustering: Clustering,
}

/// Runs the whole pipeline with one configuration
#[derive(Debug, Clone)]
pub struct Resolver {
    config: ResolverConfig,
    scorer: SimilarityScorer,
    assigner: ClusterAssigner,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            scorer: SimilarityScorer::new(config.scorer.clone())?,
            assigner: ClusterAssigner::new(config.merge),
            config,
        })
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Ingest raw rows and resolve them.
    pub fn resolve(&self, raw: Vec<RawRecord>) -> Resolution {
        let input_rows = raw.len();
        let Ingested {
            records,
            duplicates_dropped,
        } = ingest(raw, &self.config.ingest);
        if duplicates_dropped > 0 {
            warn!(duplicates_dropped, "dropped rows repeating an earlier raw name");
        }

        let mut resolution = self.resolve_records(records);
        resolution.stats.input_rows = input_rows;
        resolution.stats.duplicates_dropped = duplicates_dropped;
        resolution
    }

    /// Resolve already-normalized records; every group id is overwritten.
    pub fn resolve_records(&self, mut records: Vec<Record>) -> Resolution {
        let partitions = partition(&records);
        let unique_names = partitions.iter().map(Partition::len).sum();
        info!(
            records = records.len(),
            partitions = partitions.len(),
            unique_names,
            "resolving"
        );

        let outcomes: Vec<PartitionOutcome> = if self.config.parallel {
            partitions
                .into_par_iter()
                .map(|p| self.process(p))
                .collect()
        } else {
            partitions.into_iter().map(|p| self.process(p)).collect()
        };

        let mut ids = IdAllocator::new();
        let mut assignments: AHashMap<String, GroupAssignment> = AHashMap::new();
        let mut pairs = Vec::new();
        for outcome in outcomes {
            assignments.insert(outcome.key, outcome.clustering.into_assignment(&mut ids));
            pairs.extend(outcome.pairs);
        }

        for record in &mut records {
            record.group_id = assignments
                .get(&record.partition_key)
                .and_then(|assignment| assignment.get(&record.normalized_name))
                .unwrap_or_else(|| ids.allocate());
        }

        let stats = ResolutionStats {
            input_rows: records.len(),
            duplicates_dropped: 0,
            records: records.len(),
            partitions: assignments.len(),
            unique_names,
            candidate_pairs: pairs.len(),
            groups: ids.allocated() as usize,
        };
        info!(
            groups = stats.groups,
            candidate_pairs = stats.candidate_pairs,
            "resolution complete"
        );

        Resolution {
            records,
            pairs,
            stats,
        }
    }

    fn process(&self, partition: Partition) -> PartitionOutcome {
        let span = info_span!(
            "partition",
            key = %partition.key,
            names = partition.len(),
            comparisons = partition.comparisons()
        );
        let _enter = span.enter();

        let pairs = self.scorer.score_partition(&partition.key, &partition.names);
        let clustering = self.assigner.cluster(&partition.names, &pairs);
        debug!(
            pairs = pairs.len(),
            groups = clustering.component_count(),
            "clustered partition"
        );

        PartitionOutcome {
            key: partition.key,
            pairs,
            clustering,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::UNASSIGNED;

    fn raw(rows: &[(&str, &str)]) -> Vec<RawRecord> {
        rows.iter()
            .map(|(name, jurisdiction)| RawRecord::new(*name, *jurisdiction))
            .collect()
    }

    fn resolver() -> Resolver {
        Resolver::new(ResolverConfig::default()).unwrap()
    }

    #[test]
    fn test_chain_resolves_to_one_group() {
        let resolution = resolver().resolve(raw(&[
            ("Christopher Montgomery", "us_ban_nd"),
            ("Christopher Montgomerie", "us_ban_nd"),
            ("Christophor Montgomerie", "us_ban_nd"),
            ("Elizabeth Warren", "us_ban_nd"),
        ]));
        let ids: Vec<GroupId> = resolution.records.iter().map(|r| r.group_id).collect();
        assert_eq!(ids[0], ids[1]);
        assert_eq!(ids[1], ids[2]);
        assert_ne!(ids[0], ids[3]);
        assert_eq!(resolution.stats.groups, 2);
        assert_eq!(resolution.stats.candidate_pairs, 4);
    }

    #[test]
    fn test_same_name_in_two_partitions() {
        let resolution = resolver().resolve(raw(&[("Jon Snow", "us_ban_nd"), ("Jon Snow Jr", "us_ban_sd")]));
        let records = &resolution.records;
        assert_eq!(records[0].normalized_name, records[1].normalized_name);
        assert_ne!(records[0].group_id, records[1].group_id);
        assert_eq!(resolution.stats.partitions, 2);
    }

    #[test]
    fn test_same_normalized_name_shares_group() {
        let resolution = resolver().resolve(raw(&[("Jon Snow", "nd"), ("Jon Snow, Jr.", "nd"), ("JON SNOW", "nd")]));
        let ids: Vec<GroupId> = resolution.records.iter().map(|r| r.group_id).collect();
        assert_eq!(ids, vec![1, 1, 1]);
    }

    #[test]
    fn test_every_record_grouped() {
        let resolution = resolver().resolve(raw(&[
            ("", "nd"),
            (",", "nd"),
            ("Al", "sd"),
            ("Jon Snow", "sd"),
        ]));
        assert!(resolution.records.iter().all(|r| r.group_id > UNASSIGNED));
        // "" and "," normalize to the same empty name
        assert_eq!(resolution.records[0].group_id, resolution.records[1].group_id);
        assert_eq!(resolution.stats.groups, 3);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let rows = raw(&[
            ("Christopher Montgomery", "a"),
            ("Christopher Montgomerie", "a"),
            ("Jon Snow", "b"),
            ("Elizabeth Warren", "c"),
            ("Christophor Montgomerie", "a"),
        ]);
        let sequential = Resolver::new(ResolverConfig {
            parallel: false,
            ..ResolverConfig::default()
        })
        .unwrap()
        .resolve(rows.clone());
        let parallel = resolver().resolve(rows);
        assert_eq!(sequential.records, parallel.records);
        assert_eq!(sequential.pairs, parallel.pairs);
    }

    #[test]
    fn test_stats_and_dedup() {
        let resolution = resolver().resolve(raw(&[("Jon Snow", "nd"), ("Jon Snow", "sd")]));
        assert_eq!(resolution.stats.input_rows, 2);
        assert_eq!(resolution.stats.duplicates_dropped, 1);
        assert_eq!(resolution.stats.records, 1);
        assert_eq!(resolution.records[0].partition_key, "nd");
    }

    #[test]
    fn test_identities() {
        let resolution = resolver().resolve(raw(&[
            ("Christopher Montgomery", "nd"),
            ("Christopher Montgomerie III", "nd"),
            ("Elizabeth Warren", "nd"),
        ]));
        let identities = resolution.identities();
        assert_eq!(identities.len(), 2);

        let montgomery = &identities[0];
        assert_eq!(montgomery.members, vec![0, 1]);
        assert_eq!(montgomery.suffix, Suffix::III);
        assert_eq!(montgomery.canonical_name, "christopher montgomerie");
        assert_eq!(montgomery.partition_key, "nd");

        assert_eq!(identities[1].canonical_name, "elizabeth warren");
        assert_eq!(identities[1].suffix, Suffix::None);
    }
}

//! Input and output records, and ingest
//!
//! Ingest keeps the first row of every raw name (input order), turns the
//! jurisdiction into a partition key and normalizes each kept name once.

use ahash::AHashSet;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::algorithms::normalize::{normalize_name, Suffix};
use crate::cluster::{GroupId, UNASSIGNED};

/// Jurisdiction prefixes stripped by default.
pub const DEFAULT_JURISDICTION_PREFIXES: [&str; 2] = ["us_ban_", "us_bap_"];

/// One input row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub name: String,
    pub jurisdiction: String,
    /// Every input column, in header order, passed through to the output
    pub columns: Vec<String>,
}

impl RawRecord {
    pub fn new(name: impl Into<String>, jurisdiction: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            jurisdiction: jurisdiction.into(),
            columns: Vec::new(),
        }
    }
}

/// A normalized, partitioned record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Zero-based row of the record in the input, before deduplication
    pub id: usize,
    pub raw_name: String,
    pub normalized_name: String,
    pub partition_key: String,
    pub suffix: Suffix,
    pub name_token_count: usize,
    /// [`UNASSIGNED`] until the resolver groups the record
    pub group_id: GroupId,
    pub columns: Vec<String>,
}

impl Record {
    /// Normalize a raw row.
    pub fn from_raw(id: usize, raw: RawRecord, config: &IngestConfig) -> Self {
        let normalized = normalize_name(&raw.name);
        Self {
            id,
            partition_key: partition_key(&raw.jurisdiction, &config.jurisdiction_prefixes),
            normalized_name: normalized.canonical,
            suffix: normalized.suffix,
            name_token_count: normalized.token_count,
            group_id: UNASSIGNED,
            raw_name: raw.name,
            columns: raw.columns,
        }
    }
}

/// Ingest parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestConfig {
    /// Prefixes removed from jurisdiction values; the first match wins
    pub jurisdiction_prefixes: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            jurisdiction_prefixes: DEFAULT_JURISDICTION_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

/// Partition key of a jurisdiction value.
pub fn partition_key(jurisdiction: &str, prefixes: &[String]) -> String {
    let jurisdiction = jurisdiction.trim();
    prefixes
        .iter()
        .find_map(|prefix| jurisdiction.strip_prefix(prefix.as_str()))
        .unwrap_or(jurisdiction)
        .to_string()
}

/// Output of [`ingest`]
#[derive(Debug, Clone, Default)]
pub struct Ingested {
    pub records: Vec<Record>,
    /// Rows dropped because an earlier row had the same raw name
    pub duplicates_dropped: usize,
}

/// Deduplicate by raw name (first wins) and normalize the remaining rows.
pub fn ingest(raw: Vec<RawRecord>, config: &IngestConfig) -> Ingested {
    let total = raw.len();
    let mut seen: AHashSet<String> = AHashSet::with_capacity(total);
    let kept: Vec<(usize, RawRecord)> = raw
        .into_iter()
        .enumerate()
        .filter(|(_, record)| seen.insert(record.name.clone()))
        .collect();
    let duplicates_dropped = total - kept.len();

    let records = kept
        .into_par_iter()
        .map(|(id, record)| Record::from_raw(id, record, config))
        .collect();

    Ingested {
        records,
        duplicates_dropped,
    }
}

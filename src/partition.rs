//! Grouping of records by jurisdiction
//!
//! Names are only ever compared inside their own partition, which bounds
//! pairwise work to the square of the largest partition's unique-name count.

use ahash::AHashSet;
use std::collections::BTreeMap;

use crate::record::Record;

/// Unique normalized names of one jurisdiction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub key: String,
    /// In order of first appearance
    pub names: Vec<String>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Ordered pairs a full comparison of this partition would score
    pub fn comparisons(&self) -> usize {
        self.names.len().saturating_mul(self.names.len().saturating_sub(1))
    }
}

/// Split records into partitions, ordered by key.
pub fn partition(records: &[Record]) -> Vec<Partition> {
    let mut by_key: BTreeMap<&str, (Vec<String>, AHashSet<&str>)> = BTreeMap::new();
    for record in records {
        let (names, seen) = by_key.entry(record.partition_key.as_str()).or_default();
        if seen.insert(record.normalized_name.as_str()) {
            names.push(record.normalized_name.clone());
        }
    }

    by_key
        .into_iter()
        .map(|(key, (names, _))| Partition {
            key: key.to_string(),
            names,
        })
        .collect()
}

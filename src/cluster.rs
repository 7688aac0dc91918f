//! Transitive grouping of matched names
//!
//! Merges a partition's candidate pairs into connected components and gives
//! every component a group id. Clustering and id allocation are separate
//! steps: [`ClusterAssigner::cluster`] is pure and can run on many partitions
//! in parallel, while [`Clustering::into_assignment`] draws ids from a shared
//! [`IdAllocator`] afterwards.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use tracing::warn;

use crate::scorer::MatchPair;

/// Group identifier; unique per equivalence class within one run
pub type GroupId = u64;

/// Sentinel carried by records that have not been grouped yet
pub const UNASSIGNED: GroupId = 0;

/// Hands out group ids for one resolution run, starting above [`UNASSIGNED`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAllocator {
    next: GroupId,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self {
            next: UNASSIGNED + 1,
        }
    }

    /// Allocate one fresh id.
    pub fn allocate(&mut self) -> GroupId {
        self.reserve(1)
    }

    /// Reserve `count` consecutive ids and return the first one.
    pub fn reserve(&mut self, count: usize) -> GroupId {
        let first = self.next;
        self.next += count as GroupId;
        first
    }

    /// Number of ids handed out so far
    pub fn allocated(&self) -> u64 {
        self.next - (UNASSIGNED + 1)
    }
}

/// How pairs are merged into groups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeStrategy {
    /// Disjoint-set forest with union by rank and path compression
    #[default]
    UnionFind,
    /// Label table where a merge rewrites every holder of the absorbed label
    Relabel,
}

/// Disjoint-set forest over name indices
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]); // Path compression
        }
        self.parent[x]
    }

    fn union(&mut self, x: usize, y: usize) {
        let root_x = self.find(x);
        let root_y = self.find(y);

        if root_x != root_y {
            // Union by rank
            match self.rank[root_x].cmp(&self.rank[root_y]) {
                std::cmp::Ordering::Less => {
                    self.parent[root_x] = root_y;
                }
                std::cmp::Ordering::Greater => {
                    self.parent[root_y] = root_x;
                }
                std::cmp::Ordering::Equal => {
                    self.parent[root_y] = root_x;
                    self.rank[root_x] += 1;
                }
            }
        }
    }

    /// Flatten so every element points straight at its root.
    fn roots(&mut self) -> Vec<usize> {
        (0..self.parent.len()).map(|x| self.find(x)).collect()
    }
}

/// Label table merge: 0 means unlabeled.
fn relabel_classes(size: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let mut labels = vec![0usize; size];
    let mut next = 1;

    for &(a, b) in edges {
        match (labels[a], labels[b]) {
            (0, 0) => {
                labels[a] = next;
                labels[b] = next;
                next += 1;
            }
            (la, 0) => labels[b] = la,
            (0, lb) => labels[a] = lb,
            (la, lb) if la != lb => {
                for label in labels.iter_mut().filter(|l| **l == lb) {
                    *label = la;
                }
            }
            _ => {}
        }
    }

    // Unlabeled names are their own class
    labels
        .iter()
        .enumerate()
        .map(|(i, &l)| if l == 0 { next + i } else { l })
        .collect()
}

/// Components of one partition, before ids are allocated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clustering {
    names: Vec<String>,
    /// Dense component label per name
    labels: Vec<usize>,
    components: usize,
}

impl Clustering {
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of groups, isolated names included
    pub fn component_count(&self) -> usize {
        self.components
    }

    /// Dense component label of the `i`-th name
    pub fn label(&self, i: usize) -> usize {
        self.labels[i]
    }

    /// Members of each component, indexed by label.
    pub fn groups(&self) -> Vec<Vec<&str>> {
        let mut groups = vec![Vec::new(); self.components];
        for (name, &label) in self.names.iter().zip(&self.labels) {
            groups[label].push(name.as_str());
        }
        groups
    }

    /// Reserve one id per component and label every name.
    pub fn into_assignment(self, ids: &mut IdAllocator) -> GroupAssignment {
        let first = ids.reserve(self.components);
        let group_ids = self
            .labels
            .iter()
            .map(|&label| first + label as GroupId)
            .collect();
        GroupAssignment::new(self.names, group_ids)
    }
}

/// Final, immutable name-to-group mapping of one partition
#[derive(Debug, Clone)]
pub struct GroupAssignment {
    names: Vec<String>,
    ids: Vec<GroupId>,
    lookup: AHashMap<String, usize>,
}

impl GroupAssignment {
    fn new(names: Vec<String>, ids: Vec<GroupId>) -> Self {
        let mut lookup = AHashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            lookup.entry(name.clone()).or_insert(i);
        }
        Self { names, ids, lookup }
    }

    pub fn get(&self, name: &str) -> Option<GroupId> {
        self.lookup.get(name).map(|&i| self.ids[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, GroupId)> + '_ {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.ids.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn group_count(&self) -> usize {
        let mut ids = self.ids.clone();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }
}

/// Merges candidate pairs into groups
#[derive(Debug, Clone, Copy, Default)]
pub struct ClusterAssigner {
    strategy: MergeStrategy,
}

impl ClusterAssigner {
    pub fn new(strategy: MergeStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> MergeStrategy {
        self.strategy
    }

    /// Group `names` by the transitive closure of `pairs`.
    ///
    /// Pairs naming something outside `names` are skipped.
    pub fn cluster(&self, names: &[String], pairs: &[MatchPair]) -> Clustering {
        let index: AHashMap<&str, usize> = names
            .iter()
            .enumerate()
            .rev()
            .map(|(i, name)| (name.as_str(), i))
            .collect();

        let mut skipped = 0usize;
        let edges: Vec<(usize, usize)> = pairs
            .iter()
            .filter_map(|pair| {
                let edge = index
                    .get(pair.name_a.as_str())
                    .zip(index.get(pair.name_b.as_str()))
                    .map(|(&a, &b)| (a, b));
                if edge.is_none() {
                    skipped += 1;
                }
                edge
            })
            .collect();
        if skipped > 0 {
            warn!(skipped, "pairs reference names outside the partition");
        }

        self.cluster_edges(names, &edges)
    }

    /// Group `names` by index-based edges.
    ///
    /// Labels are dense and follow the first appearance of each component in
    /// `edges`; names without edges come last, in `names` order. Group
    /// membership does not depend on the order of `edges`. Edges with an
    /// endpoint outside `names` are skipped.
    pub fn cluster_edges(&self, names: &[String], edges: &[(usize, usize)]) -> Clustering {
        let valid: Vec<(usize, usize)> = edges
            .iter()
            .copied()
            .filter(|&(a, b)| a < names.len() && b < names.len())
            .collect();
        if valid.len() < edges.len() {
            warn!(
                skipped = edges.len() - valid.len(),
                names = names.len(),
                "edges reference indices outside the partition"
            );
        }
        let edges = valid.as_slice();

        let classes = match self.strategy {
            MergeStrategy::UnionFind => {
                let mut uf = UnionFind::new(names.len());
                for &(a, b) in edges {
                    uf.union(a, b);
                }
                uf.roots()
            }
            MergeStrategy::Relabel => relabel_classes(names.len(), edges),
        };

        let (labels, components) = dense_labels(&classes, edges);
        Clustering {
            names: names.to_vec(),
            labels,
            components,
        }
    }

    /// Cluster and allocate ids in one step.
    pub fn assign(
        &self,
        names: &[String],
        pairs: &[MatchPair],
        ids: &mut IdAllocator,
    ) -> GroupAssignment {
        self.cluster(names, pairs).into_assignment(ids)
    }
}

/// Map arbitrary class keys onto `0..components`, in edge order first.
fn dense_labels(classes: &[usize], edges: &[(usize, usize)]) -> (Vec<usize>, usize) {
    let mut labels = vec![usize::MAX; classes.len()];
    let mut by_class: AHashMap<usize, usize> = AHashMap::new();
    let mut next = 0;

    let endpoints = edges.iter().flat_map(|&(a, b)| [a, b]);
    let everything = endpoints.chain(0..classes.len());
    for x in everything {
        if labels[x] != usize::MAX {
            continue;
        }
        labels[x] = match by_class.entry(classes[x]) {
            Entry::Occupied(e) => *e.get(),
            Entry::Vacant(e) => {
                let label = next;
                next += 1;
                *e.insert(label)
            }
        };
    }
    (labels, next)
}

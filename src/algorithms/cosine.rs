//! TF-IDF vector space and cosine similarity
//!
//! Every name in a partition becomes a sparse vector over the partition's
//! character n-gram vocabulary. Weights are raw n-gram counts scaled by a
//! smoothed inverse document frequency, so n-grams shared by many names in
//! the partition count for less than distinctive ones.
//!
//! # Weighting
//! - tf: raw count of the n-gram in the name
//! - idf: `ln((1 + N) / (1 + df)) + 1` where `N` is the number of names
//! - each vector is L2-normalized, so cosine similarity is a plain dot product
//!
//! # Complexity
//! - Fit: O(total n-grams + V log V) for a vocabulary of size V
//! - Similarity: O(nnz(a) + nnz(b)) merge over sorted entries

use super::ngram::ngram_counts;
use ahash::AHashMap;

/// Sparse vector with entries sorted by term id.
///
/// Vectors built by [`SparseVector::unit`] have unit length, or no entries
/// at all when every weight is zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(u32, f64)>,
}

impl SparseVector {
    /// Build a unit-length vector from raw `(term, weight)` entries.
    pub fn unit(mut entries: Vec<(u32, f64)>) -> Self {
        entries.retain(|&(_, w)| w != 0.0);
        entries.sort_unstable_by_key(|&(term, _)| term);

        let norm = entries.iter().map(|&(_, w)| w * w).sum::<f64>().sqrt();
        if norm == 0.0 || !norm.is_finite() {
            return Self::default();
        }
        for (_, w) in &mut entries {
            *w /= norm;
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[(u32, f64)] {
        &self.entries
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dot product by merging the two sorted entry lists.
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0f64;
        while i < self.entries.len() && j < other.entries.len() {
            let (ta, wa) = self.entries[i];
            let (tb, wb) = other.entries[j];
            match ta.cmp(&tb) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += wa * wb;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }
}

/// Cosine similarity of two unit vectors, clamped to `[0.0, 1.0]`.
///
/// A zero vector is similar to nothing, itself included.
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f64 {
    if a.is_zero() || b.is_zero() {
        return 0.0;
    }
    a.dot(b).clamp(0.0, 1.0)
}

/// TF-IDF vector space fitted on one set of names.
///
/// # Usage
/// ```
/// use nameresolve::algorithms::cosine::TfIdfSpace;
///
/// let space = TfIdfSpace::fit(&["jon snow", "jon c snow", "arya stark"], 3);
/// assert_eq!(space.len(), 3);
/// assert!(space.similarity_at(0, 1) > space.similarity_at(0, 2));
/// ```
#[derive(Debug, Clone)]
pub struct TfIdfSpace {
    /// Term to id; ids follow the lexicographic order of the terms
    vocabulary: AHashMap<String, u32>,
    idf: Vec<f64>,
    vectors: Vec<SparseVector>,
}

impl TfIdfSpace {
    /// Fit the vocabulary and idf weights on `docs` and vectorize each of them.
    pub fn fit<S: AsRef<str>>(docs: &[S], ngram_size: usize) -> Self {
        let counts: Vec<AHashMap<String, usize>> = docs
            .iter()
            .map(|doc| ngram_counts(doc.as_ref(), ngram_size))
            .collect();

        let mut df: AHashMap<&str, usize> = AHashMap::new();
        for doc in &counts {
            for term in doc.keys() {
                *df.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        let mut terms: Vec<(&str, usize)> = df.into_iter().collect();
        terms.sort_unstable_by(|a, b| a.0.cmp(b.0));

        let n_docs = docs.len() as f64;
        let mut vocabulary = AHashMap::with_capacity(terms.len());
        let mut idf = Vec::with_capacity(terms.len());
        for (id, (term, doc_freq)) in terms.into_iter().enumerate() {
            vocabulary.insert(term.to_string(), id as u32);
            idf.push(((1.0 + n_docs) / (1.0 + doc_freq as f64)).ln() + 1.0);
        }

        let mut space = Self {
            vocabulary,
            idf,
            vectors: Vec::new(),
        };
        space.vectors = counts.iter().map(|doc| space.weigh(doc)).collect();
        space
    }

    fn weigh(&self, counts: &AHashMap<String, usize>) -> SparseVector {
        let entries = counts
            .iter()
            .filter_map(|(term, &count)| {
                self.vocabulary
                    .get(term)
                    .map(|&id| (id, count as f64 * self.idf[id as usize]))
            })
            .collect();
        SparseVector::unit(entries)
    }

    /// Number of fitted documents
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }

    /// Inverse document frequency of a term, if it is in the vocabulary
    pub fn idf(&self, term: &str) -> Option<f64> {
        self.vocabulary.get(term).map(|&id| self.idf[id as usize])
    }

    /// Vector of the `i`-th fitted document.
    pub fn vector(&self, i: usize) -> &SparseVector {
        &self.vectors[i]
    }

    pub fn vectors(&self) -> &[SparseVector] {
        &self.vectors
    }

    /// Cosine similarity between two fitted documents.
    pub fn similarity_at(&self, i: usize, j: usize) -> f64 {
        cosine_similarity(&self.vectors[i], &self.vectors[j])
    }
}

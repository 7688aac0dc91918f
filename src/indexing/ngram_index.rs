//! Inverted n-gram index over a fitted TF-IDF space
//!
//! Maps every vocabulary term to the documents that contain it, so the
//! similarity of one document against the rest of its partition can be
//! accumulated from the postings of its own terms. Documents that share no
//! n-gram with the query are never touched; their cosine similarity is 0.

use ahash::AHashMap;

use crate::algorithms::cosine::TfIdfSpace;

/// Posting: document index and that document's weight for the term
type Posting = (u32, f64);

/// Term-to-document postings for one [`TfIdfSpace`]
#[derive(Debug, Clone, Default)]
pub struct NgramIndex {
    /// Postings per term id, ordered by document index
    postings: Vec<Vec<Posting>>,
    documents: usize,
}

impl NgramIndex {
    /// Build postings for every document of the space.
    pub fn build(space: &TfIdfSpace) -> Self {
        let mut postings: Vec<Vec<Posting>> = vec![Vec::new(); space.vocabulary_size()];
        for (doc, vector) in space.vectors().iter().enumerate() {
            for &(term, weight) in vector.entries() {
                postings[term as usize].push((doc as u32, weight));
            }
        }
        Self {
            postings,
            documents: space.len(),
        }
    }

    /// Number of indexed documents
    pub fn len(&self) -> usize {
        self.documents
    }

    pub fn is_empty(&self) -> bool {
        self.documents == 0
    }

    /// Dot products of document `doc` with every document sharing a term.
    ///
    /// Contributions are summed in ascending term order, the same order a
    /// merge over two sorted vectors uses, so the result for `(a, b)` is
    /// bit-identical to that for `(b, a)`. The document itself is included.
    pub fn scores(&self, space: &TfIdfSpace, doc: usize) -> Vec<(usize, f64)> {
        let mut acc: AHashMap<u32, f64> = AHashMap::new();
        for &(term, weight) in space.vector(doc).entries() {
            if let Some(list) = self.postings.get(term as usize) {
                for &(other, other_weight) in list {
                    *acc.entry(other).or_insert(0.0) += weight * other_weight;
                }
            }
        }

        let mut scores: Vec<(usize, f64)> = acc
            .into_iter()
            .map(|(other, dot)| (other as usize, dot.clamp(0.0, 1.0)))
            .collect();
        scores.sort_unstable_by_key(|&(other, _)| other);
        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postings_cover_space() {
        let space = TfIdfSpace::fit(&["jon snow", "jon c snow", "arya stark"], 3);
        let index = NgramIndex::build(&space);
        assert_eq!(index.len(), 3);
        assert!(!index.is_empty());

        let total: usize = index.postings.iter().map(Vec::len).sum();
        let nnz: usize = space.vectors().iter().map(|v| v.entries().len()).sum();
        assert_eq!(total, nnz);
    }

    #[test]
    fn test_candidates_share_ngrams() {
        let space = TfIdfSpace::fit(&["jon snow", "jon c snow", "arya stark"], 3);
        let index = NgramIndex::build(&space);
        let candidates = |doc| -> Vec<usize> {
            index.scores(&space, doc).into_iter().map(|(id, _)| id).collect()
        };
        assert_eq!(candidates(0), vec![0, 1]);
        assert_eq!(candidates(2), vec![2]);
    }

    #[test]
    fn test_scores_match_exhaustive_dot() {
        let names = ["jon snow", "jon c snow", "jon clark snow", "joan snowe", "arya stark"];
        let space = TfIdfSpace::fit(&names, 3);
        let index = NgramIndex::build(&space);
        for i in 0..names.len() {
            for (j, score) in index.scores(&space, i) {
                assert_eq!(score, space.similarity_at(i, j));
            }
        }
    }

    #[test]
    fn test_zero_vector_has_no_candidates() {
        let space = TfIdfSpace::fit(&["al", "jon snow"], 3);
        let index = NgramIndex::build(&space);
        assert!(index.scores(&space, 0).is_empty());
    }
}

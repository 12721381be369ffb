//! In-memory view of a collection and brute-force cosine ranking.
//!
//! Entries are keyed by insertion sequence so that iteration order, and
//! therefore tie-breaking, is stable across runs and reopens.

use crate::embedding::l2_normalize;
use crate::models::{RecordId, RecordMetadata, VectorHit, VectorRecord};
use crate::{Error, Result};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// A validated vector ready for storage or scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedVector {
    /// Unit-length vector, or the original zero vector.
    pub embedding: Vec<f32>,
    /// `false` if the vector had zero norm and was stored as-is.
    pub normalized: bool,
}

/// Validates dimensionality and finiteness, then normalizes.
///
/// # Errors
///
/// - [`Error::DimensionMismatch`] if `vector.len() != dimensions`
/// - [`Error::InvalidInput`] if any component is NaN or infinite
pub fn prepare_vector(mut vector: Vec<f32>, dimensions: usize) -> Result<PreparedVector> {
    if vector.len() != dimensions {
        return Err(Error::DimensionMismatch {
            expected: dimensions,
            actual: vector.len(),
        });
    }
    if let Some(position) = vector.iter().position(|v| !v.is_finite()) {
        return Err(Error::InvalidInput(format!(
            "vector component {position} is not finite"
        )));
    }

    let normalized = l2_normalize(&mut vector);
    Ok(PreparedVector {
        embedding: vector,
        normalized,
    })
}

/// A stored record with its insertion sequence.
#[derive(Debug, Clone)]
pub struct CachedVector {
    /// Insertion sequence; preserved across replacements.
    pub seq: i64,
    /// Record identifier.
    pub id: RecordId,
    /// Stored vector.
    pub vector: PreparedVector,
    /// Embedded text.
    pub document: String,
    /// Record metadata.
    pub metadata: RecordMetadata,
}

impl CachedVector {
    fn score(&self, query: &PreparedVector) -> f32 {
        if !self.vector.normalized || !query.normalized {
            return 0.0;
        }
        let dot: f32 = self
            .vector
            .embedding
            .iter()
            .zip(&query.embedding)
            .map(|(a, b)| a * b)
            .sum();
        dot.clamp(-1.0, 1.0)
    }

    /// Converts into a public record.
    pub fn to_record(&self) -> VectorRecord {
        VectorRecord {
            id: self.id.clone(),
            embedding: self.vector.embedding.clone(),
            document: self.document.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

/// Ordered collection state.
#[derive(Debug, Default)]
pub struct VectorCache {
    entries: BTreeMap<i64, CachedVector>,
    seqs: HashMap<RecordId, i64>,
    next_seq: i64,
}

impl VectorCache {
    /// Creates an empty cache that assigns sequences from `next_seq`.
    pub fn with_next_seq(next_seq: i64) -> Self {
        Self {
            next_seq,
            ..Self::default()
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The sequence of an existing id.
    pub fn seq_of(&self, id: &RecordId) -> Option<i64> {
        self.seqs.get(id).copied()
    }

    /// The sequence the next new record receives.
    pub const fn next_seq(&self) -> i64 {
        self.next_seq
    }

    /// Looks up a record by id.
    pub fn get(&self, id: &RecordId) -> Option<&CachedVector> {
        self.seq_of(id).and_then(|seq| self.entries.get(&seq))
    }

    /// Stores an entry under its sequence, replacing any entry for the same id.
    pub fn put(&mut self, entry: CachedVector) {
        if let Some(previous) = self.seqs.insert(entry.id.clone(), entry.seq) {
            if previous != entry.seq {
                self.entries.remove(&previous);
            }
        }
        self.next_seq = self.next_seq.max(entry.seq + 1);
        self.entries.insert(entry.seq, entry);
    }

    /// Removes an id. Returns `true` if it was present.
    pub fn remove(&mut self, id: &RecordId) -> bool {
        self.seqs
            .remove(id)
            .is_some_and(|seq| self.entries.remove(&seq).is_some())
    }

    /// Removes every entry. Sequences keep increasing.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.seqs.clear();
    }

    /// Returns the `k` best matches, score descending then sequence ascending.
    pub fn top_k(&self, query: &PreparedVector, k: usize) -> Vec<VectorHit> {
        if k == 0 || self.entries.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(f32, &CachedVector)> = self
            .entries
            .values()
            .map(|entry| (entry.score(query), entry))
            .collect();

        let by_rank = |a: &(f32, &CachedVector), b: &(f32, &CachedVector)| -> Ordering {
            b.0.total_cmp(&a.0).then_with(|| a.1.seq.cmp(&b.1.seq))
        };

        if k < scored.len() {
            scored.select_nth_unstable_by(k, by_rank);
            scored.truncate(k);
        }
        scored.sort_unstable_by(by_rank);

        scored
            .into_iter()
            .map(|(score, entry)| VectorHit {
                id: entry.id.clone(),
                score,
                document: entry.document.clone(),
                metadata: entry.metadata.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(seq: i64, id: &str, vector: Vec<f32>) -> CachedVector {
        let dims = vector.len();
        CachedVector {
            seq,
            id: RecordId::new(id),
            vector: prepare_vector(vector, dims).unwrap(),
            document: id.to_string(),
            metadata: RecordMetadata::new(),
        }
    }

    fn ids(hits: &[VectorHit]) -> Vec<&str> {
        hits.iter().map(|h| h.id.as_str()).collect()
    }

    #[test]
    fn test_prepare_vector_rejects_wrong_dimensions() {
        assert!(matches!(
            prepare_vector(vec![1.0, 2.0], 3),
            Err(Error::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_prepare_vector_rejects_non_finite() {
        assert!(matches!(
            prepare_vector(vec![1.0, f32::NAN], 2),
            Err(Error::InvalidInput(_))
        ));
        assert!(prepare_vector(vec![f32::INFINITY, 0.0], 2).is_err());
    }

    #[test]
    fn test_prepare_vector_flags_zero_norm() {
        let prepared = prepare_vector(vec![0.0, 0.0], 2).unwrap();
        assert!(!prepared.normalized);
        assert_eq!(prepared.embedding, vec![0.0, 0.0]);
    }

    #[test]
    fn test_top_k_orders_by_score() {
        let mut cache = VectorCache::default();
        cache.put(entry(0, "far", vec![0.0, 1.0]));
        cache.put(entry(1, "near", vec![1.0, 0.1]));
        cache.put(entry(2, "exact", vec![2.0, 0.0]));

        let query = prepare_vector(vec![1.0, 0.0], 2).unwrap();
        let hits = cache.top_k(&query, 3);
        assert_eq!(ids(&hits), vec!["exact", "near", "far"]);
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_top_k_breaks_ties_by_insertion_order() {
        let mut cache = VectorCache::default();
        for (seq, id) in ["c", "a", "b"].iter().enumerate() {
            cache.put(entry(i64::try_from(seq).unwrap(), id, vec![1.0, 1.0]));
        }

        let query = prepare_vector(vec![1.0, 1.0], 2).unwrap();
        assert_eq!(ids(&cache.top_k(&query, 2)), vec!["c", "a"]);
        assert_eq!(ids(&cache.top_k(&query, 10)), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_zero_norm_scores_zero() {
        let mut cache = VectorCache::default();
        cache.put(entry(0, "zero", vec![0.0, 0.0]));
        cache.put(entry(1, "opposite", vec![-1.0, 0.0]));

        let query = prepare_vector(vec![1.0, 0.0], 2).unwrap();
        let hits = cache.top_k(&query, 2);
        assert_eq!(ids(&hits), vec!["zero", "opposite"]);
        assert!(hits[0].score.abs() < f32::EPSILON);
        assert!((hits[1].score + 1.0).abs() < 1e-6);

        let zero_query = prepare_vector(vec![0.0, 0.0], 2).unwrap();
        assert!(cache.top_k(&zero_query, 2).iter().all(|h| h.score == 0.0));
    }

    #[test]
    fn test_top_k_empty_and_zero_k() {
        let mut cache = VectorCache::default();
        let query = prepare_vector(vec![1.0], 1).unwrap();
        assert!(cache.top_k(&query, 5).is_empty());

        cache.put(entry(0, "a", vec![1.0]));
        assert!(cache.top_k(&query, 0).is_empty());
    }

    #[test]
    fn test_put_replaces_and_keeps_sequence() {
        let mut cache = VectorCache::default();
        cache.put(entry(0, "a", vec![1.0, 0.0]));
        cache.put(entry(1, "b", vec![1.0, 0.0]));
        cache.put(entry(0, "a", vec![0.0, 1.0]));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.next_seq(), 2);
        assert_eq!(cache.seq_of(&RecordId::new("a")), Some(0));
        assert_eq!(
            cache.get(&RecordId::new("a")).unwrap().vector.embedding,
            vec![0.0, 1.0]
        );
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cache = VectorCache::with_next_seq(5);
        cache.put(entry(5, "a", vec![1.0]));
        assert!(cache.remove(&RecordId::new("a")));
        assert!(!cache.remove(&RecordId::new("a")));

        cache.put(entry(6, "b", vec![1.0]));
        cache.clear();
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.next_seq(), 7);
    }
}

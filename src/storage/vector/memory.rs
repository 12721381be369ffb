//! In-memory vector index.

use super::cache::{CachedVector, VectorCache, prepare_vector};
use crate::models::{InsertOutcome, RecordId, VectorHit, VectorRecord};
use crate::storage::lock::{acquire_read, acquire_write};
use crate::storage::sqlite::{record_operation_metrics, status_of};
use crate::storage::traits::VectorIndex;
use crate::{Error, Result};
use std::sync::RwLock;
use std::time::Instant;

/// Vector index held entirely in memory.
///
/// Behaves like `SqliteVectorIndex` without persistence.
#[derive(Debug)]
pub struct MemoryVectorIndex {
    dimensions: usize,
    fingerprint: Option<String>,
    allow_upsert: bool,
    cache: RwLock<VectorCache>,
}

impl MemoryVectorIndex {
    /// Creates an empty index with upserts enabled.
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            fingerprint: None,
            allow_upsert: true,
            cache: RwLock::new(VectorCache::default()),
        }
    }

    /// Binds the index to an embedding space.
    #[must_use]
    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    /// Sets whether inserting an existing id replaces it.
    #[must_use]
    pub const fn with_upsert(mut self, allow_upsert: bool) -> Self {
        self.allow_upsert = allow_upsert;
        self
    }
}

impl VectorIndex for MemoryVectorIndex {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    fn insert(&self, record: VectorRecord) -> Result<InsertOutcome> {
        let start = Instant::now();
        let result = prepare_vector(record.embedding, self.dimensions).and_then(|vector| {
            let mut cache = acquire_write(&self.cache);
            let (seq, outcome) = match cache.seq_of(&record.id) {
                Some(_) if !self.allow_upsert => {
                    return Err(Error::DuplicateInsertConflict(record.id.to_string()));
                },
                Some(seq) => (seq, InsertOutcome::Replaced),
                None => (cache.next_seq(), InsertOutcome::Inserted),
            };
            cache.put(CachedVector {
                seq,
                id: record.id,
                vector,
                document: record.document,
                metadata: record.metadata,
            });
            Ok(outcome)
        });
        record_operation_metrics("memory", "insert", start, status_of(&result));
        result
    }

    fn query(&self, vector: &[f32], k: usize) -> Result<Vec<VectorHit>> {
        let start = Instant::now();
        let result = prepare_vector(vector.to_vec(), self.dimensions)
            .map(|query| acquire_read(&self.cache).top_k(&query, k));
        record_operation_metrics("memory", "query", start, status_of(&result));
        result
    }

    fn get(&self, id: &RecordId) -> Result<Option<VectorRecord>> {
        Ok(acquire_read(&self.cache).get(id).map(CachedVector::to_record))
    }

    fn delete(&self, id: &RecordId) -> Result<bool> {
        Ok(acquire_write(&self.cache).remove(id))
    }

    fn count(&self) -> Result<usize> {
        Ok(acquire_read(&self.cache).len())
    }

    fn clear(&self) -> Result<()> {
        acquire_write(&self.cache).clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_insert_and_query() {
        let index = MemoryVectorIndex::new(3);
        index
            .insert(VectorRecord::new("x", vec![1.0, 0.0, 0.0], "x doc"))
            .unwrap();
        index
            .insert(VectorRecord::new("y", vec![0.0, 1.0, 0.0], "y doc"))
            .unwrap();

        let hits = index.query(&[0.9, 0.1, 0.0], 1).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id.as_str(), "x");
        assert_eq!(hits[0].document, "x doc");
    }

    #[test]
    fn test_upsert_replaces() {
        let index = MemoryVectorIndex::new(2);
        assert_eq!(
            index.insert(VectorRecord::new("a", vec![1.0, 0.0], "one")).unwrap(),
            InsertOutcome::Inserted
        );
        assert_eq!(
            index.insert(VectorRecord::new("a", vec![0.0, 1.0], "two")).unwrap(),
            InsertOutcome::Replaced
        );
        assert_eq!(index.count().unwrap(), 1);
        let stored = index.get(&RecordId::new("a")).unwrap().unwrap();
        assert_eq!(stored.document, "two");
    }

    #[test]
    fn test_duplicate_rejected_without_upsert() {
        let index = MemoryVectorIndex::new(2).with_upsert(false);
        index.insert(VectorRecord::new("a", vec![1.0, 0.0], "one")).unwrap();
        let err = index
            .insert(VectorRecord::new("a", vec![0.0, 1.0], "two"))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateInsertConflict(ref id) if id == "a"));
        assert_eq!(index.get(&RecordId::new("a")).unwrap().unwrap().document, "one");
    }

    #[test]
    fn test_dimension_mismatch() {
        let index = MemoryVectorIndex::new(3);
        assert!(matches!(
            index.insert(VectorRecord::new("a", vec![1.0], "doc")),
            Err(Error::DimensionMismatch { .. })
        ));
        assert!(matches!(
            index.query(&[1.0, 0.0], 1),
            Err(Error::DimensionMismatch { .. })
        ));
        assert_eq!(index.count().unwrap(), 0);
    }

    #[test]
    fn test_delete_and_clear() {
        let index = MemoryVectorIndex::new(1);
        index.insert(VectorRecord::new("a", vec![1.0], "a")).unwrap();
        index.insert(VectorRecord::new("b", vec![1.0], "b")).unwrap();

        assert!(index.delete(&RecordId::new("a")).unwrap());
        assert!(!index.delete(&RecordId::new("a")).unwrap());
        assert_eq!(index.count().unwrap(), 1);

        index.clear().unwrap();
        assert_eq!(index.count().unwrap(), 0);
        assert!(index.query(&[1.0], 5).unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_inserts_and_queries() {
        let index = Arc::new(MemoryVectorIndex::new(2));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let index = Arc::clone(&index);
                thread::spawn(move || {
                    let id = format!("rec-{i}");
                    index
                        .insert(VectorRecord::new(id, vec![1.0, f32::from(u8::try_from(i).unwrap())], "doc"))
                        .unwrap();
                    index.query(&[1.0, 0.0], 3).unwrap().len()
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap() >= 1);
        }
        assert_eq!(index.count().unwrap(), 8);
    }
}

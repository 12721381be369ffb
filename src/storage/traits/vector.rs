//! Vector index trait.
//!
//! A collection of fixed-dimension vectors keyed by [`RecordId`], searched by
//! exact cosine similarity.
//!
//! # Available Implementations
//!
//! | Index | Use Case |
//! |-------|----------|
//! | `SqliteVectorIndex` | Persistent collection in `papers.db` |
//! | `MemoryVectorIndex` | Tests and ephemeral sessions |
//!
//! # Ranking
//!
//! Stored vectors are L2-normalized on insert; a query is normalized before
//! scoring, so the score is the dot product. Results are sorted by score
//! descending, ties broken by insertion order. A stored or query vector with
//! zero norm scores 0.0.

use crate::Result;
use crate::models::{InsertOutcome, RecordId, VectorHit, VectorRecord};

/// Trait for vector similarity indexes.
///
/// Implementations are `Send + Sync`: queries may run concurrently and
/// observe either the state before or after any concurrent insert.
pub trait VectorIndex: Send + Sync {
    /// Returns the fixed dimensionality of stored vectors.
    fn dimensions(&self) -> usize;

    /// Fingerprint of the embedding space the stored vectors belong to.
    ///
    /// `None` when the index is not bound to a space.
    fn fingerprint(&self) -> Option<&str>;

    /// Inserts a record, replacing any existing record with the same id.
    ///
    /// A replaced record keeps its original insertion position.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::DimensionMismatch`] if the embedding length differs from
    ///   [`Self::dimensions`]
    /// - [`crate::Error::InvalidInput`] if any component is NaN or infinite
    /// - [`crate::Error::DuplicateInsertConflict`] if the id exists and upserts are disabled
    /// - [`crate::Error::StorageUnavailable`] if the write fails
    fn insert(&self, record: VectorRecord) -> Result<InsertOutcome>;

    /// Returns up to `k` records nearest to `vector`, most similar first.
    ///
    /// Returns an empty list for `k == 0` or an empty index.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::DimensionMismatch`] if the query length differs.
    fn query(&self, vector: &[f32], k: usize) -> Result<Vec<VectorHit>>;

    /// Retrieves a record by id, with its stored (normalized) embedding.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be read.
    fn get(&self, id: &RecordId) -> Result<Option<VectorRecord>>;

    /// Removes a record. Returns `true` if it existed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StorageUnavailable`] if the write fails.
    fn delete(&self, id: &RecordId) -> Result<bool>;

    /// Returns the number of stored records.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be read.
    fn count(&self) -> Result<usize>;

    /// Removes every record from the collection.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StorageUnavailable`] if the write fails.
    fn clear(&self) -> Result<()>;
}

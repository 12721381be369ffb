//! `SQLite`-backed vector index.
//!
//! Records live in `vector_records`, one row per id, with the embedding as a
//! little-endian `f32` blob. Each collection row in `collections` carries the
//! dimensionality and embedding fingerprint it was built with, so reopening
//! with an incompatible embedder fails instead of silently mixing spaces.
//!
//! Writes go to `SQLite` first; the in-memory cache used for ranking is only
//! updated after the transaction commits.

use super::cache::{CachedVector, PreparedVector, VectorCache, prepare_vector};
use crate::current_timestamp;
use crate::embedding::Embedder;
use crate::models::{InsertOutcome, RecordId, RecordMetadata, VectorHit, VectorRecord};
use crate::storage::lock::{acquire_lock, acquire_read, acquire_write};
use crate::storage::sqlite::{
    configure_connection, decode_embedding, encode_embedding, open_connection,
    record_operation_metrics, status_of, unavailable,
};
use crate::storage::traits::VectorIndex;
use crate::{Error, Result};
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use std::time::Instant;
use tracing::instrument;

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS collections (
    name TEXT PRIMARY KEY,
    dimensions INTEGER NOT NULL,
    fingerprint TEXT NOT NULL,
    next_seq INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS vector_records (
    collection TEXT NOT NULL REFERENCES collections(name) ON DELETE CASCADE,
    id TEXT NOT NULL,
    seq INTEGER NOT NULL,
    embedding BLOB NOT NULL,
    normalized INTEGER NOT NULL,
    document TEXT NOT NULL,
    metadata TEXT NOT NULL,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (collection, id)
);

CREATE INDEX IF NOT EXISTS idx_vector_records_seq ON vector_records(collection, seq);
";

/// Identity of a collection: its name and the embedding space it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSpec {
    /// Collection name.
    pub name: String,
    /// Vector dimensionality.
    pub dimensions: usize,
    /// Embedder fingerprint the vectors were produced with.
    pub fingerprint: String,
    /// Whether inserting an existing id replaces it.
    pub allow_upsert: bool,
}

impl CollectionSpec {
    /// Creates a spec with upserts enabled.
    #[must_use]
    pub fn new(name: impl Into<String>, dimensions: usize, fingerprint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dimensions,
            fingerprint: fingerprint.into(),
            allow_upsert: true,
        }
    }

    /// Creates a spec matching an embedder.
    #[must_use]
    pub fn for_embedder(name: impl Into<String>, embedder: &dyn Embedder) -> Self {
        Self::new(name, embedder.dimensions(), embedder.fingerprint())
    }

    /// Sets whether inserting an existing id replaces it.
    #[must_use]
    pub const fn with_upsert(mut self, allow_upsert: bool) -> Self {
        self.allow_upsert = allow_upsert;
        self
    }
}

/// What to do when the stored collection was built with another embedder.
#[derive(Clone, Copy)]
enum Reconcile<'a> {
    Reject,
    Reembed { embedder: &'a dyn Embedder, force: bool },
}

/// Persistent vector index stored in a `SQLite` database.
pub struct SqliteVectorIndex {
    conn: Mutex<Connection>,
    cache: RwLock<VectorCache>,
    spec: CollectionSpec,
    db_path: Option<PathBuf>,
}

impl SqliteVectorIndex {
    /// Opens (or creates) a collection in the database at `path`.
    ///
    /// # Errors
    ///
    /// - [`Error::StorageUnavailable`] if the database cannot be opened or read
    /// - [`Error::DimensionMismatch`] if the collection has other dimensions
    /// - [`Error::EmbeddingSpaceMismatch`] if the collection has another fingerprint
    #[instrument(skip(path, spec), fields(collection = %spec.name))]
    pub fn open(path: impl AsRef<Path>, spec: CollectionSpec) -> Result<Self> {
        let path = path.as_ref();
        let conn = open_connection(path)?;
        let (index, _) = Self::from_connection(conn, spec, Some(path.to_path_buf()), Reconcile::Reject)?;
        Ok(index)
    }

    /// Opens a collection, re-embedding every stored document with `embedder`
    /// if the collection was built with a different one, or always if `force`.
    ///
    /// Re-embedding runs in one transaction: if any document fails to embed,
    /// the collection is left untouched. Returns the index and the number of
    /// records re-embedded.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if `spec` does not describe `embedder`
    /// - [`Error::EmbeddingFailure`] if a stored document cannot be embedded
    /// - [`Error::StorageUnavailable`] if the database cannot be read or written
    #[instrument(skip(path, spec, embedder), fields(collection = %spec.name))]
    pub fn open_reembedding(
        path: impl AsRef<Path>,
        spec: CollectionSpec,
        embedder: &dyn Embedder,
        force: bool,
    ) -> Result<(Self, usize)> {
        let path = path.as_ref();
        let conn = open_connection(path)?;
        Self::from_connection(
            conn,
            spec,
            Some(path.to_path_buf()),
            Reconcile::Reembed { embedder, force },
        )
    }

    /// Creates an index backed by an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageUnavailable`] if `SQLite` fails to initialize.
    pub fn in_memory(spec: CollectionSpec) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(unavailable("open_sqlite"))?;
        let (index, _) = Self::from_connection(conn, spec, None, Reconcile::Reject)?;
        Ok(index)
    }

    /// Returns the collection spec.
    #[must_use]
    pub const fn spec(&self) -> &CollectionSpec {
        &self.spec
    }

    /// Returns the database path, or `None` for in-memory indexes.
    #[must_use]
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn from_connection(
        mut conn: Connection,
        spec: CollectionSpec,
        db_path: Option<PathBuf>,
        reconcile: Reconcile<'_>,
    ) -> Result<(Self, usize)> {
        configure_connection(&conn)?;
        conn.execute_batch(SCHEMA)
            .map_err(unavailable("create_schema"))?;

        let reembedded = Self::reconcile_collection(&mut conn, &spec, reconcile)?;
        let cache = Self::load_cache(&conn, &spec)?;

        tracing::debug!(
            collection = %spec.name,
            records = cache.len(),
            reembedded,
            "Opened vector collection"
        );

        Ok((
            Self {
                conn: Mutex::new(conn),
                cache: RwLock::new(cache),
                spec,
                db_path,
            },
            reembedded,
        ))
    }

    fn reconcile_collection(
        conn: &mut Connection,
        spec: &CollectionSpec,
        reconcile: Reconcile<'_>,
    ) -> Result<usize> {
        let tx = conn
            .transaction()
            .map_err(unavailable("begin_transaction"))?;

        let stored: Option<(i64, String)> = tx
            .query_row(
                "SELECT dimensions, fingerprint FROM collections WHERE name = ?1",
                params![spec.name],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(unavailable("read_collection"))?;

        let mut reembedded = 0;
        match stored {
            None => {
                tx.execute(
                    "INSERT INTO collections (name, dimensions, fingerprint, next_seq, created_at)
                     VALUES (?1, ?2, ?3, 0, ?4)",
                    params![spec.name, to_i64(spec.dimensions), spec.fingerprint, now()],
                )
                .map_err(unavailable("create_collection"))?;
            },
            Some((dimensions, fingerprint)) => {
                let stored_dimensions = usize::try_from(dimensions).unwrap_or(0);
                let matches =
                    stored_dimensions == spec.dimensions && fingerprint == spec.fingerprint;

                match reconcile {
                    Reconcile::Reembed { embedder, force } if force || !matches => {
                        tracing::info!(
                            collection = %spec.name,
                            stored = %fingerprint,
                            current = %spec.fingerprint,
                            "Re-embedding collection"
                        );
                        reembedded = reembed_records(&tx, spec, embedder)?;
                    },
                    _ if stored_dimensions != spec.dimensions => {
                        return Err(Error::DimensionMismatch {
                            expected: stored_dimensions,
                            actual: spec.dimensions,
                        });
                    },
                    _ if !matches => {
                        return Err(Error::EmbeddingSpaceMismatch {
                            stored: fingerprint,
                            current: spec.fingerprint.clone(),
                        });
                    },
                    _ => {},
                }
            },
        }

        tx.commit().map_err(unavailable("commit_collection"))?;
        Ok(reembedded)
    }

    fn load_cache(conn: &Connection, spec: &CollectionSpec) -> Result<VectorCache> {
        let next_seq: i64 = conn
            .query_row(
                "SELECT next_seq FROM collections WHERE name = ?1",
                params![spec.name],
                |row| row.get(0),
            )
            .map_err(unavailable("read_collection"))?;

        let mut cache = VectorCache::with_next_seq(next_seq);
        let mut stmt = conn
            .prepare(
                "SELECT id, seq, embedding, normalized, document, metadata
                 FROM vector_records WHERE collection = ?1 ORDER BY seq",
            )
            .map_err(unavailable("load_records"))?;

        let rows = stmt
            .query_map(params![spec.name], |row| {
                Ok(StoredRow {
                    id: row.get(0)?,
                    seq: row.get(1)?,
                    embedding: row.get(2)?,
                    normalized: row.get(3)?,
                    document: row.get(4)?,
                    metadata: row.get(5)?,
                })
            })
            .map_err(unavailable("load_records"))?;

        for row in rows {
            let row = row.map_err(unavailable("load_records"))?;
            let metadata: RecordMetadata =
                serde_json::from_str(&row.metadata).map_err(|e| Error::StorageUnavailable {
                    operation: "decode_metadata".to_string(),
                    cause: format!("record '{}': {e}", row.id),
                })?;
            cache.put(CachedVector {
                seq: row.seq,
                vector: PreparedVector {
                    embedding: decode_embedding(&row.embedding, spec.dimensions)?,
                    normalized: row.normalized,
                },
                id: RecordId::new(row.id),
                document: row.document,
                metadata,
            });
        }

        Ok(cache)
    }

    fn insert_inner(&self, record: VectorRecord) -> Result<InsertOutcome> {
        let vector = prepare_vector(record.embedding, self.spec.dimensions)?;
        let metadata = serde_json::to_string(&record.metadata).map_err(|e| Error::OperationFailed {
            operation: "serialize_metadata".to_string(),
            cause: e.to_string(),
        })?;
        let blob = encode_embedding(&vector.embedding);
        let name = &self.spec.name;

        let mut conn = acquire_lock(&self.conn);
        let tx = conn
            .transaction()
            .map_err(unavailable("begin_transaction"))?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT seq FROM vector_records WHERE collection = ?1 AND id = ?2",
                params![name, record.id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(unavailable("insert_record"))?;

        let (seq, outcome) = match existing {
            Some(_) if !self.spec.allow_upsert => {
                return Err(Error::DuplicateInsertConflict(record.id.to_string()));
            },
            Some(seq) => {
                tx.execute(
                    "UPDATE vector_records
                     SET embedding = ?1, normalized = ?2, document = ?3, metadata = ?4, updated_at = ?5
                     WHERE collection = ?6 AND id = ?7",
                    params![
                        blob,
                        vector.normalized,
                        record.document,
                        metadata,
                        now(),
                        name,
                        record.id.as_str()
                    ],
                )
                .map_err(unavailable("insert_record"))?;
                (seq, InsertOutcome::Replaced)
            },
            None => {
                let seq: i64 = tx
                    .query_row(
                        "SELECT next_seq FROM collections WHERE name = ?1",
                        params![name],
                        |row| row.get(0),
                    )
                    .map_err(unavailable("insert_record"))?;
                tx.execute(
                    "INSERT INTO vector_records
                     (collection, id, seq, embedding, normalized, document, metadata, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        name,
                        record.id.as_str(),
                        seq,
                        blob,
                        vector.normalized,
                        record.document,
                        metadata,
                        now()
                    ],
                )
                .map_err(unavailable("insert_record"))?;
                tx.execute(
                    "UPDATE collections SET next_seq = ?1 WHERE name = ?2",
                    params![seq + 1, name],
                )
                .map_err(unavailable("insert_record"))?;
                (seq, InsertOutcome::Inserted)
            },
        };

        tx.commit().map_err(unavailable("commit_record"))?;

        // Published while the connection lock is held so the cache follows commit order.
        acquire_write(&self.cache).put(CachedVector {
            seq,
            id: record.id,
            vector,
            document: record.document,
            metadata: record.metadata,
        });
        drop(conn);

        Ok(outcome)
    }

    fn delete_inner(&self, id: &RecordId) -> Result<bool> {
        let conn = acquire_lock(&self.conn);
        let changed = conn
            .execute(
                "DELETE FROM vector_records WHERE collection = ?1 AND id = ?2",
                params![self.spec.name, id.as_str()],
            )
            .map_err(unavailable("delete_record"))?;
        acquire_write(&self.cache).remove(id);
        drop(conn);
        Ok(changed > 0)
    }

    fn clear_inner(&self) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        conn.execute(
            "DELETE FROM vector_records WHERE collection = ?1",
            params![self.spec.name],
        )
        .map_err(unavailable("clear_collection"))?;
        acquire_write(&self.cache).clear();
        drop(conn);
        Ok(())
    }
}

impl VectorIndex for SqliteVectorIndex {
    fn dimensions(&self) -> usize {
        self.spec.dimensions
    }

    fn fingerprint(&self) -> Option<&str> {
        Some(&self.spec.fingerprint)
    }

    #[instrument(skip(self, record), fields(id = %record.id))]
    fn insert(&self, record: VectorRecord) -> Result<InsertOutcome> {
        let start = Instant::now();
        let result = self.insert_inner(record);
        record_operation_metrics("sqlite", "insert", start, status_of(&result));
        result
    }

    #[instrument(skip(self, vector))]
    fn query(&self, vector: &[f32], k: usize) -> Result<Vec<VectorHit>> {
        let start = Instant::now();
        let result = prepare_vector(vector.to_vec(), self.spec.dimensions)
            .map(|query| acquire_read(&self.cache).top_k(&query, k));
        record_operation_metrics("sqlite", "query", start, status_of(&result));
        result
    }

    fn get(&self, id: &RecordId) -> Result<Option<VectorRecord>> {
        Ok(acquire_read(&self.cache).get(id).map(CachedVector::to_record))
    }

    #[instrument(skip(self), fields(id = %id))]
    fn delete(&self, id: &RecordId) -> Result<bool> {
        let start = Instant::now();
        let result = self.delete_inner(id);
        record_operation_metrics("sqlite", "delete", start, status_of(&result));
        result
    }

    fn count(&self) -> Result<usize> {
        Ok(acquire_read(&self.cache).len())
    }

    fn clear(&self) -> Result<()> {
        let start = Instant::now();
        let result = self.clear_inner();
        record_operation_metrics("sqlite", "clear", start, status_of(&result));
        result
    }
}

struct StoredRow {
    id: String,
    seq: i64,
    embedding: Vec<u8>,
    normalized: bool,
    document: String,
    metadata: String,
}

/// Re-embeds every document of a collection inside `tx` and records the new space.
fn reembed_records(tx: &Transaction<'_>, spec: &CollectionSpec, embedder: &dyn Embedder) -> Result<usize> {
    if embedder.dimensions() != spec.dimensions || embedder.fingerprint() != spec.fingerprint {
        return Err(Error::InvalidInput(format!(
            "collection '{}' does not describe the re-embedding model",
            spec.name
        )));
    }

    let documents: Vec<(String, String)> = {
        let mut stmt = tx
            .prepare("SELECT id, document FROM vector_records WHERE collection = ?1 ORDER BY seq")
            .map_err(unavailable("reembed_records"))?;
        let rows = stmt
            .query_map(params![spec.name], |row| Ok((row.get(0)?, row.get(1)?)))
            .map_err(unavailable("reembed_records"))?;
        rows.collect::<rusqlite::Result<_>>()
            .map_err(unavailable("reembed_records"))?
    };

    let mut update = tx
        .prepare(
            "UPDATE vector_records SET embedding = ?1, normalized = ?2, updated_at = ?3
             WHERE collection = ?4 AND id = ?5",
        )
        .map_err(unavailable("reembed_records"))?;

    for (id, document) in &documents {
        let vector = prepare_vector(embedder.embed(document)?, spec.dimensions)?;
        update
            .execute(params![
                encode_embedding(&vector.embedding),
                vector.normalized,
                now(),
                spec.name,
                id
            ])
            .map_err(unavailable("reembed_records"))?;
    }

    tx.execute(
        "UPDATE collections SET dimensions = ?1, fingerprint = ?2 WHERE name = ?3",
        params![to_i64(spec.dimensions), spec.fingerprint, spec.name],
    )
    .map_err(unavailable("reembed_records"))?;

    Ok(documents.len())
}

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn now() -> i64 {
    i64::try_from(current_timestamp()).unwrap_or(i64::MAX)
}

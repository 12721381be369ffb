//! Paper store: papers and their summaries in the vector index.

use super::trends::{TREND_SAMPLE_SIZE, summarize_trends};
use crate::config::{EmbeddingBackend, EmbeddingChangePolicy, PaperlensConfig, StorageSettings};
use crate::embedding::{
    Embedder, TERM_WEIGHTS_FILE, TermWeightEmbedder, TermWeights, build_embedder,
};
use crate::models::{
    InsertOutcome, Paper, RecordId, SimilarityResult, TrendSummary, VectorRecord, encode_list,
    keys,
};
use crate::storage::{CollectionSpec, MemoryVectorIndex, SqliteVectorIndex, VectorIndex};
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Default number of results for [`PaperStore::get_similar_papers`].
pub const DEFAULT_SIMILAR_PAPERS: usize = 3;

/// Stores papers with their generated summaries and answers similarity queries.
///
/// Every paper is embedded as `"{title} {abstract} {generated_summary}"` with
/// a single embedder; queries use the same embedder.
pub struct PaperStore {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    settings: StorageSettings,
}

impl PaperStore {
    /// Creates a store over an embedder and index.
    ///
    /// # Errors
    ///
    /// - [`Error::DimensionMismatch`] if the embedder and index disagree on
    ///   dimensionality
    /// - [`Error::EmbeddingSpaceMismatch`] if the index is bound to another
    ///   embedding space
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        settings: StorageSettings,
    ) -> Result<Self> {
        if embedder.dimensions() != index.dimensions() {
            return Err(Error::DimensionMismatch {
                expected: index.dimensions(),
                actual: embedder.dimensions(),
            });
        }
        let current = embedder.fingerprint();
        if let Some(stored) = index.fingerprint() {
            if stored != current {
                return Err(Error::EmbeddingSpaceMismatch {
                    stored: stored.to_string(),
                    current,
                });
            }
        }
        Ok(Self {
            embedder,
            index,
            settings,
        })
    }

    /// Creates a store backed by an in-memory index.
    #[must_use]
    pub fn in_memory(embedder: Arc<dyn Embedder>, settings: StorageSettings) -> Self {
        let index = MemoryVectorIndex::new(embedder.dimensions())
            .with_fingerprint(embedder.fingerprint())
            .with_upsert(settings.allow_upsert);
        Self {
            embedder,
            index: Arc::new(index),
            settings,
        }
    }

    /// Opens the configured store.
    ///
    /// Builds the embedder, then opens the collection in `papers.db`. When the
    /// collection was built with another embedder, the configured
    /// [`EmbeddingChangePolicy`] decides between failing and re-embedding.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if the configuration is invalid
    /// - [`Error::EmbeddingSpaceMismatch`] or [`Error::DimensionMismatch`] if the
    ///   collection belongs to another embedder and the policy is `reject`
    /// - [`Error::StorageUnavailable`] if the database cannot be opened
    #[instrument(skip(config), fields(collection = %config.collection))]
    pub fn open(config: &PaperlensConfig) -> Result<Self> {
        let reembed = match config.storage.on_embedding_change {
            EmbeddingChangePolicy::Reject => None,
            EmbeddingChangePolicy::Reembed => Some(false),
        };
        config.validate()?;
        let embedder = build_embedder(&config.embedding, &config.data_dir)?;
        let (store, reembedded) = Self::open_with(config, embedder, reembed)?;
        if reembedded > 0 {
            tracing::info!(reembedded, "Collection moved to current embedding space");
        }
        Ok(store)
    }

    /// Opens the configured store and re-embeds every stored document with the
    /// current embedder. Returns the store and the number of records re-embedded.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened or any document fails to
    /// embed; the collection is left unchanged in that case.
    #[instrument(skip(config), fields(collection = %config.collection))]
    pub fn reindex(config: &PaperlensConfig) -> Result<(Self, usize)> {
        let start = Instant::now();
        config.validate()?;
        let embedder = build_embedder(&config.embedding, &config.data_dir)?;
        let (store, count) = Self::open_with(config, embedder, Some(true))?;
        tracing::info!(
            records = count,
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Re-embedded collection"
        );
        Ok((store, count))
    }

    /// Refits the term weights from the configured bootstrap corpus and
    /// re-embeds every stored document with them.
    ///
    /// The new weights file replaces the old one only after the re-embedding
    /// has committed, so a failed re-embedding leaves both the collection and
    /// the weights file unchanged. If the write itself fails after the commit,
    /// the collection rejects the old weights until `refit` is run again.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if the configured backend has no term weights
    /// - [`Error::OperationFailed`] if the corpus cannot be read or the weights
    ///   cannot be written
    /// - any error from [`PaperStore::reindex`]
    #[instrument(skip(config), fields(collection = %config.collection))]
    pub fn refit(config: &PaperlensConfig) -> Result<(Self, usize)> {
        config.validate()?;
        if config.embedding.backend != EmbeddingBackend::TermWeights {
            return Err(Error::InvalidInput(
                "refit requires the term-weights embedding backend".to_string(),
            ));
        }

        let start = Instant::now();
        let weights = TermWeights::fit_configured(config.embedding.bootstrap_corpus.as_deref())?;
        let embedder = TermWeightEmbedder::new(
            config.embedding.dimensions,
            config.embedding.stop_words,
            weights.clone(),
        )?;
        let (store, count) = Self::open_with(config, Arc::new(embedder), Some(true))?;
        weights.save(&config.data_dir.join(TERM_WEIGHTS_FILE))?;

        tracing::info!(
            records = count,
            documents = weights.documents(),
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Refitted term weights and re-embedded collection"
        );
        Ok((store, count))
    }

    fn open_with(
        config: &PaperlensConfig,
        embedder: Arc<dyn Embedder>,
        reembed: Option<bool>,
    ) -> Result<(Self, usize)> {
        let spec = CollectionSpec::for_embedder(&config.collection, embedder.as_ref())
            .with_upsert(config.storage.allow_upsert);
        let path = config.database_path();

        let (index, reembedded) = match reembed {
            None => (SqliteVectorIndex::open(&path, spec)?, 0),
            Some(force) => {
                SqliteVectorIndex::open_reembedding(&path, spec, embedder.as_ref(), force)?
            },
        };

        Ok((Self::new(embedder, Arc::new(index), config.storage)?, reembedded))
    }

    /// Returns the embedder.
    #[must_use]
    pub const fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Fingerprint of the embedding space in use.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        self.embedder.fingerprint()
    }

    /// The record id a paper is stored under.
    #[must_use]
    pub fn record_id_for(&self, paper: &Paper) -> RecordId {
        RecordId::for_paper(paper, self.settings.id_strategy)
    }

    /// Stores a paper together with its generated summary.
    ///
    /// Returns `Ok(true)` when the record was written (inserted or replaced)
    /// and `Ok(false)` when it already exists and upserts are disabled.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if the paper has no title
    /// - [`Error::EmbeddingFailure`] if the composite text cannot be embedded
    /// - [`Error::StorageUnavailable`] if the write fails
    #[instrument(skip(self, paper, generated_summary), fields(title = %paper.title))]
    pub fn add_paper_with_summary(&self, paper: &Paper, generated_summary: &str) -> Result<bool> {
        if paper.title.trim().is_empty() {
            return Err(Error::InvalidInput("paper title must not be empty".to_string()));
        }

        let id = self.record_id_for(paper);
        let document = paper.composite_text(generated_summary);
        let embedding = self.embedder.embed(&document)?;

        let mut record = VectorRecord::new(id.clone(), embedding, document)
            .with_metadata(keys::TITLE, paper.title.as_str())
            .with_metadata(keys::AUTHORS, encode_list(&paper.authors))
            .with_metadata(keys::PDF_URL, paper.pdf_url.as_str())
            .with_metadata(keys::PUBLISHED, paper.published_string())
            .with_metadata(keys::ORIGINAL_SUMMARY, paper.abstract_text.as_str())
            .with_metadata(keys::GENERATED_SUMMARY, generated_summary);
        if !paper.categories.is_empty() {
            record = record.with_metadata(keys::CATEGORIES, encode_list(&paper.categories.iter().cloned().collect::<Vec<_>>()));
        }

        match self.index.insert(record) {
            Ok(outcome) => {
                tracing::debug!(id = %id, replaced = outcome == InsertOutcome::Replaced, "Stored paper");
                metrics::counter!("papers_stored_total").increment(1);
                Ok(true)
            },
            Err(Error::DuplicateInsertConflict(existing)) => {
                tracing::warn!(id = %existing, "Paper already stored, skipping");
                Ok(false)
            },
            Err(e) => Err(e),
        }
    }

    /// Returns up to `k` stored papers most similar to `query_text`.
    ///
    /// An empty store yields an empty list.
    ///
    /// # Errors
    ///
    /// - [`Error::EmbeddingFailure`] if the query has no indexable terms
    /// - any error from the index query
    #[instrument(skip(self, query_text))]
    pub fn get_similar_papers(&self, query_text: &str, k: usize) -> Result<Vec<SimilarityResult>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let query = self.embedder.embed(query_text)?;
        let hits = self.index.query(&query, k)?;

        tracing::debug!(
            results = hits.len(),
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Similarity search complete"
        );

        Ok(hits.iter().map(SimilarityResult::from_hit).collect())
    }

    /// Aggregates the papers most similar to `topic` into a trend summary.
    ///
    /// # Errors
    ///
    /// Returns an error if the similarity search fails.
    #[instrument(skip(self))]
    pub fn analyze_research_trends(&self, topic: &str) -> Result<TrendSummary> {
        let similar = self.get_similar_papers(topic, TREND_SAMPLE_SIZE)?;
        Ok(summarize_trends(topic, &similar))
    }

    /// Number of stored papers.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be read.
    pub fn paper_count(&self) -> Result<usize> {
        self.index.count()
    }

    /// Removes a stored paper. Returns `true` if it existed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageUnavailable`] if the delete fails.
    #[instrument(skip(self), fields(id = %id))]
    pub fn remove_paper(&self, id: &RecordId) -> Result<bool> {
        self.index.delete(id)
    }
}

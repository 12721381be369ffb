//! # Paperlens
//!
//! A retrieval-augmented knowledge base for academic papers.
//!
//! Paperlens ingests paper abstracts together with machine-generated
//! summaries, embeds them into a single fixed vector space, persists them in
//! `SQLite`, and answers nearest-neighbour queries used for enhanced
//! summarization, related-work discovery, trend aggregation, and
//! recommendations.
//!
//! ## Layers
//!
//! - [`embedding`]: text to fixed-dimensional vectors ([`Embedder`])
//! - [`storage`]: persistent cosine-similarity index ([`VectorIndex`])
//! - [`services`]: [`PaperStore`], [`RecommenderEngine`], [`SummaryService`]
//! - [`llm`] and [`sources`]: summarization and paper-search collaborators
//!
//! ## Example
//!
//! ```rust,ignore
//! use paperlens::{PaperStore, PaperlensConfig};
//!
//! let config = PaperlensConfig::load_default();
//! let store = PaperStore::open(&config)?;
//! store.add_paper_with_summary(&paper, "Introduces sparse attention.")?;
//! let similar = store.get_similar_papers("attention mechanisms", 3)?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
// multiple_crate_versions is inherently crate-level (detects duplicate transitive dependencies).
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod embedding;
pub mod llm;
pub mod models;
pub mod observability;
pub mod services;
pub mod sources;
pub mod storage;

// Re-exports for convenience
pub use config::PaperlensConfig;
pub use embedding::Embedder;
pub use llm::{LlmProvider, Summarizer};
pub use models::{Paper, RecordId, SimilarityResult, TrendSummary, VectorRecord};
pub use services::{PaperStore, RecommenderEngine, SummaryService};
pub use sources::PaperSource;
pub use storage::VectorIndex;

/// Error type for paperlens operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `EmbeddingFailure` | Text is empty or has no indexable terms, model fails to load or run |
/// | `DimensionMismatch` | A vector's length differs from the index dimensionality |
/// | `StorageUnavailable` | The `SQLite` database cannot be opened, read, or written |
/// | `DuplicateInsertConflict` | An id already exists and upserts are disabled |
/// | `SummarizationFailure` | The language-model collaborator fails |
/// | `EmbeddingSpaceMismatch` | The index was built with a different embedding fingerprint |
/// | `InvalidInput` | Non-finite vector components, malformed paper data |
/// | `OperationFailed` | Configuration, serialization, or filesystem errors |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Embedding generation failed.
    #[error("embedding failed: {0}")]
    EmbeddingFailure(String),

    /// A vector did not match the index dimensionality.
    ///
    /// Vectors are never truncated or padded.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensionality of the index.
        expected: usize,
        /// Length of the offending vector.
        actual: usize,
    },

    /// The persistence layer could not be used.
    #[error("storage unavailable during '{operation}': {cause}")]
    StorageUnavailable {
        /// The storage operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// A record with this id already exists and upserts are disabled.
    #[error("record '{0}' already exists")]
    DuplicateInsertConflict(String),

    /// The summarization collaborator failed.
    #[error("summarization failed: {0}")]
    SummarizationFailure(String),

    /// The index was populated by a different embedding space.
    ///
    /// Raised when reopening a collection whose stored fingerprint differs
    /// from the active embedder and re-embedding is not enabled.
    #[error("embedding space mismatch: index built with {stored}, embedder is {current}")]
    EmbeddingSpaceMismatch {
        /// Fingerprint recorded in the index.
        stored: String,
        /// Fingerprint of the active embedder.
        current: String,
    },

    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised for configuration loading, serialization, and filesystem
    /// errors outside the vector index.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Returns true if a caller may reasonably degrade and continue.
    ///
    /// Dimension and embedding-space mismatches indicate a misconfigured
    /// index and should abort the workflow instead.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::EmbeddingFailure(_)
                | Self::StorageUnavailable { .. }
                | Self::DuplicateInsertConflict(_)
                | Self::SummarizationFailure(_)
        )
    }
}

/// Result type alias for paperlens operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current Unix timestamp in seconds.
///
/// Falls back to 0 if the system clock is before the Unix epoch.
///
/// # Examples
///
/// ```rust
/// use paperlens::current_timestamp;
///
/// let ts = current_timestamp();
/// assert!(ts > 0);
/// ```
#[must_use]
pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

//! Hashed TF-IDF embedder with a frozen vocabulary weighting.
//!
//! Each token is projected into one of `dimensions` buckets by a stable
//! SHA-256 hash, with a hash-derived sign so that colliding tokens tend to
//! cancel instead of accumulate. Token counts are scaled by inverse document
//! frequency from a [`TermWeights`] table that is fitted once and then
//! persisted, so the embedding space never shifts between calls or restarts.

use super::{Embedder, l2_normalize, tokenize};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::time::Instant;

/// File name of the persisted term weights inside the data directory.
pub const TERM_WEIGHTS_FILE: &str = "term_weights.json";

/// Version tag mixed into fingerprints; bump when the projection changes.
const PROJECTION_VERSION: &str = "term-weights/v2";

/// Document frequencies fitted over a bootstrap corpus.
///
/// An unfitted table (zero documents) weights every term with 1.0.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TermWeights {
    documents: usize,
    document_frequency: BTreeMap<String, usize>,
}

impl TermWeights {
    /// Uniform weights.
    #[must_use]
    pub const fn uniform() -> Self {
        Self {
            documents: 0,
            document_frequency: BTreeMap::new(),
        }
    }

    /// Fits document frequencies over a corpus.
    ///
    /// Stop words are kept in the table so the same weights serve either
    /// tokenizer setting.
    pub fn fit<'a, I>(corpus: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut weights = Self::uniform();
        for document in corpus {
            let terms: BTreeSet<String> = tokenize(document, false).into_iter().collect();
            if terms.is_empty() {
                continue;
            }
            weights.documents += 1;
            for term in terms {
                *weights.document_frequency.entry(term).or_insert(0) += 1;
            }
        }
        weights
    }

    /// Number of documents the table was fitted on.
    #[must_use]
    pub const fn documents(&self) -> usize {
        self.documents
    }

    /// Number of distinct terms seen while fitting.
    #[must_use]
    pub fn vocabulary_size(&self) -> usize {
        self.document_frequency.len()
    }

    /// Smoothed inverse document frequency, `ln((1 + n) / (1 + df)) + 1`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn idf(&self, term: &str) -> f64 {
        if self.documents == 0 {
            return 1.0;
        }
        let df = self.document_frequency.get(term).copied().unwrap_or(0);
        let n = self.documents as f64;
        ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0
    }

    /// Loads weights from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_term_weights".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        serde_json::from_str(&contents).map_err(|e| Error::OperationFailed {
            operation: "parse_term_weights".to_string(),
            cause: e.to_string(),
        })
    }

    /// Writes weights to a JSON file, replacing it atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
                operation: "create_term_weights_dir".to_string(),
                cause: e.to_string(),
            })?;
        }

        let json = serde_json::to_string(self).map_err(|e| Error::OperationFailed {
            operation: "serialize_term_weights".to_string(),
            cause: e.to_string(),
        })?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| Error::OperationFailed {
            operation: "write_term_weights".to_string(),
            cause: e.to_string(),
        })?;
        fs::rename(&tmp, path).map_err(|e| Error::OperationFailed {
            operation: "write_term_weights".to_string(),
            cause: e.to_string(),
        })
    }

    /// Loads persisted weights, or fits and persists them on first use.
    ///
    /// Once the file exists it wins over `bootstrap_corpus`.
    pub fn load_or_fit(path: &Path, bootstrap_corpus: Option<&Path>) -> Result<Self> {
        if path.exists() {
            let weights = Self::load(path)?;
            tracing::debug!(
                path = %path.display(),
                documents = weights.documents,
                "Loaded frozen term weights"
            );
            return Ok(weights);
        }

        let weights = Self::fit_configured(bootstrap_corpus)?;
        weights.save(path)?;
        Ok(weights)
    }

    /// Fits weights from a one-document-per-line corpus, or returns uniform
    /// weights when none is configured. Nothing is written.
    pub fn fit_configured(bootstrap_corpus: Option<&Path>) -> Result<Self> {
        match bootstrap_corpus {
            Some(corpus_path) => {
                let start = Instant::now();
                let corpus = fs::read_to_string(corpus_path).map_err(|e| Error::OperationFailed {
                    operation: "read_bootstrap_corpus".to_string(),
                    cause: format!("{}: {e}", corpus_path.display()),
                })?;
                let weights = Self::fit(corpus.lines().filter(|line| !line.trim().is_empty()));
                tracing::info!(
                    documents = weights.documents,
                    vocabulary = weights.vocabulary_size(),
                    elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                    "Fitted term weights from bootstrap corpus"
                );
                Ok(weights)
            },
            None => {
                tracing::info!("No bootstrap corpus configured, using uniform term weights");
                Ok(Self::uniform())
            },
        }
    }

    fn digest_into(&self, hasher: &mut Sha256) {
        hasher.update((self.documents as u64).to_le_bytes());
        for (term, df) in &self.document_frequency {
            hasher.update(term.as_bytes());
            hasher.update([0]);
            hasher.update((*df as u64).to_le_bytes());
        }
    }
}

/// Embedder projecting weighted term counts into a fixed number of buckets.
#[derive(Debug, Clone)]
pub struct TermWeightEmbedder {
    dimensions: usize,
    remove_stop_words: bool,
    weights: TermWeights,
    fingerprint: String,
}

impl TermWeightEmbedder {
    /// Creates an embedder over frozen weights.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `dimensions` is zero.
    pub fn new(dimensions: usize, remove_stop_words: bool, weights: TermWeights) -> Result<Self> {
        if dimensions == 0 {
            return Err(Error::InvalidInput(
                "embedding dimensions must be greater than zero".to_string(),
            ));
        }

        let mut hasher = Sha256::new();
        hasher.update(PROJECTION_VERSION.as_bytes());
        hasher.update((dimensions as u64).to_le_bytes());
        hasher.update([u8::from(remove_stop_words)]);
        weights.digest_into(&mut hasher);
        let fingerprint = format!("{PROJECTION_VERSION}:{}", hex::encode(hasher.finalize()));

        Ok(Self {
            dimensions,
            remove_stop_words,
            weights,
            fingerprint,
        })
    }

    /// Creates an embedder with uniform weights.
    pub fn uniform(dimensions: usize) -> Result<Self> {
        Self::new(dimensions, true, TermWeights::uniform())
    }

    /// The frozen weights.
    #[must_use]
    pub const fn weights(&self) -> &TermWeights {
        &self.weights
    }

    /// Bucket index and sign for a term.
    #[allow(clippy::cast_possible_truncation)]
    fn project(&self, term: &str) -> (usize, f64) {
        let digest = Sha256::digest(term.as_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        let bucket = (u64::from_le_bytes(head) % self.dimensions as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        (bucket, sign)
    }
}

impl Embedder for TermWeightEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn fingerprint(&self) -> String {
        self.fingerprint.clone()
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(Error::EmbeddingFailure("cannot embed empty text".to_string()));
        }

        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for token in tokenize(text, self.remove_stop_words) {
            *counts.entry(token).or_insert(0) += 1;
        }
        if counts.is_empty() {
            return Err(Error::EmbeddingFailure(
                "text has no indexable terms".to_string(),
            ));
        }

        let mut embedding = self.accumulate(&counts, true);
        if !l2_normalize(&mut embedding) {
            // Signed terms cancelled out; every idf is positive, so the
            // unsigned projection cannot be zero.
            embedding = self.accumulate(&counts, false);
            if !l2_normalize(&mut embedding) {
                return Err(Error::EmbeddingFailure(
                    "text projected to a zero vector".to_string(),
                ));
            }
        }
        Ok(embedding)
    }
}

impl TermWeightEmbedder {
    /// Sums weighted term counts into their buckets.
    ///
    /// Accumulates in f64 and iterates in term order so results are bit-identical.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn accumulate(&self, counts: &BTreeMap<String, usize>, signed: bool) -> Vec<f32> {
        let mut accumulator = vec![0.0f64; self.dimensions];
        for (term, count) in counts {
            let (bucket, sign) = self.project(term);
            let sign = if signed { sign } else { 1.0 };
            accumulator[bucket] += sign * (*count as f64) * self.weights.idf(term);
        }
        accumulator.into_iter().map(|v| v as f32).collect()
    }
}

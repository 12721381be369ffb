//! FastEmbed-based embedder.
//!
//! Provides pretrained semantic embeddings (BGE family by default) via
//! fastembed-rs. Only compiled with the `fastembed-embeddings` feature.

use super::Embedder;
use crate::{Error, Result};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use sha2::{Digest, Sha256};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::Instant;

/// Default model, the v1.5 release of `BAAI/bge-base-en`.
pub const DEFAULT_FASTEMBED_MODEL: &str = "bge-base-en-v1.5";

/// `FastEmbed` embedder.
///
/// The model is lazily loaded on first embed call to preserve cold start time.
/// fastembed's `embed()` requires `&mut self`, so the model sits behind a mutex.
pub struct FastEmbedEmbedder {
    model_name: &'static str,
    model_kind: EmbeddingModel,
    dimensions: usize,
    cache_dir: Option<PathBuf>,
    model: OnceLock<Mutex<TextEmbedding>>,
}

impl FastEmbedEmbedder {
    /// Creates an embedder for a named model.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmbeddingFailure`] if the model name is not supported.
    pub fn new(model_name: &str) -> Result<Self> {
        let (canonical, model_kind, dimensions) = parse_model_name(model_name)?;
        Ok(Self {
            model_name: canonical,
            model_kind,
            dimensions,
            cache_dir: None,
            model: OnceLock::new(),
        })
    }

    /// Sets the directory model files are downloaded to.
    #[must_use]
    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(cache_dir.into());
        self
    }

    /// Returns the canonical model name.
    #[must_use]
    pub const fn model_name(&self) -> &'static str {
        self.model_name
    }

    /// Gets or initializes the embedding model.
    ///
    /// The first call blocks while the ONNX model loads.
    fn get_model(&self) -> Result<&Mutex<TextEmbedding>> {
        if let Some(model) = self.model.get() {
            return Ok(model);
        }

        tracing::info!(model = self.model_name, "Loading embedding model (first use)...");
        let start = Instant::now();

        let mut options =
            InitOptions::new(self.model_kind.clone()).with_show_download_progress(false);
        if let Some(cache_dir) = &self.cache_dir {
            options = options.with_cache_dir(cache_dir.clone());
        }

        let model = TextEmbedding::try_new(options)
            .map_err(|e| Error::EmbeddingFailure(format!("failed to load model: {e}")))?;

        tracing::info!(
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            model = self.model_name,
            "Embedding model loaded successfully"
        );

        // Another thread may have won the race; either instance is equivalent.
        let _ = self.model.set(Mutex::new(model));
        self.model
            .get()
            .ok_or_else(|| Error::EmbeddingFailure("model initialization race".to_string()))
    }

    fn run(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let model = self.get_model()?;
        let batch_size = texts.len();

        // ONNX runtime can panic on malformed inputs or internal errors.
        let result = catch_unwind(AssertUnwindSafe(|| {
            let mut guard = model.lock().unwrap_or_else(PoisonError::into_inner);
            guard.embed(texts, None)
        }));

        result
            .map_err(|panic_info| {
                let panic_msg = panic_info
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic_info.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!(
                    panic_message = %panic_msg,
                    batch_size,
                    "ONNX runtime panicked during embedding"
                );
                Error::EmbeddingFailure(format!("ONNX runtime panic: {panic_msg}"))
            })?
            .map_err(|e| Error::EmbeddingFailure(e.to_string()))
    }
}

impl Embedder for FastEmbedEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn fingerprint(&self) -> String {
        let digest = Sha256::digest(format!("{}:{}", self.model_name, self.dimensions));
        format!("fastembed/{}:{}", self.model_name, hex::encode(digest))
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(Error::EmbeddingFailure("cannot embed empty text".to_string()));
        }

        self.run(vec![text.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| Error::EmbeddingFailure("no embedding returned from model".to_string()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if texts.iter().any(|t| t.trim().is_empty()) {
            return Err(Error::EmbeddingFailure("cannot embed empty text".to_string()));
        }

        self.run(texts.iter().map(|s| (*s).to_string()).collect())
    }
}

/// Maps a model name to its canonical name, fastembed model, and dimensionality.
fn parse_model_name(name: &str) -> Result<(&'static str, EmbeddingModel, usize)> {
    let normalized = name.trim().to_lowercase();
    let normalized = normalized.strip_prefix("baai/").unwrap_or(&normalized);
    let normalized = normalized
        .strip_prefix("sentence-transformers/")
        .unwrap_or(normalized);

    match normalized {
        "bge-base-en" | "bge-base-en-v1.5" => {
            Ok(("bge-base-en-v1.5", EmbeddingModel::BGEBaseENV15, 768))
        },
        "bge-small-en" | "bge-small-en-v1.5" => {
            Ok(("bge-small-en-v1.5", EmbeddingModel::BGESmallENV15, 384))
        },
        "bge-large-en" | "bge-large-en-v1.5" => {
            Ok(("bge-large-en-v1.5", EmbeddingModel::BGELargeENV15, 1024))
        },
        "all-minilm-l6-v2" => Ok(("all-minilm-l6-v2", EmbeddingModel::AllMiniLML6V2, 384)),
        _ => Err(Error::EmbeddingFailure(format!(
            "unsupported embedding model '{name}'"
        ))),
    }
}

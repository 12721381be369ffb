//! Embedding generation.
//!
//! Maps text to fixed-dimensional vectors. The default [`TermWeightEmbedder`]
//! is a hashed TF-IDF model whose weights are fitted once and frozen; the
//! `fastembed-embeddings` feature adds pretrained ONNX models.

#[cfg(feature = "fastembed-embeddings")]
mod fastembed;
mod term_weight;
mod tokenize;

#[cfg(feature = "fastembed-embeddings")]
pub use fastembed::{DEFAULT_FASTEMBED_MODEL, FastEmbedEmbedder};
pub use term_weight::{TERM_WEIGHTS_FILE, TermWeightEmbedder, TermWeights};
pub use tokenize::{is_stop_word, tokenize};

use crate::config::{EmbeddingBackend, EmbeddingSettings};
use crate::Result;
use std::path::Path;
use std::sync::Arc;

/// Default dimensionality of the term-weight embedder.
pub const DEFAULT_DIMENSIONS: usize = 512;

/// Trait for embedding generators.
///
/// Implementations must be deterministic: the same text yields a
/// bit-identical vector for the lifetime of a configured embedder.
pub trait Embedder: Send + Sync {
    /// Returns the embedding dimensions.
    fn dimensions(&self) -> usize;

    /// Identifies the embedding space.
    ///
    /// Two embedders with equal fingerprints produce interchangeable vectors.
    fn fingerprint(&self) -> String;

    /// Generates an embedding for the given text.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::EmbeddingFailure`] if the text is empty or has no
    /// indexable content, or the model fails.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generates embeddings for multiple texts.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding any of the texts fails.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Builds the configured embedder.
///
/// Term weights are loaded from (or fitted into) `data_dir`.
///
/// # Errors
///
/// Returns [`crate::Error::EmbeddingFailure`] if the weights or model cannot
/// be loaded, or the backend is not compiled in.
pub fn build_embedder(settings: &EmbeddingSettings, data_dir: &Path) -> Result<Arc<dyn Embedder>> {
    match settings.backend {
        EmbeddingBackend::TermWeights => {
            let weights = TermWeights::load_or_fit(
                &data_dir.join(TERM_WEIGHTS_FILE),
                settings.bootstrap_corpus.as_deref(),
            )?;
            let embedder =
                TermWeightEmbedder::new(settings.dimensions, settings.stop_words, weights)?;
            Ok(Arc::new(embedder))
        },
        #[cfg(feature = "fastembed-embeddings")]
        EmbeddingBackend::FastEmbed => {
            let embedder = FastEmbedEmbedder::new(&settings.model)?
                .with_cache_dir(data_dir.join("models"));
            Ok(Arc::new(embedder))
        },
        #[cfg(not(feature = "fastembed-embeddings"))]
        EmbeddingBackend::FastEmbed => Err(crate::Error::EmbeddingFailure(
            "fastembed backend requires the 'fastembed-embeddings' feature".to_string(),
        )),
    }
}

/// Normalizes a vector to unit length in place.
///
/// Returns `false` and leaves the vector untouched if its norm is zero.
pub fn l2_normalize(vector: &mut [f32]) -> bool {
    let norm_sq: f64 = vector.iter().map(|&x| f64::from(x) * f64::from(x)).sum();
    if norm_sq <= 0.0 {
        return false;
    }
    let inv_norm = norm_sq.sqrt().recip();
    for v in vector.iter_mut() {
        #[allow(clippy::cast_possible_truncation)]
        {
            *v = (f64::from(*v) * inv_norm) as f32;
        }
    }
    true
}

/// Computes cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`, or 0.0 if the lengths differ or either
/// vector has zero norm.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot_product / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

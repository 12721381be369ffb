//! Similarity search results.

use super::{RecordId, VectorHit, decode_list, keys};
use serde::Serialize;

/// Marker shown when a stored record has no generated summary.
pub const UNAVAILABLE_SUMMARY: &str = "No summary available";

/// A paper returned by a similarity query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityResult {
    /// Record identifier.
    pub id: RecordId,
    /// Paper title.
    pub title: String,
    /// Generated summary, `None` when the record has none.
    pub generated_summary: Option<String>,
    /// The paper's own abstract.
    pub original_summary: String,
    /// Cosine similarity to the query.
    pub score: f32,
    /// Author names in stored order.
    pub authors: Vec<String>,
    /// Stored publication timestamp, verbatim.
    pub published: Option<String>,
    /// Link to the PDF.
    pub pdf_url: Option<String>,
    /// Category tags in stored order.
    pub categories: Vec<String>,
}

impl SimilarityResult {
    /// Maps an index hit back into a paper result.
    ///
    /// A missing title falls back to the record id.
    #[must_use]
    pub fn from_hit(hit: &VectorHit) -> Self {
        let non_empty = |key: &str| {
            hit.meta(key)
                .filter(|value| !value.trim().is_empty())
                .map(ToString::to_string)
        };

        Self {
            id: hit.id.clone(),
            title: hit
                .meta(keys::TITLE)
                .map_or_else(|| hit.id.to_string(), ToString::to_string),
            generated_summary: non_empty(keys::GENERATED_SUMMARY),
            original_summary: hit
                .meta(keys::ORIGINAL_SUMMARY)
                .unwrap_or_default()
                .to_string(),
            score: hit.score,
            authors: decode_list(hit.meta(keys::AUTHORS)),
            published: non_empty(keys::PUBLISHED),
            pdf_url: non_empty(keys::PDF_URL),
            categories: decode_list(hit.meta(keys::CATEGORIES)),
        }
    }

    /// The generated summary or [`UNAVAILABLE_SUMMARY`].
    #[must_use]
    pub fn summary_or_unavailable(&self) -> &str {
        self.generated_summary
            .as_deref()
            .unwrap_or(UNAVAILABLE_SUMMARY)
    }
}

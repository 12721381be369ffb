//! Vector index records.

use super::RecordId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// String metadata attached to a vector record.
pub type RecordMetadata = BTreeMap<String, String>;

/// Metadata keys written by the paper store.
pub mod keys {
    /// Paper title.
    pub const TITLE: &str = "title";
    /// Authors as a JSON array, see [`encode_list`](super::encode_list).
    pub const AUTHORS: &str = "authors";
    /// Link to the PDF.
    pub const PDF_URL: &str = "pdf_url";
    /// Publication timestamp.
    pub const PUBLISHED: &str = "published";
    /// The paper's own abstract.
    pub const ORIGINAL_SUMMARY: &str = "original_summary";
    /// The machine-generated summary.
    pub const GENERATED_SUMMARY: &str = "generated_summary";
    /// Category tags as a JSON array.
    pub const CATEGORIES: &str = "categories";
}

/// Encodes a list metadata value as a JSON array of strings.
#[must_use]
pub fn encode_list(items: &[String]) -> String {
    serde_json::Value::from(items.to_vec()).to_string()
}

/// Decodes a list metadata value.
///
/// Values that are not a JSON array are read as a `", "` join, the layout
/// of collections written before lists were stored as arrays.
#[must_use]
pub fn decode_list(value: Option<&str>) -> Vec<String> {
    let Some(value) = value else {
        return Vec::new();
    };
    if let Ok(items) = serde_json::from_str::<Vec<String>>(value) {
        return items;
    }
    value
        .split(", ")
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// A record stored in a vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Unique identifier.
    pub id: RecordId,
    /// Embedding vector; its length must equal the index dimensionality.
    pub embedding: Vec<f32>,
    /// The text that was embedded.
    pub document: String,
    /// Arbitrary string metadata.
    pub metadata: RecordMetadata,
}

impl VectorRecord {
    /// Creates a record with empty metadata.
    #[must_use]
    pub fn new(id: impl Into<RecordId>, embedding: Vec<f32>, document: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            embedding,
            document: document.into(),
            metadata: RecordMetadata::new(),
        }
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A single nearest-neighbour match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorHit {
    /// Identifier of the matching record.
    pub id: RecordId,
    /// Cosine similarity in `[-1.0, 1.0]`.
    pub score: f32,
    /// The stored document text.
    pub document: String,
    /// The stored metadata.
    pub metadata: RecordMetadata,
}

impl VectorHit {
    /// Returns a metadata value, if present.
    #[must_use]
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

/// Whether an insert created a new record or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The id was not present.
    Inserted,
    /// The id was present and its record was overwritten.
    Replaced,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_list_keeps_commas_inside_items() {
        let authors = vec!["Smith, J.".to_string(), "Doe, A.".to_string()];
        let encoded = encode_list(&authors);
        assert_eq!(encoded, r#"["Smith, J.","Doe, A."]"#);
        assert_eq!(decode_list(Some(&encoded)), authors);
    }

    #[test_case(Some("Ada Lovelace, Alan Turing"), &["Ada Lovelace", "Alan Turing"]; "legacy join")]
    #[test_case(Some("[]"), &[]; "empty array")]
    #[test_case(Some(""), &[]; "empty string")]
    #[test_case(None, &[]; "missing")]
    fn test_decode_list(value: Option<&str>, expected: &[&str]) {
        assert_eq!(decode_list(value), expected);
    }
}

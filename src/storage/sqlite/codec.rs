//! Embedding blob encoding.
//!
//! Vectors are stored as little-endian `f32` sequences.

use crate::{Error, Result};

/// Encodes a vector as a little-endian `f32` blob.
#[must_use]
pub fn encode_embedding(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Decodes a little-endian `f32` blob, checking it holds `dimensions` values.
///
/// # Errors
///
/// Returns [`Error::StorageUnavailable`] if the blob length does not match.
pub fn decode_embedding(blob: &[u8], dimensions: usize) -> Result<Vec<f32>> {
    if blob.len() != dimensions * 4 {
        return Err(Error::StorageUnavailable {
            operation: "decode_embedding".to_string(),
            cause: format!(
                "expected {} bytes for {dimensions} dimensions, found {}",
                dimensions * 4,
                blob.len()
            ),
        });
    }

    Ok(blob
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

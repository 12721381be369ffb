//! Data models for paperlens.
//!
//! This module contains all the core data structures used throughout the system.

mod paper;
mod record;
mod search;
mod trends;

pub use paper::{IdStrategy, Paper, PaperStats, RecordId, WORDS_PER_MINUTE};
pub use record::{
    InsertOutcome, RecordMetadata, VectorHit, VectorRecord, decode_list, encode_list, keys,
};
pub use search::{SimilarityResult, UNAVAILABLE_SUMMARY};
pub use trends::{KeyFinding, TrendSummary};

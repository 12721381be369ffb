//! Business logic services.
//!
//! Services orchestrate the embedder, the vector index, and the summarizer.

mod paper_store;
mod recommender;
mod summary;
pub mod trends;

pub use paper_store::{DEFAULT_SIMILAR_PAPERS, PaperStore};
pub use recommender::{DEFAULT_RECOMMENDATIONS, RecommenderEngine};
pub use summary::{PaperAnalysis, SummaryMode, SummaryOutcome, SummaryService};

//! Vector index implementations.
//!
//! Both indexes rank by exact (brute-force) cosine similarity over an
//! in-memory cache; [`SqliteVectorIndex`] persists every write before it
//! becomes visible to queries.

mod cache;
mod memory;
mod sqlite;

pub use cache::{PreparedVector, prepare_vector};
pub use memory::MemoryVectorIndex;
pub use sqlite::{CollectionSpec, SqliteVectorIndex};

//! Storage layer.
//!
//! A single vector layer holds everything the paper store needs: each record
//! carries its embedding, the embedded document, and string metadata.
//!
//! - [`traits`]: the [`VectorIndex`] abstraction
//! - [`vector`]: [`SqliteVectorIndex`] (persistent) and [`MemoryVectorIndex`]
//! - [`sqlite`]: shared `SQLite` connection, codec, and metrics helpers

// Allow significant_drop_tightening - the connection guard is held until the
// cache is updated so cache order follows commit order.
#![allow(clippy::significant_drop_tightening)]

mod lock;
pub mod sqlite;
pub mod traits;
pub mod vector;

pub use traits::VectorIndex;
pub use vector::{CollectionSpec, MemoryVectorIndex, SqliteVectorIndex};

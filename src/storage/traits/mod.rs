//! Storage traits.

mod vector;

pub use vector::VectorIndex;

//! Shared `SQLite` infrastructure for the vector index.
//!
//! - [`connection`]: opening and configuring connections, error mapping
//! - [`codec`]: embedding blob encoding
//! - [`metrics`]: shared metrics recording helpers

mod codec;
mod connection;
mod metrics;

pub use codec::{decode_embedding, encode_embedding};
pub use connection::{configure_connection, open_connection, unavailable};
pub use metrics::{record_operation_metrics, status_of};

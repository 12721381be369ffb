//! Connection handling for the `SQLite` vector index.

use crate::{Error, Result};
use rusqlite::Connection;
use std::path::Path;

/// Maps a rusqlite error into [`Error::StorageUnavailable`] for `operation`.
pub fn unavailable(operation: &'static str) -> impl Fn(rusqlite::Error) -> Error {
    move |e| Error::StorageUnavailable {
        operation: operation.to_string(),
        cause: e.to_string(),
    }
}

/// Opens a database file, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`Error::StorageUnavailable`] if the directory or database cannot be created.
pub fn open_connection(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::StorageUnavailable {
            operation: "create_data_dir".to_string(),
            cause: format!("{}: {e}", parent.display()),
        })?;
    }

    Connection::open(path).map_err(unavailable("open_sqlite"))
}

/// Configures a `SQLite` connection for the vector index.
///
/// # Configuration Applied
///
/// - **WAL mode**: concurrent readers with a single writer
/// - **NORMAL synchronous**: committed transactions survive a process crash
/// - **`busy_timeout`**: waits up to 5 seconds for locks instead of failing immediately
/// - **`foreign_keys`**: records are removed with their collection
///
/// # Errors
///
/// Returns [`Error::StorageUnavailable`] if enabling foreign keys fails.
pub fn configure_connection(conn: &Connection) -> Result<()> {
    // journal_mode returns a row ("wal"), so it cannot go through execute_batch.
    // In-memory databases report "memory" and ignore the request.
    let _ = conn.pragma_update(None, "journal_mode", "WAL");
    let _ = conn.pragma_update(None, "synchronous", "NORMAL");
    let _ = conn.pragma_update(None, "busy_timeout", "5000");
    conn.pragma_update(None, "foreign_keys", "ON")
        .map_err(unavailable("configure_sqlite"))?;

    Ok(())
}

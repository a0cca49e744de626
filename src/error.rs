use thiserror::Error;

/// Errors surfaced by the chunk engine and the file manager.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Chunk {index} ({chunk_id}) could not be written to '{location}': {source}")]
    StorageWrite {
        index: u64,
        chunk_id: String,
        location: String,
        #[source]
        source: LocationError,
    },

    #[error("Chunk {index} ({chunk_id}) on '{location}' is corrupt: {reason}")]
    Corruption {
        index: u64,
        chunk_id: String,
        location: String,
        reason: String,
    },

    #[error("Chunk {index} ({chunk_id}) is missing from '{location}'")]
    MissingChunk {
        index: u64,
        chunk_id: String,
        location: String,
    },

    #[error("Manifest for '{name}' is inconsistent: {reason}")]
    InconsistentManifest { name: String, reason: String },
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors raised by a single [`StorageLocation`](crate::storage::location::StorageLocation).
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("key '{0}' not found")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Durable catalog failures. Absorbed by [`Catalog`](crate::catalog::Catalog),
/// never returned to its callers.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Durable catalog unavailable: {0}")]
    Unavailable(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Manifest serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Catalog task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

use std::path::PathBuf;

/// Errors from cache store operations.
///
/// Only [`StoreError::CreateRoot`] and [`StoreError::InvalidConfig`] escape
/// construction. Everything raised by a per-entry operation is converted at
/// the [`CacheBackend`](crate::CacheBackend) boundary into a miss or `false`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The cache root could not be created.
    #[error("cannot create cache root {path}: {source}")]
    CreateRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration rejected before the store was opened.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration file could not be parsed.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Value encoding or decoding failure in the typed cache wrapper.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error from the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory walk failure while collecting stats.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

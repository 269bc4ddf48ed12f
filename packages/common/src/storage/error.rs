use thiserror::Error;

/// Errors that can occur during blob storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Authentication material is absent or was rejected by the store.
    #[error("blob store credentials error: {0}")]
    Credentials(String),
    /// The requested object does not exist.
    #[error("object not found: {0}")]
    NotFound(String),
    /// The object key is not a flat, printable name.
    #[error("invalid object key: {0}")]
    InvalidKey(String),
    /// Any other failure reported by the backend (network, bucket, permission).
    #[error("blob store error: {0}")]
    Backend(String),
    /// An I/O error occurred.
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
}

use common::storage::StorageError;
use nexus::{ContainerError, ConversionError, RenderError};
use thiserror::Error;

/// Failure category reported by the pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conversion,
    Credentials,
    Store,
    NotFound,
    Processing,
}

/// Structured pipeline failure: a kind plus a human-readable message.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Validation(String),

    #[error("Conversion failed: {0}")]
    Conversion(String),

    #[error("Blob store credentials rejected: {0}")]
    Credentials(String),

    #[error("Blob store failure: {0}")]
    Store(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Processing failed: {0}")]
    Processing(String),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Conversion(_) => ErrorKind::Conversion,
            Self::Credentials(_) => ErrorKind::Credentials,
            Self::Store(_) => ErrorKind::Store,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Processing(_) => ErrorKind::Processing,
        }
    }
}

impl From<StorageError> for PipelineError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Credentials(_) => Self::Credentials(err.to_string()),
            StorageError::InvalidKey(msg) => Self::Validation(format!("Invalid file name: {msg}")),
            StorageError::NotFound(_) | StorageError::Backend(_) | StorageError::Io(_) => {
                Self::Store(err.to_string())
            }
        }
    }
}

impl From<ConversionError> for PipelineError {
    fn from(err: ConversionError) -> Self {
        match err {
            ConversionError::InvalidText { .. } => Self::Validation(err.to_string()),
            _ => Self::Conversion(err.to_string()),
        }
    }
}

impl From<ContainerError> for PipelineError {
    fn from(err: ContainerError) -> Self {
        Self::Processing(err.to_string())
    }
}

impl From<RenderError> for PipelineError {
    fn from(err: RenderError) -> Self {
        Self::Processing(err.to_string())
    }
}

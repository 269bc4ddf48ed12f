mod error;
mod key;
mod traits;

pub mod filesystem;
#[cfg(feature = "object-storage")]
pub mod s3;

use std::sync::Arc;

pub use error::StorageError;
pub use key::ObjectKey;
pub use traits::BlobStore;

use crate::config::{StorageBackend, StorageConfig};

/// Build the blob store selected by `config.backend`.
pub async fn connect(config: &StorageConfig) -> Result<Arc<dyn BlobStore>, StorageError> {
    match config.backend {
        StorageBackend::Filesystem => Ok(Arc::new(
            filesystem::FilesystemBlobStore::new(config.root.clone()).await?,
        )),
        #[cfg(feature = "object-storage")]
        StorageBackend::S3 => Ok(Arc::new(s3::S3BlobStore::new(config))),
        #[cfg(not(feature = "object-storage"))]
        StorageBackend::S3 => Err(StorageError::Backend(
            "built without the object-storage feature".into(),
        )),
    }
}

use std::path::Path;

use async_trait::async_trait;

use super::error::StorageError;
use super::key::ObjectKey;

/// Flat key/value blob storage addressed by bucket and key.
///
/// Objects are written once and read any number of times; there is no
/// update or delete path.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `key`.
    async fn put(&self, bucket: &str, key: &ObjectKey, data: Vec<u8>) -> Result<(), StorageError>;

    /// Store the contents of a local file under `key` and return its size.
    async fn put_file(
        &self,
        bucket: &str,
        key: &ObjectKey,
        path: &Path,
    ) -> Result<u64, StorageError> {
        let data = tokio::fs::read(path).await?;
        let size = data.len() as u64;
        self.put(bucket, key, data).await?;
        Ok(size)
    }

    /// Retrieve all bytes of an object.
    async fn get(&self, bucket: &str, key: &ObjectKey) -> Result<Vec<u8>, StorageError>;

    /// List every key in the bucket, in the order the store returns them.
    async fn list(&self, bucket: &str) -> Result<Vec<String>, StorageError>;
}

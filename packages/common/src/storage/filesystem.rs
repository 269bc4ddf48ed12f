use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use super::error::StorageError;
use super::key::ObjectKey;
use super::traits::BlobStore;

/// Filesystem-backed blob store.
///
/// Objects are stored as `{base_path}/{bucket}/{key}`. Writes go through a
/// temp file under `{base_path}/.tmp` and are renamed into place, so readers
/// never observe a partially written object.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
}

impl FilesystemBlobStore {
    /// Create a new filesystem blob store.
    pub async fn new(base_path: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self { base_path })
    }

    fn bucket_path(&self, bucket: &str) -> Result<PathBuf, StorageError> {
        // Bucket names share the key rules: one flat path component.
        ObjectKey::parse(bucket)
            .map_err(|_| StorageError::Backend(format!("invalid bucket name '{bucket}'")))?;
        Ok(self.base_path.join(bucket))
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put(&self, bucket: &str, key: &ObjectKey, data: Vec<u8>) -> Result<(), StorageError> {
        let bucket_dir = self.bucket_path(bucket)?;
        fs::create_dir_all(&bucket_dir).await?;

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, &data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&temp_path, bucket_dir.join(key.as_str())).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(())
    }

    async fn get(&self, bucket: &str, key: &ObjectKey) -> Result<Vec<u8>, StorageError> {
        let path = self.bucket_path(bucket)?.join(key.as_str());
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Keys come back sorted by name. A bucket that was never written to
    /// lists as empty.
    async fn list(&self, bucket: &str) -> Result<Vec<String>, StorageError> {
        let bucket_dir = self.bucket_path(bucket)?;
        let mut entries = match fs::read_dir(&bucket_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                keys.push(name.to_owned());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

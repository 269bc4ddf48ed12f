use async_trait::async_trait;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{Bucket, Region};
use tracing::debug;

use super::error::StorageError;
use super::key::ObjectKey;
use super::traits::BlobStore;
use crate::config::StorageConfig;

/// Error codes S3-compatible services return when the access key or the
/// request signature is not accepted.
const CREDENTIAL_ERROR_CODES: [&str; 4] = [
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
    "InvalidToken",
    "ExpiredToken",
];

/// Blob store backed by an S3-compatible service.
///
/// Holds only connection parameters. Every call builds a fresh bucket handle
/// with fresh credentials; no connection state outlives a request.
pub struct S3BlobStore {
    endpoint: String,
    region: String,
    access_key: Option<String>,
    secret_key: Option<String>,
    path_style: bool,
}

impl S3BlobStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            region: config.region.clone(),
            access_key: config.access_key.clone(),
            secret_key: config.secret_key.clone(),
            path_style: config.path_style,
        }
    }

    fn bucket(&self, name: &str) -> Result<Box<Bucket>, StorageError> {
        let access_key = self.access_key.as_deref().filter(|s| !s.is_empty());
        let secret_key = self.secret_key.as_deref().filter(|s| !s.is_empty());
        let (Some(access_key), Some(secret_key)) = (access_key, secret_key) else {
            return Err(StorageError::Credentials(
                "access key and secret key must both be configured".into(),
            ));
        };

        let credentials = Credentials::new(Some(access_key), Some(secret_key), None, None, None)
            .map_err(|e| StorageError::Credentials(e.to_string()))?;
        let region = Region::Custom {
            region: self.region.clone(),
            endpoint: self.endpoint.clone(),
        };

        let bucket = Bucket::new(name, region, credentials).map_err(classify_s3_error)?;
        Ok(if self.path_style {
            bucket.with_path_style()
        } else {
            bucket
        })
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, bucket: &str, key: &ObjectKey, data: Vec<u8>) -> Result<(), StorageError> {
        let handle = self.bucket(bucket)?;
        let response = handle
            .put_object(key.as_str(), &data)
            .await
            .map_err(classify_s3_error)?;
        check_status(response.status_code(), response.as_slice(), key.as_str())?;
        debug!(bucket, key = %key, size = data.len(), "Object stored");
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &ObjectKey) -> Result<Vec<u8>, StorageError> {
        let handle = self.bucket(bucket)?;
        let response = handle
            .get_object(key.as_str())
            .await
            .map_err(classify_s3_error)?;
        check_status(response.status_code(), response.as_slice(), key.as_str())?;
        Ok(response.as_slice().to_vec())
    }

    async fn list(&self, bucket: &str) -> Result<Vec<String>, StorageError> {
        let handle = self.bucket(bucket)?;
        let pages = handle
            .list(String::new(), None)
            .await
            .map_err(classify_s3_error)?;

        Ok(pages
            .into_iter()
            .flat_map(|page| page.contents.into_iter().map(|object| object.key))
            .collect())
    }
}

fn check_status(status: u16, body: &[u8], key: &str) -> Result<(), StorageError> {
    if (200..300).contains(&status) {
        return Ok(());
    }
    Err(classify_failure(
        status,
        &String::from_utf8_lossy(body),
        key,
    ))
}

fn classify_failure(status: u16, body: &str, key: &str) -> StorageError {
    if CREDENTIAL_ERROR_CODES.iter().any(|code| body.contains(code)) {
        return StorageError::Credentials(format!("store rejected credentials (HTTP {status})"));
    }
    if status == 404 && !body.contains("NoSuchBucket") {
        return StorageError::NotFound(key.to_owned());
    }
    StorageError::Backend(format!("HTTP {status}: {}", body.trim()))
}

fn classify_s3_error(err: S3Error) -> StorageError {
    match err {
        S3Error::Credentials(e) => StorageError::Credentials(e.to_string()),
        S3Error::HttpFailWithBody(status, body) => classify_failure(status, &body, ""),
        other => StorageError::Backend(other.to_string()),
    }
}

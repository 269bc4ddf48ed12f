use std::path::PathBuf;

use serde::Deserialize;

/// Which blob store implementation backs the service.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Any S3-compatible service (MinIO, AWS, Ceph RGW).
    S3,
    /// Local directory tree, one sub-directory per bucket.
    Filesystem,
}

/// Blob store configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Default: `s3`.
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,
    /// Bucket holding every container produced by the service.
    pub bucket: String,
    /// S3 endpoint URL, e.g. `https://minio.example.org`.
    #[serde(default)]
    pub endpoint: String,
    /// Default: "us-east-1". MinIO ignores it but request signing needs one.
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    /// Address buckets as `endpoint/bucket` instead of `bucket.endpoint`. Default: true.
    #[serde(default = "default_path_style")]
    pub path_style: bool,
    /// Root directory of the filesystem backend. Default: "./data/blobs".
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

fn default_backend() -> StorageBackend {
    StorageBackend::S3
}
fn default_region() -> String {
    "us-east-1".into()
}
fn default_path_style() -> bool {
    true
}
fn default_root() -> PathBuf {
    PathBuf::from("./data/blobs")
}

impl StorageConfig {
    /// Filesystem-backed configuration rooted at `root`.
    pub fn filesystem(root: PathBuf, bucket: impl Into<String>) -> Self {
        Self {
            backend: StorageBackend::Filesystem,
            bucket: bucket.into(),
            endpoint: String::new(),
            region: default_region(),
            access_key: None,
            secret_key: None,
            path_style: default_path_style(),
            root,
        }
    }
}

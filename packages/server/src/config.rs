use std::path::PathBuf;

use common::StorageConfig;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    #[serde(default)]
    pub allow_origins: Vec<String>,
    #[serde(default = "default_cors_max_age")]
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: Vec::new(),
            max_age: default_cors_max_age(),
        }
    }
}

fn default_cors_max_age() -> u64 {
    3600
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub cors: CorsConfig,
    /// Request body limit for experiment uploads, in bytes. Default: 512 MiB.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: usize,
}

fn default_max_upload_size() -> usize {
    512 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    /// Directory holding the `*_mapping.json` schema files. Default: "./schemas".
    #[serde(default = "default_schema_dir")]
    pub schema_dir: PathBuf,
    /// Where uploads and built containers live while a request runs.
    /// Default: the system temp directory.
    #[serde(default = "std::env::temp_dir")]
    pub staging_dir: PathBuf,
    /// Pre-filled instrument location on the experiment form.
    #[serde(default = "default_location")]
    pub default_location: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            schema_dir: default_schema_dir(),
            staging_dir: std::env::temp_dir(),
            default_location: default_location(),
        }
    }
}

fn default_schema_dir() -> PathBuf {
    PathBuf::from("./schemas")
}

fn default_location() -> String {
    "Trieste".into()
}

/// OIDC relying-party settings. The provider itself is external; the
/// service only verifies the ID tokens it issues.
#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Expected `aud` claim.
    pub client_id: String,
    /// Expected `iss` claim; not checked when unset.
    #[serde(default)]
    pub issuer: Option<String>,
    /// JWS algorithm name, e.g. `RS256` or `HS256`. Default: `RS256`.
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    /// PEM public key for asymmetric algorithms, shared secret for HMAC.
    pub verification_key: String,
    /// Provider's end-session endpoint.
    pub logout_endpoint: String,
    /// Where the provider sends the browser after logout.
    pub logout_redirect_url: String,
}

fn default_algorithm() -> String {
    "RS256".into()
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("storage.bucket", "nexus-depot")?
            .set_default("auth.client_id", "nexus-depot")?
            .set_default("auth.verification_key", "")?
            .set_default("auth.logout_endpoint", "http://localhost:8080/logout")?
            .set_default("auth.logout_redirect_url", "http://127.0.0.1:8000/")?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., NEXUS_DEPOT__STORAGE__BUCKET)
            .add_source(Environment::with_prefix("NEXUS_DEPOT").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

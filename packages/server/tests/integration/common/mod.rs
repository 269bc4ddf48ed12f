use std::io::Cursor;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Duration, Utc};
use ::common::StorageConfig;
use ::common::storage::filesystem::FilesystemBlobStore;
use ::common::storage::{BlobStore, ObjectKey};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use nexus::{ContainerBuilder, NexusBuilder};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tempfile::TempDir;
use tiff::encoder::{TiffEncoder, colortype};

use depot_server::config::{AppConfig, AuthConfig, CorsConfig, IngestConfig, ServerConfig};
use depot_server::state::AppState;
use depot_server::utils::id_token::IdTokenVerifier;

pub const BUCKET: &str = "experiments";
pub const CLIENT_ID: &str = "nexus-depot-tests";
pub const SECRET: &str = "integration-test-secret";
pub const LOGOUT_ENDPOINT: &str = "https://idp.example.org/protocol/openid-connect/logout";
pub const LOGOUT_REDIRECT: &str = "http://localhost:8000/";

pub mod routes {
    pub const HOME: &str = "/";
    pub const HEALTH: &str = "/health";
    pub const LOGOUT: &str = "/logout";
    pub const OPENAPI: &str = "/api-docs/openapi.json";
    pub const NEW_EXPERIMENT: &str = "/files/new-experiment";
    pub const LIST_FILES: &str = "/files/list-files";

    pub fn view_file(key: &str) -> String {
        format!("/files/view-file/{key}")
    }

    pub fn download_file(key: &str) -> String {
        format!("/files/download-file/{key}")
    }

    pub fn download_image(key: &str) -> String {
        format!("/files/download-file/{key}?image=true")
    }
}

/// Schema files shipped with the repository.
fn schema_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../schemas")
}

/// A running test server backed by a filesystem blob store.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub store: Arc<FilesystemBlobStore>,
    pub staging_dir: PathBuf,
    _root: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    pub headers: reqwest::header::HeaderMap,
    /// Raw response body.
    pub bytes: Vec<u8>,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let bytes = res.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Self {
            status,
            headers,
            bytes,
            body,
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    pub fn header(&self, name: &str) -> &str {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    pub fn code(&self) -> &str {
        self.body["code"].as_str().unwrap_or_default()
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_builder(Arc::new(NexusBuilder::default())).await
    }

    pub async fn spawn_with_builder(builder: Arc<dyn ContainerBuilder>) -> Self {
        let root = tempfile::tempdir().expect("Failed to create temp dir");
        let staging_dir = root.path().join("staging");
        std::fs::create_dir(&staging_dir).expect("Failed to create staging dir");
        let blob_root = root.path().join("blobs");

        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig::default(),
                max_upload_size: 16 * 1024 * 1024,
            },
            storage: StorageConfig::filesystem(blob_root.clone(), BUCKET),
            ingest: IngestConfig {
                schema_dir: schema_dir(),
                staging_dir: staging_dir.clone(),
                default_location: "Trieste".to_string(),
            },
            auth: AuthConfig {
                client_id: CLIENT_ID.to_string(),
                issuer: None,
                algorithm: "HS256".to_string(),
                verification_key: SECRET.to_string(),
                logout_endpoint: LOGOUT_ENDPOINT.to_string(),
                logout_redirect_url: LOGOUT_REDIRECT.to_string(),
            },
        };

        let store = Arc::new(
            FilesystemBlobStore::new(blob_root)
                .await
                .expect("Failed to create blob store"),
        );
        let verifier =
            IdTokenVerifier::from_config(&config.auth).expect("Failed to build verifier");
        let state = AppState::new(config, store.clone(), builder, verifier);

        let app = depot_server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to build HTTP client");

        Self {
            addr,
            client,
            store,
            staging_dir,
            _root: root,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_cookie(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header("Cookie", format!("id_token={token}"))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_without_token(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn post_form_with_token(&self, path: &str, form: Form, token: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart request");

        TestResponse::from_response(res).await
    }

    pub async fn post_form_without_token(&self, path: &str, form: Form) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart request");

        TestResponse::from_response(res).await
    }

    pub async fn post_json_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    /// Upload an experiment and return the stored key.
    pub async fn create_experiment(&self, token: &str) -> String {
        let form = experiment_form("TVIPS", "").part("image_files", tiff_part("scan.tif"));
        let res = self
            .post_form_with_token(routes::NEW_EXPERIMENT, form, token)
            .await;
        assert_eq!(res.status, 201, "create_experiment failed: {}", res.text());
        res.body["filename"]
            .as_str()
            .expect("response should contain 'filename'")
            .to_string()
    }

    /// Store raw bytes directly, bypassing ingestion.
    pub async fn put_object(&self, key: &str, bytes: Vec<u8>) {
        self.store
            .put(BUCKET, &ObjectKey::parse(key).unwrap(), bytes)
            .await
            .expect("Failed to store object");
    }

    pub fn staging_is_empty(&self) -> bool {
        std::fs::read_dir(&self.staging_dir)
            .expect("staging dir exists")
            .next()
            .is_none()
    }
}

/// A signed ID token for `sub`, valid for an hour.
pub fn id_token(sub: &str) -> String {
    signed_token(sub, CLIENT_ID, SECRET, Duration::hours(1))
}

pub fn signed_token(sub: &str, aud: &str, secret: &str, expires_in: Duration) -> String {
    let claims = serde_json::json!({
        "sub": sub,
        "aud": aud,
        "exp": (Utc::now() + expires_in).timestamp(),
        "name": "Test Operator",
        "email": format!("{sub}@example.org"),
    });
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("Failed to sign token")
}

/// A 4x3 16-bit grayscale TIFF with a horizontal ramp.
pub fn tiff_bytes() -> Vec<u8> {
    let data: Vec<u16> = (0..12u16).map(|v| v * 5000).collect();
    let mut buf = Cursor::new(Vec::new());
    TiffEncoder::new(&mut buf)
        .unwrap()
        .write_image::<colortype::Gray16>(4, 3, &data)
        .unwrap();
    buf.into_inner()
}

pub fn tiff_part(file_name: &str) -> Part {
    Part::bytes(tiff_bytes())
        .file_name(file_name.to_string())
        .mime_str("image/tiff")
        .expect("Failed to set MIME type")
}

/// Metadata fields of the experiment form, without image files.
pub fn experiment_form(experiment_type: &str, schema_file_name: &str) -> Form {
    Form::new()
        .text("operator_name", "Ada")
        .text("description", "Integration test")
        .text("material", "Other")
        .text("custom_material", "MoS2")
        .text("hypothetical_composition", "MoS2")
        .text("initial_composition", "Mo1S2")
        .text("final_composition", "Mo1S1.9")
        .text("sample_identifier", "S-42")
        .text("preparation_date", "2026-10-19")
        .text("atom_types", "Mo S")
        .text("instrument_name", "TEM-1")
        .text("instrument_location", "Trieste")
        .text("experiment_type", experiment_type.to_string())
        .text("schema_file_name", schema_file_name.to_string())
}

/// An HDF5 file without `NXentry/image_2d/data`.
pub fn container_without_image(dir: &Path) -> Vec<u8> {
    let path = dir.join("no-image.nxs");
    hdf5::File::create(&path)
        .unwrap()
        .create_group("NXentry")
        .unwrap();
    std::fs::read(path).unwrap()
}

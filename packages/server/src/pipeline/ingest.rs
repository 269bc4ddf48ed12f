use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use common::storage::{BlobStore, ObjectKey, StorageError};
use nexus::{BuildRequest, ContainerBuilder, ExtraFields};
use tempfile::TempPath;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::pipeline::PipelineError;
use crate::pipeline::schema::{ExperimentType, SchemaCatalog};

/// Material value that defers to the free-text `custom_material` field.
pub const OTHER_MATERIAL: &str = "Other";

/// One uploaded file from the experiment form.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub data: Bytes,
}

/// A submitted experiment form.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub operator_name: String,
    pub description: String,
    pub material: String,
    pub custom_material: String,
    pub hypothetical_composition: String,
    pub initial_composition: String,
    pub final_composition: String,
    pub sample_identifier: String,
    pub preparation_date: String,
    pub atom_types: String,
    pub instrument_name: String,
    pub instrument_location: String,
    pub experiment_type: ExperimentType,
    pub schema_file_name: String,
    pub images: Vec<UploadedImage>,
}

impl Default for UploadRequest {
    fn default() -> Self {
        Self {
            operator_name: String::new(),
            description: String::new(),
            material: String::new(),
            custom_material: String::new(),
            hypothetical_composition: String::new(),
            initial_composition: String::new(),
            final_composition: String::new(),
            sample_identifier: String::new(),
            preparation_date: String::new(),
            atom_types: String::new(),
            instrument_name: String::new(),
            instrument_location: String::new(),
            experiment_type: ExperimentType::Other(String::new()),
            schema_file_name: String::new(),
            images: Vec::new(),
        }
    }
}

impl UploadRequest {
    /// Material as recorded in the container.
    pub fn effective_material(&self) -> &str {
        if self.material == OTHER_MATERIAL {
            &self.custom_material
        } else {
            &self.material
        }
    }

    pub fn extra_fields(&self) -> ExtraFields {
        [
            ("operator_name", self.operator_name.as_str()),
            ("description", &self.description),
            ("material", self.effective_material()),
            ("sample_identifier", &self.sample_identifier),
            ("preparation_date", &self.preparation_date),
            ("atom_types", &self.atom_types),
            ("hypothetical_composition", &self.hypothetical_composition),
            ("initial_composition", &self.initial_composition),
            ("final_composition", &self.final_composition),
            ("instrument_name", &self.instrument_name),
            ("instrument_location", &self.instrument_location),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect()
    }
}

/// Ingestion progress, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    Received,
    StagingLocal,
    Building,
    Uploading,
    Cleanup,
    Succeeded,
    Failed,
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Received => "received",
            Self::StagingLocal => "staging_local",
            Self::Building => "building",
            Self::Uploading => "uploading",
            Self::Cleanup => "cleanup",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        })
    }
}

/// Outcome of a successful ingestion.
#[derive(Debug, Clone)]
pub struct IngestReceipt {
    pub key: ObjectKey,
    pub size: u64,
}

/// Request-scoped local files. Each path is removed when its guard drops,
/// so a cancelled request (client gone mid-build) leaves nothing behind.
struct StagedFiles {
    source: TempPath,
    container: TempPath,
}

impl StagedFiles {
    fn create(dir: &Path, image: &UploadedImage) -> std::io::Result<Self> {
        let id = Uuid::new_v4();
        let source = staged_path(
            dir,
            &id,
            &format!("-source.{}", staged_extension(&image.file_name)),
        )?;
        let container = staged_path(dir, &id, "-container.nxs")?;
        Ok(Self { source, container })
    }

    fn cleanup(self) {
        for path in [self.source, self.container] {
            let display = path.display().to_string();
            match path.close() {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %display, error = %e, "Failed to remove staged file"),
            }
        }
    }
}

/// `{id}{suffix}` in `dir`, created empty and owned by the returned guard.
fn staged_path(dir: &Path, id: &Uuid, suffix: &str) -> std::io::Result<TempPath> {
    Ok(tempfile::Builder::new()
        .prefix(&id.to_string())
        .suffix(suffix)
        .rand_bytes(0)
        .tempfile_in(dir)?
        .into_temp_path())
}

/// Extension of the uploaded file name when it is plain alphanumeric,
/// `tif` otherwise.
fn staged_extension(file_name: &str) -> &str {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("tif")
}

/// Upload → container build → blob store.
pub struct IngestionPipeline {
    store: Arc<dyn BlobStore>,
    bucket: String,
    builder: Arc<dyn ContainerBuilder>,
    schemas: SchemaCatalog,
    staging_dir: PathBuf,
}

impl IngestionPipeline {
    pub fn new(
        store: Arc<dyn BlobStore>,
        bucket: impl Into<String>,
        builder: Arc<dyn ContainerBuilder>,
        schemas: SchemaCatalog,
        staging_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            builder,
            schemas,
            staging_dir: staging_dir.into(),
        }
    }

    /// Run one upload to completion. Staged files are gone when this
    /// returns, whatever the outcome.
    #[instrument(skip(self, request), fields(images = request.images.len()))]
    pub async fn ingest(&self, request: UploadRequest) -> Result<IngestReceipt, PipelineError> {
        info!(stage = %IngestStage::Received, "Ingestion started");
        let Some(image) = request.images.first() else {
            return Err(PipelineError::Validation(
                "At least one image file is required".into(),
            ));
        };
        if request.images.len() > 1 {
            warn!(
                ignored = request.images.len() - 1,
                "Only the first image is converted"
            );
        }
        let schema = self
            .schemas
            .resolve(&request.experiment_type, &request.schema_file_name)?;

        let result = self
            .stage_build_upload(image, schema, request.extra_fields())
            .await;

        match &result {
            Ok(receipt) => info!(
                stage = %IngestStage::Succeeded,
                key = %receipt.key,
                size = receipt.size,
                "Ingestion finished"
            ),
            Err(e) => warn!(stage = %IngestStage::Failed, kind = ?e.kind(), error = %e, "Ingestion failed"),
        }
        result
    }

    async fn stage_build_upload(
        &self,
        image: &UploadedImage,
        schema: PathBuf,
        extra_fields: ExtraFields,
    ) -> Result<IngestReceipt, PipelineError> {
        let staged = StagedFiles::create(&self.staging_dir, image)
            .map_err(|e| PipelineError::Conversion(format!("Failed to stage upload: {e}")))?;
        info!(stage = %IngestStage::StagingLocal, path = %staged.source.display(), "Staging upload");
        if let Err(e) = tokio::fs::write(&staged.source, &image.data).await {
            staged.cleanup();
            return Err(PipelineError::Conversion(format!(
                "Failed to stage upload: {e}"
            )));
        }

        info!(stage = %IngestStage::Building, schema = %schema.display(), "Building container");
        let request = BuildRequest {
            source: staged.source.to_path_buf(),
            schema,
            extra_fields,
            output: staged.container.to_path_buf(),
        };
        let builder = Arc::clone(&self.builder);
        // The guards travel with the blocking task: if this future is dropped,
        // they are released once the build returns.
        let (built, staged) = tokio::task::spawn_blocking(move || (builder.build(&request), staged))
            .await
            .map_err(|e| PipelineError::Conversion(format!("Build task failed: {e}")))?;

        let result = match built {
            Ok(path) => self.upload(&path, &staged).await,
            Err(e) => Err(e.into()),
        };

        info!(stage = %IngestStage::Cleanup, "Removing staged files");
        staged.cleanup();
        result
    }

    async fn upload(
        &self,
        built: &Path,
        staged: &StagedFiles,
    ) -> Result<IngestReceipt, PipelineError> {
        let key = container_key()?;
        info!(stage = %IngestStage::Uploading, key = %key, "Uploading container");
        let uploaded = self.store.put_file(&self.bucket, &key, built).await;
        if built != &*staged.container {
            let _ = tokio::fs::remove_file(built).await;
        }
        let size = uploaded?;

        Ok(IngestReceipt { key, size })
    }
}

/// `TEM_<unix seconds>.nxs`. Two uploads within the same second collide.
fn container_key() -> Result<ObjectKey, StorageError> {
    ObjectKey::parse(&format!("TEM_{}.nxs", Utc::now().timestamp()))
}

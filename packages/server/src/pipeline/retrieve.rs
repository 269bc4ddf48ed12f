use std::io::Write;
use std::sync::Arc;

use common::storage::{BlobStore, ObjectKey};
use nexus::render::{encode_png, encode_png_base64};
use nexus::{Container, RawImage, normalize};
use tracing::{debug, info, instrument, warn};

use crate::pipeline::PipelineError;

/// File name given to images extracted from a container.
pub const EXTRACTED_IMAGE_NAME: &str = "extracted_image.png";

/// Rendered previews of a stored container.
#[derive(Debug, Clone)]
pub struct Preview {
    pub file_name: String,
    /// Base64-encoded PNGs; empty when the container has no image entry.
    pub images: Vec<String>,
}

/// What a download returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadKind {
    /// The stored object, unchanged.
    Raw,
    /// The container's image rendered as PNG.
    ExtractedImage,
}

#[derive(Debug, Clone)]
pub struct Download {
    pub file_name: String,
    pub kind: DownloadKind,
    pub bytes: Vec<u8>,
}

/// Blob store → container → normalized PNG.
pub struct RetrievalPipeline {
    store: Arc<dyn BlobStore>,
    bucket: String,
}

impl RetrievalPipeline {
    pub fn new(store: Arc<dyn BlobStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    /// Keys of every stored object, in store order.
    pub async fn list(&self) -> Result<Vec<String>, PipelineError> {
        Ok(self.store.list(&self.bucket).await?)
    }

    #[instrument(skip(self), fields(key = %key))]
    pub async fn preview(&self, key: &ObjectKey) -> Result<Preview, PipelineError> {
        let bytes = self.store.get(&self.bucket, key).await?;
        let rendered = tokio::task::spawn_blocking(move || render_base64(&bytes))
            .await
            .map_err(|e| PipelineError::Processing(format!("Render task failed: {e}")))??;

        let images = match rendered {
            Some(png) => vec![png],
            None => {
                warn!("Container has no NXentry/image_2d/data; nothing to preview");
                Vec::new()
            }
        };

        Ok(Preview {
            file_name: key.to_string(),
            images,
        })
    }

    #[instrument(skip(self), fields(key = %key))]
    pub async fn download(
        &self,
        key: &ObjectKey,
        kind: DownloadKind,
    ) -> Result<Download, PipelineError> {
        let bytes = self.store.get(&self.bucket, key).await?;

        match kind {
            DownloadKind::Raw => {
                info!(size = bytes.len(), "Serving stored object");
                Ok(Download {
                    file_name: key.to_string(),
                    kind,
                    bytes,
                })
            }
            DownloadKind::ExtractedImage => {
                let rendered = tokio::task::spawn_blocking(move || render_png(&bytes))
                    .await
                    .map_err(|e| PipelineError::Processing(format!("Render task failed: {e}")))??;
                let png = rendered.ok_or_else(|| {
                    PipelineError::NotFound("Image entry not found in the container".into())
                })?;
                info!(size = png.len(), "Serving extracted image");
                Ok(Download {
                    file_name: EXTRACTED_IMAGE_NAME.into(),
                    kind,
                    bytes: png,
                })
            }
        }
    }
}

/// Spill container bytes to a temp file; HDF5 only reads from paths.
fn spill(bytes: &[u8]) -> std::io::Result<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("nexus-depot-")
        .suffix(".nxs")
        .tempfile()?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(file)
}

/// Read `NXentry/image_2d/data` from container bytes.
fn load_image(bytes: &[u8], log_outline: bool) -> Result<Option<RawImage>, PipelineError> {
    let file = spill(bytes)
        .map_err(|e| PipelineError::Processing(format!("Failed to spill container: {e}")))?;
    let container = Container::open(file.path())?;
    if log_outline {
        match container.outline() {
            Ok(lines) => debug!(outline = %lines.join("\n"), "Container structure"),
            Err(e) => debug!(error = %e, "Could not walk container structure"),
        }
        if let Ok(attributes) = container.entry_attributes() {
            debug!(?attributes, "Entry metadata");
        }
    }
    let image = container.image()?;
    if let Some(raw) = &image {
        debug!(dtype = raw.dtype_name(), shape = ?raw.shape(), "Normalizing image");
    }
    Ok(image)
}

fn render_base64(bytes: &[u8]) -> Result<Option<String>, PipelineError> {
    match load_image(bytes, true)? {
        Some(raw) => Ok(Some(encode_png_base64(&normalize(raw))?)),
        None => Ok(None),
    }
}

fn render_png(bytes: &[u8]) -> Result<Option<Vec<u8>>, PipelineError> {
    match load_image(bytes, false)? {
        Some(raw) => Ok(Some(encode_png(&normalize(raw))?)),
        None => Ok(None),
    }
}

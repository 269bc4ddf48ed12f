use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

use crate::pipeline::Preview;

/// Response DTO for listing stored files.
#[derive(Serialize, utoipa::ToSchema)]
pub struct FileListResponse {
    #[schema(example = json!(["TEM_1760870400.nxs"]))]
    pub files: Vec<String>,
    pub total: u64,
}

/// Rendered preview of a stored container.
#[derive(Serialize, utoipa::ToSchema)]
pub struct FilePreviewResponse {
    #[schema(example = "TEM_1760870400.nxs")]
    pub file_name: String,
    /// Base64-encoded PNG images; empty when the container holds no image.
    pub image_data_list: Vec<String>,
}

impl From<Preview> for FilePreviewResponse {
    fn from(preview: Preview) -> Self {
        Self {
            file_name: preview.file_name,
            image_data_list: preview.images,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DownloadQuery {
    /// `true` to extract the embedded image as PNG instead of the raw file.
    pub image: Option<String>,
}

impl DownloadQuery {
    pub fn extract_image(&self) -> bool {
        self.image.as_deref() == Some("true")
    }
}

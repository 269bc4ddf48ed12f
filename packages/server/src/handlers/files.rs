use axum::Json;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use common::storage::ObjectKey;
use sha2::{Digest, Sha256};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::files::{DownloadQuery, FileListResponse, FilePreviewResponse};
use crate::pipeline::{Download, DownloadKind};
use crate::state::AppState;
use crate::utils::filename::attachment_disposition;

#[utoipa::path(
    get,
    path = "/list-files",
    tag = "Files",
    operation_id = "listFiles",
    summary = "List stored files",
    description = "Returns every key in the bucket, in the order the blob store reports them.",
    responses(
        (status = 200, description = "Stored files", body = FileListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 500, description = "Blob store failure (CREDENTIALS_ERROR, STORE_ERROR)", body = ErrorBody),
    ),
    security(("oidc" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_files(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<FileListResponse>, AppError> {
    let files = state.retrieve.list().await?;
    let total = files.len() as u64;
    Ok(Json(FileListResponse { files, total }))
}

#[utoipa::path(
    get,
    path = "/view-file/{key}",
    tag = "Files",
    operation_id = "viewFile",
    summary = "Preview a stored container",
    description = "Renders `NXentry/image_2d/data` as a base64 PNG. A container without that \
        entry yields an empty `image_data_list`.",
    params(("key" = String, Path, description = "Object key, e.g. `TEM_1760870400.nxs`")),
    responses(
        (status = 200, description = "Preview", body = FilePreviewResponse),
        (status = 400, description = "Invalid key (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 500, description = "Fetch or render failure (CREDENTIALS_ERROR, STORE_ERROR, PROCESSING_ERROR)", body = ErrorBody),
    ),
    security(("oidc" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn view_file(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<FilePreviewResponse>, AppError> {
    let key = parse_key(&key)?;
    let preview = state.retrieve.preview(&key).await?;
    Ok(Json(FilePreviewResponse::from(preview)))
}

#[utoipa::path(
    get,
    path = "/download-file/{key}",
    tag = "Files",
    operation_id = "downloadFile",
    summary = "Download a stored file",
    description = "Returns the stored bytes as an attachment. With `image=true` the container's \
        image is normalized and returned as `extracted_image.png` instead. \
        The `ETag` is the SHA-256 of the returned body.",
    params(
        ("key" = String, Path, description = "Object key"),
        DownloadQuery,
    ),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 400, description = "Invalid key (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Container has no image entry (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Fetch or render failure (CREDENTIALS_ERROR, STORE_ERROR, PROCESSING_ERROR)", body = ErrorBody),
    ),
    security(("oidc" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn download_file(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, AppError> {
    let key = parse_key(&key)?;
    let kind = if query.extract_image() {
        DownloadKind::ExtractedImage
    } else {
        DownloadKind::Raw
    };
    let download = state.retrieve.download(&key, kind).await?;
    download_response(download)
}

fn parse_key(raw: &str) -> Result<ObjectKey, AppError> {
    ObjectKey::parse(raw).map_err(|e| AppError::Validation(e.to_string()))
}

fn content_type(download: &Download) -> String {
    if download.kind == DownloadKind::ExtractedImage {
        return "image/png".into();
    }
    let extension = std::path::Path::new(&download.file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("nxs" | "h5" | "hdf5" | "nx5") => "application/x-hdf5".into(),
        _ => mime_guess::from_path(&download.file_name)
            .first_or_octet_stream()
            .to_string(),
    }
}

fn download_response(download: Download) -> Result<Response, AppError> {
    let etag = format!("\"{}\"", hex::encode(Sha256::digest(&download.bytes)));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type(&download))
        .header(header::CONTENT_LENGTH, download.bytes.len().to_string())
        .header(
            header::CONTENT_DISPOSITION,
            attachment_disposition(&download.file_name),
        )
        .header(header::ETAG, etag)
        .header(header::CACHE_CONTROL, "private, max-age=3600")
        .body(Body::from(download.bytes))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

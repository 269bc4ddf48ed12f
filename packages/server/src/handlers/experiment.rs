use axum::Json;
use axum::extract::State;
use axum::extract::multipart::Field;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{Datelike, Utc};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::multipart::AppMultipart;
use crate::models::experiment::{ExperimentCreated, NewExperimentForm};
use crate::pipeline::ingest::OTHER_MATERIAL;
use crate::pipeline::{ExperimentType, UploadRequest, UploadedImage};
use crate::state::AppState;

const MATERIALS: [&str; 4] = ["Suggestion 1", "Suggestion 2", "Suggestion 3", OTHER_MATERIAL];
const EXPERIMENT_TYPES: [&str; 3] = ["ED", "TVIPS", "TEM"];

#[utoipa::path(
    get,
    path = "/new-experiment",
    tag = "Experiments",
    operation_id = "newExperimentForm",
    summary = "Options for the new-experiment form",
    description = "Lists the mapping schema files, material suggestions and experiment types, \
        plus today's date and the default instrument location.",
    responses(
        (status = 200, description = "Form options", body = NewExperimentForm),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 500, description = "Schema directory unreadable (INTERNAL_ERROR)", body = ErrorBody),
    ),
    security(("oidc" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn new_experiment_form(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<NewExperimentForm>, AppError> {
    let schema_files = state.schemas.list().await.map_err(|e| {
        AppError::Internal(format!(
            "Failed to list schemas in {}: {e}",
            state.schemas.dir().display()
        ))
    })?;
    let today = Utc::now().date_naive();

    Ok(Json(NewExperimentForm {
        schema_files,
        materials: MATERIALS.to_vec(),
        experiment_types: EXPERIMENT_TYPES.to_vec(),
        default_date: today,
        current_year: today.year(),
        default_location: state.config.ingest.default_location.clone(),
    }))
}

#[utoipa::path(
    post,
    path = "/new-experiment",
    tag = "Experiments",
    operation_id = "createExperiment",
    summary = "Upload an experiment",
    description = "Converts the first file of the repeated `image_files` field into a NeXus \
        container carrying the form's metadata, and stores it as `TEM_<unix seconds>.nxs`. \
        Further image files are ignored. `ED` and `TVIPS` experiments use their own mapping \
        schema; any other type uses `schema_file_name`.",
    request_body(content_type = "multipart/form-data", description = "Experiment metadata and image files"),
    responses(
        (status = 201, description = "Experiment stored", body = ExperimentCreated),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 500, description = "Conversion or storage failure (CONVERSION_ERROR, CREDENTIALS_ERROR, STORE_ERROR)", body = ErrorBody),
    ),
    security(("oidc" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user = %auth_user.subject))]
pub async fn create_experiment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppMultipart(mut multipart): AppMultipart,
) -> Result<impl IntoResponse, AppError> {
    let mut request = UploadRequest::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        let slot = match name.as_str() {
            "image_files" => {
                let file_name = field.file_name().unwrap_or_default().to_owned();
                // Browsers send an empty part when no file was chosen.
                if file_name.is_empty() {
                    continue;
                }
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?;
                request.images.push(UploadedImage { file_name, data });
                continue;
            }
            "experiment_type" => {
                request.experiment_type = ExperimentType::parse(&read_text(field).await?);
                continue;
            }
            "operator_name" => &mut request.operator_name,
            "description" => &mut request.description,
            "material" => &mut request.material,
            "custom_material" => &mut request.custom_material,
            "hypothetical_composition" => &mut request.hypothetical_composition,
            "initial_composition" => &mut request.initial_composition,
            "final_composition" => &mut request.final_composition,
            "sample_identifier" => &mut request.sample_identifier,
            "preparation_date" => &mut request.preparation_date,
            "atom_types" => &mut request.atom_types,
            "instrument_name" => &mut request.instrument_name,
            "instrument_location" => &mut request.instrument_location,
            "schema_file_name" => &mut request.schema_file_name,
            _ => continue, // Ignore unknown fields.
        };
        *slot = read_text(field).await?;
    }

    let receipt = state.ingest.ingest(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ExperimentCreated {
            status: "success",
            filename: receipt.key.to_string(),
        }),
    ))
}

async fn read_text(field: Field<'_>) -> Result<String, AppError> {
    let name = field.name().unwrap_or_default().to_owned();
    let text = field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read '{name}': {e}")))?;
    if text.contains('\0') {
        return Err(AppError::Validation(format!("'{name}' contains a NUL character")));
    }
    Ok(text)
}

use axum::Json;
use tracing::instrument;

use crate::error::ErrorBody;
use crate::extractors::auth::AuthUser;
use crate::models::home::{HealthResponse, HomeLinks, HomeResponse, UserInfo};

#[utoipa::path(
    get,
    path = "/",
    tag = "Session",
    operation_id = "home",
    summary = "Signed-in user and entry points",
    responses(
        (status = 200, description = "Homepage", body = HomeResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("oidc" = [])),
)]
#[instrument(skip_all, fields(user = %auth_user.subject))]
pub async fn home(auth_user: AuthUser) -> Json<HomeResponse> {
    Json(HomeResponse {
        user: UserInfo {
            display_name: auth_user.display_name().to_owned(),
            subject: auth_user.subject,
            email: auth_user.email,
        },
        links: HomeLinks {
            new_experiment: "/files/new-experiment",
            list_files: "/files/list-files",
            logout: "/logout",
        },
    })
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Session",
    operation_id = "health",
    summary = "Liveness probe",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

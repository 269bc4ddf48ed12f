use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tracing::{info, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{ID_TOKEN_COOKIE, presented_token};
use crate::state::AppState;
use crate::utils::id_token::logout_url;

#[utoipa::path(
    get,
    path = "/logout",
    tag = "Session",
    operation_id = "logout",
    summary = "Sign out",
    description = "Clears the `id_token` cookie and redirects (303) to the identity provider's \
        end-session endpoint with `id_token_hint` and `post_logout_redirect_uri`. \
        The token is passed through unverified so expired sessions can still sign out.",
    responses(
        (status = 303, description = "Redirect to the identity provider"),
        (status = 500, description = "Misconfigured logout endpoint (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let token = presented_token(&headers);
    let auth = &state.config.auth;
    let target = logout_url(
        &auth.logout_endpoint,
        token.as_deref(),
        &auth.logout_redirect_url,
    )
    .map_err(|e| AppError::Internal(format!("Invalid logout endpoint: {e}")))?;

    info!(had_token = token.is_some(), "Signing out");
    let jar = jar.remove(Cookie::build(ID_TOKEN_COOKIE).path("/"));
    Ok((jar, Redirect::to(target.as_str())))
}

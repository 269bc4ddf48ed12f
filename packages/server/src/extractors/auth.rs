use axum::http::HeaderMap;
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;

use crate::error::AppError;
use crate::state::AppState;

/// Cookie holding the raw ID token issued at login.
pub const ID_TOKEN_COOKIE: &str = "id_token";

/// Authenticated user extracted from the OIDC ID token, presented either as
/// `Authorization: Bearer <token>` or as the `id_token` cookie.
///
/// Add this as a handler parameter to require authentication.
pub struct AuthUser {
    pub subject: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl AuthUser {
    /// Best display name the token carries.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.subject)
    }
}

/// The ID token the client presented, without verifying it.
pub fn presented_token(headers: &HeaderMap) -> Option<String> {
    if let Some(bearer) = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        return Some(bearer.to_owned());
    }
    CookieJar::from_headers(headers)
        .get(ID_TOKEN_COOKIE)
        .map(|c| c.value().to_owned())
        .filter(|v| !v.is_empty())
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(header) = parts.headers.get("Authorization")
            && !header.to_str().is_ok_and(|v| v.starts_with("Bearer "))
        {
            return Err(AppError::TokenInvalid);
        }

        let token = presented_token(&parts.headers).ok_or(AppError::TokenMissing)?;

        let claims = state.verifier.verify(&token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected ID token");
            AppError::TokenInvalid
        })?;

        Ok(AuthUser {
            name: claims.name.or(claims.preferred_username),
            email: claims.email,
            subject: claims.sub,
        })
    }
}

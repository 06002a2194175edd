//! HTTP glue between axum and the controllers: bearer authentication, JSON
//! body rejections and the mapping from [`ErrorCode`] to a status.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequestParts},
    http::{header, request::Parts, HeaderMap, StatusCode},
    Json,
};
use server_api::{authenticate, Principal};
use shared::error::{ApiError, ErrorCode};
use tracing::warn;

use crate::app_state::AppState;

pub(crate) type HttpError = (StatusCode, Json<ApiError>);

pub(crate) fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn http_error(err: ApiError) -> HttpError {
    if err.code == ErrorCode::Internal {
        warn!(message = %err.message, "request failed");
    }
    (status_for(err.code), Json(err))
}

/// Unwraps a JSON body, reporting malformed payloads in the usual error
/// envelope with a 400 instead of axum's plain-text rejection. Oversized
/// bodies keep their 413.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, HttpError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        let status = match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        };
        (
            status,
            Json(ApiError::new(ErrorCode::Validation, rejection.body_text())),
        )
    })
}

/// Returns the token from an `Authorization: Bearer <token>` header. The
/// scheme is matched case-insensitively.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// The caller of an authenticated route.
pub(crate) struct AuthenticatedUser(pub(crate) Principal);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthenticatedUser {
    type Rejection = HttpError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or_else(|| {
            http_error(ApiError::new(
                ErrorCode::Unauthorized,
                "a bearer token is required",
            ))
        })?;
        let principal = authenticate(&state.api, token).await.map_err(http_error)?;
        Ok(Self(principal))
    }
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;

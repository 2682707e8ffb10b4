//! Bearer-token gate for admin endpoints.

use crate::{error::HttpError, AppError, AppState};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

/// Extract the credential from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

fn secure_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Reject requests whose bearer token does not match `API_TOKEN`.
///
/// When no token is configured every request passes.
pub async fn require_bearer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, HttpError> {
    if let Some(expected) = state.config.api_token.as_deref() {
        match bearer_token(request.headers()) {
            Some(token) if secure_compare(token, expected) => {}
            Some(_) => {
                tracing::warn!(path = %request.uri().path(), "rejected invalid bearer token");
                return Err(AppError::Unauthorized("Invalid token".to_string()).into());
            }
            None => {
                return Err(AppError::Unauthorized("Missing bearer token".to_string()).into());
            }
        }
    }
    Ok(next.run(request).await)
}

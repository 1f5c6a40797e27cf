use crate::error::ServiceError;
use crate::handlers::auth::verify_jwt_token;
use crate::models::auth::Claims;
use crate::AppState;
use axum::{
    extract::{Extension, Request},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Resolves the bearer token into [`Claims`] and stores them in the request
/// extensions so handlers can read the acting user.
pub async fn auth_middleware(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ServiceError::Unauthorized("Missing Authorization header".to_string()))?;

    let auth_str = auth_header.to_str().map_err(|_| {
        ServiceError::Unauthorized("Invalid Authorization header format".to_string())
    })?;

    let token = auth_str.strip_prefix("Bearer ").ok_or_else(|| {
        ServiceError::Unauthorized(
            "Invalid Authorization header format. Expected 'Bearer <token>'".to_string(),
        )
    })?;

    let claims = verify_jwt_token(token, &state.config.jwt_secret).map_err(|e| {
        tracing::warn!("JWT verification failed: {}", e);
        ServiceError::Unauthorized("Invalid or expired token".to_string())
    })?;

    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// Numeric id of the acting user behind the token.
pub fn acting_user_id(claims: &Claims) -> Result<i32, ServiceError> {
    claims
        .user_id()
        .ok_or_else(|| ServiceError::Unauthorized("Token subject is not a user id".to_string()))
}

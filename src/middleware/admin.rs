use crate::error::ServiceError;
use crate::models::auth::Claims;
use axum::{extract::Request, middleware::Next, response::Response};

/// Lets only `admin` roles through. Must run after [`super::auth::auth_middleware`].
pub async fn admin_middleware(request: Request, next: Next) -> Result<Response, ServiceError> {
    match request.extensions().get::<Claims>() {
        Some(claims) if claims.is_admin() => Ok(next.run(request).await),
        Some(claims) => {
            tracing::warn!(username = %claims.username, role = %claims.role, "admin access denied");
            Err(ServiceError::Forbidden("Admin access required.".to_string()))
        }
        None => Err(ServiceError::Unauthorized(
            "Authentication required for admin access.".to_string(),
        )),
    }
}

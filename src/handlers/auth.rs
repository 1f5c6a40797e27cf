use crate::error::ServiceError;
use crate::middleware::auth::{acting_user_id, auth_middleware};
use crate::models::auth::*;
use crate::store::UserStore;
use crate::AppState;
use axum::{
    extract::Extension,
    response::Json,
    routing::{get, post},
    Router,
};
use bcrypt::verify;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use axum_extra::extract::WithRejection;
use std::sync::Arc;

pub fn auth_routes() -> Router {
    let public_routes = Router::new().route("/api/auth/login", post(login));

    let protected_routes = Router::new()
        .route("/api/auth/verify", get(verify_token))
        .layer(axum::middleware::from_fn(auth_middleware));

    public_routes.merge(protected_routes)
}

async fn login(
    Extension(state): Extension<Arc<AppState>>,
    WithRejection(Json(payload), _): WithRejection<Json<LoginRequest>, ServiceError>,
) -> Result<Json<AuthResponse>, ServiceError> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(ServiceError::MalformedInput(
            "Username and password required".to_string(),
        ));
    }

    let user = state
        .store
        .find_user_by_username(&payload.username)
        .await?
        .ok_or_else(|| ServiceError::Unauthorized("Invalid credentials".to_string()))?;

    match verify(&payload.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            tracing::warn!(username = %payload.username, "login rejected");
            return Err(ServiceError::Unauthorized("Invalid credentials".to_string()));
        }
        Err(e) => {
            // Malformed or empty stored hash: the account cannot log in.
            tracing::error!(user_id = user.id, "Error verifying password: {}", e);
            return Err(ServiceError::Unauthorized("Invalid credentials".to_string()));
        }
    }

    let token = generate_jwt_token(&user, &state.config.jwt_secret, state.config.jwt_ttl_hours)
        .map_err(|e| ServiceError::Internal(format!("Error generating JWT token: {}", e)))?;

    tracing::info!(user_id = user.id, role = %user.role, "user logged in");

    Ok(Json(AuthResponse {
        success: true,
        message: "Login successful".to_string(),
        user: UserResponse::from(user),
        token,
    }))
}

async fn verify_token(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let user_id = acting_user_id(&claims)?;

    let user = state
        .store
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| ServiceError::Unauthorized("User not found".to_string()))?;

    Ok(Json(serde_json::json!({
        "success": true,
        "user": UserResponse::from(user)
    })))
}

pub fn generate_jwt_token(
    user: &User,
    secret: &str,
    ttl_hours: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let expiration = now + Duration::hours(ttl_hours);

    let claims = Claims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        role: user.role.clone(),
        exp: expiration.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
}

pub fn verify_jwt_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

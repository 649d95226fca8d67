use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use rand::RngCore;
use serde::Deserialize;
use tracing::info;

use super::{ApiError, ApiResponse, LoginResponse, PasswordResetResponse, UserDto};
use crate::auth::decode_token;
use crate::domain::access::Actor;
use crate::entities::users;
use crate::state::AppState;

/// Authenticated caller, inserted by [`auth_middleware`].
#[derive(Clone)]
pub struct CurrentUser(pub users::Model);

impl CurrentUser {
    #[must_use]
    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.0.id,
            role: self.0.role,
            employment_status: self.0.employment_status,
        }
    }
}

pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Missing authorization header"))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::unauthorized("Invalid authorization header"))?;

    let claims = decode_token(token, &state.config.security)
        .map_err(|_| ApiError::unauthorized("Invalid credentials"))?;
    let user_id = claims
        .user_id()
        .map_err(|_| ApiError::unauthorized("Invalid credentials"))?;

    let user = state
        .store
        .users()
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if !user.is_active {
        return Err(ApiError::forbidden("User is inactive"));
    }

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let user = state
        .store
        .users()
        .verify_credentials(&payload.email, &payload.password)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if !user.is_active {
        return Err(ApiError::forbidden("User is inactive"));
    }

    let token = crate::auth::issue_token(user.id, user.role, &state.config.security)?;
    info!(user_id = user.id, "user logged in");

    Ok(Json(ApiResponse::success(LoginResponse {
        access_token: token,
        token_type: "bearer",
    })))
}

pub async fn me(
    Extension(current): Extension<CurrentUser>,
) -> Json<ApiResponse<UserDto>> {
    Json(ApiResponse::success(current.0.into()))
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

fn random_reset_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Always answers 200 so the endpoint cannot be used to probe for accounts.
/// Outside production the token rides back in the response for local testing.
pub async fn request_password_reset(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PasswordResetRequest>,
) -> Result<Json<ApiResponse<PasswordResetResponse>>, ApiError> {
    let mut reset_token = None;

    if let Some(user) = state.store.users().get_by_email(&payload.email).await? {
        if user.is_active {
            let token = random_reset_token();
            let expires_at = Utc::now()
                + Duration::minutes(state.config.security.password_reset_expire_minutes);
            state
                .store
                .password_resets()
                .create(user.id, &token, expires_at)
                .await?;

            if state.config.server.environment != "production" {
                reset_token = Some(token);
            }
        }
    }

    Ok(Json(ApiResponse::success(PasswordResetResponse {
        message: "If the account exists, a reset token has been generated.",
        reset_token,
    })))
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetConfirm {
    pub token: String,
    pub new_password: String,
}

pub async fn confirm_password_reset(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PasswordResetConfirm>,
) -> Result<Json<ApiResponse<PasswordResetResponse>>, ApiError> {
    let record = state
        .store
        .password_resets()
        .get_by_token(&payload.token)
        .await?
        .ok_or_else(|| ApiError::validation("Invalid or expired reset token"))?;

    if record.used_at.is_some() {
        return Err(ApiError::validation("Reset token has already been used"));
    }
    if record.expires_at < Utc::now() {
        return Err(ApiError::validation("Reset token has expired"));
    }

    let user = state
        .store
        .users()
        .get_by_id(record.user_id)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(|| ApiError::forbidden("User is inactive"))?;

    state
        .store
        .users()
        .set_password(user, &payload.new_password, &state.config.security)
        .await?;
    state.store.password_resets().mark_used(record).await?;

    Ok(Json(ApiResponse::success(PasswordResetResponse {
        message: "Password updated successfully.",
        reset_token: None,
    })))
}

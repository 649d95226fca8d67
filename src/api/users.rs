use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use tracing::info;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, UserDto};
use crate::db::repositories::user::{ContactUpdate, UserProfile};
use crate::domain::access::{Action, authorize};
use crate::domain::{EmploymentStatus, Role};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub legal_first_name: String,
    pub legal_last_name: String,
    #[serde(default)]
    pub preferred_name: Option<String>,
    pub job_title: String,
    pub department: String,
    pub hire_date: NaiveDate,
    #[serde(default)]
    pub phone: Option<String>,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,
    pub emergency_contact_relationship: String,
    pub role: Role,
    pub employment_status: EmploymentStatus,
}

impl CreateUserRequest {
    fn into_profile(self) -> (UserProfile, String) {
        let password = self.password;
        let profile = UserProfile {
            email: self.email,
            legal_first_name: self.legal_first_name,
            legal_last_name: self.legal_last_name,
            preferred_name: self.preferred_name,
            job_title: self.job_title,
            department: self.department,
            hire_date: self.hire_date,
            phone: self.phone,
            address_line1: self.address_line1,
            address_line2: self.address_line2,
            city: self.city,
            state: self.state,
            postal_code: self.postal_code,
            country: self.country,
            emergency_contact_name: self.emergency_contact_name,
            emergency_contact_phone: self.emergency_contact_phone,
            emergency_contact_relationship: self.emergency_contact_relationship,
            role: self.role,
            employment_status: self.employment_status,
        };
        (profile, password)
    }
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), ApiError> {
    authorize(&current.actor(), None, Action::Write)?;

    if state
        .store
        .users()
        .get_by_email(&payload.email)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("Email already exists".to_string()));
    }

    let (profile, password) = payload.into_profile();
    let user = state
        .store
        .users()
        .create(profile, &password, &state.config.security)
        .await?;

    info!(user_id = user.id, "user created");
    Ok((StatusCode::CREATED, Json(ApiResponse::success(user.into()))))
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ApiError> {
    authorize(&current.actor(), None, Action::Read)?;

    let users = state.store.users().list().await?;
    Ok(Json(ApiResponse::success(
        users.into_iter().map(UserDto::from).collect(),
    )))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(user_id): Path<i32>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    authorize(&current.actor(), None, Action::Read)?;

    let user = state
        .store
        .users()
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", user_id))?;

    Ok(Json(ApiResponse::success(user.into())))
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(flatten)]
    pub profile: CreateUserProfileFields,
    pub is_active: bool,
}

/// Profile fields without a password, reused by the full update.
#[derive(Debug, Deserialize)]
pub struct CreateUserProfileFields {
    pub email: String,
    pub legal_first_name: String,
    pub legal_last_name: String,
    #[serde(default)]
    pub preferred_name: Option<String>,
    pub job_title: String,
    pub department: String,
    pub hire_date: NaiveDate,
    #[serde(default)]
    pub phone: Option<String>,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,
    pub emergency_contact_relationship: String,
    pub role: Role,
    pub employment_status: EmploymentStatus,
}

impl From<CreateUserProfileFields> for UserProfile {
    fn from(fields: CreateUserProfileFields) -> Self {
        Self {
            email: fields.email,
            legal_first_name: fields.legal_first_name,
            legal_last_name: fields.legal_last_name,
            preferred_name: fields.preferred_name,
            job_title: fields.job_title,
            department: fields.department,
            hire_date: fields.hire_date,
            phone: fields.phone,
            address_line1: fields.address_line1,
            address_line2: fields.address_line2,
            city: fields.city,
            state: fields.state,
            postal_code: fields.postal_code,
            country: fields.country,
            emergency_contact_name: fields.emergency_contact_name,
            emergency_contact_phone: fields.emergency_contact_phone,
            emergency_contact_relationship: fields.emergency_contact_relationship,
            role: fields.role,
            employment_status: fields.employment_status,
        }
    }
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(user_id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    authorize(&current.actor(), None, Action::Write)?;

    let user = state
        .store
        .users()
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", user_id))?;

    // Admins cannot lock themselves out.
    if user.id == current.0.id {
        if payload.profile.role != current.0.role {
            return Err(ApiError::validation("Cannot change your own role"));
        }
        if !payload.is_active {
            return Err(ApiError::validation("Cannot deactivate your own account"));
        }
    }

    if payload.profile.email != user.email
        && state
            .store
            .users()
            .get_by_email(&payload.profile.email)
            .await?
            .is_some()
    {
        return Err(ApiError::Conflict("Email already exists".to_string()));
    }

    let updated = state
        .store
        .users()
        .update_profile(user, payload.profile.into(), payload.is_active)
        .await?;

    Ok(Json(ApiResponse::success(updated.into())))
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Self-service contact update. Absent fields are untouched; explicit nulls
/// clear nullable fields.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateContactRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub preferred_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default)]
    pub address_line1: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub address_line2: Option<Option<String>>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub emergency_contact_name: Option<String>,
    #[serde(default)]
    pub emergency_contact_phone: Option<String>,
    #[serde(default)]
    pub emergency_contact_relationship: Option<String>,
}

pub async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<UpdateContactRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    authorize(&current.actor(), Some(current.0.id), Action::Write)?;

    let update = ContactUpdate {
        preferred_name: payload.preferred_name,
        phone: payload.phone,
        address_line1: payload.address_line1,
        address_line2: payload.address_line2,
        city: payload.city,
        state: payload.state,
        postal_code: payload.postal_code,
        country: payload.country,
        emergency_contact_name: payload.emergency_contact_name,
        emergency_contact_phone: payload.emergency_contact_phone,
        emergency_contact_relationship: payload.emergency_contact_relationship,
    };

    let updated = state
        .store
        .users()
        .update_contact(current.0.clone(), update)
        .await?;

    Ok(Json(ApiResponse::success(updated.into())))
}

#[derive(Debug, Deserialize)]
pub struct SetPasswordRequest {
    pub new_password: String,
}

pub async fn set_user_password(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(user_id): Path<i32>,
    Json(payload): Json<SetPasswordRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    authorize(&current.actor(), None, Action::Write)?;

    let user = state
        .store
        .users()
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", user_id))?;

    state
        .store
        .users()
        .set_password(user, &payload.new_password, &state.config.security)
        .await?;

    info!(user_id, "password set by admin");
    Ok(Json(ApiResponse::success(())))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(user_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    authorize(&current.actor(), None, Action::Write)?;

    if current.0.id == user_id {
        return Err(ApiError::validation("Cannot delete your own account"));
    }

    state
        .store
        .users()
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", user_id))?;

    state.store.users().delete(user_id).await?;
    info!(user_id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

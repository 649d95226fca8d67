use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use chrono::{NaiveDate, Utc};
use rand::RngCore;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, PaystubListResponse, PaystubSummary, pdf_response};
use crate::blob;
use crate::db::repositories::paystub::NewPaystub;
use crate::domain::Role;
use crate::domain::access::{Action, authorize, authorize_owner_only};
use crate::entities::paystubs;
use crate::pdf::paystub::render_stored;
use crate::state::AppState;

/// Display name for rows uploaded without one. Unlike generation-time names,
/// hyphens in the surname survive.
fn fallback_file_name(prefix: &str, last_name: &str, pay_date: NaiveDate) -> String {
    let surname: String = last_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect::<String>()
        .to_uppercase();
    let surname = if surname.is_empty() {
        "EMPLOYEE".to_string()
    } else {
        surname
    };
    format!(
        "{prefix}_PAYSTUB_{surname}_{}.pdf",
        pay_date.format("%Y%m%d")
    )
}

fn display_file_name(paystub: &paystubs::Model, prefix: &str) -> String {
    paystub.file_name.clone().unwrap_or_else(|| {
        fallback_file_name(prefix, &paystub.employee_last_name, paystub.pay_date)
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct ListPaystubsParams {
    pub year: Option<i32>,
    pub user_id: Option<i32>,
}

pub async fn list_paystubs(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<ListPaystubsParams>,
) -> Result<Json<ApiResponse<PaystubListResponse>>, ApiError> {
    let target_user_id = match params.user_id {
        Some(other) if other != current.0.id => {
            if current.0.role != Role::Admin {
                return Err(ApiError::forbidden("Access denied"));
            }
            other
        }
        _ => current.0.id,
    };

    let paystubs = state
        .store
        .paystubs()
        .list_for_user(target_user_id, params.year)
        .await?;
    let available_years = state.store.paystubs().available_years(target_user_id).await?;

    if !paystubs.is_empty() {
        let ids: Vec<i32> = paystubs.iter().map(|p| p.id).collect();
        state
            .store
            .audit()
            .log_paystub_events("paystub_access", current.0.id, &ids, json!({"via": "list"}))
            .await?;
    }

    let prefix = &state.config.branding.filename_prefix;
    let items = paystubs
        .iter()
        .map(|p| PaystubSummary {
            id: p.id,
            pay_date: p.pay_date,
            pay_period_start: p.pay_period_start,
            pay_period_end: p.pay_period_end,
            file_name: display_file_name(p, prefix),
        })
        .collect();

    Ok(Json(ApiResponse::success(PaystubListResponse {
        items,
        available_years,
    })))
}

/// Paystub PDFs are strictly owner-only; admins manage the rows but do not
/// read other people's stubs.
pub async fn get_paystub_pdf(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(paystub_id): Path<i32>,
) -> Result<Response, ApiError> {
    let paystub = state
        .store
        .paystubs()
        .get_by_id(paystub_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Paystub", paystub_id))?;

    authorize_owner_only(&current.actor(), paystub.user_id)?;

    let bytes = if let Some(key) = &paystub.s3_key {
        let blob = state.blob.as_ref().ok_or_else(|| {
            ApiError::ConfigurationError("Blob storage is not configured".to_string())
        })?;
        blob.download(key)
            .await?
            .ok_or_else(|| ApiError::NotFound("Paystub file not found".to_string()))?
    } else {
        render_stored(&paystub, &state.config.branding, Utc::now())?.bytes
    };

    state
        .store
        .audit()
        .log_paystub_event(
            "paystub_generation",
            current.0.id,
            paystub.id,
            json!({"format": "pdf"}),
        )
        .await?;

    let filename = display_file_name(&paystub, &state.config.branding.filename_prefix);
    Ok(pdf_response(bytes, &filename))
}

#[derive(Debug, Deserialize)]
pub struct UploadPaystubRequest {
    pub user_id: i32,
    pub pay_period_start: NaiveDate,
    pub pay_period_end: NaiveDate,
    pub pay_date: NaiveDate,
    #[serde(default)]
    pub earnings: Option<serde_json::Value>,
    #[serde(default)]
    pub deductions: Option<serde_json::Value>,
    pub gross_pay: Decimal,
    pub total_deductions: Decimal,
    pub net_pay: Decimal,
    #[serde(default)]
    pub file_name: Option<String>,
    /// Base64-encoded PDF. When present the bytes go to blob storage and the
    /// row is served from there instead of being re-rendered.
    #[serde(default)]
    pub content_base64: Option<String>,
}

fn upload_suffix() -> String {
    let mut bytes = [0u8; 6];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub async fn upload_paystub(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<UploadPaystubRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PaystubSummary>>), ApiError> {
    authorize(&current.actor(), None, Action::Write)?;

    let user = state
        .store
        .users()
        .get_by_id(payload.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Employee not found".to_string()))?;

    let s3_key = if let Some(encoded) = &payload.content_base64 {
        let blob = state.blob.as_ref().ok_or_else(|| {
            ApiError::ConfigurationError("Blob storage is not configured".to_string())
        })?;
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|_| ApiError::validation("content_base64 is not valid base64"))?;

        let key = blob::paystub_key(
            user.id,
            payload.pay_date,
            &format!("upload-{}", upload_suffix()),
        );
        let metadata = std::collections::HashMap::from([
            ("employee_id".to_string(), user.id.to_string()),
            (
                "pay_date".to_string(),
                payload.pay_date.format("%Y-%m-%d").to_string(),
            ),
        ]);
        blob.upload(&key, bytes, "application/pdf", metadata).await?;
        Some(key)
    } else {
        None
    };

    let paystub = state
        .store
        .paystubs()
        .create(NewPaystub {
            user_id: user.id,
            employee_first_name: user.legal_first_name.clone(),
            employee_last_name: user.legal_last_name.clone(),
            pay_period_start: payload.pay_period_start,
            pay_period_end: payload.pay_period_end,
            pay_date: payload.pay_date,
            earnings: payload.earnings.unwrap_or_else(|| json!([])),
            deductions: payload.deductions.unwrap_or_else(|| json!([])),
            gross_pay: payload.gross_pay,
            total_deductions: payload.total_deductions,
            net_pay: payload.net_pay,
            file_name: payload.file_name,
            s3_key,
        })
        .await?;

    info!(paystub_id = paystub.id, user_id = user.id, "paystub uploaded");

    let summary = PaystubSummary {
        id: paystub.id,
        pay_date: paystub.pay_date,
        pay_period_start: paystub.pay_period_start,
        pay_period_end: paystub.pay_period_end,
        file_name: display_file_name(&paystub, &state.config.branding.filename_prefix),
    };
    Ok((StatusCode::CREATED, Json(ApiResponse::success(summary))))
}

pub async fn delete_paystub(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(paystub_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    authorize(&current.actor(), None, Action::Write)?;

    let paystub = state
        .store
        .paystubs()
        .get_by_id(paystub_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Paystub", paystub_id))?;

    if let Some(key) = &paystub.s3_key {
        let blob = state.blob.as_ref().ok_or_else(|| {
            ApiError::ConfigurationError("Blob storage is not configured".to_string())
        })?;
        blob.delete(key).await?;
    }

    state.store.paystubs().delete(paystub.id).await?;
    info!(paystub_id, "paystub deleted");
    Ok(StatusCode::NO_CONTENT)
}

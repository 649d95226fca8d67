use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, VerificationRequestDto, pdf_response};
use crate::blob;
use crate::db::repositories::verification::{GenerationStamp, NewVerificationRequest};
use crate::domain::Role;
use crate::domain::access::{Action, authorize};
use crate::domain::verification::{VerificationAction, letter_available, transition};
use crate::entities::{users, verification_requests};
use crate::pdf::verification::{LetterInput, build_letter_filename, render_letter};
use crate::state::AppState;

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

async fn get_request_checked(
    state: &AppState,
    request_id: i32,
    current: &CurrentUser,
) -> Result<verification_requests::Model, ApiError> {
    let request = state
        .store
        .verifications()
        .get_by_id(request_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Verification request", request_id))?;

    if current.0.role != Role::Admin && request.employee_id != current.0.id {
        return Err(ApiError::forbidden("Access denied"));
    }
    Ok(request)
}

#[derive(Debug, Deserialize)]
pub struct CreateVerificationRequest {
    pub verifier_name: String,
    #[serde(default)]
    pub verifier_company: Option<String>,
    #[serde(default)]
    pub verifier_email: Option<String>,
    pub purpose: String,
    #[serde(default)]
    pub include_salary: bool,
    #[serde(default)]
    pub consent: bool,
}

/// Employees open requests on their own behalf; admins act on them but never
/// open them.
pub async fn create_verification_request(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<CreateVerificationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<VerificationRequestDto>>), ApiError> {
    if current.0.role == Role::Admin {
        return Err(ApiError::forbidden(
            "Only employees can create verification requests",
        ));
    }
    authorize(&current.actor(), Some(current.0.id), Action::Write)?;

    if !payload.consent {
        return Err(ApiError::validation("Consent is required"));
    }

    let request = state
        .store
        .verifications()
        .create(NewVerificationRequest {
            employee_id: current.0.id,
            verifier_name: payload.verifier_name,
            verifier_company: trimmed(payload.verifier_company),
            verifier_email: trimmed(payload.verifier_email),
            purpose: payload.purpose,
            include_salary: payload.include_salary,
            consent: payload.consent,
        })
        .await?;

    state
        .store
        .audit()
        .log_verification_event(
            "verification_request_created",
            current.0.id,
            request.id,
            json!({
                "include_salary": request.include_salary,
                "verifier_email": request.verifier_email,
            }),
        )
        .await?;

    info!(request_id = request.id, "verification request created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(VerificationRequestDto::from_model(
            request,
            Some(&current.0),
        ))),
    ))
}

pub async fn list_verification_requests(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<VerificationRequestDto>>>, ApiError> {
    let scope = if current.0.role == Role::Admin {
        None
    } else {
        Some(current.0.id)
    };
    let requests = state.store.verifications().list(scope).await?;

    if !requests.is_empty() {
        let ids: Vec<i32> = requests.iter().map(|r| r.id).collect();
        state
            .store
            .audit()
            .log_verification_events(
                "verification_request_access",
                current.0.id,
                &ids,
                json!({"via": "list"}),
            )
            .await?;
    }

    // Admin rows carry an employee summary; cache lookups across rows.
    let mut employees: HashMap<i32, Option<users::Model>> = HashMap::new();
    let mut dtos = Vec::with_capacity(requests.len());
    for request in requests {
        let employee = match employees.entry(request.employee_id) {
            std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
            std::collections::hash_map::Entry::Vacant(entry) => {
                let user = state.store.users().get_by_id(request.employee_id).await?;
                entry.insert(user)
            }
        };
        dtos.push(VerificationRequestDto::from_model(
            request,
            employee.as_ref(),
        ));
    }

    Ok(Json(ApiResponse::success(dtos)))
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateLetterRequest {
    #[serde(default)]
    pub salary_amount: Option<Decimal>,
}

pub async fn generate_letter(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(request_id): Path<i32>,
    Json(payload): Json<GenerateLetterRequest>,
) -> Result<Response, ApiError> {
    authorize(&current.actor(), None, Action::Write)?;

    let request = get_request_checked(&state, request_id, &current).await?;
    transition(request.status, VerificationAction::Generate)?;

    // The salary figure is admin-entered at generation time, but only when
    // the employee asked for it to appear.
    let salary_amount = if request.include_salary {
        match payload.salary_amount {
            Some(amount) if amount > Decimal::ZERO => Some(amount),
            _ => {
                return Err(ApiError::validation(
                    "Salary amount is required for this request",
                ));
            }
        }
    } else {
        if payload.salary_amount.is_some() {
            return Err(ApiError::validation(
                "Salary amount not permitted without employee request",
            ));
        }
        None
    };

    let employee = state
        .store
        .users()
        .get_by_id(request.employee_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Employee not found".to_string()))?;

    let blob_store = state.blob.as_ref().ok_or_else(|| {
        ApiError::ConfigurationError("Blob storage is not configured".to_string())
    })?;

    let tz: chrono_tz::Tz = state
        .config
        .branding
        .time_zone
        .parse()
        .map_err(|_| ApiError::internal("Invalid time zone configured"))?;
    let generated_at = Utc::now();
    let local = generated_at.with_timezone(&tz);
    let generated_on = local.date_naive();

    let employee_name = format!(
        "{} {}",
        employee.legal_first_name, employee.legal_last_name
    );
    let input = LetterInput {
        employee_name: &employee_name,
        job_title: &employee.job_title,
        employment_status: employee.employment_status,
        hire_date: employee.hire_date,
        include_salary: request.include_salary,
        salary_amount,
        generated_at: local,
        request_id: request.id,
        employee_id: employee.id,
    };
    let rendered = render_letter(&input, &state.config.branding, &state.config.verification)?;

    let filename = build_letter_filename(
        &state.config.branding.filename_prefix,
        &employee.legal_last_name,
        generated_on,
    );
    let key = blob::verification_key(employee.id, generated_on, request.id);

    let metadata = HashMap::from([
        ("request_id".to_string(), request.id.to_string()),
        ("employee_id".to_string(), employee.id.to_string()),
        (
            "verifier_email".to_string(),
            request.verifier_email.clone().unwrap_or_default(),
        ),
        ("generated_at".to_string(), generated_at.to_rfc3339()),
    ]);
    blob_store
        .upload(&key, rendered.bytes.clone(), "application/pdf", metadata)
        .await?;

    let request = state
        .store
        .verifications()
        .mark_generated(
            request,
            GenerationStamp {
                generated_by_user_id: current.0.id,
                generated_at,
                salary_amount,
                file_name: filename.clone(),
                s3_key: key,
            },
        )
        .await?;

    state
        .store
        .audit()
        .log_verification_event(
            "verification_generation",
            current.0.id,
            request.id,
            json!({
                "include_salary": request.include_salary,
                "generated_at": generated_at,
            }),
        )
        .await?;

    info!(request_id = request.id, "verification letter generated");
    Ok(pdf_response(rendered.bytes, &filename))
}

#[derive(Debug, Default, Deserialize)]
pub struct MarkSentRequest {
    #[serde(default)]
    pub sent_note: Option<String>,
}

pub async fn mark_sent(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(request_id): Path<i32>,
    Json(payload): Json<MarkSentRequest>,
) -> Result<Json<ApiResponse<VerificationRequestDto>>, ApiError> {
    authorize(&current.actor(), None, Action::Write)?;

    let request = get_request_checked(&state, request_id, &current).await?;
    transition(request.status, VerificationAction::MarkSent)?;

    let sent_note = trimmed(payload.sent_note);
    let request = state
        .store
        .verifications()
        .mark_sent(request, current.0.id, sent_note.clone())
        .await?;

    state
        .store
        .audit()
        .log_verification_event(
            "verification_sent",
            current.0.id,
            request.id,
            json!({
                "verifier_email": request.verifier_email,
                "sent_note": sent_note,
            }),
        )
        .await?;

    let employee = state.store.users().get_by_id(request.employee_id).await?;
    Ok(Json(ApiResponse::success(
        VerificationRequestDto::from_model(request, employee.as_ref()),
    )))
}

#[derive(Debug, Default, Deserialize)]
pub struct DeclineRequest {
    #[serde(default)]
    pub decline_reason: Option<String>,
}

pub async fn decline_request(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(request_id): Path<i32>,
    Json(payload): Json<DeclineRequest>,
) -> Result<Json<ApiResponse<VerificationRequestDto>>, ApiError> {
    authorize(&current.actor(), None, Action::Write)?;

    let request = get_request_checked(&state, request_id, &current).await?;
    transition(request.status, VerificationAction::Decline)?;

    let decline_reason = trimmed(payload.decline_reason);
    let request = state
        .store
        .verifications()
        .mark_declined(request, current.0.id, decline_reason.clone())
        .await?;

    state
        .store
        .audit()
        .log_verification_event(
            "verification_declined",
            current.0.id,
            request.id,
            json!({"decline_reason": decline_reason}),
        )
        .await?;

    let employee = state.store.users().get_by_id(request.employee_id).await?;
    Ok(Json(ApiResponse::success(
        VerificationRequestDto::from_model(request, employee.as_ref()),
    )))
}

/// Downloads the stored letter. Available to the requesting employee and to
/// admins, only once a letter exists.
pub async fn get_letter_pdf(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(request_id): Path<i32>,
) -> Result<Response, ApiError> {
    let request = get_request_checked(&state, request_id, &current).await?;

    let key = match (&request.s3_key, letter_available(request.status)) {
        (Some(key), true) => key,
        _ => return Err(ApiError::NotFound("Letter not available".to_string())),
    };

    let blob_store = state.blob.as_ref().ok_or_else(|| {
        ApiError::ConfigurationError("Blob storage is not configured".to_string())
    })?;
    let bytes = blob_store
        .download(key)
        .await?
        .ok_or_else(|| ApiError::NotFound("Letter not available".to_string()))?;

    state
        .store
        .audit()
        .log_verification_event(
            "verification_download",
            current.0.id,
            request.id,
            json!({"status": request.status.as_str()}),
        )
        .await?;

    let filename = request
        .file_name
        .clone()
        .unwrap_or_else(|| "employment_verification.pdf".to_string());
    Ok(pdf_response(bytes, &filename))
}

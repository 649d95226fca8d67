use std::collections::HashMap;
use std::sync::Arc;

use axum::{Extension, Json, extract::State, response::Response};
use serde_json::json;
use tracing::info;

use super::auth::CurrentUser;
use super::{ApiError, pdf_response};
use crate::blob;
use crate::db::Store;
use crate::db::repositories::paystub::NewPaystub;
use crate::domain::access::{Action, authorize};
use crate::entities::users;
use crate::pdf::paystub::{PaystubStatement, build_paystub_filename, render_statement};
use crate::state::AppState;

/// Maps a payroll-provider employee id onto a local user. Provider ids are
/// offset by 800 from ours, so "EMP-0803" resolves to user 3. Ids that miss
/// both ways fall back to a legal-name match on the payload's employee name.
async fn resolve_user(
    store: &Store,
    employee_id: &str,
    employee_name: &str,
) -> Result<Option<users::Model>, ApiError> {
    let digits: String = employee_id.chars().filter(char::is_ascii_digit).collect();

    if let Ok(numeric) = digits.parse::<i32>() {
        if numeric >= 800 {
            if let Some(user) = store.users().get_by_id(numeric - 800).await? {
                return Ok(Some(user));
            }
        }
        if let Some(user) = store.users().get_by_id(numeric).await? {
            return Ok(Some(user));
        }
    }

    let mut tokens = employee_name.split_whitespace();
    let (Some(first), Some(last)) = (tokens.next(), tokens.next_back()) else {
        return Ok(None);
    };
    Ok(store.users().get_by_legal_name(first, last).await?)
}

pub async fn generate_paystub(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<PaystubStatement>,
) -> Result<Response, ApiError> {
    authorize(&current.actor(), None, Action::Write)?;

    let employer = &state.config.branding.employer_legal_name;
    if payload.company.company_name != *employer {
        return Err(ApiError::validation(format!(
            "company_name must be {employer}"
        )));
    }

    let user = resolve_user(
        &state.store,
        &payload.employee.employee_id,
        &payload.employee.employee_name,
    )
    .await?
    .ok_or_else(|| {
        ApiError::validation("Unable to match employee_id to an existing user")
    })?;

    let blob_store = state.blob.as_ref().ok_or_else(|| {
        ApiError::ConfigurationError("Blob storage is not configured".to_string())
    })?;

    let rendered = render_statement(&payload, &state.config.branding)?;

    let pay_date = payload.pay_period.pay_date;
    let filename = build_paystub_filename(
        &state.config.branding.filename_prefix,
        &payload.employee.employee_name,
        pay_date,
    );
    let key = blob::paystub_key(user.id, pay_date, &payload.metadata.paystub_id);

    let metadata = HashMap::from([
        ("paystub_id".to_string(), payload.metadata.paystub_id.clone()),
        (
            "employee_id".to_string(),
            payload.employee.employee_id.clone(),
        ),
        (
            "employee_name".to_string(),
            payload.employee.employee_name.clone(),
        ),
        (
            "pay_date".to_string(),
            pay_date.format("%Y-%m-%d").to_string(),
        ),
    ]);
    blob_store
        .upload(&key, rendered.bytes.clone(), "application/pdf", metadata)
        .await?;

    let record = state
        .store
        .paystubs()
        .create(NewPaystub {
            user_id: user.id,
            employee_first_name: user.legal_first_name.clone(),
            employee_last_name: user.legal_last_name.clone(),
            pay_period_start: payload.pay_period.pay_period_start,
            pay_period_end: payload.pay_period.pay_period_end,
            pay_date,
            earnings: serde_json::to_value(&payload.earnings)
                .map_err(|err| ApiError::internal(err.to_string()))?,
            deductions: serde_json::to_value(&payload.deductions)
                .map_err(|err| ApiError::internal(err.to_string()))?,
            gross_pay: payload.totals.gross_pay_current,
            total_deductions: payload.totals.total_deductions_current,
            net_pay: payload.totals.net_pay_current,
            file_name: Some(filename.clone()),
            s3_key: Some(key),
        })
        .await?;

    state
        .store
        .audit()
        .log_paystub_generation(
            "paystub_generation",
            current.0.id,
            json!({
                "paystub_id": payload.metadata.paystub_id,
                "paystub_record_id": record.id,
                "employee_id": payload.employee.employee_id,
                "employee_name": payload.employee.employee_name,
                "pay_date": pay_date,
            }),
        )
        .await?;

    info!(
        paystub_record_id = record.id,
        user_id = user.id,
        "paystub generated"
    );
    Ok(pdf_response(rendered.bytes, &filename))
}

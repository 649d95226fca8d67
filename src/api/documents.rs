use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::json;
use tracing::info;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, DocumentDto, ShareDto, pdf_response};
use crate::domain::Role;
use crate::domain::access::{Action, authorize};
use crate::entities::documents;
use crate::pdf::document::render_document;
use crate::services::share::{ShareService, validate_access};
use crate::state::AppState;

async fn get_document_checked(
    state: &AppState,
    doc_id: i32,
    current: &CurrentUser,
    action: Action,
) -> Result<documents::Model, ApiError> {
    let document = state
        .store
        .documents()
        .get_by_id(doc_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Document", doc_id))?;
    authorize(&current.actor(), Some(document.owner_id), action)?;
    Ok(document)
}

#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub owner_id: i32,
}

pub async fn create_document(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<DocumentDto>>), ApiError> {
    authorize(&current.actor(), None, Action::Write)?;

    state
        .store
        .users()
        .get_by_id(payload.owner_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Owner not found".to_string()))?;

    let document = state
        .store
        .documents()
        .create(
            &payload.title,
            payload.body.as_deref().unwrap_or(""),
            payload.owner_id,
        )
        .await?;

    info!(document_id = document.id, "document created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(document.into())),
    ))
}

pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<DocumentDto>>>, ApiError> {
    let owner_filter = if current.0.role == Role::Admin {
        None
    } else {
        Some(current.0.id)
    };
    let documents = state.store.documents().list(owner_filter).await?;

    if !documents.is_empty() {
        let ids: Vec<i32> = documents.iter().map(|d| d.id).collect();
        state
            .store
            .audit()
            .log_document_events("document_access", current.0.id, &ids, json!({"via": "list"}))
            .await?;
    }

    Ok(Json(ApiResponse::success(
        documents.into_iter().map(DocumentDto::from).collect(),
    )))
}

pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(doc_id): Path<i32>,
) -> Result<Json<ApiResponse<DocumentDto>>, ApiError> {
    let document = get_document_checked(&state, doc_id, &current, Action::Read).await?;

    state
        .store
        .audit()
        .log_document_event(
            "document_access",
            current.0.id,
            document.id,
            json!({"via": "detail"}),
        )
        .await?;

    Ok(Json(ApiResponse::success(document.into())))
}

#[derive(Debug, Deserialize)]
pub struct UpdateDocumentRequest {
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
}

pub async fn update_document(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(doc_id): Path<i32>,
    Json(payload): Json<UpdateDocumentRequest>,
) -> Result<Json<ApiResponse<DocumentDto>>, ApiError> {
    authorize(&current.actor(), None, Action::Write)?;
    let document = get_document_checked(&state, doc_id, &current, Action::Write).await?;

    let updated = state
        .store
        .documents()
        .update(
            document,
            &payload.title,
            payload.body.as_deref().unwrap_or(""),
        )
        .await?;

    Ok(Json(ApiResponse::success(updated.into())))
}

pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(doc_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    authorize(&current.actor(), None, Action::Write)?;
    let document = get_document_checked(&state, doc_id, &current, Action::Write).await?;

    state.store.documents().delete(document.id).await?;
    info!(document_id = doc_id, "document deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_document_pdf(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(doc_id): Path<i32>,
) -> Result<Response, ApiError> {
    let document = get_document_checked(&state, doc_id, &current, Action::Read).await?;

    let rendered = render_document(&document, &state.config.branding, Utc::now())?;

    state
        .store
        .audit()
        .log_document_event(
            "document_generation",
            current.0.id,
            document.id,
            json!({"format": "pdf"}),
        )
        .await?;

    let filename = format!("document_{}.pdf", document.id);
    Ok(pdf_response(rendered.bytes, &filename))
}

/// Accepts an RFC 3339 timestamp with or without an offset; naive values are
/// taken as UTC.
fn flexible_utc<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(dt) = raw.parse::<DateTime<Utc>>() {
        return Ok(Some(dt));
    }
    raw.parse::<NaiveDateTime>()
        .map(|naive| Some(naive.and_utc()))
        .map_err(serde::de::Error::custom)
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateShareRequest {
    #[serde(default, deserialize_with = "flexible_utc")]
    pub expires_at: Option<DateTime<Utc>>,
}

pub async fn create_share(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(doc_id): Path<i32>,
    Json(payload): Json<CreateShareRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ShareDto>>), ApiError> {
    let document = get_document_checked(&state, doc_id, &current, Action::Write).await?;

    let service = ShareService::new(state.store.shares());
    let share = service
        .issue(document.id, current.0.id, payload.expires_at)
        .await?;

    state
        .store
        .audit()
        .log_document_event(
            "share_created",
            current.0.id,
            document.id,
            json!({"share_id": share.id, "expires_at": share.expires_at}),
        )
        .await?;

    info!(document_id = doc_id, share_id = share.id, "share link issued");
    Ok((StatusCode::CREATED, Json(ApiResponse::success(share.into()))))
}

pub async fn list_shares(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(doc_id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<ShareDto>>>, ApiError> {
    let document = get_document_checked(&state, doc_id, &current, Action::Read).await?;

    let shares = state.store.shares().list_for_document(document.id).await?;
    Ok(Json(ApiResponse::success(
        shares.into_iter().map(ShareDto::from).collect(),
    )))
}

pub async fn revoke_share(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path((doc_id, share_id)): Path<(i32, i32)>,
) -> Result<Json<ApiResponse<ShareDto>>, ApiError> {
    let document = get_document_checked(&state, doc_id, &current, Action::Write).await?;

    let share = state
        .store
        .shares()
        .get_by_id(share_id)
        .await?
        .filter(|share| share.document_id == document.id)
        .ok_or_else(|| ApiError::not_found("Share", share_id))?;

    let already_revoked = share.revoked_at.is_some();
    let service = ShareService::new(state.store.shares());
    let share = service.revoke(share).await?;

    if !already_revoked {
        state
            .store
            .audit()
            .log_document_event(
                "share_revoked",
                current.0.id,
                document.id,
                json!({"share_id": share.id}),
            )
            .await?;
    }

    Ok(Json(ApiResponse::success(share.into())))
}

/// Anonymous fetch by token. Unknown tokens are 404; revoked or expired
/// links are 410. Access is audited under the share creator, falling back to
/// the document owner for shares whose creator was deleted.
pub async fn get_shared_pdf(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Response, ApiError> {
    let share = state
        .store
        .shares()
        .get_by_token(&token)
        .await?
        .ok_or_else(|| ApiError::NotFound("Share link not found".to_string()))?;

    validate_access(&share, Utc::now())?;

    let document = state
        .store
        .documents()
        .get_by_id(share.document_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Share link not found".to_string()))?;

    let rendered = render_document(&document, &state.config.branding, Utc::now())?;

    let audit_actor = share.created_by_user_id.unwrap_or(document.owner_id);
    state
        .store
        .audit()
        .log_document_event(
            "document_generation",
            audit_actor,
            document.id,
            json!({"format": "pdf", "via": "share", "share_id": share.id}),
        )
        .await?;

    let filename = format!("document_{}.pdf", document.id);
    Ok(pdf_response(rendered.bytes, &filename))
}

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{HeaderValue, header},
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod auth;
mod documents;
mod error;
mod paystub_generate;
mod paystubs;
mod types;
mod users;
mod verifications;

pub use error::ApiError;
pub use types::*;

/// PDF bytes as a download attachment.
fn pdf_response(bytes: Vec<u8>, filename: &str) -> Response {
    Response::builder()
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(Body::from(bytes))
        .unwrap_or_else(|_| {
            ApiError::internal("Failed to build PDF response").into_response()
        })
}

async fn health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<&'static str>>, ApiError> {
    state.store.ping().await?;
    Ok(Json(ApiResponse::success("ok")))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config.server.cors_allowed_origins.clone();

    let protected_routes = create_protected_router(state.clone());

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/auth/login", post(auth::login))
        .route(
            "/auth/password-reset/request",
            post(auth::request_password_reset),
        )
        .route(
            "/auth/password-reset/confirm",
            post(auth::confirm_password_reset),
        );

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .route("/health", get(health))
        .route("/shared/{token}/pdf", get(documents::get_shared_pdf))
        .with_state(state)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/me", get(auth::me))
        .route("/users", post(users::create_user))
        .route("/users", get(users::list_users))
        .route("/users/me", patch(users::update_me))
        .route("/users/{id}", get(users::get_user))
        .route("/users/{id}", put(users::update_user))
        .route("/users/{id}", delete(users::delete_user))
        .route("/users/{id}/password", put(users::set_user_password))
        .route("/documents", post(documents::create_document))
        .route("/documents", get(documents::list_documents))
        .route("/documents/{id}", get(documents::get_document))
        .route("/documents/{id}", put(documents::update_document))
        .route("/documents/{id}", delete(documents::delete_document))
        .route("/documents/{id}/pdf", get(documents::get_document_pdf))
        .route("/documents/{id}/shares", post(documents::create_share))
        .route("/documents/{id}/shares", get(documents::list_shares))
        .route(
            "/documents/{id}/shares/{share_id}",
            delete(documents::revoke_share),
        )
        .route("/paystubs", get(paystubs::list_paystubs))
        .route("/paystubs/generate", post(paystub_generate::generate_paystub))
        .route("/paystubs/upload", post(paystubs::upload_paystub))
        .route("/paystubs/{id}", delete(paystubs::delete_paystub))
        .route("/paystubs/{id}/pdf", get(paystubs::get_paystub_pdf))
        .route(
            "/verification-requests",
            post(verifications::create_verification_request),
        )
        .route(
            "/verification-requests",
            get(verifications::list_verification_requests),
        )
        .route(
            "/verification-requests/{id}/generate",
            post(verifications::generate_letter),
        )
        .route(
            "/verification-requests/{id}/mark-sent",
            post(verifications::mark_sent),
        )
        .route(
            "/verification-requests/{id}/decline",
            post(verifications::decline_request),
        )
        .route(
            "/verification-requests/{id}/pdf",
            get(verifications::get_letter_pdf),
        )
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}

//! End-to-end API tests over an in-memory database and blob store.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use corehr::blob::MemoryBlobStore;
use corehr::config::Config;
use corehr::db::Store;
use corehr::state::AppState;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Bootstrap admin seeded by migration (must match m20240901_initial.rs).
const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
const DEFAULT_ADMIN_PASSWORD: &str = "ChangeMeNow";

async fn spawn_app() -> (Arc<AppState>, Router) {
    let mut config = Config::default();
    config.database.url = "sqlite::memory:".to_string();

    let store = Store::with_pool_options(&config.database.url, 1, 1)
        .await
        .expect("Failed to open in-memory database");
    let blob = Some(Arc::new(MemoryBlobStore::new()) as Arc<dyn corehr::blob::BlobStore>);

    let state = AppState::from_parts(config, store, blob);
    let router = corehr::api::router(state.clone());
    (state, router)
}

/// Same app, no blob store configured.
async fn spawn_app_without_blob() -> (Arc<AppState>, Router) {
    let mut config = Config::default();
    config.database.url = "sqlite::memory:".to_string();

    let store = Store::with_pool_options(&config.database.url, 1, 1)
        .await
        .expect("Failed to open in-memory database");

    let state = AppState::from_parts(config, store, None);
    let router = corehr::api::router(state.clone());
    (state, router)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn send_json(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, token, body).await;
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = send_json(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"email": email, "password": password})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["data"]["access_token"].as_str().unwrap().to_string()
}

async fn admin_token(app: &Router) -> String {
    login(app, DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_PASSWORD).await
}

fn employee_payload(email: &str, last_name: &str) -> Value {
    json!({
        "email": email,
        "password": "secret-password-1",
        "legal_first_name": "Avery",
        "legal_last_name": last_name,
        "job_title": "Software Engineer",
        "department": "Engineering",
        "hire_date": "2021-06-01",
        "phone": "503-555-0100",
        "address_line1": "42 Oak St",
        "city": "Portland",
        "state": "OR",
        "postal_code": "97201",
        "country": "US",
        "emergency_contact_name": "Jamie Walker",
        "emergency_contact_phone": "503-555-0101",
        "emergency_contact_relationship": "Partner",
        "role": "EMPLOYEE",
        "employment_status": "ACTIVE"
    })
}

async fn create_employee(app: &Router, admin: &str, email: &str, last_name: &str) -> i32 {
    let (status, body) = send_json(
        app,
        Method::POST,
        "/api/users",
        Some(admin),
        Some(employee_payload(email, last_name)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create user failed: {body}");
    i32::try_from(body["data"]["id"].as_i64().unwrap()).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let (_state, app) = spawn_app().await;

    let (status, body) = send_json(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], "ok");
}

#[tokio::test]
async fn auth_flow() {
    let (_state, app) = spawn_app().await;

    let (status, _) = send_json(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"email": DEFAULT_ADMIN_EMAIL, "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send_json(&app, Method::GET, "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = admin_token(&app).await;
    let (status, body) = send_json(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], DEFAULT_ADMIN_EMAIL);
    assert_eq!(body["data"]["role"], "ADMIN");
}

#[tokio::test]
async fn password_reset_flow() {
    let (_state, app) = spawn_app().await;
    let admin = admin_token(&app).await;
    create_employee(&app, &admin, "reset@example.com", "Reset").await;

    // Unknown emails still answer 200 without a token.
    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/auth/password-reset/request",
        None,
        Some(json!({"email": "nobody@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["reset_token"].is_null());

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/auth/password-reset/request",
        None,
        Some(json!({"email": "reset@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["reset_token"].as_str().unwrap().to_string();

    let (status, _) = send_json(
        &app,
        Method::POST,
        "/api/auth/password-reset/confirm",
        None,
        Some(json!({"token": token, "new_password": "brand-new-pass"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    login(&app, "reset@example.com", "brand-new-pass").await;

    // Tokens are single use.
    let (status, _) = send_json(
        &app,
        Method::POST,
        "/api/auth/password-reset/confirm",
        None,
        Some(json!({"token": token, "new_password": "another-pass"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn user_management_guards() {
    let (_state, app) = spawn_app().await;
    let admin = admin_token(&app).await;

    let employee_id = create_employee(&app, &admin, "avery@example.com", "Nguyen").await;

    // Duplicate email.
    let (status, _) = send_json(
        &app,
        Method::POST,
        "/api/users",
        Some(&admin),
        Some(employee_payload("avery@example.com", "Nguyen")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Employees cannot create users.
    let employee = login(&app, "avery@example.com", "secret-password-1").await;
    let (status, _) = send_json(
        &app,
        Method::POST,
        "/api/users",
        Some(&employee),
        Some(employee_payload("other@example.com", "Lee")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Admin cannot delete their own account.
    let (status, body) = send_json(&app, Method::GET, "/api/auth/me", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let admin_id = body["data"]["id"].as_i64().unwrap();
    let (status, _) = send_json(
        &app,
        Method::DELETE,
        &format!("/api/users/{admin_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Deleting someone else works.
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/users/{employee_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn former_employees_are_read_only() {
    let (_state, app) = spawn_app().await;
    let admin = admin_token(&app).await;

    let mut payload = employee_payload("former@example.com", "Ito");
    payload["employment_status"] = json!("FORMER_EMPLOYEE");
    let (status, _) = send_json(&app, Method::POST, "/api/users", Some(&admin), Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED);

    let former = login(&app, "former@example.com", "secret-password-1").await;

    // Reads still work.
    let (status, _) = send_json(&app, Method::GET, "/api/paystubs", Some(&former), None).await;
    assert_eq!(status, StatusCode::OK);

    // Any write is rejected, even self-service ones.
    let (status, _) = send_json(
        &app,
        Method::POST,
        "/api/verification-requests",
        Some(&former),
        Some(json!({
            "verifier_name": "Acme Screening",
            "purpose": "Background check",
            "consent": true
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send_json(
        &app,
        Method::PATCH,
        "/api/users/me",
        Some(&former),
        Some(json!({"phone": "503-555-0199"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn document_and_share_lifecycle() {
    let (_state, app) = spawn_app().await;
    let admin = admin_token(&app).await;
    let employee_id = create_employee(&app, &admin, "docs@example.com", "Rivera").await;

    // Owner must exist.
    let (status, _) = send_json(
        &app,
        Method::POST,
        "/api/documents",
        Some(&admin),
        Some(json!({"title": "Offer Letter", "body": "Welcome", "owner_id": 9999})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/documents",
        Some(&admin),
        Some(json!({
            "title": "Offer Letter",
            "body": "Welcome aboard.\nWe are glad to have you.",
            "owner_id": employee_id
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let doc_id = body["data"]["id"].as_i64().unwrap();

    // The owner sees it, and only their own documents.
    let employee = login(&app, "docs@example.com", "secret-password-1").await;
    let (status, body) = send_json(&app, Method::GET, "/api/documents", Some(&employee), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, bytes) = send(
        &app,
        Method::GET,
        &format!("/api/documents/{doc_id}/pdf"),
        Some(&employee),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(bytes.starts_with(b"%PDF"));

    // Share issuance and anonymous fetch.
    let (status, body) = send_json(
        &app,
        Method::POST,
        &format!("/api/documents/{doc_id}/shares"),
        Some(&admin),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let token = body["data"]["token"].as_str().unwrap().to_string();
    let share_id = body["data"]["id"].as_i64().unwrap();

    let (status, bytes) = send(
        &app,
        Method::GET,
        &format!("/shared/{token}/pdf"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(bytes.starts_with(b"%PDF"));

    let (status, _) = send(&app, Method::GET, "/shared/nope/pdf", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Revocation is immediate and idempotent.
    let (status, _) = send_json(
        &app,
        Method::DELETE,
        &format!("/api/documents/{doc_id}/shares/{share_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/shared/{token}/pdf"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::GONE);

    let (status, _) = send_json(
        &app,
        Method::DELETE,
        &format!("/api/documents/{doc_id}/shares/{share_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // A share born expired is minted but immediately unusable.
    let (status, body) = send_json(
        &app,
        Method::POST,
        &format!("/api/documents/{doc_id}/shares"),
        Some(&admin),
        Some(json!({"expires_at": "2020-01-01T00:00:00Z"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let expired_token = body["data"]["token"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/shared/{expired_token}/pdf"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::GONE);
}

#[tokio::test]
async fn verification_request_lifecycle() {
    let (_state, app) = spawn_app().await;
    let admin = admin_token(&app).await;
    create_employee(&app, &admin, "verify@example.com", "Okafor").await;
    let employee = login(&app, "verify@example.com", "secret-password-1").await;

    // Admins do not open requests.
    let (status, _) = send_json(
        &app,
        Method::POST,
        "/api/verification-requests",
        Some(&admin),
        Some(json!({
            "verifier_name": "Acme Screening",
            "purpose": "Background check",
            "consent": true
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Consent is mandatory.
    let (status, _) = send_json(
        &app,
        Method::POST,
        "/api/verification-requests",
        Some(&employee),
        Some(json!({
            "verifier_name": "Acme Screening",
            "purpose": "Background check",
            "consent": false
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/verification-requests",
        Some(&employee),
        Some(json!({
            "verifier_name": "Acme Screening",
            "verifier_email": "checks@acme.example",
            "purpose": "Mortgage application",
            "include_salary": true,
            "consent": true
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create request failed: {body}");
    assert_eq!(body["data"]["status"], "PENDING");
    let request_id = body["data"]["id"].as_i64().unwrap();

    // Letter does not exist yet.
    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/verification-requests/{request_id}/pdf"),
        Some(&employee),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Employees cannot drive admin transitions.
    let (status, _) = send_json(
        &app,
        Method::POST,
        &format!("/api/verification-requests/{request_id}/generate"),
        Some(&employee),
        Some(json!({"salary_amount": "95000.00"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // mark-sent before generate violates the state machine.
    let (status, _) = send_json(
        &app,
        Method::POST,
        &format!("/api/verification-requests/{request_id}/mark-sent"),
        Some(&admin),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Salary is required when the employee asked for it.
    let (status, _) = send_json(
        &app,
        Method::POST,
        &format!("/api/verification-requests/{request_id}/generate"),
        Some(&admin),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // And it must be a positive amount.
    let (status, _) = send_json(
        &app,
        Method::POST,
        &format!("/api/verification-requests/{request_id}/generate"),
        Some(&admin),
        Some(json!({"salary_amount": "-5"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, bytes) = send(
        &app,
        Method::POST,
        &format!("/api/verification-requests/{request_id}/generate"),
        Some(&admin),
        Some(json!({"salary_amount": "95000.00"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(bytes.starts_with(b"%PDF"));

    // The employee can now download the stored letter.
    let (status, bytes) = send(
        &app,
        Method::GET,
        &format!("/api/verification-requests/{request_id}/pdf"),
        Some(&employee),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(bytes.starts_with(b"%PDF"));

    let (status, body) = send_json(
        &app,
        Method::POST,
        &format!("/api/verification-requests/{request_id}/mark-sent"),
        Some(&admin),
        Some(json!({"sent_note": "  Emailed to verifier  "})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "SENT");
    assert_eq!(body["data"]["sent_note"], "Emailed to verifier");

    // Sent requests cannot be declined or regenerated.
    let (status, _) = send_json(
        &app,
        Method::POST,
        &format!("/api/verification-requests/{request_id}/decline"),
        Some(&admin),
        Some(json!({"decline_reason": "too late"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(
        &app,
        Method::POST,
        &format!("/api/verification-requests/{request_id}/generate"),
        Some(&admin),
        Some(json!({"salary_amount": "95000.00"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn salary_not_permitted_unless_requested() {
    let (_state, app) = spawn_app().await;
    let admin = admin_token(&app).await;
    create_employee(&app, &admin, "nosalary@example.com", "Moss").await;
    let employee = login(&app, "nosalary@example.com", "secret-password-1").await;

    let (_, body) = send_json(
        &app,
        Method::POST,
        "/api/verification-requests",
        Some(&employee),
        Some(json!({
            "verifier_name": "Landlord LLC",
            "purpose": "Rental application",
            "include_salary": false,
            "consent": true
        })),
    )
    .await;
    let request_id = body["data"]["id"].as_i64().unwrap();

    let (status, _) = send_json(
        &app,
        Method::POST,
        &format!("/api/verification-requests/{request_id}/generate"),
        Some(&admin),
        Some(json!({"salary_amount": "95000.00"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, bytes) = send(
        &app,
        Method::POST,
        &format!("/api/verification-requests/{request_id}/generate"),
        Some(&admin),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(bytes.starts_with(b"%PDF"));
}

fn statement_payload(employee_id: &str, employee_name: &str) -> Value {
    json!({
        "company": {
            "company_name": "Example Employer LLC",
            "company_address": "100 Market St, Portland, OR 97201",
            "payroll_contact_email": "payroll@example.com"
        },
        "employee": {
            "employee_id": employee_id,
            "employee_name": employee_name,
            "job_title": "Software Engineer",
            "department": "Engineering",
            "employment_type": "Full-Time",
            "pay_type": "Salary",
            "pay_rate": "95000.00"
        },
        "pay_period": {
            "pay_period_start": "2024-03-01",
            "pay_period_end": "2024-03-15",
            "pay_date": "2024-03-20",
            "pay_frequency": "Semi-Monthly"
        },
        "earnings": [
            {"description": "Regular", "current_amount": "3958.33", "ytd_amount": "23750.00"}
        ],
        "deductions": [
            {"deduction_name": "Federal Income Tax", "current_amount": "600.00", "ytd_amount": "3600.00"}
        ],
        "totals": {
            "gross_pay_current": "3958.33",
            "total_deductions_current": "600.00",
            "net_pay_current": "3358.33",
            "gross_pay_ytd": "23750.00",
            "total_deductions_ytd": "3600.00",
            "net_pay_ytd": "20150.00"
        },
        "payment": {
            "payment_method": "Direct Deposit",
            "bank_name_masked": "First Bank ****1234",
            "payment_status": "Paid"
        },
        "metadata": {
            "paystub_id": "PS-1001",
            "generated_timestamp": "2024-03-20T17:00:00Z"
        }
    })
}

#[tokio::test]
async fn paystub_generation_and_access() {
    let (_state, app) = spawn_app().await;
    let admin = admin_token(&app).await;
    let employee_id = create_employee(&app, &admin, "pay@example.com", "Castillo").await;

    // The provider id is offset by 800 from ours.
    let provider_id = format!("EMP-{:04}", employee_id + 800);

    // Wrong legal entity is rejected outright.
    let mut wrong = statement_payload(&provider_id, "Avery Castillo");
    wrong["company"]["company_name"] = json!("Some Other Corp");
    let (status, _) = send_json(
        &app,
        Method::POST,
        "/api/paystubs/generate",
        Some(&admin),
        Some(wrong),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unresolvable employee ids fail validation.
    let (status, _) = send_json(
        &app,
        Method::POST,
        "/api/paystubs/generate",
        Some(&admin),
        Some(statement_payload("EMP-9750", "Nobody Known")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, bytes) = send(
        &app,
        Method::POST,
        "/api/paystubs/generate",
        Some(&admin),
        Some(statement_payload(&provider_id, "Avery Castillo")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(bytes.starts_with(b"%PDF"));

    // The stub landed on the resolved user with the generated file name.
    let employee = login(&app, "pay@example.com", "secret-password-1").await;
    let (status, body) = send_json(&app, Method::GET, "/api/paystubs", Some(&employee), None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(
        items[0]["file_name"],
        "EMPLOYER_PAYSTUB_CASTILLO_20240320.pdf"
    );
    assert_eq!(body["data"]["available_years"], json!([2024]));
    let paystub_id = items[0]["id"].as_i64().unwrap();

    // Owner downloads the stored bytes.
    let (status, bytes) = send(
        &app,
        Method::GET,
        &format!("/api/paystubs/{paystub_id}/pdf"),
        Some(&employee),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(bytes.starts_with(b"%PDF"));

    // Even admins are locked out of someone else's stub.
    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/paystubs/{paystub_id}/pdf"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Filtering by a year with no stubs yields an empty page.
    let (status, body) = send_json(
        &app,
        Method::GET,
        "/api/paystubs?year=2019",
        Some(&employee),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["items"].as_array().unwrap().is_empty());

    // Admin cleanup removes the row.
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/paystubs/{paystub_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn uploaded_paystub_round_trip() {
    let (_state, app) = spawn_app().await;
    let admin = admin_token(&app).await;
    let employee_id = create_employee(&app, &admin, "upload@example.com", "Smith-Jones").await;

    use base64::Engine;
    let content = base64::engine::general_purpose::STANDARD.encode(b"%PDF-1.7 uploaded");

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/paystubs/upload",
        Some(&admin),
        Some(json!({
            "user_id": employee_id,
            "pay_period_start": "2024-01-01",
            "pay_period_end": "2024-01-15",
            "pay_date": "2024-01-19",
            "gross_pay": "2000.00",
            "total_deductions": "350.00",
            "net_pay": "1650.00",
            "content_base64": content
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "upload failed: {body}");
    // No stored name, so the derived one is used; hyphens survive here.
    assert_eq!(
        body["data"]["file_name"],
        "EMPLOYER_PAYSTUB_SMITH-JONES_20240119.pdf"
    );
    let paystub_id = body["data"]["id"].as_i64().unwrap();

    let employee = login(&app, "upload@example.com", "secret-password-1").await;
    let (status, bytes) = send(
        &app,
        Method::GET,
        &format!("/api/paystubs/{paystub_id}/pdf"),
        Some(&employee),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"%PDF-1.7 uploaded");
}

#[tokio::test]
async fn share_token_minting_gives_up_after_collisions() {
    let (state, app) = spawn_app().await;
    let admin = admin_token(&app).await;
    let employee_id = create_employee(&app, &admin, "collide@example.com", "Hale").await;

    let (_, body) = send_json(
        &app,
        Method::POST,
        "/api/documents",
        Some(&admin),
        Some(json!({"title": "Handbook", "body": "Policies", "owner_id": employee_id})),
    )
    .await;
    let doc_id = i32::try_from(body["data"]["id"].as_i64().unwrap()).unwrap();

    struct FixedToken;
    impl corehr::services::share::TokenGenerator for FixedToken {
        fn generate(&self) -> String {
            "always-the-same".to_string()
        }
    }

    let service =
        corehr::services::share::ShareService::with_generator(state.store.shares(), FixedToken);
    service.issue(doc_id, 1, None).await.unwrap();

    let err = service.issue(doc_id, 1, None).await.unwrap_err();
    assert!(err.to_string().contains("Exhausted"));
}

#[tokio::test]
async fn share_token_race_surfaces_as_conflict() {
    use corehr::api::ApiError;
    use corehr::services::share::IssueError;

    let (state, app) = spawn_app().await;
    let admin = admin_token(&app).await;
    let employee_id = create_employee(&app, &admin, "race@example.com", "Ngo").await;

    let (_, body) = send_json(
        &app,
        Method::POST,
        "/api/documents",
        Some(&admin),
        Some(json!({"title": "Handbook", "body": "Policies", "owner_id": employee_id})),
    )
    .await;
    let doc_id = i32::try_from(body["data"]["id"].as_i64().unwrap()).unwrap();

    // A concurrent issuer can win the token between the existence pre-check
    // and the insert; the second insert then lands on the unique column.
    let shares = state.store.shares();
    shares.create(doc_id, "raced-token", 1, None).await.unwrap();
    let err = shares.create(doc_id, "raced-token", 1, None).await.unwrap_err();

    let issue = IssueError::from_insert(err);
    assert!(matches!(issue, IssueError::TokenRace));
    assert!(matches!(ApiError::from(issue), ApiError::Conflict(_)));
}

#[tokio::test]
async fn stored_paystub_delete_requires_blob_store() {
    use chrono::NaiveDate;
    use corehr::db::repositories::paystub::NewPaystub;
    use rust_decimal::Decimal;

    let (state, app) = spawn_app_without_blob().await;
    let admin = admin_token(&app).await;
    let employee_id = create_employee(&app, &admin, "orphan@example.com", "Vance").await;

    let date = NaiveDate::from_ymd_opt(2024, 2, 9).unwrap();
    let new_row = |s3_key: Option<String>| NewPaystub {
        user_id: employee_id,
        employee_first_name: "Avery".to_string(),
        employee_last_name: "Vance".to_string(),
        pay_period_start: date,
        pay_period_end: date,
        pay_date: date,
        earnings: json!([]),
        deductions: json!([]),
        gross_pay: Decimal::ZERO,
        total_deductions: Decimal::ZERO,
        net_pay: Decimal::ZERO,
        file_name: None,
        s3_key,
    };

    // A row pointing at stored bytes cannot be deleted without the store;
    // deleting the row alone would orphan the object.
    let stored = state
        .store
        .paystubs()
        .create(new_row(Some("paystubs/1/test".to_string())))
        .await
        .unwrap();
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/paystubs/{}", stored.id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        state
            .store
            .paystubs()
            .get_by_id(stored.id)
            .await
            .unwrap()
            .is_some()
    );

    // Rows without stored bytes still delete fine.
    let rendered = state.store.paystubs().create(new_row(None)).await.unwrap();
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/paystubs/{}", rendered.id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::verification::VerificationStatus;
use crate::domain::{EmploymentStatus, Role};
use crate::entities::{document_shares, documents, users, verification_requests};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub email: String,
    pub legal_first_name: String,
    pub legal_last_name: String,
    pub preferred_name: Option<String>,
    pub job_title: String,
    pub department: String,
    pub hire_date: NaiveDate,
    pub phone: Option<String>,
    pub address_line1: String,
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
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for UserDto {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            legal_first_name: user.legal_first_name,
            legal_last_name: user.legal_last_name,
            preferred_name: user.preferred_name,
            job_title: user.job_title,
            department: user.department,
            hire_date: user.hire_date,
            phone: user.phone,
            address_line1: user.address_line1,
            address_line2: user.address_line2,
            city: user.city,
            state: user.state,
            postal_code: user.postal_code,
            country: user.country,
            emergency_contact_name: user.emergency_contact_name,
            emergency_contact_phone: user.emergency_contact_phone,
            emergency_contact_relationship: user.emergency_contact_relationship,
            role: user.role,
            employment_status: user.employment_status,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PasswordResetResponse {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DocumentDto {
    pub id: i32,
    pub title: String,
    pub body: String,
    pub owner_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<documents::Model> for DocumentDto {
    fn from(document: documents::Model) -> Self {
        Self {
            id: document.id,
            title: document.title,
            body: document.body,
            owner_id: document.owner_id,
            created_at: document.created_at,
            updated_at: document.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ShareDto {
    pub id: i32,
    pub document_id: i32,
    pub token: String,
    pub created_by_user_id: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<document_shares::Model> for ShareDto {
    fn from(share: document_shares::Model) -> Self {
        Self {
            id: share.id,
            document_id: share.document_id,
            token: share.token,
            created_by_user_id: share.created_by_user_id,
            expires_at: share.expires_at,
            revoked_at: share.revoked_at,
            created_at: share.created_at,
        }
    }
}

/// List row; `file_name` always carries a value, falling back to the derived
/// name when the row has none stored.
#[derive(Debug, Serialize)]
pub struct PaystubSummary {
    pub id: i32,
    pub pay_date: NaiveDate,
    pub pay_period_start: NaiveDate,
    pub pay_period_end: NaiveDate,
    pub file_name: String,
}

#[derive(Debug, Serialize)]
pub struct PaystubListResponse {
    pub items: Vec<PaystubSummary>,
    pub available_years: Vec<i32>,
}

#[derive(Debug, Serialize)]
pub struct EmployeeSummary {
    pub id: i32,
    pub legal_first_name: String,
    pub legal_last_name: String,
    pub job_title: String,
    pub department: String,
    pub hire_date: NaiveDate,
    pub employment_status: EmploymentStatus,
}

impl From<&users::Model> for EmployeeSummary {
    fn from(user: &users::Model) -> Self {
        Self {
            id: user.id,
            legal_first_name: user.legal_first_name.clone(),
            legal_last_name: user.legal_last_name.clone(),
            job_title: user.job_title.clone(),
            department: user.department.clone(),
            hire_date: user.hire_date,
            employment_status: user.employment_status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VerificationRequestDto {
    pub id: i32,
    pub employee_id: i32,
    pub verifier_name: String,
    pub verifier_company: Option<String>,
    pub verifier_email: Option<String>,
    pub purpose: String,
    pub include_salary: bool,
    pub consent: bool,
    pub status: VerificationStatus,
    pub salary_amount: Option<Decimal>,
    pub generated_at: Option<DateTime<Utc>>,
    pub generated_by_user_id: Option<i32>,
    pub sent_at: Option<DateTime<Utc>>,
    pub sent_by_user_id: Option<i32>,
    pub sent_note: Option<String>,
    pub declined_at: Option<DateTime<Utc>>,
    pub declined_by_user_id: Option<i32>,
    pub decline_reason: Option<String>,
    pub file_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee: Option<EmployeeSummary>,
}

impl VerificationRequestDto {
    #[must_use]
    pub fn from_model(
        request: verification_requests::Model,
        employee: Option<&users::Model>,
    ) -> Self {
        Self {
            id: request.id,
            employee_id: request.employee_id,
            verifier_name: request.verifier_name,
            verifier_company: request.verifier_company,
            verifier_email: request.verifier_email,
            purpose: request.purpose,
            include_salary: request.include_salary,
            consent: request.consent,
            status: request.status,
            salary_amount: request.salary_amount,
            generated_at: request.generated_at,
            generated_by_user_id: request.generated_by_user_id,
            sent_at: request.sent_at,
            sent_by_user_id: request.sent_by_user_id,
            sent_note: request.sent_note,
            declined_at: request.declined_at,
            declined_by_user_id: request.declined_by_user_id,
            decline_reason: request.decline_reason,
            file_name: request.file_name,
            created_at: request.created_at,
            updated_at: request.updated_at,
            employee: employee.map(EmployeeSummary::from),
        }
    }
}

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::domain::verification::VerificationStatus;
use crate::entities::verification_requests;

#[derive(Debug, Clone)]
pub struct NewVerificationRequest {
    pub employee_id: i32,
    pub verifier_name: String,
    pub verifier_company: Option<String>,
    pub verifier_email: Option<String>,
    pub purpose: String,
    pub include_salary: bool,
    pub consent: bool,
}

/// Stamps applied when a letter is generated.
#[derive(Debug, Clone)]
pub struct GenerationStamp {
    pub generated_by_user_id: i32,
    pub generated_at: DateTime<Utc>,
    pub salary_amount: Option<Decimal>,
    pub file_name: String,
    pub s3_key: String,
}

pub struct VerificationRepository {
    conn: DatabaseConnection,
}

impl VerificationRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<verification_requests::Model>> {
        verification_requests::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query verification request")
    }

    /// Newest first; `employee_id` scopes the list for non-admin callers.
    pub async fn list(&self, employee_id: Option<i32>) -> Result<Vec<verification_requests::Model>> {
        let mut query = verification_requests::Entity::find();
        if let Some(employee) = employee_id {
            query = query.filter(verification_requests::Column::EmployeeId.eq(employee));
        }
        query
            .order_by_desc(verification_requests::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list verification requests")
    }

    pub async fn create(&self, new: NewVerificationRequest) -> Result<verification_requests::Model> {
        let model = verification_requests::ActiveModel {
            employee_id: Set(new.employee_id),
            verifier_name: Set(new.verifier_name),
            verifier_company: Set(new.verifier_company),
            verifier_email: Set(new.verifier_email),
            purpose: Set(new.purpose),
            include_salary: Set(new.include_salary),
            consent: Set(new.consent),
            status: Set(VerificationStatus::Pending),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            ..Default::default()
        };

        model
            .insert(&self.conn)
            .await
            .context("Failed to insert verification request")
    }

    pub async fn mark_generated(
        &self,
        request: verification_requests::Model,
        stamp: GenerationStamp,
    ) -> Result<verification_requests::Model> {
        let mut active: verification_requests::ActiveModel = request.into();
        active.status = Set(VerificationStatus::Generated);
        active.generated_at = Set(Some(stamp.generated_at));
        active.generated_by_user_id = Set(Some(stamp.generated_by_user_id));
        active.salary_amount = Set(stamp.salary_amount);
        active.file_name = Set(Some(stamp.file_name));
        active.s3_key = Set(Some(stamp.s3_key));
        active.updated_at = Set(Some(Utc::now()));

        active
            .update(&self.conn)
            .await
            .context("Failed to stamp generated verification request")
    }

    pub async fn mark_sent(
        &self,
        request: verification_requests::Model,
        sent_by_user_id: i32,
        sent_note: Option<String>,
    ) -> Result<verification_requests::Model> {
        let mut active: verification_requests::ActiveModel = request.into();
        active.status = Set(VerificationStatus::Sent);
        active.sent_at = Set(Some(Utc::now()));
        active.sent_by_user_id = Set(Some(sent_by_user_id));
        active.sent_note = Set(sent_note);
        active.updated_at = Set(Some(Utc::now()));

        active
            .update(&self.conn)
            .await
            .context("Failed to stamp sent verification request")
    }

    pub async fn mark_declined(
        &self,
        request: verification_requests::Model,
        declined_by_user_id: i32,
        decline_reason: Option<String>,
    ) -> Result<verification_requests::Model> {
        let mut active: verification_requests::ActiveModel = request.into();
        active.status = Set(VerificationStatus::Declined);
        active.declined_at = Set(Some(Utc::now()));
        active.declined_by_user_id = Set(Some(declined_by_user_id));
        active.decline_reason = Set(decline_reason);
        active.updated_at = Set(Some(Utc::now()));

        active
            .update(&self.conn)
            .await
            .context("Failed to stamp declined verification request")
    }
}

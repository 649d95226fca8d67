use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

use crate::entities::{
    document_audit_logs, paystub_audit_logs, paystub_generation_logs, verification_audit_logs,
};

/// Append-only event trail across documents, paystubs and verification
/// requests. Metadata is free-form JSON so each caller can record what it
/// knows without schema churn.
pub struct AuditRepository {
    conn: DatabaseConnection,
}

impl AuditRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn log_document_event(
        &self,
        event_type: &str,
        user_id: i32,
        document_id: i32,
        metadata: serde_json::Value,
    ) -> Result<()> {
        let model = document_audit_logs::ActiveModel {
            event_type: Set(event_type.to_string()),
            event_metadata: Set(metadata),
            user_id: Set(user_id),
            document_id: Set(document_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        model
            .insert(&self.conn)
            .await
            .context("Failed to insert document audit event")?;
        Ok(())
    }

    pub async fn log_paystub_event(
        &self,
        event_type: &str,
        user_id: i32,
        paystub_id: i32,
        metadata: serde_json::Value,
    ) -> Result<()> {
        let model = paystub_audit_logs::ActiveModel {
            event_type: Set(event_type.to_string()),
            event_metadata: Set(metadata),
            user_id: Set(user_id),
            paystub_id: Set(paystub_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        model
            .insert(&self.conn)
            .await
            .context("Failed to insert paystub audit event")?;
        Ok(())
    }

    pub async fn log_verification_event(
        &self,
        event_type: &str,
        user_id: i32,
        request_id: i32,
        metadata: serde_json::Value,
    ) -> Result<()> {
        let model = verification_audit_logs::ActiveModel {
            event_type: Set(event_type.to_string()),
            event_metadata: Set(metadata),
            user_id: Set(user_id),
            request_id: Set(request_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        model
            .insert(&self.conn)
            .await
            .context("Failed to insert verification audit event")?;
        Ok(())
    }

    /// One event per listed document, e.g. a list endpoint recording access.
    pub async fn log_document_events(
        &self,
        event_type: &str,
        user_id: i32,
        document_ids: &[i32],
        metadata: serde_json::Value,
    ) -> Result<()> {
        for document_id in document_ids {
            self.log_document_event(event_type, user_id, *document_id, metadata.clone())
                .await?;
        }
        Ok(())
    }

    /// One event per listed paystub.
    pub async fn log_paystub_events(
        &self,
        event_type: &str,
        user_id: i32,
        paystub_ids: &[i32],
        metadata: serde_json::Value,
    ) -> Result<()> {
        for paystub_id in paystub_ids {
            self.log_paystub_event(event_type, user_id, *paystub_id, metadata.clone())
                .await?;
        }
        Ok(())
    }

    /// One event per listed verification request.
    pub async fn log_verification_events(
        &self,
        event_type: &str,
        user_id: i32,
        request_ids: &[i32],
        metadata: serde_json::Value,
    ) -> Result<()> {
        for request_id in request_ids {
            self.log_verification_event(event_type, user_id, *request_id, metadata.clone())
                .await?;
        }
        Ok(())
    }

    /// Generation events stand alone so a failed run still leaves a trace.
    pub async fn log_paystub_generation(
        &self,
        event_type: &str,
        user_id: i32,
        metadata: serde_json::Value,
    ) -> Result<()> {
        let model = paystub_generation_logs::ActiveModel {
            event_type: Set(event_type.to_string()),
            event_metadata: Set(metadata),
            user_id: Set(user_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        model
            .insert(&self.conn)
            .await
            .context("Failed to insert paystub generation event")?;
        Ok(())
    }
}

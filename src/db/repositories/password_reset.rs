use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entities::password_reset_tokens;

pub struct PasswordResetRepository {
    conn: DatabaseConnection,
}

impl PasswordResetRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        user_id: i32,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<password_reset_tokens::Model> {
        let model = password_reset_tokens::ActiveModel {
            token: Set(token.to_string()),
            user_id: Set(user_id),
            expires_at: Set(expires_at),
            used_at: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        model
            .insert(&self.conn)
            .await
            .context("Failed to insert password reset token")
    }

    pub async fn get_by_token(&self, token: &str) -> Result<Option<password_reset_tokens::Model>> {
        password_reset_tokens::Entity::find()
            .filter(password_reset_tokens::Column::Token.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query password reset token")
    }

    pub async fn mark_used(
        &self,
        token: password_reset_tokens::Model,
    ) -> Result<password_reset_tokens::Model> {
        let mut active: password_reset_tokens::ActiveModel = token.into();
        active.used_at = Set(Some(Utc::now()));

        active
            .update(&self.conn)
            .await
            .context("Failed to mark password reset token used")
    }
}

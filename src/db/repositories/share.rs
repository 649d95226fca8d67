use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::document_shares;

pub struct ShareRepository {
    conn: DatabaseConnection,
}

impl ShareRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<document_shares::Model>> {
        document_shares::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query share")
    }

    pub async fn get_by_token(&self, token: &str) -> Result<Option<document_shares::Model>> {
        document_shares::Entity::find()
            .filter(document_shares::Column::Token.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query share by token")
    }

    pub async fn token_exists(&self, token: &str) -> Result<bool> {
        Ok(self.get_by_token(token).await?.is_some())
    }

    pub async fn list_for_document(&self, document_id: i32) -> Result<Vec<document_shares::Model>> {
        document_shares::Entity::find()
            .filter(document_shares::Column::DocumentId.eq(document_id))
            .order_by_desc(document_shares::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list shares")
    }

    pub async fn create(
        &self,
        document_id: i32,
        token: &str,
        created_by_user_id: i32,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<document_shares::Model> {
        let model = document_shares::ActiveModel {
            document_id: Set(document_id),
            token: Set(token.to_string()),
            created_by_user_id: Set(Some(created_by_user_id)),
            expires_at: Set(expires_at),
            revoked_at: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        model.insert(&self.conn).await.context("Failed to insert share")
    }

    /// Stamps `revoked_at`. Callers treat an already-revoked share as a no-op
    /// before reaching this.
    pub async fn revoke(&self, share: document_shares::Model) -> Result<document_shares::Model> {
        let mut active: document_shares::ActiveModel = share.into();
        active.revoked_at = Set(Some(Utc::now()));

        active.update(&self.conn).await.context("Failed to revoke share")
    }
}

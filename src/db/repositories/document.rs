use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::documents;

pub struct DocumentRepository {
    conn: DatabaseConnection,
}

impl DocumentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<documents::Model>> {
        documents::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query document")
    }

    /// Newest first; `owner_id` scopes the list for non-admin callers.
    pub async fn list(&self, owner_id: Option<i32>) -> Result<Vec<documents::Model>> {
        let mut query = documents::Entity::find();
        if let Some(owner) = owner_id {
            query = query.filter(documents::Column::OwnerId.eq(owner));
        }
        query
            .order_by_desc(documents::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list documents")
    }

    pub async fn create(&self, title: &str, body: &str, owner_id: i32) -> Result<documents::Model> {
        let model = documents::ActiveModel {
            title: Set(title.to_string()),
            body: Set(body.to_string()),
            owner_id: Set(owner_id),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            ..Default::default()
        };

        model.insert(&self.conn).await.context("Failed to insert document")
    }

    pub async fn update(
        &self,
        document: documents::Model,
        title: &str,
        body: &str,
    ) -> Result<documents::Model> {
        let mut active: documents::ActiveModel = document.into();
        active.title = Set(title.to_string());
        active.body = Set(body.to_string());
        active.updated_at = Set(Some(Utc::now()));

        active.update(&self.conn).await.context("Failed to update document")
    }

    pub async fn delete(&self, id: i32) -> Result<()> {
        documents::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete document")?;
        Ok(())
    }
}

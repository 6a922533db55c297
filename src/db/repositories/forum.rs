use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

use crate::entities::{forums, posts, topics};

pub struct ForumRepository {
    conn: DatabaseConnection,
}

impl ForumRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self) -> Result<Vec<forums::Model>> {
        forums::Entity::find()
            .order_by_asc(forums::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list forums")
    }

    pub async fn get(&self, id: i32) -> Result<Option<forums::Model>> {
        forums::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query forum by ID")
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<forums::Model>> {
        forums::Entity::find()
            .filter(forums::Column::Name.eq(name))
            .one(&self.conn)
            .await
            .context("Failed to query forum by name")
    }

    pub async fn create(&self, name: &str, description: Option<&str>) -> Result<forums::Model> {
        let model = forums::ActiveModel {
            name: Set(name.to_string()),
            description: Set(description.map(ToString::to_string)),
            ..Default::default()
        };

        model.insert(&self.conn).await.context("Failed to insert forum")
    }

    pub async fn update(
        &self,
        id: i32,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<forums::Model>> {
        let forum = forums::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query forum for update")?;

        let Some(forum) = forum else {
            return Ok(None);
        };

        let mut active: forums::ActiveModel = forum.into();

        if let Some(name) = name {
            active.name = Set(name.to_string());
        }
        if let Some(description) = description {
            active.description = Set(Some(description.to_string()));
        }

        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to update forum")?;

        Ok(Some(updated))
    }

    /// Delete a forum and, child-first in one transaction, every topic it
    /// owns and every post under those topics. Returns false when the forum
    /// does not exist.
    pub async fn delete_cascade(&self, id: i32) -> Result<bool> {
        let forum = forums::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query forum for deletion")?;

        let Some(forum) = forum else {
            return Ok(false);
        };

        let txn = self.conn.begin().await.context("Failed to open transaction")?;

        let topic_ids: Vec<i32> = topics::Entity::find()
            .filter(topics::Column::ForumId.eq(forum.id))
            .select_only()
            .column(topics::Column::Id)
            .into_tuple()
            .all(&txn)
            .await
            .context("Failed to collect topic ids")?;

        if !topic_ids.is_empty() {
            posts::Entity::delete_many()
                .filter(posts::Column::TopicId.is_in(topic_ids.clone()))
                .exec(&txn)
                .await
                .context("Failed to delete posts in forum")?;

            topics::Entity::delete_many()
                .filter(topics::Column::Id.is_in(topic_ids))
                .exec(&txn)
                .await
                .context("Failed to delete topics in forum")?;
        }

        forums::Entity::delete_by_id(forum.id)
            .exec(&txn)
            .await
            .context("Failed to delete forum")?;

        txn.commit()
            .await
            .context("Failed to commit forum deletion")?;

        Ok(true)
    }
}

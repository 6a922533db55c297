use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use crate::entities::{posts, topics};

pub struct TopicRepository {
    conn: DatabaseConnection,
}

impl TopicRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list_for_forum(&self, forum_id: i32) -> Result<Vec<topics::Model>> {
        topics::Entity::find()
            .filter(topics::Column::ForumId.eq(forum_id))
            .order_by_asc(topics::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list topics for forum")
    }

    pub async fn list(&self) -> Result<Vec<topics::Model>> {
        topics::Entity::find()
            .order_by_asc(topics::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list topics")
    }

    pub async fn get(&self, id: i32) -> Result<Option<topics::Model>> {
        topics::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query topic by ID")
    }

    pub async fn create(
        &self,
        forum_id: i32,
        title: &str,
        content: Option<&str>,
    ) -> Result<topics::Model> {
        let model = topics::ActiveModel {
            title: Set(title.to_string()),
            content: Set(content.map(ToString::to_string)),
            forum_id: Set(forum_id),
            ..Default::default()
        };

        model.insert(&self.conn).await.context("Failed to insert topic")
    }

    pub async fn update(
        &self,
        id: i32,
        title: Option<&str>,
        content: Option<&str>,
        forum_id: Option<i32>,
    ) -> Result<Option<topics::Model>> {
        let topic = topics::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query topic for update")?;

        let Some(topic) = topic else {
            return Ok(None);
        };

        let mut active: topics::ActiveModel = topic.into();

        if let Some(title) = title {
            active.title = Set(title.to_string());
        }
        if let Some(content) = content {
            active.content = Set(Some(content.to_string()));
        }
        if let Some(forum_id) = forum_id {
            active.forum_id = Set(forum_id);
        }

        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to update topic")?;

        Ok(Some(updated))
    }

    /// Delete a topic and its posts in one transaction. Returns false when
    /// the topic does not exist.
    pub async fn delete_cascade(&self, id: i32) -> Result<bool> {
        let topic = topics::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query topic for deletion")?;

        let Some(topic) = topic else {
            return Ok(false);
        };

        let txn = self.conn.begin().await.context("Failed to open transaction")?;

        posts::Entity::delete_many()
            .filter(posts::Column::TopicId.eq(topic.id))
            .exec(&txn)
            .await
            .context("Failed to delete posts in topic")?;

        topics::Entity::delete_by_id(topic.id)
            .exec(&txn)
            .await
            .context("Failed to delete topic")?;

        txn.commit()
            .await
            .context("Failed to commit topic deletion")?;

        Ok(true)
    }
}

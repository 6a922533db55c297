use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::{posts, users};

pub struct PostRepository {
    conn: DatabaseConnection,
}

impl PostRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Posts in a topic, each paired with its author (if the author row is
    /// still live).
    pub async fn list_for_topic(
        &self,
        topic_id: i32,
    ) -> Result<Vec<(posts::Model, Option<users::Model>)>> {
        posts::Entity::find()
            .filter(posts::Column::TopicId.eq(topic_id))
            .order_by_asc(posts::Column::Id)
            .find_also_related(users::Entity)
            .all(&self.conn)
            .await
            .context("Failed to list posts for topic")
    }

    pub async fn list(&self) -> Result<Vec<posts::Model>> {
        posts::Entity::find()
            .order_by_asc(posts::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list posts")
    }

    pub async fn get(&self, id: i32) -> Result<Option<posts::Model>> {
        posts::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query post by ID")
    }

    pub async fn create(&self, topic_id: i32, user_id: i32, content: &str) -> Result<posts::Model> {
        let model = posts::ActiveModel {
            content: Set(content.to_string()),
            topic_id: Set(topic_id),
            user_id: Set(user_id),
            ..Default::default()
        };

        model.insert(&self.conn).await.context("Failed to insert post")
    }

    pub async fn update(&self, id: i32, content: Option<&str>) -> Result<Option<posts::Model>> {
        let post = posts::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query post for update")?;

        let Some(post) = post else {
            return Ok(None);
        };

        let mut active: posts::ActiveModel = post.into();

        if let Some(content) = content {
            active.content = Set(content.to_string());
        }

        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to update post")?;

        Ok(Some(updated))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = posts::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete post")?;

        Ok(result.rows_affected > 0)
    }
}

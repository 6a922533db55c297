use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::users::Role;
use crate::entities::{forums, posts, topics, users};

pub mod migrator;
pub mod repositories;

pub use repositories::user::User;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn forum_repo(&self) -> repositories::forum::ForumRepository {
        repositories::forum::ForumRepository::new(self.conn.clone())
    }

    fn topic_repo(&self) -> repositories::topic::TopicRepository {
        repositories::topic::TopicRepository::new(self.conn.clone())
    }

    fn post_repo(&self) -> repositories::post::PostRepository {
        repositories::post::PostRepository::new(self.conn.clone())
    }

    // ========== Users ==========

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.user_repo().list().await
    }

    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        role: Role,
        config: Option<&SecurityConfig>,
    ) -> Result<User> {
        self.user_repo()
            .create(username, password, role, config)
            .await
    }

    pub async fn verify_user_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>> {
        self.user_repo().verify_password(username, password).await
    }

    pub async fn update_user(
        &self,
        id: i32,
        username: Option<&str>,
        password: Option<&str>,
        role: Option<Role>,
        config: Option<&SecurityConfig>,
    ) -> Result<Option<User>> {
        self.user_repo()
            .update(id, username, password, role, config)
            .await
    }

    pub async fn delete_user_with_posts(&self, id: i32) -> Result<bool> {
        self.user_repo().delete_with_posts(id).await
    }

    // ========== Forums ==========

    pub async fn list_forums(&self) -> Result<Vec<forums::Model>> {
        self.forum_repo().list().await
    }

    pub async fn get_forum(&self, id: i32) -> Result<Option<forums::Model>> {
        self.forum_repo().get(id).await
    }

    pub async fn get_forum_by_name(&self, name: &str) -> Result<Option<forums::Model>> {
        self.forum_repo().get_by_name(name).await
    }

    pub async fn create_forum(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<forums::Model> {
        self.forum_repo().create(name, description).await
    }

    pub async fn update_forum(
        &self,
        id: i32,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<forums::Model>> {
        self.forum_repo().update(id, name, description).await
    }

    pub async fn delete_forum_cascade(&self, id: i32) -> Result<bool> {
        self.forum_repo().delete_cascade(id).await
    }

    // ========== Topics ==========

    pub async fn list_topics(&self, forum_id: i32) -> Result<Vec<topics::Model>> {
        self.topic_repo().list_for_forum(forum_id).await
    }

    pub async fn list_all_topics(&self) -> Result<Vec<topics::Model>> {
        self.topic_repo().list().await
    }

    pub async fn get_topic(&self, id: i32) -> Result<Option<topics::Model>> {
        self.topic_repo().get(id).await
    }

    pub async fn create_topic(
        &self,
        forum_id: i32,
        title: &str,
        content: Option<&str>,
    ) -> Result<topics::Model> {
        self.topic_repo().create(forum_id, title, content).await
    }

    pub async fn update_topic(
        &self,
        id: i32,
        title: Option<&str>,
        content: Option<&str>,
        forum_id: Option<i32>,
    ) -> Result<Option<topics::Model>> {
        self.topic_repo().update(id, title, content, forum_id).await
    }

    pub async fn delete_topic_cascade(&self, id: i32) -> Result<bool> {
        self.topic_repo().delete_cascade(id).await
    }

    // ========== Posts ==========

    pub async fn list_posts(
        &self,
        topic_id: i32,
    ) -> Result<Vec<(posts::Model, Option<users::Model>)>> {
        self.post_repo().list_for_topic(topic_id).await
    }

    pub async fn list_all_posts(&self) -> Result<Vec<posts::Model>> {
        self.post_repo().list().await
    }

    pub async fn get_post(&self, id: i32) -> Result<Option<posts::Model>> {
        self.post_repo().get(id).await
    }

    pub async fn create_post(
        &self,
        topic_id: i32,
        user_id: i32,
        content: &str,
    ) -> Result<posts::Model> {
        self.post_repo().create(topic_id, user_id, content).await
    }

    pub async fn update_post(&self, id: i32, content: Option<&str>) -> Result<Option<posts::Model>> {
        self.post_repo().update(id, content).await
    }

    pub async fn delete_post(&self, id: i32) -> Result<bool> {
        self.post_repo().delete(id).await
    }
}

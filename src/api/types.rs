use serde::Serialize;

use crate::db::User;
use crate::entities::users::Role;
use crate::entities::{forums, posts, topics, users};

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

#[derive(Debug, Serialize, Clone)]
pub struct UserDto {
    pub id: i32,
    pub username: String,
    pub role: Role,
    pub created_at: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

impl From<users::Model> for UserDto {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            role: model.role,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct ForumDto {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

impl From<forums::Model> for ForumDto {
    fn from(model: forums::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct TopicDto {
    pub id: i32,
    pub title: String,
    pub content: Option<String>,
    pub forum_id: i32,
}

impl From<topics::Model> for TopicDto {
    fn from(model: topics::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            content: model.content,
            forum_id: model.forum_id,
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct PostDto {
    pub id: i32,
    pub content: String,
    pub topic_id: i32,
    pub user_id: i32,
    /// Author username, when the author row is still live.
    pub username: Option<String>,
}

impl From<(posts::Model, Option<users::Model>)> for PostDto {
    fn from((post, author): (posts::Model, Option<users::Model>)) -> Self {
        Self {
            id: post.id,
            content: post.content,
            topic_id: post.topic_id,
            user_id: post.user_id,
            username: author.map(|u| u.username),
        }
    }
}

/// Context every page view carries: who is looking at it.
#[derive(Debug, Serialize)]
pub struct PageContext {
    pub current_user: Option<UserDto>,
}

#[derive(Debug, Serialize)]
pub struct HomePage {
    pub forums: Vec<ForumDto>,
    pub current_user: Option<UserDto>,
}

#[derive(Debug, Serialize)]
pub struct ForumsPage {
    pub forums: Vec<ForumDto>,
    pub current_user: UserDto,
}

#[derive(Debug, Serialize)]
pub struct TopicsPage {
    pub forum: ForumDto,
    pub topics: Vec<TopicDto>,
    pub current_user: UserDto,
}

#[derive(Debug, Serialize)]
pub struct DiscussionPage {
    pub topic: TopicDto,
    pub posts: Vec<PostDto>,
    pub current_user: UserDto,
}

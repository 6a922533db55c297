use axum::{
    Json,
    extract::{Path, Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::current_user;
use super::{ApiError, ApiResponse, AppState, ForumDto, PostDto, TopicDto, UserDto};
use crate::constants::FALLBACK_FORUM_ID;
use crate::entities::users::Role;

// ============================================================================
// Middleware
// ============================================================================

/// Console gate: anonymous sessions go to the login page, signed-in
/// non-admins go home.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    session: Session,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match current_user(&state, &session).await? {
        Some(user) if user.is_admin() => Ok(next.run(request).await),
        Some(_) => Ok(Redirect::to("/").into_response()),
        None => Ok(Redirect::to("/login").into_response()),
    }
}

/// GET /admin
pub async fn console_home() -> Redirect {
    Redirect::to("/admin/users")
}

// ============================================================================
// Users
// ============================================================================

#[derive(Deserialize)]
pub struct CreateUserForm {
    pub username: String,
    pub password: String,
    pub role: Option<Role>,
}

#[derive(Deserialize)]
pub struct UpdateUserForm {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ApiError> {
    let users = state.store().list_users().await?;
    Ok(Json(ApiResponse::success(
        users.into_iter().map(UserDto::from).collect(),
    )))
}

/// The supplied password is hashed before it is persisted, same as at
/// registration.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    axum::Form(form): axum::Form<CreateUserForm>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    if state
        .store()
        .get_user_by_username(&form.username)
        .await?
        .is_some()
    {
        return Err(ApiError::conflict("Username already exists"));
    }

    let user = state
        .store()
        .create_user(
            &form.username,
            &form.password,
            form.role.unwrap_or(Role::User),
            Some(&state.config().security),
        )
        .await?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    axum::Form(form): axum::Form<UpdateUserForm>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let updated = state
        .store()
        .update_user(
            id,
            form.username.as_deref(),
            form.password.as_deref(),
            form.role,
            Some(&state.config().security),
        )
        .await?
        .ok_or_else(|| ApiError::not_found("User", id))?;

    Ok(Json(ApiResponse::success(UserDto::from(updated))))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    let deleted = state.store().delete_user_with_posts(id).await?;
    if deleted {
        Ok(Json(ApiResponse::success(true)))
    } else {
        Err(ApiError::not_found("User", id))
    }
}

// ============================================================================
// Forums
// ============================================================================

#[derive(Deserialize)]
pub struct CreateForumForm {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateForumForm {
    pub name: Option<String>,
    pub description: Option<String>,
}

pub async fn list_forums(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<ForumDto>>>, ApiError> {
    let forums = state.store().list_forums().await?;
    Ok(Json(ApiResponse::success(
        forums.into_iter().map(ForumDto::from).collect(),
    )))
}

pub async fn create_forum(
    State(state): State<Arc<AppState>>,
    axum::Form(form): axum::Form<CreateForumForm>,
) -> Result<Json<ApiResponse<ForumDto>>, ApiError> {
    if state.store().get_forum_by_name(&form.name).await?.is_some() {
        return Err(ApiError::conflict("Forum name already exists"));
    }

    let forum = state
        .store()
        .create_forum(&form.name, form.description.as_deref())
        .await?;

    Ok(Json(ApiResponse::success(ForumDto::from(forum))))
}

pub async fn update_forum(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    axum::Form(form): axum::Form<UpdateForumForm>,
) -> Result<Json<ApiResponse<ForumDto>>, ApiError> {
    let updated = state
        .store()
        .update_forum(id, form.name.as_deref(), form.description.as_deref())
        .await?
        .ok_or_else(|| ApiError::not_found("Forum", id))?;

    Ok(Json(ApiResponse::success(ForumDto::from(updated))))
}

pub async fn delete_forum(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    let deleted = state.store().delete_forum_cascade(id).await?;
    if deleted {
        Ok(Json(ApiResponse::success(true)))
    } else {
        Err(ApiError::not_found("Forum", id))
    }
}

// ============================================================================
// Topics
// ============================================================================

#[derive(Deserialize)]
pub struct CreateTopicForm {
    pub title: String,
    pub content: Option<String>,
    pub forum_id: Option<i32>,
}

#[derive(Deserialize)]
pub struct UpdateTopicForm {
    pub title: Option<String>,
    pub content: Option<String>,
    pub forum_id: Option<i32>,
}

pub async fn list_topics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<TopicDto>>>, ApiError> {
    let topics = state.store().list_all_topics().await?;
    Ok(Json(ApiResponse::success(
        topics.into_iter().map(TopicDto::from).collect(),
    )))
}

/// A topic created without a forum lands in the fallback forum, which the
/// initial migration guarantees to exist.
pub async fn create_topic(
    State(state): State<Arc<AppState>>,
    axum::Form(form): axum::Form<CreateTopicForm>,
) -> Result<Json<ApiResponse<TopicDto>>, ApiError> {
    let forum_id = form.forum_id.unwrap_or(FALLBACK_FORUM_ID);

    if state.store().get_forum(forum_id).await?.is_none() {
        return Err(ApiError::not_found("Forum", forum_id));
    }

    let topic = state
        .store()
        .create_topic(forum_id, &form.title, form.content.as_deref())
        .await?;

    Ok(Json(ApiResponse::success(TopicDto::from(topic))))
}

pub async fn update_topic(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    axum::Form(form): axum::Form<UpdateTopicForm>,
) -> Result<Json<ApiResponse<TopicDto>>, ApiError> {
    if let Some(forum_id) = form.forum_id
        && state.store().get_forum(forum_id).await?.is_none()
    {
        return Err(ApiError::not_found("Forum", forum_id));
    }

    let updated = state
        .store()
        .update_topic(
            id,
            form.title.as_deref(),
            form.content.as_deref(),
            form.forum_id,
        )
        .await?
        .ok_or_else(|| ApiError::not_found("Topic", id))?;

    Ok(Json(ApiResponse::success(TopicDto::from(updated))))
}

pub async fn delete_topic(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    let deleted = state.store().delete_topic_cascade(id).await?;
    if deleted {
        Ok(Json(ApiResponse::success(true)))
    } else {
        Err(ApiError::not_found("Topic", id))
    }
}

// ============================================================================
// Posts
// ============================================================================

#[derive(Deserialize)]
pub struct CreatePostForm {
    pub content: String,
    pub topic_id: i32,
    pub user_id: i32,
}

#[derive(Deserialize)]
pub struct UpdatePostForm {
    pub content: Option<String>,
}

pub async fn list_posts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<PostDto>>>, ApiError> {
    let posts = state.store().list_all_posts().await?;
    Ok(Json(ApiResponse::success(
        posts.into_iter().map(|p| PostDto::from((p, None))).collect(),
    )))
}

pub async fn create_post(
    State(state): State<Arc<AppState>>,
    axum::Form(form): axum::Form<CreatePostForm>,
) -> Result<Json<ApiResponse<PostDto>>, ApiError> {
    if state.store().get_topic(form.topic_id).await?.is_none() {
        return Err(ApiError::not_found("Topic", form.topic_id));
    }
    if state.store().get_user(form.user_id).await?.is_none() {
        return Err(ApiError::not_found("User", form.user_id));
    }

    let post = state
        .store()
        .create_post(form.topic_id, form.user_id, &form.content)
        .await?;

    Ok(Json(ApiResponse::success(PostDto::from((post, None)))))
}

pub async fn update_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    axum::Form(form): axum::Form<UpdatePostForm>,
) -> Result<Json<ApiResponse<PostDto>>, ApiError> {
    let updated = state
        .store()
        .update_post(id, form.content.as_deref())
        .await?
        .ok_or_else(|| ApiError::not_found("Post", id))?;

    Ok(Json(ApiResponse::success(PostDto::from((updated, None)))))
}

pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    let deleted = state.store().delete_post(id).await?;
    if deleted {
        Ok(Json(ApiResponse::success(true)))
    } else {
        Err(ApiError::not_found("Post", id))
    }
}

use axum::{
    Json,
    extract::{Path, State},
    response::Redirect,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::require_session_user;
use super::{ApiError, ApiResponse, AppState, DiscussionPage, TopicDto, UserDto};

#[derive(Deserialize)]
pub struct AddPostForm {
    pub content: String,
}

/// GET /discussion/{topic_id}
pub async fn discussion_page(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(topic_id): Path<i32>,
) -> Result<Json<ApiResponse<DiscussionPage>>, ApiError> {
    let user = require_session_user(&state, &session).await?;

    let topic = state
        .store()
        .get_topic(topic_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Topic", topic_id))?;

    let posts = state.store().list_posts(topic_id).await?;

    Ok(Json(ApiResponse::success(DiscussionPage {
        topic: TopicDto::from(topic),
        posts: posts.into_iter().map(Into::into).collect(),
        current_user: UserDto::from(user),
    })))
}

/// POST /add_post/{topic_id}
/// The author is always the session user.
pub async fn add_post(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(topic_id): Path<i32>,
    axum::Form(form): axum::Form<AddPostForm>,
) -> Result<Redirect, ApiError> {
    let user = require_session_user(&state, &session).await?;

    if state.store().get_topic(topic_id).await?.is_none() {
        return Err(ApiError::not_found("Topic", topic_id));
    }

    state
        .store()
        .create_post(topic_id, user.id, &form.content)
        .await?;

    Ok(Redirect::to(&format!("/discussion/{}", topic_id)))
}

/// POST /delete_post/{post_id}/{topic_id}
/// Permitted for the admin role or the post's author; anyone else falls
/// through to the redirect without effect.
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path((post_id, topic_id)): Path<(i32, i32)>,
) -> Result<Redirect, ApiError> {
    let user = require_session_user(&state, &session).await?;

    if let Some(post) = state.store().get_post(post_id).await?
        && (user.is_admin() || user.id == post.user_id)
    {
        state.store().delete_post(post_id).await?;
    }

    Ok(Redirect::to(&format!("/discussion/{}", topic_id)))
}

use axum::{
    Json,
    extract::{Path, State},
    response::Redirect,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::require_session_user;
use super::{ApiError, ApiResponse, AppState, ForumDto, TopicsPage, UserDto};

#[derive(Deserialize)]
pub struct AddTopicForm {
    pub title: String,
    pub content: Option<String>,
}

#[derive(Serialize)]
pub struct AddTopicPage {
    pub forum: ForumDto,
    pub current_user: UserDto,
}

/// GET /topics/{forum_id}
pub async fn topics_page(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(forum_id): Path<i32>,
) -> Result<Json<ApiResponse<TopicsPage>>, ApiError> {
    let user = require_session_user(&state, &session).await?;

    let forum = state
        .store()
        .get_forum(forum_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Forum", forum_id))?;

    let topics = state.store().list_topics(forum_id).await?;

    Ok(Json(ApiResponse::success(TopicsPage {
        forum: ForumDto::from(forum),
        topics: topics.into_iter().map(Into::into).collect(),
        current_user: UserDto::from(user),
    })))
}

/// GET /add_topic/{forum_id}
pub async fn add_topic_page(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(forum_id): Path<i32>,
) -> Result<Json<ApiResponse<AddTopicPage>>, ApiError> {
    let user = require_session_user(&state, &session).await?;

    let forum = state
        .store()
        .get_forum(forum_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Forum", forum_id))?;

    Ok(Json(ApiResponse::success(AddTopicPage {
        forum: ForumDto::from(forum),
        current_user: UserDto::from(user),
    })))
}

/// POST /add_topic/{forum_id}
pub async fn add_topic(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(forum_id): Path<i32>,
    axum::Form(form): axum::Form<AddTopicForm>,
) -> Result<Redirect, ApiError> {
    require_session_user(&state, &session).await?;

    if state.store().get_forum(forum_id).await?.is_none() {
        return Err(ApiError::not_found("Forum", forum_id));
    }

    state
        .store()
        .create_topic(forum_id, &form.title, form.content.as_deref())
        .await?;

    Ok(Redirect::to(&format!("/topics/{}", forum_id)))
}

/// POST /delete_topic/{id}
/// Admin only. A missing topic is reported as not-found rather than
/// crashing while building the redirect.
pub async fn delete_topic(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(topic_id): Path<i32>,
) -> Result<Redirect, ApiError> {
    let user = require_session_user(&state, &session).await?;

    let topic = state
        .store()
        .get_topic(topic_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Topic", topic_id))?;

    if user.is_admin() {
        state.store().delete_topic_cascade(topic_id).await?;
        tracing::info!("Topic {} deleted by {}", topic_id, user.username);
    }

    Ok(Redirect::to(&format!("/topics/{}", topic.forum_id)))
}

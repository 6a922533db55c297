use axum::{
    Json,
    extract::{Path, State},
    response::Redirect,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::require_session_user;
use super::{ApiError, ApiResponse, AppState, ForumsPage, PageContext, UserDto};

#[derive(Deserialize)]
pub struct AddForumForm {
    pub name: String,
    pub description: Option<String>,
}

/// GET /forums
pub async fn forums_page(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<ForumsPage>>, ApiError> {
    let user = require_session_user(&state, &session).await?;
    let forums = state.store().list_forums().await?;

    Ok(Json(ApiResponse::success(ForumsPage {
        forums: forums.into_iter().map(Into::into).collect(),
        current_user: UserDto::from(user),
    })))
}

/// GET /add_forum
pub async fn add_forum_page(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<PageContext>>, ApiError> {
    let user = require_session_user(&state, &session).await?;
    Ok(Json(ApiResponse::success(PageContext {
        current_user: Some(UserDto::from(user)),
    })))
}

/// POST /add_forum
/// Any signed-in user may create a forum; there is no role check.
pub async fn add_forum(
    State(state): State<Arc<AppState>>,
    session: Session,
    axum::Form(form): axum::Form<AddForumForm>,
) -> Result<Redirect, ApiError> {
    require_session_user(&state, &session).await?;

    if state.store().get_forum_by_name(&form.name).await?.is_some() {
        return Err(ApiError::conflict("Forum name already exists"));
    }

    state
        .store()
        .create_forum(&form.name, form.description.as_deref())
        .await?;

    Ok(Redirect::to("/forums"))
}

/// POST /delete_forum/{id}
/// Admin only. Non-admins and missing forums fall through to the same
/// redirect without effect.
pub async fn delete_forum(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(forum_id): Path<i32>,
) -> Result<Redirect, ApiError> {
    let user = require_session_user(&state, &session).await?;

    if user.is_admin() {
        let deleted = state.store().delete_forum_cascade(forum_id).await?;
        if deleted {
            tracing::info!("Forum {} deleted by {}", forum_id, user.username);
        }
    }

    Ok(Redirect::to("/forums"))
}

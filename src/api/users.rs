use axum::{
    extract::{Path, State},
    response::Redirect,
};
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::require_session_user;
use super::{ApiError, AppState};

/// POST /delete_user/{id}
/// Admin only; removes the user and all their posts. Non-admins fall
/// through to the redirect without effect.
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(user_id): Path<i32>,
) -> Result<Redirect, ApiError> {
    let user = require_session_user(&state, &session).await?;

    if user.is_admin() {
        let deleted = state.store().delete_user_with_posts(user_id).await?;
        if deleted {
            tracing::info!("User {} deleted by {}", user_id, user.username);
        }
    }

    Ok(Redirect::to("/"))
}

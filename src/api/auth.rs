use axum::{
    Json,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState, HomePage, PageContext, UserDto};
use crate::constants::{MIN_PASSWORD_LEN, MIN_USERNAME_LEN, SESSION_USER_KEY};
use crate::db::User;
use crate::entities::users::Role;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Gate for pages that require a signed-in user. Anonymous or stale
/// sessions are redirected to the login page.
pub async fn require_user(
    State(state): State<Arc<AppState>>,
    session: Session,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if current_user(&state, &session).await?.is_some() {
        return Ok(next.run(request).await);
    }

    Ok(Redirect::to("/login").into_response())
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /
/// Forum summary; the current user is included if a session exists.
pub async fn home(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<HomePage>>, ApiError> {
    let current_user = current_user(&state, &session).await?;
    let forums = state.store().list_forums().await?;

    Ok(Json(ApiResponse::success(HomePage {
        forums: forums.into_iter().map(Into::into).collect(),
        current_user: current_user.map(UserDto::from),
    })))
}

/// GET /register
pub async fn register_page(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<PageContext>>, ApiError> {
    let current_user = current_user(&state, &session).await?;
    Ok(Json(ApiResponse::success(PageContext {
        current_user: current_user.map(UserDto::from),
    })))
}

/// POST /register
/// Create an account, start a session, redirect home.
pub async fn register(
    State(state): State<Arc<AppState>>,
    session: Session,
    axum::Form(form): axum::Form<RegisterForm>,
) -> Result<Redirect, ApiError> {
    // Character counts, not byte lengths, so multibyte names measure right.
    if form.username.chars().count() < MIN_USERNAME_LEN {
        return Err(ApiError::validation(format!(
            "Username must be at least {} characters",
            MIN_USERNAME_LEN
        )));
    }
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

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
            Role::User,
            Some(&state.config().security),
        )
        .await?;

    start_session(&session, user.id).await?;
    tracing::info!("New user registered: {}", user.username);

    Ok(Redirect::to("/"))
}

/// GET /login
pub async fn login_page(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<PageContext>>, ApiError> {
    let current_user = current_user(&state, &session).await?;
    Ok(Json(ApiResponse::success(PageContext {
        current_user: current_user.map(UserDto::from),
    })))
}

/// POST /login
/// A login attempt while already signed in redirects to the profile
/// without re-authenticating.
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    axum::Form(form): axum::Form<LoginForm>,
) -> Result<Redirect, ApiError> {
    if current_user(&state, &session).await?.is_some() {
        return Ok(Redirect::to("/profile"));
    }

    let user = state
        .store()
        .verify_user_password(&form.username, &form.password)
        .await?;

    // Unknown username and wrong password read the same to the caller.
    let Some(user) = user else {
        return Err(ApiError::Unauthorized(
            "Invalid username or password".to_string(),
        ));
    };

    start_session(&session, user.id).await?;

    Ok(Redirect::to("/"))
}

/// GET /logout
pub async fn logout(session: Session) -> Result<Redirect, ApiError> {
    session
        .flush()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to end session: {e}")))?;

    Ok(Redirect::to("/login"))
}

/// GET /profile
pub async fn profile(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = require_session_user(&state, &session).await?;
    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

// ============================================================================
// Helpers
// ============================================================================

async fn start_session(session: &Session, user_id: i32) -> Result<(), ApiError> {
    session
        .insert(SESSION_USER_KEY, user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))
}

/// Resolve the session to a live user record, if any. A stale id (the user
/// was deleted since login) resolves to None.
pub async fn current_user(state: &AppState, session: &Session) -> Result<Option<User>, ApiError> {
    let user_id = session
        .get::<i32>(SESSION_USER_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;

    match user_id {
        Some(id) => Ok(state.store().get_user(id).await?),
        None => Ok(None),
    }
}

/// Like `current_user`, but an absent session is an error. Handlers behind
/// `require_user` use this to fetch who is acting.
pub async fn require_session_user(state: &AppState, session: &Session) -> Result<User, ApiError> {
    current_user(state, session)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))
}

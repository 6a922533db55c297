use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::db::Store;

mod admin;
pub mod auth;
mod error;
mod forums;
mod posts;
mod topics;
mod types;
mod users;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    config: Config,
    store: Store,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }
}

#[must_use]
pub fn create_app_state(config: Config, store: Store) -> Arc<AppState> {
    Arc::new(AppState { config, store })
}

#[must_use]
pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config().server.cors_allowed_origins.clone();
    let secure_cookies = state.config().server.secure_cookies;
    let inactivity_minutes = state.config().server.session_inactivity_minutes;

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            inactivity_minutes,
        )));

    let public_routes = Router::new()
        .route("/", get(auth::home))
        .route("/register", get(auth::register_page))
        .route("/register", post(auth::register))
        .route("/login", get(auth::login_page))
        .route("/login", post(auth::login))
        .route("/logout", get(auth::logout));

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .merge(public_routes)
        .merge(create_protected_router(state.clone()))
        .nest("/admin", create_admin_router(state.clone()))
        .layer(session_layer)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/profile", get(auth::profile))
        .route("/forums", get(forums::forums_page))
        .route("/add_forum", get(forums::add_forum_page))
        .route("/add_forum", post(forums::add_forum))
        .route("/topics/{forum_id}", get(topics::topics_page))
        .route("/add_topic/{forum_id}", get(topics::add_topic_page))
        .route("/add_topic/{forum_id}", post(topics::add_topic))
        .route("/discussion/{topic_id}", get(posts::discussion_page))
        .route("/add_post/{topic_id}", post(posts::add_post))
        .route("/delete_user/{id}", post(users::delete_user))
        .route("/delete_forum/{id}", post(forums::delete_forum))
        .route("/delete_topic/{id}", post(topics::delete_topic))
        .route(
            "/delete_post/{post_id}/{topic_id}",
            post(posts::delete_post),
        )
        .route_layer(middleware::from_fn_with_state(state, auth::require_user))
}

fn create_admin_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(admin::console_home))
        .route("/users", get(admin::list_users))
        .route("/users", post(admin::create_user))
        .route("/users/{id}", put(admin::update_user))
        .route("/users/{id}", delete(admin::delete_user))
        .route("/forums", get(admin::list_forums))
        .route("/forums", post(admin::create_forum))
        .route("/forums/{id}", put(admin::update_forum))
        .route("/forums/{id}", delete(admin::delete_forum))
        .route("/topics", get(admin::list_topics))
        .route("/topics", post(admin::create_topic))
        .route("/topics/{id}", put(admin::update_topic))
        .route("/topics/{id}", delete(admin::delete_topic))
        .route("/posts", get(admin::list_posts))
        .route("/posts", post(admin::create_post))
        .route("/posts/{id}", put(admin::update_post))
        .route("/posts/{id}", delete(admin::delete_post))
        .route_layer(middleware::from_fn_with_state(state, admin::require_admin))
}

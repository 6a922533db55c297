use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use quorum::config::Config;
use quorum::db::Store;
use tower::ServiceExt;

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;

    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await
    .expect("Failed to create store");

    let state = quorum::api::create_app_state(config, store);
    quorum::api::router(state)
}

fn form_request(uri: &str, cookie: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .header(header::COOKIE, cookie)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: Response<axum::body::Body>) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn register(app: &Router, username: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/register")
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(Body::from(format!(
                    "username={}&password={}",
                    username, password
                )))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("expected a session cookie")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(Body::from(format!(
                    "username={}&password={}",
                    username, password
                )))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("expected a session cookie")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_forum_topic_post_flow() {
    let app = spawn_app().await;
    let cookie = register(&app, "ferris", "crabcakes").await;

    // Create a forum.
    let response = app
        .clone()
        .oneshot(form_request(
            "/add_forum",
            &cookie,
            "name=Rustaceans&description=All+things+Rust",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app
        .clone()
        .oneshot(get_request("/forums", &cookie))
        .await
        .unwrap();
    let body = body_json(response).await;
    let forum = body["data"]["forums"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["name"] == "Rustaceans")
        .expect("forum should exist")
        .clone();
    let forum_id = forum["id"].as_i64().unwrap();
    assert_eq!(forum["description"], "All things Rust");

    // Create a topic in it.
    let response = app
        .clone()
        .oneshot(form_request(
            &format!("/add_topic/{}", forum_id),
            &cookie,
            "title=Borrow+checker+tips&content=Share+yours",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app
        .clone()
        .oneshot(get_request(&format!("/topics/{}", forum_id), &cookie))
        .await
        .unwrap();
    let body = body_json(response).await;
    let topic_id = body["data"]["topics"][0]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["topics"][0]["title"], "Borrow checker tips");

    // Post a reply.
    let response = app
        .clone()
        .oneshot(form_request(
            &format!("/add_post/{}", topic_id),
            &cookie,
            "content=Clone+less%2C+borrow+more",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app
        .clone()
        .oneshot(get_request(&format!("/discussion/{}", topic_id), &cookie))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["posts"][0]["content"], "Clone less, borrow more");
    assert_eq!(body["data"]["posts"][0]["username"], "ferris");
}

#[tokio::test]
async fn test_duplicate_forum_name_rejected() {
    let app = spawn_app().await;
    let cookie = register(&app, "ferris", "crabcakes").await;

    let response = app
        .clone()
        .oneshot(form_request("/add_forum", &cookie, "name=General"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Forum name already exists");
}

#[tokio::test]
async fn test_topics_page_for_missing_forum_is_not_found() {
    let app = spawn_app().await;
    let cookie = register(&app, "ferris", "crabcakes").await;

    let response = app
        .clone()
        .oneshot(get_request("/topics/9999", &cookie))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_admin_delete_forum_is_a_no_op() {
    let app = spawn_app().await;
    let cookie = register(&app, "ferris", "crabcakes").await;

    // The seeded forum has id 1.
    let response = app
        .clone()
        .oneshot(form_request("/delete_forum/1", &cookie, ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app
        .clone()
        .oneshot(get_request("/forums", &cookie))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["forums"][0]["name"], "General");
}

#[tokio::test]
async fn test_admin_delete_missing_forum_is_a_no_op() {
    let app = spawn_app().await;
    let admin = login(&app, "admin", "password").await;

    let response = app
        .clone()
        .oneshot(form_request("/delete_forum/9999", &admin, ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/forums");

    // Nothing was removed.
    let response = app
        .clone()
        .oneshot(get_request("/forums", &admin))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["forums"][0]["name"], "General");
}

#[tokio::test]
async fn test_admin_delete_forum_cascades() {
    let app = spawn_app().await;
    let admin = login(&app, "admin", "password").await;

    let response = app
        .clone()
        .oneshot(form_request("/add_forum", &admin, "name=Doomed"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app
        .clone()
        .oneshot(get_request("/forums", &admin))
        .await
        .unwrap();
    let body = body_json(response).await;
    let forum_id = body["data"]["forums"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["name"] == "Doomed")
        .unwrap()["id"]
        .as_i64()
        .unwrap();

    app.clone()
        .oneshot(form_request(
            &format!("/add_topic/{}", forum_id),
            &admin,
            "title=Last+words",
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(form_request(
            &format!("/delete_forum/{}", forum_id),
            &admin,
            "",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    // The forum and its topics are gone.
    let response = app
        .clone()
        .oneshot(get_request(&format!("/topics/{}", forum_id), &admin))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_topic_requires_admin_and_existing_topic() {
    let app = spawn_app().await;
    let admin = login(&app, "admin", "password").await;
    let user = register(&app, "ferris", "crabcakes").await;

    let response = app
        .clone()
        .oneshot(form_request("/delete_topic/9999", &admin, ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    app.clone()
        .oneshot(form_request("/add_topic/1", &admin, "title=Sticky"))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get_request("/topics/1", &admin))
        .await
        .unwrap();
    let body = body_json(response).await;
    let topic_id = body["data"]["topics"][0]["id"].as_i64().unwrap();

    // A regular user gets the redirect but the topic survives.
    let response = app
        .clone()
        .oneshot(form_request(&format!("/delete_topic/{}", topic_id), &user, ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app
        .clone()
        .oneshot(get_request("/topics/1", &admin))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["topics"].as_array().unwrap().len(), 1);

    // The admin actually removes it.
    let response = app
        .clone()
        .oneshot(form_request(
            &format!("/delete_topic/{}", topic_id),
            &admin,
            "",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app
        .clone()
        .oneshot(get_request("/topics/1", &admin))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert!(body["data"]["topics"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_post_allowed_for_author_or_admin_only() {
    let app = spawn_app().await;
    let author = register(&app, "author1", "crabcakes").await;
    let other = register(&app, "bystander", "crabcakes").await;

    app.clone()
        .oneshot(form_request("/add_topic/1", &author, "title=Thread"))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get_request("/topics/1", &author))
        .await
        .unwrap();
    let body = body_json(response).await;
    let topic_id = body["data"]["topics"][0]["id"].as_i64().unwrap();

    app.clone()
        .oneshot(form_request(
            &format!("/add_post/{}", topic_id),
            &author,
            "content=mine",
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get_request(&format!("/discussion/{}", topic_id), &author))
        .await
        .unwrap();
    let body = body_json(response).await;
    let post_id = body["data"]["posts"][0]["id"].as_i64().unwrap();

    // Someone else's delete is a silent no-op.
    let response = app
        .clone()
        .oneshot(form_request(
            &format!("/delete_post/{}/{}", post_id, topic_id),
            &other,
            "",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app
        .clone()
        .oneshot(get_request(&format!("/discussion/{}", topic_id), &other))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["posts"].as_array().unwrap().len(), 1);

    // The author's delete goes through.
    let response = app
        .clone()
        .oneshot(form_request(
            &format!("/delete_post/{}/{}", post_id, topic_id),
            &author,
            "",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app
        .clone()
        .oneshot(get_request(&format!("/discussion/{}", topic_id), &author))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert!(body["data"]["posts"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_admin_can_delete_another_users_post() {
    let app = spawn_app().await;
    let author = register(&app, "author1", "crabcakes").await;
    let admin = login(&app, "admin", "password").await;

    app.clone()
        .oneshot(form_request("/add_topic/1", &author, "title=Thread"))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get_request("/topics/1", &author))
        .await
        .unwrap();
    let body = body_json(response).await;
    let topic_id = body["data"]["topics"][0]["id"].as_i64().unwrap();

    app.clone()
        .oneshot(form_request(
            &format!("/add_post/{}", topic_id),
            &author,
            "content=not+mine+to+keep",
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get_request(&format!("/discussion/{}", topic_id), &author))
        .await
        .unwrap();
    let body = body_json(response).await;
    let post_id = body["data"]["posts"][0]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(form_request(
            &format!("/delete_post/{}/{}", post_id, topic_id),
            &admin,
            "",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app
        .clone()
        .oneshot(get_request(&format!("/discussion/{}", topic_id), &author))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert!(body["data"]["posts"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_admin_delete_user_removes_their_posts() {
    let app = spawn_app().await;
    let admin = login(&app, "admin", "password").await;
    let doomed = register(&app, "shortlived", "crabcakes").await;

    app.clone()
        .oneshot(form_request("/add_topic/1", &admin, "title=Thread"))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get_request("/topics/1", &admin))
        .await
        .unwrap();
    let body = body_json(response).await;
    let topic_id = body["data"]["topics"][0]["id"].as_i64().unwrap();

    app.clone()
        .oneshot(form_request(
            &format!("/add_post/{}", topic_id),
            &doomed,
            "content=soon+gone",
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get_request("/admin/users", &admin))
        .await
        .unwrap();
    let body = body_json(response).await;
    let user_id = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["username"] == "shortlived")
        .unwrap()["id"]
        .as_i64()
        .unwrap();

    let response = app
        .clone()
        .oneshot(form_request(&format!("/delete_user/{}", user_id), &admin, ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app
        .clone()
        .oneshot(get_request(&format!("/discussion/{}", topic_id), &admin))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert!(body["data"]["posts"].as_array().unwrap().is_empty());
}

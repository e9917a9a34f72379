use axum::{
    http::{self, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use mock_server::{app, AuthBody, Post, User};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn request(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<String> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Token {token}"));
    }
    builder.body(body.to_string()).unwrap()
}

const ADA: &str = r#"{"username":"ada","email":"ada@example.com","password":"secret1",
    "ANumber":"A0001","first_name":"Ada","last_name":"Lovelace"}"#;

async fn send(app: &Router, req: Request<String>) -> axum::response::Response {
    app.clone().oneshot(req).await.unwrap()
}

async fn register_ada(app: &Router) -> AuthBody {
    let resp = send(app, request("POST", "/api/auth/register/", None, ADA)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await
}

async fn create(app: &Router, token: &str, body: &str) -> Post {
    let resp = send(app, request("POST", "/api/posts/", Some(token), body)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await
}

// --- auth ---

#[tokio::test]
async fn register_returns_token_and_user() {
    let app = app();
    let auth = register_ada(&app).await;
    assert_eq!(auth.user.email, "ada@example.com");
    assert_eq!(auth.user.a_number, "A0001");
    assert!(!auth.token.is_empty());
}

#[tokio::test]
async fn register_duplicate_email_is_field_error() {
    let app = app();
    register_ada(&app).await;
    let resp = send(&app, request("POST", "/api/auth/register/", None, ADA)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert!(body["email"][0].as_str().unwrap().contains("already exists"));
    assert!(body.get("message").is_none());
}

#[tokio::test]
async fn register_missing_fields_lists_each_one() {
    let app = app();
    let resp = send(
        &app,
        request("POST", "/api/auth/register/", None, r#"{"email":"x@y.z"}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    for field in ["username", "password", "ANumber", "first_name", "last_name"] {
        assert!(body[field].is_array(), "missing error for {field}");
    }
}

#[tokio::test]
async fn login_reuses_registration_token() {
    let app = app();
    let registered = register_ada(&app).await;
    let resp = send(
        &app,
        request(
            "POST",
            "/api/auth/login/",
            None,
            r#"{"email":"ada@example.com","password":"secret1"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let auth: AuthBody = body_json(resp).await;
    assert_eq!(auth.token, registered.token);
    assert_eq!(auth.user, registered.user);
}

#[tokio::test]
async fn login_wrong_password_returns_message() {
    let app = app();
    register_ada(&app).await;
    let resp = send(
        &app,
        request(
            "POST",
            "/api/auth/login/",
            None,
            r#"{"email":"ada@example.com","password":"nope"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = body_json(resp).await;
    assert_eq!(body["message"], "Invalid credentials");
}

#[tokio::test]
async fn current_user_requires_token() {
    let app = app();
    let auth = register_ada(&app).await;

    let resp = send(&app, request("GET", "/api/auth/user/", None, "")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = body_json(resp).await;
    assert_eq!(body["detail"], "Authentication credentials were not provided.");

    let resp = send(&app, request("GET", "/api/auth/user/", Some("bogus"), "")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = body_json(resp).await;
    assert_eq!(body["detail"], "Invalid token.");

    let resp = send(&app, request("GET", "/api/auth/user/", Some(&auth.token), "")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let user: User = body_json(resp).await;
    assert_eq!(user, auth.user);
}

// --- posts ---

#[tokio::test]
async fn create_post_defaults_to_draft() {
    let app = app();
    let auth = register_ada(&app).await;
    let post = create(
        &app,
        &auth.token,
        r#"{"Title":"Campus laundry","Description":"Pickup service","Category":"retail"}"#,
    )
    .await;
    assert_eq!(post.status, "draft");
    assert_eq!(post.category, "retail");
    assert_eq!(post.author.id, auth.user.id);
}

#[tokio::test]
async fn create_post_invalid_category_is_400() {
    let app = app();
    let auth = register_ada(&app).await;
    let resp = send(
        &app,
        request(
            "POST",
            "/api/posts/",
            Some(&auth.token),
            r#"{"Title":"x","Description":"y","Category":"space"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn publish_moves_post_into_published_list() {
    let app = app();
    let auth = register_ada(&app).await;
    let post = create(&app, &auth.token, r#"{"Title":"A","Description":"B"}"#).await;

    let resp = send(&app, request("GET", "/api/posts/published/", Some(&auth.token), "")).await;
    let published: Vec<Post> = body_json(resp).await;
    assert!(published.is_empty());

    let uri = format!("/api/posts/{}/publish/", post.id);
    let resp = send(&app, request("POST", &uri, Some(&auth.token), "")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let published_post: Post = body_json(resp).await;
    assert_eq!(published_post.status, "published");

    let resp = send(&app, request("GET", "/api/posts/published/", Some(&auth.token), "")).await;
    let published: Vec<Post> = body_json(resp).await;
    assert_eq!(published.len(), 1);
}

#[tokio::test]
async fn my_posts_lists_newest_first() {
    let app = app();
    let auth = register_ada(&app).await;
    let first = create(&app, &auth.token, r#"{"Title":"first","Description":"d"}"#).await;
    let second = create(&app, &auth.token, r#"{"Title":"second","Description":"d"}"#).await;

    let resp = send(&app, request("GET", "/api/posts/my_posts/", Some(&auth.token), "")).await;
    let posts: Vec<Post> = body_json(resp).await;
    let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[tokio::test]
async fn other_users_posts_are_not_found() {
    let app = app();
    let ada = register_ada(&app).await;
    let post = create(&app, &ada.token, r#"{"Title":"A","Description":"B"}"#).await;

    let resp = send(
        &app,
        request(
            "POST",
            "/api/auth/register/",
            None,
            r#"{"username":"grace","email":"grace@example.com","password":"cobol!",
                "ANumber":"A0002","first_name":"Grace","last_name":"Hopper"}"#,
        ),
    )
    .await;
    let grace: AuthBody = body_json(resp).await;

    let uri = format!("/api/posts/{}/", post.id);
    let resp = send(&app, request("GET", &uri, Some(&grace.token), "")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = body_json(resp).await;
    assert_eq!(body["detail"], "Not found.");
}

#[tokio::test]
async fn update_then_delete_post() {
    let app = app();
    let auth = register_ada(&app).await;
    let post = create(&app, &auth.token, r#"{"Title":"A","Description":"B"}"#).await;
    let uri = format!("/api/posts/{}/", post.id);

    let resp = send(
        &app,
        request(
            "PUT",
            &uri,
            Some(&auth.token),
            r#"{"Title":"A2","Description":"B2","FundingNeeds":"2500"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Post = body_json(resp).await;
    assert_eq!(updated.title, "A2");
    assert_eq!(updated.funding_needs.as_deref(), Some("2500.00"));

    let resp = send(&app, request("DELETE", &uri, Some(&auth.token), "")).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(resp.headers().get(http::header::CONTENT_TYPE).is_none());
    assert!(body_bytes(resp).await.is_empty());

    let resp = send(&app, request("DELETE", &uri, Some(&auth.token), "")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bad_post_id_returns_400_text() {
    let app = app();
    let auth = register_ada(&app).await;
    let resp = send(&app, request("GET", "/api/posts/abc/", Some(&auth.token), "")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let content_type = resp.headers()[http::header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn health_is_plain_text() {
    let app = app();
    let resp = send(&app, request("GET", "/api/health/", None, "")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(&body_bytes(resp).await[..], b"ok");
}

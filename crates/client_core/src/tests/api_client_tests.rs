use super::*;
use crate::test_support::{sample_user, spawn_stub};
use axum::{
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

#[test]
fn base_url_keeps_its_path_prefix() {
    let client = ApiClient::new("http://localhost:8080/app").expect("client");
    assert_eq!(client.base_url().as_str(), "http://localhost:8080/app/");
    assert_eq!(
        client.base_url().join("api/v1/users").expect("join").as_str(),
        "http://localhost:8080/app/api/v1/users"
    );
    assert!(matches!(
        ApiClient::new("not a url"),
        Err(ClientError::InvalidUrl(_))
    ));
}

#[test]
fn clones_share_the_bearer_token() {
    let client = ApiClient::new("http://localhost:8080").expect("client");
    let clone = client.clone();
    client.set_token(Some("abc".into()));
    assert_eq!(clone.token().as_deref(), Some("abc"));
    clone.set_token(None);
    assert_eq!(client.token(), None);
}

#[tokio::test]
async fn error_bodies_surface_their_message() {
    let app = Router::new()
        .route(
            "/api/v1/users/login",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "code": "unauthorized", "message": "invalid password" })),
                )
            }),
        )
        .route(
            "/api/v1/roles/",
            get(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        )
        .route(
            "/api/v1/documents/",
            get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        );
    let client = ApiClient::new(&spawn_stub(app).await).expect("client");

    let err = client
        .login(&LoginRequest {
            username: Some("itunuworks".into()),
            password: Some("itunu".into()),
        })
        .await
        .expect_err("401");
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.to_string(), "invalid password");

    let err = client.list_roles().await.expect_err("502");
    assert_eq!(err.to_string(), "upstream down");

    let err = client.list_documents().await.expect_err("503");
    assert_eq!(err.to_string(), "Service Unavailable");
}

#[tokio::test]
async fn bearer_token_is_sent_once_set() {
    let app = Router::new().route(
        "/api/v1/users/:id",
        get(|headers: HeaderMap| async move {
            match headers.get("authorization").and_then(|v| v.to_str().ok()) {
                Some("Bearer secret-token") => {
                    Ok(Json(json!({ "user": sample_user(3, "ada") })))
                }
                _ => Err((
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "message": "a bearer token is required" })),
                )),
            }
        }),
    );
    let client = ApiClient::new(&spawn_stub(app).await).expect("client");

    let err = client.get_user(UserId(3)).await.expect_err("no token yet");
    assert_eq!(err.to_string(), "a bearer token is required");

    client.set_token(Some("secret-token".into()));
    let user = client.get_user(UserId(3)).await.expect("user");
    assert_eq!(user.username, "ada");
}

#[tokio::test]
async fn unexpected_success_bodies_are_decode_errors() {
    let app = Router::new().route("/api/v1/users/", get(|| async { "not json" }));
    let client = ApiClient::new(&spawn_stub(app).await).expect("client");
    let err = client.list_users().await.expect_err("decode");
    assert!(matches!(err, ClientError::Decode(_)));
}

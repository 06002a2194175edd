use super::*;
use axum::{
    body::{self, Body},
    http::{header, Request, Response},
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use shared::{
    domain::{Right, ADMIN_ROLE_ID},
    error::{ApiError, ErrorCode},
};
use tower::ServiceExt;

async fn test_app() -> (Router, Storage) {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let api = ApiContext {
        storage: storage.clone(),
        tokens: TokenConfig {
            secret: "router-test-secret".into(),
            ttl_seconds: 600,
        },
    };
    (build_router(Arc::new(AppState { api }), 64 * 1024), storage)
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

async fn read_json<T: DeserializeOwned>(response: Response<Body>) -> T {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

fn signup_body(username: &str) -> Value {
    json!({
        "firstname": "Itunu",
        "lastname": "Fatoki",
        "username": username,
        "email": format!("{username}@example.com"),
        "password": "secret-password",
    })
}

async fn signup(app: &Router, username: &str) -> AuthResponse {
    let response = app
        .clone()
        .oneshot(request("POST", "/api/v1/users", None, Some(signup_body(username))))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json(response).await
}

/// Signs a user up and promotes them straight in storage.
async fn signup_admin(app: &Router, storage: &Storage, username: &str) -> AuthResponse {
    let auth = signup(app, username).await;
    storage
        .update_user(
            auth.user.id,
            &storage::UserChanges {
                role_id: Some(ADMIN_ROLE_ID),
                ..Default::default()
            },
        )
        .await
        .expect("promote")
        .expect("user exists");
    auth
}

#[tokio::test]
async fn healthz_reports_ok_when_storage_is_ready() {
    let (app, _storage) = test_app().await;
    let response = app
        .oneshot(request("GET", "/healthz", None, None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(body.as_ref(), b"ok");
}

#[tokio::test]
async fn signup_login_logout_then_token_is_rejected() {
    let (app, _storage) = test_app().await;
    let auth = signup(&app, "itunuworks").await;
    assert!(!auth.partial);
    assert_eq!(auth.user.username, "itunuworks");

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/users/login",
            None,
            Some(json!({ "username": "itunuworks", "password": "secret-password" })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let login: AuthResponse = read_json(response).await;

    let own_profile = format!("/api/v1/users/{}", login.user.id.0);
    let response = app
        .clone()
        .oneshot(request("GET", &own_profile, Some(&login.token), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let envelope: UserEnvelope = read_json(response).await;
    assert_eq!(envelope.user.email, "itunuworks@example.com");

    let response = app
        .clone()
        .oneshot(request("POST", "/api/v1/users/logout", Some(&login.token), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let message: MessageEnvelope = read_json(response).await;
    assert_eq!(message.message, "logged out successfully");

    let response = app
        .clone()
        .oneshot(request("GET", &own_profile, Some(&login.token), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(request("GET", &own_profile, Some(&auth.token), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK, "signup session is still open");
}

#[tokio::test]
async fn missing_fields_are_reported_in_the_error_envelope() {
    let (app, _storage) = test_app().await;
    let response = app
        .oneshot(request(
            "POST",
            "/api/v1/users/login",
            None,
            Some(json!({ "username": "itunuworks" })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let err: ApiError = read_json(response).await;
    assert_eq!(err.code, ErrorCode::Validation);
    assert_eq!(err.message, "password is required<br/>");
}

#[tokio::test]
async fn malformed_json_is_a_bad_request_with_envelope() {
    let (app, _storage) = test_app().await;
    let response = app
        .oneshot(
            Request::post("/api/v1/users")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let err: ApiError = read_json(response).await;
    assert_eq!(err.code, ErrorCode::Validation);
}

#[tokio::test]
async fn authenticated_routes_require_a_bearer_token() {
    let (app, _storage) = test_app().await;
    for (method, uri) in [
        ("GET", "/api/v1/users"),
        ("GET", "/api/v1/users/1"),
        ("POST", "/api/v1/users/logout"),
        ("GET", "/api/v1/documents"),
    ] {
        let response = app
            .clone()
            .oneshot(request(method, uri, None, None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
    }

    let response = app
        .oneshot(request("GET", "/api/v1/users", Some("not-a-jwt"), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn role_creation_is_admin_only_and_listing_hides_admin_role() {
    let (app, storage) = test_app().await;
    let regular = signup(&app, "ada").await;
    let admin = signup_admin(&app, &storage, "root").await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/roles/",
            Some(&regular.token),
            Some(json!({ "title": "editor" })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let err: ApiError = read_json(response).await;
    assert_eq!(err.message, "you are not authorized to create new roles");

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/roles",
            Some(&admin.token),
            Some(json!({ "title": "editor", "description": "can edit" })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: RoleEnvelope = read_json(response).await;
    assert_eq!(created.role.title, "editor");

    let response = app
        .oneshot(request("GET", "/api/v1/roles/", None, None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let listed: RolesEnvelope = read_json(response).await;
    assert!(listed.roles.iter().all(|role| role.id != ADMIN_ROLE_ID));
    assert!(listed.roles.iter().any(|role| role.title == "editor"));
}

#[tokio::test]
async fn admin_lists_users_and_regular_user_cannot() {
    let (app, storage) = test_app().await;
    let regular = signup(&app, "ada").await;
    let admin = signup_admin(&app, &storage, "root").await;

    let response = app
        .clone()
        .oneshot(request("GET", "/api/v1/users/", Some(&regular.token), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(request("GET", "/api/v1/users", Some(&admin.token), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let users: UsersEnvelope = read_json(response).await;
    assert_eq!(users.users.len(), 2);
}

#[tokio::test]
async fn delete_user_routes_return_messages_and_statuses() {
    let (app, storage) = test_app().await;
    let ada = signup(&app, "ada").await;
    let admin = signup_admin(&app, &storage, "root").await;

    let response = app
        .clone()
        .oneshot(request(
            "DELETE",
            &format!("/api/v1/users/{}", admin.user.id.0),
            Some(&admin.token),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let ada_uri = format!("/api/v1/users/{}", ada.user.id.0);
    let response = app
        .clone()
        .oneshot(request("DELETE", &ada_uri, Some(&admin.token), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let message: MessageEnvelope = read_json(response).await;
    assert_eq!(message.message, "user deleted successfully");

    let response = app
        .oneshot(request("GET", &ada_uri, Some(&admin.token), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_user_applies_partial_changes() {
    let (app, _storage) = test_app().await;
    let ada = signup(&app, "ada").await;
    let response = app
        .oneshot(request(
            "PUT",
            &format!("/api/v1/users/{}", ada.user.id.0),
            Some(&ada.token),
            Some(json!({ "firstname": "Augusta" })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let envelope: UserEnvelope = read_json(response).await;
    assert_eq!(envelope.user.firstname, "Augusta");
    assert_eq!(envelope.user.lastname, "Fatoki");
}

#[tokio::test]
async fn document_routes_enforce_visibility() {
    let (app, _storage) = test_app().await;
    let ada = signup(&app, "ada").await;
    let bob = signup(&app, "bob").await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/documents",
            Some(&ada.token),
            Some(json!({ "title": "diary", "content": "dear diary", "accessId": 2 })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: DocumentEnvelope = read_json(response).await;
    assert_eq!(created.document.right_id, Some(Right::Owner));
    let document_uri = format!("/api/v1/documents/{}", created.document.id.0);

    let response = app
        .clone()
        .oneshot(request("GET", &document_uri, Some(&bob.token), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(request("GET", "/api/v1/documents/", Some(&bob.token), None))
        .await
        .expect("response");
    let listed: DocumentsEnvelope = read_json(response).await;
    assert!(listed.documents.is_empty());

    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            &document_uri,
            Some(&ada.token),
            Some(json!({ "accessId": 1 })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(request("GET", &document_uri, Some(&bob.token), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let seen: DocumentEnvelope = read_json(response).await;
    assert_eq!(seen.document.right_id, Some(Right::Read));

    let response = app
        .clone()
        .oneshot(request("DELETE", &document_uri, Some(&bob.token), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(request("DELETE", &document_uri, Some(&ada.token), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let message: MessageEnvelope = read_json(response).await;
    assert_eq!(message.message, "document deleted successfully");
}

#[tokio::test]
async fn unknown_access_level_is_rejected() {
    let (app, _storage) = test_app().await;
    let ada = signup(&app, "ada").await;
    let response = app
        .oneshot(request(
            "POST",
            "/api/v1/documents",
            Some(&ada.token),
            Some(json!({ "title": "odd", "accessId": 7 })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_bodies_are_refused() {
    let (app, _storage) = test_app().await;
    let body = json!({ "username": "x".repeat(128 * 1024) }).to_string();
    let response = app
        .oneshot(
            Request::post("/api/v1/users")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::CONTENT_LENGTH, body.len())
                .body(Body::from(body))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

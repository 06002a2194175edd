use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post, MethodRouter},
    Json, Router,
};
use server_api::{ApiContext, TokenConfig};
use shared::{
    domain::{DocumentId, UserId},
    protocol::{
        AuthResponse, CreateDocumentRequest, CreateRoleRequest, DocumentEnvelope,
        DocumentsEnvelope, LoginRequest, MessageEnvelope, RoleEnvelope, RolesEnvelope,
        SignupRequest, UpdateDocumentRequest, UpdateUserRequest, UserEnvelope, UsersEnvelope,
    },
};
use storage::Storage;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;

use api::{http_error, json_body, AuthenticatedUser, HttpError};
use app_state::AppState;
use config::{load_settings, prepare_database_url};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    let purged = storage.purge_expired_sessions().await?;
    if purged > 0 {
        info!(purged, "removed expired sessions");
    }

    let api = ApiContext {
        storage,
        tokens: TokenConfig {
            secret: settings.jwt_secret,
            ttl_seconds: settings.token_ttl_seconds,
        },
    };
    let app = build_router(Arc::new(AppState { api }), settings.max_body_bytes);

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    let routes = Router::new().route("/healthz", get(healthz));
    let routes = [
        ("/api/v1/users", post(http_signup).get(http_list_users)),
        ("/api/v1/users/login", post(http_login)),
        ("/api/v1/users/logout", post(http_logout)),
        (
            "/api/v1/users/:id",
            get(http_get_user)
                .put(http_update_user)
                .delete(http_delete_user),
        ),
        ("/api/v1/roles", get(http_list_roles).post(http_create_role)),
        (
            "/api/v1/documents",
            get(http_list_documents).post(http_create_document),
        ),
        (
            "/api/v1/documents/:id",
            get(http_get_document)
                .put(http_update_document)
                .delete(http_delete_document),
        ),
    ]
    .into_iter()
    .fold(routes, |router, (path, handler)| {
        with_trailing_slash(router, path, handler)
    });

    routes
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .with_state(state)
}

/// Serves `path` and `path/` with the same handlers.
fn with_trailing_slash(
    router: Router<Arc<AppState>>,
    path: &str,
    handler: MethodRouter<Arc<AppState>>,
) -> Router<Arc<AppState>> {
    router
        .route(path, handler.clone())
        .route(&format!("{path}/"), handler)
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, StatusCode> {
    state.api.storage.health_check().await.map_err(|error| {
        error!(%error, "health check failed");
        StatusCode::SERVICE_UNAVAILABLE
    })?;
    Ok("ok")
}

async fn http_signup(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), HttpError> {
    let auth = server_api::signup(&state.api, json_body(payload)?)
        .await
        .map_err(http_error)?;
    Ok((StatusCode::CREATED, Json(auth)))
}

async fn http_login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, HttpError> {
    let auth = server_api::login(&state.api, json_body(payload)?)
        .await
        .map_err(http_error)?;
    Ok(Json(auth))
}

async fn http_logout(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(principal): AuthenticatedUser,
) -> Result<Json<MessageEnvelope>, HttpError> {
    let message = server_api::logout(&state.api, &principal)
        .await
        .map_err(http_error)?;
    Ok(Json(message))
}

async fn http_list_users(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(principal): AuthenticatedUser,
) -> Result<Json<UsersEnvelope>, HttpError> {
    let users = server_api::list_users(&state.api, &principal)
        .await
        .map_err(http_error)?;
    Ok(Json(UsersEnvelope { users }))
}

async fn http_get_user(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(user_id): Path<i64>,
) -> Result<Json<UserEnvelope>, HttpError> {
    let user = server_api::get_user(&state.api, &principal, UserId(user_id))
        .await
        .map_err(http_error)?;
    Ok(Json(UserEnvelope { user }))
}

async fn http_update_user(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(user_id): Path<i64>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<UserEnvelope>, HttpError> {
    let user = server_api::update_user(
        &state.api,
        &principal,
        UserId(user_id),
        json_body(payload)?,
    )
    .await
    .map_err(http_error)?;
    Ok(Json(UserEnvelope { user }))
}

async fn http_delete_user(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(user_id): Path<i64>,
) -> Result<Json<MessageEnvelope>, HttpError> {
    let message = server_api::delete_user(&state.api, &principal, UserId(user_id))
        .await
        .map_err(http_error)?;
    Ok(Json(message))
}

async fn http_list_roles(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RolesEnvelope>, HttpError> {
    let roles = server_api::list_roles(&state.api)
        .await
        .map_err(http_error)?;
    Ok(Json(RolesEnvelope { roles }))
}

async fn http_create_role(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(principal): AuthenticatedUser,
    payload: Result<Json<CreateRoleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RoleEnvelope>), HttpError> {
    let role = server_api::create_role(&state.api, &principal, json_body(payload)?)
        .await
        .map_err(http_error)?;
    Ok((StatusCode::CREATED, Json(RoleEnvelope { role })))
}

async fn http_list_documents(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(principal): AuthenticatedUser,
) -> Result<Json<DocumentsEnvelope>, HttpError> {
    let documents = server_api::list_documents(&state.api, &principal)
        .await
        .map_err(http_error)?;
    Ok(Json(DocumentsEnvelope { documents }))
}

async fn http_create_document(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(principal): AuthenticatedUser,
    payload: Result<Json<CreateDocumentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DocumentEnvelope>), HttpError> {
    let document = server_api::create_document(&state.api, &principal, json_body(payload)?)
        .await
        .map_err(http_error)?;
    Ok((StatusCode::CREATED, Json(DocumentEnvelope { document })))
}

async fn http_get_document(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(document_id): Path<i64>,
) -> Result<Json<DocumentEnvelope>, HttpError> {
    let document = server_api::get_document(&state.api, &principal, DocumentId(document_id))
        .await
        .map_err(http_error)?;
    Ok(Json(DocumentEnvelope { document }))
}

async fn http_update_document(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(document_id): Path<i64>,
    payload: Result<Json<UpdateDocumentRequest>, JsonRejection>,
) -> Result<Json<DocumentEnvelope>, HttpError> {
    let document = server_api::update_document(
        &state.api,
        &principal,
        DocumentId(document_id),
        json_body(payload)?,
    )
    .await
    .map_err(http_error)?;
    Ok(Json(DocumentEnvelope { document }))
}

async fn http_delete_document(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(document_id): Path<i64>,
) -> Result<Json<MessageEnvelope>, HttpError> {
    let message = server_api::delete_document(&state.api, &principal, DocumentId(document_id))
        .await
        .map_err(http_error)?;
    Ok(Json(message))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;

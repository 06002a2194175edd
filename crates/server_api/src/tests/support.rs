use shared::{
    domain::{User, ADMIN_ROLE_ID},
    protocol::SignupRequest,
};
use storage::{NewUser, Storage};

use crate::{authenticate, passwords, users, ApiContext, Principal, TokenConfig};

pub(crate) async fn setup() -> ApiContext {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    ApiContext {
        storage,
        tokens: TokenConfig {
            secret: "test-secret".into(),
            ttl_seconds: 3600,
        },
    }
}

pub(crate) fn signup_request(username: &str) -> SignupRequest {
    SignupRequest {
        firstname: Some("Itunu".into()),
        lastname: Some("Fatoki".into()),
        username: Some(username.into()),
        email: Some(format!("{username}@example.com")),
        password: Some("secret-password".into()),
        role_id: None,
    }
}

/// Signs a regular user up and returns them with their live principal.
pub(crate) async fn register(ctx: &ApiContext, username: &str) -> (User, Principal) {
    let auth = users::signup(ctx, signup_request(username))
        .await
        .expect("signup");
    let principal = authenticate(ctx, &auth.token).await.expect("principal");
    (auth.user, principal)
}

/// Administrators cannot sign up, so they are written straight to storage.
pub(crate) async fn register_admin(ctx: &ApiContext, username: &str) -> (User, Principal) {
    let hash = passwords::hash_password("admin-password").expect("hash");
    let email = format!("{username}@example.com");
    let user = ctx
        .storage
        .create_user(NewUser {
            username,
            email: &email,
            firstname: "Root",
            lastname: "Admin",
            password_hash: &hash,
            role_id: ADMIN_ROLE_ID,
        })
        .await
        .expect("admin");
    let token = users::open_session(ctx, &user).await.expect("session");
    let principal = authenticate(ctx, &token).await.expect("principal");
    (user, principal)
}

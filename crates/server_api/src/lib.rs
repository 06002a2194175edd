use shared::{
    domain::{RoleId, UserId, ADMIN_ROLE_ID},
    error::{ApiError, ErrorCode},
};
use storage::Storage;
use tracing::warn;

pub mod documents;
pub mod passwords;
pub mod roles;
pub mod tokens;
pub mod users;

pub use documents::{
    create_document, delete_document, get_document, list_documents, update_document,
};
pub use roles::{create_role, list_roles};
pub use tokens::TokenConfig;
pub use users::{delete_user, get_user, list_users, login, logout, signup, update_user};

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
    pub tokens: TokenConfig,
}

/// The authenticated caller of a request, resolved from its bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub role_id: RoleId,
    pub session_id: String,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role_id == ADMIN_ROLE_ID
    }

    pub fn is_self_or_admin(&self, user_id: UserId) -> bool {
        self.user_id == user_id || self.is_admin()
    }
}

/// Resolves a bearer token into a [`Principal`]. The token must verify and its
/// session must still be open; the role comes from the current user row so a
/// demotion takes effect on the next request.
pub async fn authenticate(ctx: &ApiContext, token: &str) -> Result<Principal, ApiError> {
    let claims = tokens::verify_token(&ctx.tokens, token).map_err(|e| {
        warn!(error = %e, "rejected bearer token");
        ApiError::new(ErrorCode::Unauthorized, "invalid or expired token")
    })?;
    let user_id = claims
        .sub
        .parse::<i64>()
        .map(UserId)
        .map_err(|_| ApiError::new(ErrorCode::Unauthorized, "invalid or expired token"))?;

    let active = ctx
        .storage
        .session_is_active(&claims.jti, user_id)
        .await
        .map_err(internal)?;
    if !active {
        return Err(ApiError::new(
            ErrorCode::Unauthorized,
            "session has ended, please log in again",
        ));
    }

    let user = ctx
        .storage
        .find_user(user_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::new(ErrorCode::Unauthorized, "user no longer exists"))?;

    Ok(Principal {
        user_id,
        role_id: user.role_id,
        session_id: claims.jti,
    })
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, format!("{err:#}"))
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod support;

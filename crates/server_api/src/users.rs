use shared::{
    domain::{User, UserId, ADMIN_ROLE_ID, DEFAULT_ROLE_ID},
    error::{ApiError, ErrorCode},
    protocol::{AuthResponse, LoginRequest, MessageEnvelope, SignupRequest, UpdateUserRequest},
    validation::{blank_updates, missing_fields},
};
use storage::{is_unique_violation, NewUser, UserChanges};
use tracing::info;

use crate::{internal, passwords, tokens, ApiContext, Principal};

pub async fn signup(ctx: &ApiContext, req: SignupRequest) -> Result<AuthResponse, ApiError> {
    if let Some(message) = missing_fields([
        ("username", req.username.as_deref()),
        ("password", req.password.as_deref()),
        ("email", req.email.as_deref()),
        ("firstname", req.firstname.as_deref()),
        ("lastname", req.lastname.as_deref()),
    ]) {
        return Err(ApiError::new(ErrorCode::Validation, message));
    }

    let role_id = req.role_id.unwrap_or(DEFAULT_ROLE_ID);
    if role_id == ADMIN_ROLE_ID {
        return Err(ApiError::new(
            ErrorCode::Unauthorized,
            "you are not authorized to sign up as an administrator",
        ));
    }
    ctx.storage
        .find_role(role_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::new(ErrorCode::Validation, "role does not exist"))?;

    let password_hash =
        passwords::hash_password(req.password.as_deref().unwrap_or_default()).map_err(internal)?;
    let user = ctx
        .storage
        .create_user(NewUser {
            username: req.username.as_deref().unwrap_or_default().trim(),
            email: req.email.as_deref().unwrap_or_default().trim(),
            firstname: req.firstname.as_deref().unwrap_or_default().trim(),
            lastname: req.lastname.as_deref().unwrap_or_default().trim(),
            password_hash: &password_hash,
            role_id,
        })
        .await
        .map_err(conflict_or_internal)?;

    let token = open_session(ctx, &user).await?;
    info!(user_id = user.id.0, "user signed up");
    Ok(AuthResponse {
        user,
        token,
        partial: false,
    })
}

pub async fn login(ctx: &ApiContext, req: LoginRequest) -> Result<AuthResponse, ApiError> {
    if let Some(message) = missing_fields([
        ("username", req.username.as_deref()),
        ("password", req.password.as_deref()),
    ]) {
        return Err(ApiError::new(ErrorCode::Validation, message));
    }

    let username = req.username.as_deref().unwrap_or_default().trim();
    let credentials = ctx
        .storage
        .find_credentials(username)
        .await
        .map_err(internal)?
        .ok_or_else(invalid_credentials)?;
    if !passwords::verify_password(
        req.password.as_deref().unwrap_or_default(),
        &credentials.password_hash,
    ) {
        return Err(invalid_credentials());
    }

    let token = open_session(ctx, &credentials.user).await?;
    info!(user_id = credentials.user.id.0, "user logged in");
    Ok(AuthResponse {
        user: credentials.user,
        token,
        partial: false,
    })
}

pub async fn logout(ctx: &ApiContext, principal: &Principal) -> Result<MessageEnvelope, ApiError> {
    ctx.storage
        .delete_session(&principal.session_id)
        .await
        .map_err(internal)?;
    info!(user_id = principal.user_id.0, "user logged out");
    Ok(MessageEnvelope::new("logged out successfully"))
}

pub async fn list_users(ctx: &ApiContext, principal: &Principal) -> Result<Vec<User>, ApiError> {
    if !principal.is_admin() {
        return Err(ApiError::new(
            ErrorCode::Unauthorized,
            "you are not authorized to view all users",
        ));
    }
    ctx.storage.list_users().await.map_err(internal)
}

pub async fn get_user(
    ctx: &ApiContext,
    principal: &Principal,
    user_id: UserId,
) -> Result<User, ApiError> {
    if !principal.is_self_or_admin(user_id) {
        return Err(ApiError::new(
            ErrorCode::Unauthorized,
            "you are not authorized to view this user",
        ));
    }
    ctx.storage
        .find_user(user_id)
        .await
        .map_err(internal)?
        .ok_or_else(user_not_found)
}

pub async fn update_user(
    ctx: &ApiContext,
    principal: &Principal,
    user_id: UserId,
    req: UpdateUserRequest,
) -> Result<User, ApiError> {
    if !principal.is_self_or_admin(user_id) {
        return Err(ApiError::new(
            ErrorCode::Unauthorized,
            "you are not authorized to modify this user",
        ));
    }
    if req.role_id.is_some() && !principal.is_admin() {
        return Err(ApiError::new(
            ErrorCode::Unauthorized,
            "you are not authorized to change roles",
        ));
    }
    if let Some(message) = blank_updates([
        ("email", req.email.as_deref()),
        ("username", req.username.as_deref()),
        ("firstname", req.firstname.as_deref()),
        ("lastname", req.lastname.as_deref()),
        ("password", req.password.as_deref()),
    ]) {
        return Err(ApiError::new(ErrorCode::Validation, message));
    }
    if let Some(role_id) = req.role_id {
        ctx.storage
            .find_role(role_id)
            .await
            .map_err(internal)?
            .ok_or_else(|| ApiError::new(ErrorCode::Validation, "role does not exist"))?;
    }

    let password_hash = req
        .password
        .as_deref()
        .map(passwords::hash_password)
        .transpose()
        .map_err(internal)?;
    let changes = UserChanges {
        email: req.email.map(|v| v.trim().to_string()),
        username: req.username.map(|v| v.trim().to_string()),
        firstname: req.firstname.map(|v| v.trim().to_string()),
        lastname: req.lastname.map(|v| v.trim().to_string()),
        password_hash,
        role_id: req.role_id,
    };

    ctx.storage
        .update_user(user_id, &changes)
        .await
        .map_err(conflict_or_internal)?
        .ok_or_else(user_not_found)
}

pub async fn delete_user(
    ctx: &ApiContext,
    principal: &Principal,
    user_id: UserId,
) -> Result<MessageEnvelope, ApiError> {
    if !principal.is_self_or_admin(user_id) {
        return Err(ApiError::new(
            ErrorCode::Unauthorized,
            "you are not authorized to delete this user",
        ));
    }
    let target = ctx
        .storage
        .find_user(user_id)
        .await
        .map_err(internal)?
        .ok_or_else(user_not_found)?;
    if target.is_admin() {
        return Err(ApiError::new(
            ErrorCode::Forbidden,
            "administrator accounts cannot be deleted",
        ));
    }

    if !ctx.storage.delete_user(user_id).await.map_err(internal)? {
        return Err(user_not_found());
    }
    info!(user_id = user_id.0, deleted_by = principal.user_id.0, "user deleted");
    Ok(MessageEnvelope::new("user deleted successfully"))
}

pub(crate) async fn open_session(ctx: &ApiContext, user: &User) -> Result<String, ApiError> {
    let issued = tokens::mint_token(&ctx.tokens, user.id, user.role_id)
        .map_err(|e| ApiError::new(ErrorCode::Internal, format!("token mint failed: {e}")))?;
    ctx.storage
        .create_session(&issued.jti, user.id, issued.expires_at)
        .await
        .map_err(internal)?;
    Ok(issued.token)
}

fn invalid_credentials() -> ApiError {
    ApiError::new(ErrorCode::Unauthorized, "invalid credentials")
}

fn user_not_found() -> ApiError {
    ApiError::new(ErrorCode::NotFound, "user not found")
}

fn conflict_or_internal(err: anyhow::Error) -> ApiError {
    if is_unique_violation(&err) {
        ApiError::new(ErrorCode::Validation, "username or email already exists")
    } else {
        internal(err)
    }
}

#[cfg(test)]
#[path = "tests/users_tests.rs"]
mod tests;

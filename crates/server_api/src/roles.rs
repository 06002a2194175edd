use shared::{
    domain::{Role, ADMIN_ROLE_ID},
    error::{ApiError, ErrorCode},
    protocol::CreateRoleRequest,
    validation::missing_fields,
};
use tracing::info;

use crate::{ApiContext, Principal};

/// Only administrators may add roles. Store failures, such as a duplicate
/// title, come back as validation errors carrying the store's message.
pub async fn create_role(
    ctx: &ApiContext,
    principal: &Principal,
    req: CreateRoleRequest,
) -> Result<Role, ApiError> {
    if !principal.is_admin() {
        return Err(ApiError::new(
            ErrorCode::Unauthorized,
            "you are not authorized to create new roles",
        ));
    }
    if let Some(message) = missing_fields([("title", req.title.as_deref())]) {
        return Err(ApiError::new(ErrorCode::Validation, message));
    }

    let title = req.title.as_deref().unwrap_or_default().trim();
    let description = req
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());
    let role = ctx
        .storage
        .create_role(title, description)
        .await
        .map_err(|e| ApiError::new(ErrorCode::Validation, format!("{e:#}")))?;
    info!(role_id = role.id.0, created_by = principal.user_id.0, "role created");
    Ok(role)
}

/// Every role except the reserved administrator role.
pub async fn list_roles(ctx: &ApiContext) -> Result<Vec<Role>, ApiError> {
    ctx.storage
        .list_roles_except(ADMIN_ROLE_ID)
        .await
        .map_err(|e| ApiError::new(ErrorCode::Validation, format!("{e:#}")))
}

#[cfg(test)]
#[path = "tests/roles_tests.rs"]
mod tests;

use shared::{
    domain::{AccessLevel, Document, DocumentId, Right},
    error::{ApiError, ErrorCode},
    protocol::{CreateDocumentRequest, MessageEnvelope, UpdateDocumentRequest},
    validation::{blank_updates, missing_fields},
};
use storage::{DocumentChanges, StoredDocument};
use tracing::info;

use crate::{internal, ApiContext, Principal};

/// The caller's right on a stored document, or `None` when it is invisible
/// to them.
pub fn right_for(principal: &Principal, stored: &StoredDocument) -> Option<Right> {
    let document = &stored.document;
    if document.owner_id == principal.user_id {
        return Some(Right::Owner);
    }
    if principal.is_admin() {
        return Some(Right::Edit);
    }
    match document.access_id {
        AccessLevel::Public => Some(Right::Read),
        AccessLevel::Role if stored.owner_role_id == principal.role_id => Some(Right::Read),
        AccessLevel::Role | AccessLevel::Private => None,
    }
}

pub async fn create_document(
    ctx: &ApiContext,
    principal: &Principal,
    req: CreateDocumentRequest,
) -> Result<Document, ApiError> {
    if let Some(message) = missing_fields([("title", req.title.as_deref())]) {
        return Err(ApiError::new(ErrorCode::Validation, message));
    }
    let title = req.title.as_deref().unwrap_or_default().trim();
    let document_id = ctx
        .storage
        .create_document(principal.user_id, title, &req.content, req.access_id)
        .await
        .map_err(internal)?;
    info!(
        document_id = document_id.0,
        owner_id = principal.user_id.0,
        "document created"
    );
    load_visible(ctx, principal, document_id).await
}

/// Documents the caller can see, newest first, each tagged with the caller's right.
pub async fn list_documents(
    ctx: &ApiContext,
    principal: &Principal,
) -> Result<Vec<Document>, ApiError> {
    let stored = ctx
        .storage
        .list_documents_visible_to(principal.user_id, principal.role_id, principal.is_admin())
        .await
        .map_err(internal)?;
    Ok(stored
        .into_iter()
        .filter_map(|doc| {
            let right = right_for(principal, &doc)?;
            Some(with_right(doc, right))
        })
        .collect())
}

pub async fn get_document(
    ctx: &ApiContext,
    principal: &Principal,
    document_id: DocumentId,
) -> Result<Document, ApiError> {
    load_visible(ctx, principal, document_id).await
}

pub async fn update_document(
    ctx: &ApiContext,
    principal: &Principal,
    document_id: DocumentId,
    req: UpdateDocumentRequest,
) -> Result<Document, ApiError> {
    let current = load_visible(ctx, principal, document_id).await?;
    if !current.right_id.is_some_and(Right::can_edit) {
        return Err(ApiError::new(
            ErrorCode::Unauthorized,
            "you are not authorized to edit this document",
        ));
    }
    if let Some(message) = blank_updates([("title", req.title.as_deref())]) {
        return Err(ApiError::new(ErrorCode::Validation, message));
    }

    let changes = DocumentChanges {
        title: req.title.map(|t| t.trim().to_string()),
        content: req.content,
        access_id: req.access_id,
    };
    if !ctx
        .storage
        .update_document(document_id, &changes)
        .await
        .map_err(internal)?
    {
        return Err(document_not_found());
    }
    load_visible(ctx, principal, document_id).await
}

pub async fn delete_document(
    ctx: &ApiContext,
    principal: &Principal,
    document_id: DocumentId,
) -> Result<MessageEnvelope, ApiError> {
    let current = load_visible(ctx, principal, document_id).await?;
    if current.owner_id != principal.user_id && !principal.is_admin() {
        return Err(ApiError::new(
            ErrorCode::Unauthorized,
            "you are not authorized to delete this document",
        ));
    }
    if !ctx
        .storage
        .delete_document(document_id)
        .await
        .map_err(internal)?
    {
        return Err(document_not_found());
    }
    info!(
        document_id = document_id.0,
        deleted_by = principal.user_id.0,
        "document deleted"
    );
    Ok(MessageEnvelope::new("document deleted successfully"))
}

async fn load_visible(
    ctx: &ApiContext,
    principal: &Principal,
    document_id: DocumentId,
) -> Result<Document, ApiError> {
    let stored = ctx
        .storage
        .find_document(document_id)
        .await
        .map_err(internal)?
        .ok_or_else(document_not_found)?;
    let right = right_for(principal, &stored).ok_or_else(|| {
        ApiError::new(
            ErrorCode::Unauthorized,
            "you are not authorized to view this document",
        )
    })?;
    Ok(with_right(stored, right))
}

fn with_right(stored: StoredDocument, right: Right) -> Document {
    Document {
        right_id: Some(right),
        ..stored.document
    }
}

fn document_not_found() -> ApiError {
    ApiError::new(ErrorCode::NotFound, "document not found")
}

#[cfg(test)]
#[path = "tests/documents_tests.rs"]
mod tests;

use super::*;
use crate::support::*;
use shared::protocol::CreateRoleRequest;

fn new_document(title: &str, access: AccessLevel) -> CreateDocumentRequest {
    CreateDocumentRequest {
        title: Some(title.into()),
        content: format!("<p>{title}</p>"),
        access_id: access,
    }
}

#[tokio::test]
async fn owner_gets_owner_right_on_create() {
    let ctx = setup().await;
    let (ada, principal) = register(&ctx, "ada").await;
    let document = create_document(&ctx, &principal, new_document("notes", AccessLevel::Private))
        .await
        .expect("create");
    assert_eq!(document.owner_id, ada.id);
    assert_eq!(document.right_id, Some(Right::Owner));
    assert_eq!(document.content, "<p>notes</p>");
}

#[tokio::test]
async fn blank_title_is_rejected() {
    let ctx = setup().await;
    let (_, principal) = register(&ctx, "ada").await;
    let err = create_document(
        &ctx,
        &principal,
        CreateDocumentRequest {
            title: None,
            content: String::new(),
            access_id: AccessLevel::Public,
        },
    )
    .await
    .expect_err("missing title");
    assert_eq!(err.code, ErrorCode::Validation);
    assert_eq!(err.message, "title is required<br/>");
}

#[tokio::test]
async fn private_documents_are_hidden_from_other_users() {
    let ctx = setup().await;
    let (_, ada) = register(&ctx, "ada").await;
    let (_, bob) = register(&ctx, "bob").await;
    let private = create_document(&ctx, &ada, new_document("diary", AccessLevel::Private))
        .await
        .expect("create");

    let err = get_document(&ctx, &bob, private.id)
        .await
        .expect_err("hidden");
    assert_eq!(err.code, ErrorCode::Unauthorized);
    assert!(list_documents(&ctx, &bob).await.expect("list").is_empty());
}

#[tokio::test]
async fn role_documents_are_read_only_for_role_peers() {
    let ctx = setup().await;
    let (_, ada) = register(&ctx, "ada").await;
    let (_, bob) = register(&ctx, "bob").await;
    let shared_doc = create_document(&ctx, &ada, new_document("team plan", AccessLevel::Role))
        .await
        .expect("create");

    let seen = get_document(&ctx, &bob, shared_doc.id).await.expect("visible");
    assert_eq!(seen.right_id, Some(Right::Read));

    let err = update_document(
        &ctx,
        &bob,
        shared_doc.id,
        UpdateDocumentRequest {
            content: Some("hijacked".into()),
            ..Default::default()
        },
    )
    .await
    .expect_err("read only");
    assert_eq!(err.code, ErrorCode::Unauthorized);
}

#[tokio::test]
async fn role_documents_are_hidden_from_other_roles() {
    let ctx = setup().await;
    let (_, admin) = register_admin(&ctx, "root").await;
    let guest_role = crate::create_role(
        &ctx,
        &admin,
        CreateRoleRequest {
            title: Some("guest".into()),
            description: None,
        },
    )
    .await
    .expect("role");
    let (_, ada) = register(&ctx, "ada").await;
    let guest = crate::users::signup(
        &ctx,
        shared::protocol::SignupRequest {
            role_id: Some(guest_role.id),
            ..signup_request("guest")
        },
    )
    .await
    .expect("guest signup");
    let guest = crate::authenticate(&ctx, &guest.token).await.expect("guest");

    create_document(&ctx, &ada, new_document("team plan", AccessLevel::Role))
        .await
        .expect("role doc");
    create_document(&ctx, &ada, new_document("announcement", AccessLevel::Public))
        .await
        .expect("public doc");

    let visible = list_documents(&ctx, &guest).await.expect("list");
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].title, "announcement");
    assert_eq!(visible[0].right_id, Some(Right::Read));
}

#[tokio::test]
async fn admin_sees_and_edits_everything() {
    let ctx = setup().await;
    let (_, ada) = register(&ctx, "ada").await;
    let (_, admin) = register_admin(&ctx, "root").await;
    let private = create_document(&ctx, &ada, new_document("diary", AccessLevel::Private))
        .await
        .expect("create");

    let listed = list_documents(&ctx, &admin).await.expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].right_id, Some(Right::Edit));

    let updated = update_document(
        &ctx,
        &admin,
        private.id,
        UpdateDocumentRequest {
            title: Some("moderated".into()),
            ..Default::default()
        },
    )
    .await
    .expect("admin edit");
    assert_eq!(updated.title, "moderated");
    assert_eq!(updated.access_id, AccessLevel::Private);
}

#[tokio::test]
async fn update_rejects_blank_title_and_changes_access() {
    let ctx = setup().await;
    let (_, ada) = register(&ctx, "ada").await;
    let document = create_document(&ctx, &ada, new_document("draft", AccessLevel::Private))
        .await
        .expect("create");

    let err = update_document(
        &ctx,
        &ada,
        document.id,
        UpdateDocumentRequest {
            title: Some(String::new()),
            ..Default::default()
        },
    )
    .await
    .expect_err("blank title");
    assert_eq!(err.message, "title is required<br/>");

    let published = update_document(
        &ctx,
        &ada,
        document.id,
        UpdateDocumentRequest {
            access_id: Some(AccessLevel::Public),
            ..Default::default()
        },
    )
    .await
    .expect("publish");
    assert_eq!(published.access_id, AccessLevel::Public);
    assert_eq!(published.title, "draft");
}

#[tokio::test]
async fn only_owner_or_admin_may_delete() {
    let ctx = setup().await;
    let (_, ada) = register(&ctx, "ada").await;
    let (_, bob) = register(&ctx, "bob").await;
    let document = create_document(&ctx, &ada, new_document("public", AccessLevel::Public))
        .await
        .expect("create");

    let err = delete_document(&ctx, &bob, document.id)
        .await
        .expect_err("not owner");
    assert_eq!(err.code, ErrorCode::Unauthorized);

    let message = delete_document(&ctx, &ada, document.id)
        .await
        .expect("owner delete");
    assert_eq!(message.message, "document deleted successfully");

    let err = get_document(&ctx, &ada, document.id)
        .await
        .expect_err("gone");
    assert_eq!(err.code, ErrorCode::NotFound);
}

use super::*;

async fn memory_storage() -> Storage {
    Storage::new("sqlite::memory:").await.expect("db")
}

fn seed_admin(username: &str) -> Command {
    Command::SeedAdmin {
        username: username.into(),
        email: format!("{username}@example.com"),
        password: "admin-password".into(),
        firstname: "Root".into(),
        lastname: "Admin".into(),
    }
}

#[tokio::test]
async fn seeded_admin_can_log_in_with_the_given_password() {
    let storage = memory_storage().await;
    let outcome = run(&storage, seed_admin("root")).await.expect("seed");
    assert!(outcome.starts_with("created admin user_id="));

    let credentials = storage
        .find_credentials("root")
        .await
        .expect("query")
        .expect("stored");
    assert!(credentials.user.is_admin());
    assert!(server_api::passwords::verify_password(
        "admin-password",
        &credentials.password_hash
    ));
}

#[tokio::test]
async fn seeding_the_same_admin_twice_fails() {
    let storage = memory_storage().await;
    run(&storage, seed_admin("root")).await.expect("first");
    assert!(run(&storage, seed_admin("root")).await.is_err());
}

#[tokio::test]
async fn promote_moves_a_user_into_the_admin_role() {
    let storage = memory_storage().await;
    let user = storage
        .create_user(NewUser {
            username: "ada",
            email: "ada@example.com",
            firstname: "Ada",
            lastname: "Lovelace",
            password_hash: "unused",
            role_id: RoleId(2),
        })
        .await
        .expect("user");

    run(
        &storage,
        Command::Promote {
            user_id: user.id.0,
            role_id: ADMIN_ROLE_ID.0,
        },
    )
    .await
    .expect("promote");
    let promoted = storage.find_user(user.id).await.expect("query").expect("user");
    assert!(promoted.is_admin());

    let err = run(
        &storage,
        Command::Promote {
            user_id: user.id.0,
            role_id: 77,
        },
    )
    .await
    .expect_err("unknown role");
    assert_eq!(err.to_string(), "role 77 does not exist");

    assert!(run(
        &storage,
        Command::Promote {
            user_id: 9_999,
            role_id: ADMIN_ROLE_ID.0,
        },
    )
    .await
    .is_err());
}

#[tokio::test]
async fn create_role_rejects_blank_titles() {
    let storage = memory_storage().await;
    let outcome = run(
        &storage,
        Command::CreateRole {
            title: " editor ".into(),
            description: None,
        },
    )
    .await
    .expect("role");
    assert!(outcome.ends_with("title=editor"));

    assert!(run(
        &storage,
        Command::CreateRole {
            title: "  ".into(),
            description: None,
        },
    )
    .await
    .is_err());
}

#[tokio::test]
async fn purge_on_a_fresh_database_removes_nothing() {
    let storage = memory_storage().await;
    let outcome = run(&storage, Command::PurgeSessions).await.expect("purge");
    assert_eq!(outcome, "purged 0 expired sessions");
}

#[test]
fn promote_defaults_to_the_admin_role() {
    let cli = Cli::try_parse_from(["docman-tools", "promote", "5"]).expect("parse");
    assert_eq!(cli.database_url, "sqlite://./data/docman.db");
    let Command::Promote { user_id, role_id } = cli.command else {
        panic!("expected promote");
    };
    assert_eq!(user_id, 5);
    assert_eq!(role_id, ADMIN_ROLE_ID.0);
}

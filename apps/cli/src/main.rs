use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use client_core::{
    Actions, ApiClient, FileKeyValueStore, LoginDetails, SignupDetails, Store, StoreUpdate,
};
use futures::StreamExt;
use serde::Serialize;
use shared::{
    domain::{DocumentId, RoleId, UserId},
    protocol::{CreateDocumentRequest, UpdateDocumentRequest, UpdateUserRequest},
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod args;

use args::{Cli, Command, DocumentsCommand, RolesCommand, UsersCommand};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let store = Arc::new(Store::new());
    let updates = store.updates();
    tokio::spawn(async move {
        tokio::pin!(updates);
        while let Some(StoreUpdate { action, .. }) = updates.next().await {
            debug!(action = %action.action_type(), "state updated");
        }
    });

    let api = ApiClient::new(&cli.server_url)?;
    let actions = Actions::new(api, Arc::new(FileKeyValueStore::new(&cli.state_file)));
    actions.restore_session(&store).await?;

    run(&actions, &store, cli.command).await
}

async fn run(actions: &Actions, store: &Arc<Store>, command: Command) -> Result<()> {
    match command {
        Command::Signup(a) => {
            let user = actions
                .sign_user_up(
                    store,
                    SignupDetails {
                        firstname: a.firstname,
                        lastname: a.lastname,
                        username: a.username,
                        email: a.email,
                        password: a.password,
                        confirm_password: a.confirm_password,
                        role_id: a.role_id.map(RoleId),
                    },
                )
                .await?;
            println!("signed up as {} (id={})", user.username, user.id.0);
        }
        Command::Login { username, password } => {
            let user = actions
                .log_user_in(
                    store,
                    LoginDetails {
                        username: Some(username),
                        password: Some(password),
                    },
                )
                .await?;
            println!("logged in as {} (id={})", user.username, user.id.0);
        }
        Command::Logout => {
            actions.log_user_out(store).await?;
            println!("logged out");
        }
        Command::Whoami => {
            let state = store.get_state();
            match state.user.id {
                Some(id) if state.user.is_authenticated => println!(
                    "{} {} <{}> (id={}, role={})",
                    state.user.firstname,
                    state.user.lastname,
                    state.user.email,
                    id.0,
                    state.user.role_id.map(|r| r.0).unwrap_or_default()
                ),
                _ => println!("not logged in"),
            }
        }
        Command::Users(command) => run_users(actions, store, command).await?,
        Command::Roles(command) => run_roles(actions, store, command).await?,
        Command::Documents(command) => run_documents(actions, store, command).await?,
    }
    Ok(())
}

async fn run_users(actions: &Actions, store: &Arc<Store>, command: UsersCommand) -> Result<()> {
    match command {
        UsersCommand::List => {
            actions.fetch_all_users(store).await?;
            print_json(store.get_state().user.users.as_slice())?;
        }
        UsersCommand::Get { id } => print_json(&actions.get_user(store, UserId(id)).await?)?,
        UsersCommand::Update {
            id,
            email,
            username,
            firstname,
            lastname,
            password,
            role_id,
        } => {
            let changes = UpdateUserRequest {
                email,
                username,
                firstname,
                lastname,
                password,
                role_id: role_id.map(RoleId),
            };
            print_json(&actions.modify_user(store, UserId(id), changes).await?)?;
        }
        UsersCommand::Delete { id } => {
            println!("{}", actions.delete_user(store, UserId(id)).await?);
        }
    }
    Ok(())
}

async fn run_roles(actions: &Actions, store: &Arc<Store>, command: RolesCommand) -> Result<()> {
    match command {
        RolesCommand::List => print_json(&actions.fetch_all_roles(store).await?)?,
        RolesCommand::Create { title, description } => {
            let role = actions
                .create_role(store, &title, description.as_deref())
                .await?;
            print_json(&role)?;
        }
    }
    Ok(())
}

async fn run_documents(
    actions: &Actions,
    store: &Arc<Store>,
    command: DocumentsCommand,
) -> Result<()> {
    match command {
        DocumentsCommand::List => {
            actions.fetch_documents(store).await?;
            print_json(store.get_state().documents.documents.as_slice())?;
        }
        DocumentsCommand::Get { id } => {
            print_json(&actions.get_document(store, DocumentId(id)).await?)?;
        }
        DocumentsCommand::Create {
            title,
            content,
            access,
        } => {
            let document = CreateDocumentRequest {
                title: Some(title),
                content,
                access_id: access.into(),
            };
            print_json(&actions.save_new_document(store, document).await?)?;
        }
        DocumentsCommand::Update {
            id,
            title,
            content,
            access,
        } => {
            let changes = UpdateDocumentRequest {
                title,
                content,
                access_id: access.map(Into::into),
            };
            print_json(
                &actions
                    .modify_document(store, DocumentId(id), changes)
                    .await?,
            )?;
        }
        DocumentsCommand::Delete { id } => {
            println!("{}", actions.delete_document(store, DocumentId(id)).await?);
        }
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

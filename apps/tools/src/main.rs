use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use server_api::passwords::hash_password;
use shared::domain::{RoleId, UserId, ADMIN_ROLE_ID};
use storage::{NewUser, Storage, UserChanges};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "docman-tools", about = "Administrative tasks against the docman database")]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/docman.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Creates an administrator account. Administrators cannot sign up.
    SeedAdmin {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "Admin")]
        firstname: String,
        #[arg(long, default_value = "User")]
        lastname: String,
    },
    CreateRole {
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Moves a user into another role, the administrator role by default.
    Promote {
        user_id: i64,
        #[arg(long, default_value_t = ADMIN_ROLE_ID.0)]
        role_id: i64,
    },
    PurgeSessions,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url)
        .await
        .with_context(|| format!("opening {}", cli.database_url))?;

    let outcome = run(&storage, cli.command).await?;
    println!("{outcome}");
    Ok(())
}

async fn run(storage: &Storage, command: Command) -> Result<String> {
    match command {
        Command::SeedAdmin {
            username,
            email,
            password,
            firstname,
            lastname,
        } => {
            if password.trim().is_empty() {
                bail!("password is required");
            }
            let password_hash = hash_password(&password)?;
            let user = storage
                .create_user(NewUser {
                    username: username.trim(),
                    email: email.trim(),
                    firstname: firstname.trim(),
                    lastname: lastname.trim(),
                    password_hash: &password_hash,
                    role_id: ADMIN_ROLE_ID,
                })
                .await?;
            info!(user_id = user.id.0, "administrator created");
            Ok(format!("created admin user_id={}", user.id.0))
        }
        Command::CreateRole { title, description } => {
            if title.trim().is_empty() {
                bail!("title is required");
            }
            let role = storage
                .create_role(title.trim(), description.as_deref())
                .await?;
            Ok(format!("created role_id={} title={}", role.id.0, role.title))
        }
        Command::Promote { user_id, role_id } => {
            let role_id = RoleId(role_id);
            if storage.find_role(role_id).await?.is_none() {
                bail!("role {} does not exist", role_id.0);
            }
            let changes = UserChanges {
                role_id: Some(role_id),
                ..UserChanges::default()
            };
            let user = storage
                .update_user(UserId(user_id), &changes)
                .await?
                .with_context(|| format!("user {user_id} not found"))?;
            info!(user_id = user.id.0, role_id = role_id.0, "user role changed");
            Ok(format!("user_id={} now has role_id={}", user.id.0, role_id.0))
        }
        Command::PurgeSessions => {
            let purged = storage.purge_expired_sessions().await?;
            Ok(format!("purged {purged} expired sessions"))
        }
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;

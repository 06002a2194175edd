use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use shared::domain::AccessLevel;

#[derive(Parser, Debug)]
#[command(name = "docman", about = "Document manager client")]
pub struct Cli {
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    pub server_url: String,
    /// Where the session token and signed-in user are kept between runs.
    #[arg(long, default_value = "docman-session.json")]
    pub state_file: PathBuf,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Signup(SignupArgs),
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Shows the signed-in user restored from the state file.
    Whoami,
    #[command(subcommand)]
    Users(UsersCommand),
    #[command(subcommand)]
    Roles(RolesCommand),
    #[command(subcommand)]
    Documents(DocumentsCommand),
}

#[derive(Args, Debug)]
pub struct SignupArgs {
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub firstname: Option<String>,
    #[arg(long)]
    pub lastname: Option<String>,
    #[arg(long)]
    pub password: Option<String>,
    #[arg(long)]
    pub confirm_password: Option<String>,
    #[arg(long)]
    pub role_id: Option<i64>,
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    List,
    Get {
        id: i64,
    },
    Update {
        id: i64,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        firstname: Option<String>,
        #[arg(long)]
        lastname: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        role_id: Option<i64>,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum RolesCommand {
    List,
    Create {
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum DocumentsCommand {
    List,
    Get {
        id: i64,
    },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        content: String,
        #[arg(long, value_enum, default_value_t = Access::Public)]
        access: Access,
    },
    Update {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long, value_enum)]
        access: Option<Access>,
    },
    Delete {
        id: i64,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Private,
    Role,
}

impl From<Access> for AccessLevel {
    fn from(value: Access) -> Self {
        match value {
            Access::Public => AccessLevel::Public,
            Access::Private => AccessLevel::Private,
            Access::Role => AccessLevel::Role,
        }
    }
}

#[cfg(test)]
#[path = "tests/args_tests.rs"]
mod tests;

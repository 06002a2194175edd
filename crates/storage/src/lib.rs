use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::domain::{AccessLevel, Document, DocumentId, Role, RoleId, User, UserId};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub firstname: &'a str,
    pub lastname: &'a str,
    pub password_hash: &'a str,
    pub role_id: RoleId,
}

/// Column updates for a user row; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub username: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub password_hash: Option<String>,
    pub role_id: Option<RoleId>,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub access_id: Option<AccessLevel>,
}

#[derive(Debug, Clone)]
pub struct StoredCredentials {
    pub user: User,
    pub password_hash: String,
}

/// A document row joined with its owner's role, which decides who may read
/// role-shared documents.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub document: Document,
    pub owner_role_id: RoleId,
}

const USER_COLUMNS: &str = "id, email, username, firstname, lastname, role_id, created_at";
const DOCUMENT_COLUMNS: &str = "d.id, d.title, d.content, d.owner_id, d.access_id, d.created_at, d.updated_at, u.role_id";

/// True when the error chain bottoms out in a UNIQUE constraint failure.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .is_some_and(|e| e.is_unique_violation())
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn create_user(&self, new_user: NewUser<'_>) -> Result<User> {
        let now = Utc::now();
        let row = sqlx::query(&format!(
            "INSERT INTO users (username, email, firstname, lastname, password_hash, role_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(new_user.username)
        .bind(new_user.email)
        .bind(new_user.firstname)
        .bind(new_user.lastname)
        .bind(new_user.password_hash)
        .bind(new_user.role_id.0)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(user_from_row(&row))
    }

    pub async fn find_user(&self, user_id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(user_id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(user_from_row))
    }

    pub async fn find_credentials(&self, username: &str) -> Result<Option<StoredCredentials>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| StoredCredentials {
            user: user_from_row(&r),
            password_hash: r.get::<String, _>("password_hash"),
        }))
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id ASC"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(user_from_row).collect())
    }

    pub async fn update_user(
        &self,
        user_id: UserId,
        changes: &UserChanges,
    ) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "UPDATE users SET
                email = COALESCE(?, email),
                username = COALESCE(?, username),
                firstname = COALESCE(?, firstname),
                lastname = COALESCE(?, lastname),
                password_hash = COALESCE(?, password_hash),
                role_id = COALESCE(?, role_id),
                updated_at = ?
             WHERE id = ?
             RETURNING {USER_COLUMNS}"
        ))
        .bind(changes.email.as_deref())
        .bind(changes.username.as_deref())
        .bind(changes.firstname.as_deref())
        .bind(changes.lastname.as_deref())
        .bind(changes.password_hash.as_deref())
        .bind(changes.role_id.map(|r| r.0))
        .bind(Utc::now())
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(user_from_row))
    }

    pub async fn delete_user(&self, user_id: UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn create_role(&self, title: &str, description: Option<&str>) -> Result<Role> {
        let row = sqlx::query(
            "INSERT INTO roles (title, description) VALUES (?, ?) RETURNING id, title, description",
        )
        .bind(title)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to create role '{title}'"))?;
        Ok(role_from_row(&row))
    }

    pub async fn find_role(&self, role_id: RoleId) -> Result<Option<Role>> {
        let row = sqlx::query("SELECT id, title, description FROM roles WHERE id = ?")
            .bind(role_id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(role_from_row))
    }

    pub async fn list_roles_except(&self, reserved: RoleId) -> Result<Vec<Role>> {
        let rows = sqlx::query("SELECT id, title, description FROM roles WHERE id != ? ORDER BY id ASC")
            .bind(reserved.0)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(role_from_row).collect())
    }

    pub async fn create_document(
        &self,
        owner_id: UserId,
        title: &str,
        content: &str,
        access: AccessLevel,
    ) -> Result<DocumentId> {
        let now = Utc::now();
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO documents (title, content, owner_id, access_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(title)
        .bind(content)
        .bind(owner_id.0)
        .bind(access.id())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(DocumentId(id))
    }

    pub async fn find_document(&self, document_id: DocumentId) -> Result<Option<StoredDocument>> {
        let row = sqlx::query(&format!(
            "SELECT {DOCUMENT_COLUMNS}
             FROM documents d
             INNER JOIN users u ON u.id = d.owner_id
             WHERE d.id = ?"
        ))
        .bind(document_id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(document_from_row).transpose()
    }

    /// Documents `viewer` may read: their own, public ones, and role-shared
    /// ones whose owner holds `viewer_role`. `include_all` lifts the filter.
    pub async fn list_documents_visible_to(
        &self,
        viewer: UserId,
        viewer_role: RoleId,
        include_all: bool,
    ) -> Result<Vec<StoredDocument>> {
        let rows = sqlx::query(&format!(
            "SELECT {DOCUMENT_COLUMNS}
             FROM documents d
             INNER JOIN users u ON u.id = d.owner_id
             WHERE ?1 = 1
                OR d.owner_id = ?2
                OR d.access_id = ?3
                OR (d.access_id = ?4 AND u.role_id = ?5)
             ORDER BY d.created_at DESC, d.id DESC"
        ))
        .bind(include_all)
        .bind(viewer.0)
        .bind(AccessLevel::Public.id())
        .bind(AccessLevel::Role.id())
        .bind(viewer_role.0)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(document_from_row).collect()
    }

    pub async fn update_document(
        &self,
        document_id: DocumentId,
        changes: &DocumentChanges,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE documents SET
                title = COALESCE(?, title),
                content = COALESCE(?, content),
                access_id = COALESCE(?, access_id),
                updated_at = ?
             WHERE id = ?",
        )
        .bind(changes.title.as_deref())
        .bind(changes.content.as_deref())
        .bind(changes.access_id.map(AccessLevel::id))
        .bind(Utc::now())
        .bind(document_id.0)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_document(&self, document_id: DocumentId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(document_id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn create_session(
        &self,
        jti: &str,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query("INSERT INTO sessions (jti, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)")
            .bind(jti)
            .bind(user_id.0)
            .bind(Utc::now())
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn session_is_active(&self, jti: &str, user_id: UserId) -> Result<bool> {
        let row = sqlx::query("SELECT expires_at FROM sessions WHERE jti = ? AND user_id = ?")
            .bind(jti)
            .bind(user_id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some_and(|r| r.get::<DateTime<Utc>, _>(0) > Utc::now()))
    }

    pub async fn delete_session(&self, jti: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE jti = ?")
            .bind(jti)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn purge_expired_sessions(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn user_from_row(r: &SqliteRow) -> User {
    User {
        id: UserId(r.get::<i64, _>("id")),
        email: r.get::<String, _>("email"),
        username: r.get::<String, _>("username"),
        firstname: r.get::<String, _>("firstname"),
        lastname: r.get::<String, _>("lastname"),
        role_id: RoleId(r.get::<i64, _>("role_id")),
        created_at: Some(r.get::<DateTime<Utc>, _>("created_at")),
    }
}

fn role_from_row(r: &SqliteRow) -> Role {
    Role {
        id: RoleId(r.get::<i64, _>(0)),
        title: r.get::<String, _>(1),
        description: r.get::<Option<String>, _>(2),
    }
}

fn document_from_row(r: &SqliteRow) -> Result<StoredDocument> {
    let access_id = AccessLevel::try_from(r.get::<i64, _>(4)).map_err(anyhow::Error::msg)?;
    Ok(StoredDocument {
        document: Document {
            id: DocumentId(r.get::<i64, _>(0)),
            title: r.get::<String, _>(1),
            content: r.get::<String, _>(2),
            owner_id: UserId(r.get::<i64, _>(3)),
            access_id,
            right_id: None,
            created_at: r.get::<DateTime<Utc>, _>(5),
            updated_at: r.get::<DateTime<Utc>, _>(6),
        },
        owner_role_id: RoleId(r.get::<i64, _>(7)),
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    if parent.as_os_str().is_empty() {
        return Ok(());
    }

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

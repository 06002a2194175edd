use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(UserId);
id_newtype!(RoleId);
id_newtype!(DocumentId);

/// Reserved administrator role. Never listed, never assignable at signup.
pub const ADMIN_ROLE_ID: RoleId = RoleId(1);
/// Role given to users that sign up without picking one.
pub const DEFAULT_ROLE_ID: RoleId = RoleId(2);

/// Document visibility, carried on the wire as `accessId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum AccessLevel {
    Public,
    Private,
    Role,
}

impl AccessLevel {
    pub fn id(self) -> i64 {
        match self {
            AccessLevel::Public => 1,
            AccessLevel::Private => 2,
            AccessLevel::Role => 3,
        }
    }
}

impl TryFrom<i64> for AccessLevel {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(AccessLevel::Public),
            2 => Ok(AccessLevel::Private),
            3 => Ok(AccessLevel::Role),
            other => Err(format!("unknown access id {other}")),
        }
    }
}

impl From<AccessLevel> for i64 {
    fn from(value: AccessLevel) -> Self {
        value.id()
    }
}

/// What the caller may do with a document, carried as `rightId`.
/// Lower is stronger; anything below [`Right::Read`] may edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Right {
    Owner,
    Edit,
    Read,
}

impl Right {
    pub fn id(self) -> i64 {
        match self {
            Right::Owner => 1,
            Right::Edit => 2,
            Right::Read => 3,
        }
    }

    pub fn can_edit(self) -> bool {
        self < Right::Read
    }
}

impl TryFrom<i64> for Right {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Right::Owner),
            2 => Ok(Right::Edit),
            3 => Ok(Right::Read),
            other => Err(format!("unknown right id {other}")),
        }
    }
}

impl From<Right> for i64 {
    fn from(value: Right) -> Self {
        value.id()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub role_id: RoleId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role_id == ADMIN_ROLE_ID
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    pub content: String,
    pub owner_id: UserId,
    pub access_id: AccessLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_id: Option<Right>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

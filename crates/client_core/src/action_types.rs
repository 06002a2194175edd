use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};
use shared::domain::{Document, DocumentId, Role, User, UserId};

/// Payload of a successful delete: which record went away and the server's
/// confirmation text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deleted<Id> {
    pub id: Id,
    pub message: String,
}

/// Declares [`Action`] together with its payload-free twin [`ActionType`].
macro_rules! actions {
    ($($variant:ident $(($payload:ty))?),+ $(,)?) => {
        /// Everything the store can be told. Serializes as
        /// `{"type": "LOGIN_REQUEST", "payload": ...}`.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum Action {
            $($variant $(($payload))?),+
        }

        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum ActionType {
            $($variant),+
        }

        impl Action {
            pub fn action_type(&self) -> ActionType {
                match self {
                    $(Action::$variant { .. } => ActionType::$variant),+
                }
            }
        }
    };
}

actions! {
    SignupRequest(String),
    SignupSuccessful,
    SignupFailed(String),
    LoginRequest(String),
    LoginSuccessful,
    LoginFailed(String),
    LogoutRequest,
    LogoutSuccessful,
    LogoutFailed(String),
    AddUser(User),
    RemoveUser,
    FetchUsersRequest,
    FetchUsersSuccessful(Vec<User>),
    FetchUsersFailed(String),
    FetchRolesRequest,
    FetchRolesSuccessful(Vec<Role>),
    FetchRolesFailed(String),
    UserGetRequest,
    UserGetSuccessful(User),
    UserGetFailed(String),
    UserModifyRequest,
    UserModifySuccessful(User),
    UserModifyFailed(String),
    UserDeleteRequest,
    UserDeleteSuccessful(Deleted<UserId>),
    UserDeleteFailed(String),
    UserCancelled,
    RoleCreateRequest,
    RoleCreateSuccessful(Role),
    RoleCreateFailed(String),
    FetchDocumentsRequest,
    FetchDocumentsSuccessful(Vec<Document>),
    FetchDocumentsFailed(String),
    DocumentGetRequest,
    DocumentGetSuccessful(Document),
    DocumentGetFailed(String),
    DocumentCreateRequest,
    DocumentCreateSuccessful(Document),
    DocumentCreateFailed(String),
    DocumentModifyRequest,
    DocumentModifySuccessful(Document),
    DocumentModifyFailed(String),
    DocumentDeleteRequest,
    DocumentDeleteSuccessful(Deleted<DocumentId>),
    DocumentDeleteFailed(String),
    DocumentCancelled,
}

impl Action {
    /// The message carried by a FAILED action.
    pub fn failure_message(&self) -> Option<&str> {
        match self {
            Action::SignupFailed(message)
            | Action::LoginFailed(message)
            | Action::LogoutFailed(message)
            | Action::FetchUsersFailed(message)
            | Action::FetchRolesFailed(message)
            | Action::UserGetFailed(message)
            | Action::UserModifyFailed(message)
            | Action::UserDeleteFailed(message)
            | Action::RoleCreateFailed(message)
            | Action::FetchDocumentsFailed(message)
            | Action::DocumentGetFailed(message)
            | Action::DocumentCreateFailed(message)
            | Action::DocumentModifyFailed(message)
            | Action::DocumentDeleteFailed(message) => Some(message),
            _ => None,
        }
    }
}

impl ActionType {
    pub fn is_request(self) -> bool {
        self.to_string().ends_with("_REQUEST")
    }
}

/// Same spelling as the serialized `type` tag.
impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = format!("{self:?}");
        for (index, ch) in name.chars().enumerate() {
            if index > 0 && ch.is_ascii_uppercase() {
                f.write_char('_')?;
            }
            f.write_char(ch.to_ascii_uppercase())?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/action_types_tests.rs"]
mod tests;

//! Pure state transitions. Every reducer takes the previous slice by `Arc`
//! and returns the very same `Arc` when the action leaves it unchanged, so
//! subscribers can skip work with [`Arc::ptr_eq`].

use std::sync::Arc;

use shared::domain::{Document, Role, RoleId, User, UserId};

use crate::action_types::{Action, ActionType};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserState {
    pub id: Option<UserId>,
    pub email: String,
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub role_id: Option<RoleId>,
    pub is_authenticated: bool,
    /// Type of the last auth-related action handled.
    pub result: Option<ActionType>,
    pub error: Option<String>,
    pub users: Arc<Vec<User>>,
    pub roles: Arc<Vec<Role>>,
    pub current_user: Option<User>,
    pub users_updated: bool,
    pub users_updating: bool,
    pub current_user_updated: bool,
    pub current_user_updating: bool,
    pub current_user_modifying: bool,
    pub current_user_modified: bool,
    pub roles_updated: bool,
    pub updating_roles: bool,
    pub user_deleted: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentsState {
    pub documents: Arc<Vec<Document>>,
    pub current_document: Option<Document>,
    pub documents_updating: bool,
    pub documents_updated: bool,
    pub document_saved: bool,
    pub document_modified: bool,
    pub document_deleted: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub user: Arc<UserState>,
    pub documents: Arc<DocumentsState>,
}

pub fn root_reducer(state: &Arc<AppState>, action: &Action) -> Arc<AppState> {
    let user = user_reducer(&state.user, action);
    let documents = documents_reducer(&state.documents, action);
    if Arc::ptr_eq(&user, &state.user) && Arc::ptr_eq(&documents, &state.documents) {
        return Arc::clone(state);
    }
    Arc::new(AppState { user, documents })
}

pub fn user_reducer(state: &Arc<UserState>, action: &Action) -> Arc<UserState> {
    let mut next = UserState::clone(state);
    if action.action_type().is_request() {
        next.error = None;
    }
    if let Some(message) = action.failure_message() {
        next.error = Some(message.to_string());
    }

    match action {
        Action::SignupRequest(_)
        | Action::LoginRequest(_)
        | Action::SignupFailed(_)
        | Action::LoginFailed(_)
        | Action::LogoutSuccessful => {
            next.result = Some(action.action_type());
            next.is_authenticated = false;
        }
        Action::LogoutRequest | Action::LogoutFailed(_) => {
            next.result = Some(action.action_type());
        }
        Action::SignupSuccessful | Action::LoginSuccessful => {
            next.result = Some(action.action_type());
            next.is_authenticated = true;
        }
        Action::AddUser(user) => {
            next.id = Some(user.id);
            next.email = user.email.clone();
            next.username = user.username.clone();
            next.firstname = user.firstname.clone();
            next.lastname = user.lastname.clone();
            next.role_id = Some(user.role_id);
            next.result = Some(ActionType::AddUser);
            next.is_authenticated = true;
            next.current_user_updated = false;
        }
        Action::RemoveUser => {
            next = UserState {
                result: Some(ActionType::RemoveUser),
                roles: Arc::clone(&state.roles),
                ..UserState::default()
            };
        }
        Action::FetchUsersRequest => {
            next.users_updated = false;
            next.current_user_updated = false;
            next.current_user_modified = false;
            next.users_updating = true;
        }
        Action::FetchUsersSuccessful(users) => {
            next.users = Arc::new(users.clone());
            next.users_updated = true;
            next.users_updating = false;
        }
        Action::FetchUsersFailed(_) => {
            next.users_updated = false;
            next.users_updating = false;
        }
        Action::UserModifyRequest => {
            next.current_user_modified = false;
            next.roles_updated = false;
            next.users_updated = false;
            next.current_user_updated = false;
            next.current_user_modifying = true;
        }
        Action::UserModifySuccessful(user) => {
            next.email = user.email.clone();
            next.username = user.username.clone();
            next.firstname = user.firstname.clone();
            next.lastname = user.lastname.clone();
            next.current_user = Some(user.clone());
            next.current_user_modified = true;
            next.current_user_updated = true;
            next.current_user_modifying = false;
        }
        Action::UserModifyFailed(_) => {
            next.current_user_modified = false;
            next.current_user_modifying = false;
        }
        Action::UserGetRequest => {
            next.roles_updated = false;
            next.users_updated = false;
            next.current_user_updated = false;
            next.current_user_modified = false;
            next.current_user_updating = true;
        }
        Action::UserGetSuccessful(user) => {
            next.current_user = Some(user.clone());
            next.current_user_updated = true;
            next.current_user_updating = false;
        }
        Action::UserGetFailed(_) => {
            next.current_user_updated = false;
            next.current_user_updating = false;
        }
        Action::UserDeleteRequest => {
            next.user_deleted = false;
            next.users_updating = true;
        }
        Action::UserDeleteSuccessful(deleted) => {
            next.user_deleted = true;
            next.users_updating = false;
            if state.users.iter().any(|user| user.id == deleted.id) {
                next.users = Arc::new(
                    state
                        .users
                        .iter()
                        .filter(|user| user.id != deleted.id)
                        .cloned()
                        .collect(),
                );
            }
            if next
                .current_user
                .as_ref()
                .is_some_and(|user| user.id == deleted.id)
            {
                next.current_user = None;
            }
        }
        Action::UserDeleteFailed(_) => {
            next.user_deleted = false;
            next.users_updating = false;
        }
        Action::FetchRolesRequest | Action::RoleCreateRequest => {
            next.roles_updated = false;
            next.users_updated = false;
            next.updating_roles = true;
        }
        Action::FetchRolesSuccessful(roles) => {
            next.roles = Arc::new(roles.clone());
            next.roles_updated = true;
            next.updating_roles = false;
        }
        Action::RoleCreateSuccessful(role) => {
            let mut roles = Vec::clone(&state.roles);
            roles.push(role.clone());
            next.roles = Arc::new(roles);
            next.roles_updated = true;
            next.updating_roles = false;
        }
        Action::FetchRolesFailed(_) | Action::RoleCreateFailed(_) => {
            next.roles_updated = false;
            next.updating_roles = false;
        }
        Action::UserCancelled => {
            next.current_user_updated = false;
            next.current_user_modified = false;
            next.roles_updated = false;
            next.users_updated = false;
        }
        _ => return Arc::clone(state),
    }
    keep_if_unchanged(state, next)
}

pub fn documents_reducer(state: &Arc<DocumentsState>, action: &Action) -> Arc<DocumentsState> {
    let mut next = DocumentsState::clone(state);
    match action {
        Action::FetchDocumentsRequest => {
            next.error = None;
            next.documents_updated = false;
            next.documents_updating = true;
        }
        Action::FetchDocumentsSuccessful(documents) => {
            next.documents = Arc::new(documents.clone());
            next.documents_updated = true;
            next.documents_updating = false;
        }
        Action::DocumentGetRequest => {
            next.error = None;
            next.document_saved = false;
            next.document_modified = false;
            next.document_deleted = false;
        }
        Action::DocumentGetSuccessful(document) => {
            next.current_document = Some(document.clone());
        }
        Action::DocumentCreateRequest => {
            next.error = None;
            next.document_saved = false;
        }
        Action::DocumentCreateSuccessful(document) => {
            let mut documents = Vec::with_capacity(state.documents.len() + 1);
            documents.push(document.clone());
            documents.extend(state.documents.iter().cloned());
            next.documents = Arc::new(documents);
            next.current_document = Some(document.clone());
            next.document_saved = true;
        }
        Action::DocumentModifyRequest => {
            next.error = None;
            next.document_modified = false;
        }
        Action::DocumentModifySuccessful(document) => {
            if state.documents.iter().any(|d| d.id == document.id) {
                next.documents = Arc::new(
                    state
                        .documents
                        .iter()
                        .map(|d| if d.id == document.id { document.clone() } else { d.clone() })
                        .collect(),
                );
            }
            next.current_document = Some(document.clone());
            next.document_modified = true;
        }
        Action::DocumentDeleteRequest => {
            next.error = None;
            next.document_deleted = false;
        }
        Action::DocumentDeleteSuccessful(deleted) => {
            if state.documents.iter().any(|d| d.id == deleted.id) {
                next.documents = Arc::new(
                    state
                        .documents
                        .iter()
                        .filter(|d| d.id != deleted.id)
                        .cloned()
                        .collect(),
                );
            }
            if next
                .current_document
                .as_ref()
                .is_some_and(|d| d.id == deleted.id)
            {
                next.current_document = None;
            }
            next.document_deleted = true;
        }
        Action::FetchDocumentsFailed(message) => {
            next.error = Some(message.clone());
            next.documents_updated = false;
            next.documents_updating = false;
        }
        Action::DocumentGetFailed(message) => {
            next.error = Some(message.clone());
        }
        Action::DocumentCreateFailed(message) => {
            next.error = Some(message.clone());
            next.document_saved = false;
        }
        Action::DocumentModifyFailed(message) => {
            next.error = Some(message.clone());
            next.document_modified = false;
        }
        Action::DocumentDeleteFailed(message) => {
            next.error = Some(message.clone());
            next.document_deleted = false;
        }
        Action::DocumentCancelled => {
            next.current_document = None;
            next.document_saved = false;
            next.document_modified = false;
            next.document_deleted = false;
            next.error = None;
        }
        // Documents belong to the signed-in user.
        Action::RemoveUser => next = DocumentsState::default(),
        _ => return Arc::clone(state),
    }
    keep_if_unchanged(state, next)
}

fn keep_if_unchanged<T: PartialEq>(state: &Arc<T>, next: T) -> Arc<T> {
    if **state == next {
        Arc::clone(state)
    } else {
        Arc::new(next)
    }
}

#[cfg(test)]
#[path = "tests/reducers_tests.rs"]
mod tests;

use shared::{
    domain::{Role, RoleId, User, UserId},
    protocol::{AuthResponse, CreateRoleRequest, LoginRequest, SignupRequest, UpdateUserRequest},
    validation::{blank_updates, missing_fields},
};
use tracing::{info, warn};

use super::{fail, Actions};
use crate::{
    action_types::{Action, Deleted},
    error::ClientError,
    store::Dispatch,
};

/// What a signup form collects. `confirm_password` never leaves the client.
#[derive(Debug, Clone, Default)]
pub struct SignupDetails {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
    pub role_id: Option<RoleId>,
}

#[derive(Debug, Clone, Default)]
pub struct LoginDetails {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Actions {
    pub async fn sign_user_up(
        &self,
        dispatch: &impl Dispatch,
        details: SignupDetails,
    ) -> Result<User, ClientError> {
        dispatch.dispatch(Action::SignupRequest(
            details.username.clone().unwrap_or_default(),
        ));
        if details.password != details.confirm_password {
            return fail(
                dispatch,
                Action::SignupFailed,
                ClientError::Validation("password mismatch".into()),
            );
        }
        if let Some(message) = missing_fields([
            ("username", details.username.as_deref()),
            ("password", details.password.as_deref()),
            ("email", details.email.as_deref()),
            ("firstname", details.firstname.as_deref()),
            ("lastname", details.lastname.as_deref()),
        ]) {
            return fail(dispatch, Action::SignupFailed, ClientError::Validation(message));
        }

        let req = SignupRequest {
            firstname: details.firstname,
            lastname: details.lastname,
            username: details.username,
            email: details.email,
            password: details.password,
            role_id: details.role_id,
        };
        let auth = match self.api.signup(&req).await {
            Ok(auth) => auth,
            Err(err) => return fail(dispatch, Action::SignupFailed, err),
        };
        let user = match self.establish_session(dispatch, auth).await {
            Ok(user) => user,
            Err(err) => return fail(dispatch, Action::SignupFailed, err),
        };
        info!(user_id = user.id.0, "signed up");
        dispatch.dispatch(Action::SignupSuccessful);
        Ok(user)
    }

    pub async fn log_user_in(
        &self,
        dispatch: &impl Dispatch,
        details: LoginDetails,
    ) -> Result<User, ClientError> {
        dispatch.dispatch(Action::LoginRequest(
            details.username.clone().unwrap_or_default(),
        ));
        if let Some(message) = missing_fields([
            ("username", details.username.as_deref()),
            ("password", details.password.as_deref()),
        ]) {
            return fail(dispatch, Action::LoginFailed, ClientError::Validation(message));
        }

        let req = LoginRequest {
            username: details.username,
            password: details.password,
        };
        let auth = match self.api.login(&req).await {
            Ok(auth) => auth,
            Err(err) => return fail(dispatch, Action::LoginFailed, err),
        };
        let user = match self.establish_session(dispatch, auth).await {
            Ok(user) => user,
            Err(err) => return fail(dispatch, Action::LoginFailed, err),
        };
        info!(user_id = user.id.0, "logged in");
        dispatch.dispatch(Action::LoginSuccessful);
        Ok(user)
    }

    pub async fn log_user_out(&self, dispatch: &impl Dispatch) -> Result<(), ClientError> {
        dispatch.dispatch(Action::LogoutRequest);
        if let Err(err) = self.api.logout().await {
            return fail(dispatch, Action::LogoutFailed, err);
        }
        if let Err(err) = self.clear_session().await {
            return fail(dispatch, Action::LogoutFailed, err);
        }
        dispatch.dispatch(Action::RemoveUser);
        dispatch.dispatch(Action::LogoutSuccessful);
        Ok(())
    }

    pub async fn fetch_all_users(&self, dispatch: &impl Dispatch) -> Result<Vec<User>, ClientError> {
        dispatch.dispatch(Action::FetchUsersRequest);
        match self.api.list_users().await {
            Ok(users) => {
                dispatch.dispatch(Action::FetchUsersSuccessful(users.clone()));
                Ok(users)
            }
            Err(err) => fail(dispatch, Action::FetchUsersFailed, err),
        }
    }

    pub async fn fetch_all_roles(&self, dispatch: &impl Dispatch) -> Result<Vec<Role>, ClientError> {
        dispatch.dispatch(Action::FetchRolesRequest);
        match self.api.list_roles().await {
            Ok(roles) => {
                dispatch.dispatch(Action::FetchRolesSuccessful(roles.clone()));
                Ok(roles)
            }
            Err(err) => fail(dispatch, Action::FetchRolesFailed, err),
        }
    }

    pub async fn get_user(
        &self,
        dispatch: &impl Dispatch,
        user_id: UserId,
    ) -> Result<User, ClientError> {
        dispatch.dispatch(Action::UserGetRequest);
        match self.api.get_user(user_id).await {
            Ok(user) => {
                dispatch.dispatch(Action::UserGetSuccessful(user.clone()));
                Ok(user)
            }
            Err(err) => fail(dispatch, Action::UserGetFailed, err),
        }
    }

    pub async fn modify_user(
        &self,
        dispatch: &impl Dispatch,
        user_id: UserId,
        changes: UpdateUserRequest,
    ) -> Result<User, ClientError> {
        dispatch.dispatch(Action::UserModifyRequest);
        if let Some(message) = blank_updates([
            ("email", changes.email.as_deref()),
            ("username", changes.username.as_deref()),
            ("firstname", changes.firstname.as_deref()),
            ("lastname", changes.lastname.as_deref()),
            ("password", changes.password.as_deref()),
        ]) {
            return fail(
                dispatch,
                Action::UserModifyFailed,
                ClientError::Validation(message),
            );
        }
        match self.api.update_user(user_id, &changes).await {
            Ok(user) => {
                dispatch.dispatch(Action::UserModifySuccessful(user.clone()));
                Ok(user)
            }
            Err(err) => fail(dispatch, Action::UserModifyFailed, err),
        }
    }

    /// Returns the server's confirmation message. Deleting the signed-in
    /// account also ends the local session.
    pub async fn delete_user(
        &self,
        dispatch: &impl Dispatch,
        user_id: UserId,
    ) -> Result<String, ClientError> {
        dispatch.dispatch(Action::UserDeleteRequest);
        let envelope = match self.api.delete_user(user_id).await {
            Ok(envelope) => envelope,
            Err(err) => return fail(dispatch, Action::UserDeleteFailed, err),
        };
        dispatch.dispatch(Action::UserDeleteSuccessful(Deleted {
            id: user_id,
            message: envelope.message.clone(),
        }));

        if self.signed_in_user_id().await == Some(user_id) {
            if let Err(error) = self.clear_session().await {
                warn!(%error, "failed to clear the deleted account's session");
            }
            dispatch.dispatch(Action::RemoveUser);
        }
        Ok(envelope.message)
    }

    pub fn cancel_user(&self, dispatch: &impl Dispatch) {
        dispatch.dispatch(Action::UserCancelled);
    }

    pub async fn create_role(
        &self,
        dispatch: &impl Dispatch,
        title: &str,
        description: Option<&str>,
    ) -> Result<Role, ClientError> {
        dispatch.dispatch(Action::RoleCreateRequest);
        if let Some(message) = missing_fields([("title", Some(title))]) {
            return fail(
                dispatch,
                Action::RoleCreateFailed,
                ClientError::Validation(message),
            );
        }
        let req = CreateRoleRequest {
            title: Some(title.to_string()),
            description: description.map(str::to_string),
        };
        match self.api.create_role(&req).await {
            Ok(role) => {
                dispatch.dispatch(Action::RoleCreateSuccessful(role.clone()));
                Ok(role)
            }
            Err(err) => fail(dispatch, Action::RoleCreateFailed, err),
        }
    }

    /// Stores the credentials, installs the bearer token and dispatches
    /// ADD_USER. Partial users are completed from the server first; if that
    /// fails the stored session is wiped again.
    async fn establish_session(
        &self,
        dispatch: &impl Dispatch,
        auth: AuthResponse,
    ) -> Result<User, ClientError> {
        self.persist_session(&auth.user, &auth.token).await?;
        self.api.set_token(Some(auth.token.clone()));

        let user = if auth.partial {
            match self.api.get_user(auth.user.id).await {
                Ok(user) => {
                    self.persist_session(&user, &auth.token).await?;
                    user
                }
                Err(err) => {
                    self.clear_session().await?;
                    return Err(err);
                }
            }
        } else {
            auth.user
        };

        dispatch.dispatch(Action::AddUser(user.clone()));
        Ok(user)
    }
}

#[cfg(test)]
#[path = "tests/users_tests.rs"]
mod tests;

//! Asynchronous action functions. Each one dispatches its REQUEST action,
//! makes at most one call for its main operation and then dispatches
//! exactly one SUCCESSFUL or FAILED action before returning the outcome.

use std::sync::Arc;

use shared::domain::{User, UserId};
use tracing::{info, warn};

use crate::{
    action_types::Action,
    api_client::ApiClient,
    error::ClientError,
    kv_store::{KeyValueStore, TOKEN_KEY, USER_KEY},
    store::Dispatch,
};

mod documents;
mod users;

pub use users::{LoginDetails, SignupDetails};

/// Holds what action functions need besides the dispatcher: the API client
/// and the durable session storage.
#[derive(Clone)]
pub struct Actions {
    api: ApiClient,
    storage: Arc<dyn KeyValueStore>,
}

impl Actions {
    pub fn new(api: ApiClient, storage: Arc<dyn KeyValueStore>) -> Self {
        Self { api, storage }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Brings back a session saved by an earlier sign-in. Returns `false`
    /// when nothing usable was stored; unreadable entries are dropped.
    pub async fn restore_session(&self, dispatch: &impl Dispatch) -> Result<bool, ClientError> {
        let token = self.storage.get(TOKEN_KEY).await?;
        let stored_user = self.storage.get(USER_KEY).await?;
        let (Some(token), Some(stored_user)) = (token, stored_user) else {
            return Ok(false);
        };

        let user: User = match serde_json::from_str(&stored_user) {
            Ok(user) => user,
            Err(error) => {
                warn!(%error, "discarding unreadable stored user");
                self.clear_session().await?;
                return Ok(false);
            }
        };

        self.api.set_token(Some(token));
        info!(user_id = user.id.0, "session restored");
        dispatch.dispatch(Action::AddUser(user));
        Ok(true)
    }

    /// Id of the user saved by the last sign-in, if any.
    async fn signed_in_user_id(&self) -> Option<UserId> {
        let stored = self.storage.get(USER_KEY).await.ok()??;
        serde_json::from_str::<User>(&stored).ok().map(|user| user.id)
    }

    async fn persist_session(&self, user: &User, token: &str) -> Result<(), ClientError> {
        let serialized =
            serde_json::to_string(user).map_err(|e| ClientError::Storage(e.to_string()))?;
        self.storage.set(TOKEN_KEY, token).await?;
        self.storage.set(USER_KEY, &serialized).await
    }

    async fn clear_session(&self) -> Result<(), ClientError> {
        self.api.set_token(None);
        self.storage.remove(TOKEN_KEY).await?;
        self.storage.remove(USER_KEY).await
    }
}

/// Dispatches the FAILED action for `err` and hands the error back.
fn fail<T>(
    dispatch: &impl Dispatch,
    failed: fn(String) -> Action,
    err: ClientError,
) -> Result<T, ClientError> {
    let action = failed(err.to_string());
    warn!(action = %action.action_type(), error = %err, "action failed");
    dispatch.dispatch(action);
    Err(err)
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;

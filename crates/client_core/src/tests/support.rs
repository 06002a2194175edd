use std::sync::{Arc, Mutex};

use axum::Router;
use shared::domain::{RoleId, User, UserId};
use tokio::net::TcpListener;

use crate::{
    action_types::{Action, ActionType},
    actions::Actions,
    api_client::ApiClient,
    kv_store::MemoryKeyValueStore,
    store::Dispatch,
};

/// Records dispatched actions instead of reducing them.
#[derive(Default)]
pub(crate) struct Recorder {
    actions: Mutex<Vec<Action>>,
}

impl Recorder {
    pub(crate) fn actions(&self) -> Vec<Action> {
        self.actions.lock().expect("recorder lock").clone()
    }

    pub(crate) fn types(&self) -> Vec<ActionType> {
        self.actions().iter().map(Action::action_type).collect()
    }
}

impl Dispatch for Recorder {
    fn dispatch(&self, action: Action) {
        self.actions.lock().expect("recorder lock").push(action);
    }
}

pub(crate) async fn spawn_stub(app: Router) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

pub(crate) fn sample_user(id: i64, username: &str) -> User {
    User {
        id: UserId(id),
        email: format!("{username}@example.com"),
        username: username.into(),
        firstname: "Itunuloluwa".into(),
        lastname: "Fatoki".into(),
        role_id: RoleId(2),
        created_at: None,
    }
}

pub(crate) fn actions_for(server_url: &str) -> (Actions, Arc<MemoryKeyValueStore>) {
    let storage = Arc::new(MemoryKeyValueStore::new());
    let api = ApiClient::new(server_url).expect("client");
    (Actions::new(api, storage.clone()), storage)
}

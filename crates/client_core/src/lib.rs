//! Client side of the document manager: typed actions, reducers that fold
//! them into [`AppState`], a [`Store`] to dispatch into, and the async action
//! functions that talk to the server through [`ApiClient`].

pub mod action_types;
pub mod actions;
pub mod api_client;
pub mod error;
pub mod kv_store;
pub mod reducers;
pub mod store;

pub use action_types::{Action, ActionType, Deleted};
pub use actions::{Actions, LoginDetails, SignupDetails};
pub use api_client::ApiClient;
pub use error::ClientError;
pub use kv_store::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use reducers::{AppState, DocumentsState, UserState};
pub use store::{Dispatch, Store, StoreUpdate};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

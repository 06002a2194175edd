use std::sync::{Arc, PoisonError, RwLock};

use futures::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::debug;

use crate::{
    action_types::Action,
    reducers::{root_reducer, AppState},
};

const UPDATE_CHANNEL_CAPACITY: usize = 256;

/// Anything action functions can report to. The [`Store`] is the real one;
/// tests substitute a recorder.
pub trait Dispatch: Send + Sync {
    fn dispatch(&self, action: Action);
}

/// Sent to subscribers after every dispatch.
#[derive(Debug, Clone)]
pub struct StoreUpdate {
    pub action: Action,
    pub state: Arc<AppState>,
}

pub struct Store {
    state: RwLock<Arc<AppState>>,
    updates: broadcast::Sender<StoreUpdate>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self::with_state(AppState::default())
    }

    pub fn with_state(state: AppState) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            state: RwLock::new(Arc::new(state)),
            updates,
        }
    }

    pub fn get_state(&self) -> Arc<AppState> {
        Arc::clone(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreUpdate> {
        self.updates.subscribe()
    }

    /// Subscription as a stream. Updates missed by a lagging consumer are
    /// skipped rather than ending the stream.
    pub fn updates(&self) -> impl Stream<Item = StoreUpdate> + Send + 'static {
        BroadcastStream::new(self.updates.subscribe())
            .filter_map(|update| async move { update.ok() })
    }
}

impl Dispatch for Store {
    fn dispatch(&self, action: Action) {
        let state = {
            let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let next = root_reducer(&guard, &action);
            *guard = Arc::clone(&next);
            next
        };
        debug!(action = %action.action_type(), "dispatched");
        // No subscribers is fine.
        let _ = self.updates.send(StoreUpdate { action, state });
    }
}

impl<D: Dispatch + ?Sized> Dispatch for Arc<D> {
    fn dispatch(&self, action: Action) {
        (**self).dispatch(action)
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;

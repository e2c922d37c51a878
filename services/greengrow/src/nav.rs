//! Navigation seam for session teardown

use async_trait::async_trait;

use crate::state::StateHandle;

/// Collaborator that sends the user to the login flow
///
/// Injected into the poll engine so auth failures discovered mid-poll can
/// trigger navigation without the engine knowing how routing works.
#[async_trait]
pub trait Navigator: Send + Sync {
    /// Send the user to the login flow.
    async fn to_login(&self);
}

/// Production navigator: drops the in-memory session so the next page load
/// redirects to `/login`.
pub struct StateNavigator {
    state: StateHandle,
}

impl StateNavigator {
    pub fn new(state: StateHandle) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Navigator for StateNavigator {
    async fn to_login(&self) {
        tracing::info!("Session gone, sending user to login");
        self.state.write().await.clear_session();
    }
}

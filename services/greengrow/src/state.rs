//! Shared state for the dashboard view and the poll engine

use std::sync::Arc;

use gg_auth::Claims;
use tokio::sync::RwLock;

use crate::models::{Greenhouse, Overview};
use crate::reconcile::{self, SensorCollection};

/// Everything the dashboard renders, kept fresh by the poll engine
#[derive(Debug)]
pub struct SharedState {
    /// Decoded claims of the signed-in user, `None` when logged out.
    pub user: Option<Claims>,
    /// Greenhouses available in the selector.
    pub greenhouses: Vec<Greenhouse>,
    /// Currently selected greenhouse id, `None` when the selector is empty.
    pub selected: Option<u64>,
    /// Detail of the selected greenhouse, fetched once per selection.
    pub greenhouse: Option<Greenhouse>,
    /// Latest reconciled sensor snapshot.
    pub sensors: SensorCollection,
    /// Asserted only while the first fetch of a selection is in flight.
    pub loading: bool,
    /// User-visible sensor fetch error, cleared by the next good poll.
    pub error: Option<String>,
    pub overview: Option<Overview>,
    pub overview_error: Option<String>,
    /// Epoch millis of the last completed sensor poll.
    pub last_poll_epoch_ms: u64,
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            user: None,
            greenhouses: Vec::new(),
            selected: None,
            greenhouse: None,
            sensors: reconcile::empty(),
            loading: false,
            error: None,
            overview: None,
            overview_error: None,
            last_poll_epoch_ms: 0,
        }
    }

    /// Drop everything derived from the selected greenhouse.
    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.greenhouse = None;
        self.sensors = reconcile::empty();
        self.loading = false;
        self.error = None;
        self.overview = None;
        self.overview_error = None;
        self.last_poll_epoch_ms = 0;
    }

    /// Drop the session and everything behind it.
    pub fn clear_session(&mut self) {
        self.user = None;
        self.greenhouses.clear();
        self.clear_selection();
    }

    /// Merge a fetched sensor list into the snapshot and clear the error flag.
    pub fn apply_sensors(&mut self, incoming: SensorCollection) {
        self.sensors = reconcile::reconcile(&self.sensors, incoming);
        self.error = None;
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe shared state handle
pub type StateHandle = Arc<RwLock<SharedState>>;

pub fn new_state_handle() -> StateHandle {
    Arc::new(RwLock::new(SharedState::new()))
}

//! Poll engine: keeps the selected greenhouse's snapshot fresh
//!
//! One poll task exists per selection. Selecting a greenhouse cancels and
//! awaits any previous task before the new one starts, so a stale response
//! can never land in the next greenhouse's state. Each cycle completes
//! before the next interval sleep begins; a tick that would fire while a
//! slow response is outstanding is skipped rather than queued.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use gg_auth::SessionStore;
use tokio_util::sync::CancellationToken;

use crate::api::BackendClient;
use crate::nav::Navigator;
use crate::reconcile;
use crate::state::StateHandle;
use crate::GreengrowError;

/// Default pause between poll cycles
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

pub const SENSORS_NOT_FOUND: &str = "Greenhouse or sensors not found.";
pub const SENSORS_FAILED: &str = "Failed to load environment data.";
pub const OVERVIEW_FAILED: &str = "Failed to load overview data.";

struct ActivePoll {
    cancel: CancellationToken,
    handle: tokio::task::JoinHandle<()>,
}

/// Repeatedly fetches and reconciles the selected greenhouse's sensors
pub struct Poller {
    api: Arc<BackendClient>,
    session: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    state: StateHandle,
    interval: Duration,
    active: tokio::sync::Mutex<Option<ActivePoll>>,
}

impl Poller {
    pub fn new(
        api: Arc<BackendClient>,
        session: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
        state: StateHandle,
        interval: Duration,
    ) -> Self {
        Self {
            api,
            session,
            navigator,
            state,
            interval,
            active: tokio::sync::Mutex::new(None),
        }
    }

    /// Change the selected greenhouse; `None` empties the selector.
    ///
    /// With a selection and a present session this runs the first
    /// fetch-and-reconcile cycle immediately (loading flag asserted for this
    /// cycle only), fetches the overview, and then starts the repeating poll
    /// task. An empty selector stops polling and clears derived state.
    pub async fn select(self: &Arc<Self>, greenhouse_id: Option<u64>) {
        // Selections serialize on the active-poll slot, so two concurrent
        // selector changes can't each leave a loop running.
        let mut active = self.active.lock().await;
        stop(&mut active).await;

        {
            let mut state = self.state.write().await;
            state.clear_selection();
            state.selected = greenhouse_id;
        }

        let Some(id) = greenhouse_id else {
            tracing::debug!("Selector emptied, polling stopped");
            return;
        };

        if self.session.access_token().is_none() {
            self.state.write().await.selected = None;
            self.navigator.to_login().await;
            return;
        }

        tracing::info!("Polling greenhouse {} every {:?}", id, self.interval);
        self.state.write().await.loading = true;

        let mut flow = self.fetch_overview(id).await;
        if flow.is_continue() {
            flow = self.cycle(id).await;
        }
        self.state.write().await.loading = false;
        if flow.is_break() {
            return;
        }

        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let poller = Arc::clone(self);
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = task_cancel.cancelled() => break,
                    _ = tokio::time::sleep(poller.interval) => {}
                }
                if poller.cycle(id).await.is_break() {
                    break;
                }
            }
            tracing::debug!("Poll loop for greenhouse {} ended", id);
        });

        *active = Some(ActivePoll { cancel, handle });
    }

    /// Stop polling but keep state intact for re-attachment.
    pub async fn shutdown(&self) {
        let mut active = self.active.lock().await;
        stop(&mut active).await;
    }

    /// One fetch-and-reconcile cycle. `Break` means polling must stop.
    async fn cycle(&self, id: u64) -> ControlFlow<()> {
        let Some(token) = self.session.access_token() else {
            tracing::info!("Access token disappeared mid-poll");
            self.navigator.to_login().await;
            return ControlFlow::Break(());
        };

        // The detail is fetched once per selection; retried only while missing.
        if self.state.read().await.greenhouse.is_none() {
            match self.api.greenhouse(&token, id).await {
                Ok(greenhouse) => self.state.write().await.greenhouse = Some(greenhouse),
                Err(GreengrowError::Unauthorized) => return self.expire_session().await,
                Err(e) => tracing::debug!("Greenhouse {} detail fetch failed: {}", id, e),
            }
        }

        match self.api.sensors(&token, id).await {
            Ok(sensors) => {
                let incoming = reconcile::from_sensors(sensors);
                // One write guard for the whole reconcile-and-set so readers
                // never observe a half-applied tick.
                let mut state = self.state.write().await;
                state.apply_sensors(incoming);
                state.last_poll_epoch_ms = current_epoch_ms();
            }
            Err(GreengrowError::Unauthorized) => return self.expire_session().await,
            Err(e) => {
                tracing::debug!("Sensor fetch for greenhouse {} failed: {}", id, e);
                self.state.write().await.error = Some(sensors_error_message(&e));
            }
        }

        ControlFlow::Continue(())
    }

    async fn fetch_overview(&self, id: u64) -> ControlFlow<()> {
        let Some(token) = self.session.access_token() else {
            self.navigator.to_login().await;
            return ControlFlow::Break(());
        };

        match self.api.overview(&token, id).await {
            Ok(overview) => {
                let mut state = self.state.write().await;
                state.overview = Some(overview);
                state.overview_error = None;
            }
            Err(GreengrowError::Unauthorized) => return self.expire_session().await,
            Err(e) => {
                tracing::debug!("Overview fetch for greenhouse {} failed: {}", id, e);
                let mut state = self.state.write().await;
                state.overview = None;
                state.overview_error = Some(OVERVIEW_FAILED.to_string());
            }
        }

        ControlFlow::Continue(())
    }

    async fn expire_session(&self) -> ControlFlow<()> {
        tracing::info!("Backend rejected the session, clearing it");
        self.session.clear();
        self.navigator.to_login().await;
        ControlFlow::Break(())
    }
}

/// Cancel the active poll task and wait for it to finish.
///
/// The old task must be gone before a new one starts, otherwise a late
/// response could leak into the next greenhouse's state.
async fn stop(active: &mut Option<ActivePoll>) {
    if let Some(active) = active.take() {
        active.cancel.cancel();
        let _ = active.handle.await;
    }
}

/// User-visible message for a failed sensor fetch.
fn sensors_error_message(err: &GreengrowError) -> String {
    match err {
        GreengrowError::NotFound(_) => SENSORS_NOT_FOUND.to_string(),
        GreengrowError::Http(msg) => format!("Failed to load environment data: {msg}"),
        _ => SENSORS_FAILED.to_string(),
    }
}

fn current_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

//! GreenGrow - greenhouse monitoring dashboard
//!
//! Polls a greenhouse REST backend for sensor readings, reconciles them into
//! an in-memory snapshot, and serves a browser-rendered dashboard from it.

pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod io;
pub mod models;
pub mod nav;
pub mod poller;
pub mod reconcile;
pub mod state;

pub use config::{load_config, Config};
pub use error::{GreengrowError, Result};

use std::net::SocketAddr;
use std::sync::Arc;

use gg_auth::{FileSessionStore, SessionStore};
use tokio_util::sync::CancellationToken;

use crate::api::BackendClient;
use crate::io::ReqwestHttpClient;
use crate::nav::{Navigator, StateNavigator};
use crate::poller::Poller;

/// Run the dashboard service with the given configuration
pub async fn run(config: Config) -> Result<()> {
    let session: Arc<dyn SessionStore> =
        Arc::new(FileSessionStore::new(&config.session.token_path));
    let http: Arc<dyn io::HttpClient> = Arc::new(ReqwestHttpClient::default());
    let api = Arc::new(BackendClient::new(&config.backend.base_url, http));
    let state = state::new_state_handle();
    let navigator: Arc<dyn Navigator> = Arc::new(StateNavigator::new(Arc::clone(&state)));
    let cancel = CancellationToken::new();

    let poller = Arc::new(Poller::new(
        Arc::clone(&api),
        Arc::clone(&session),
        Arc::clone(&navigator),
        Arc::clone(&state),
        config.poller.interval,
    ));

    // Session check mirrors the first page load: decode the stored token's
    // claims or drop the broken session.
    let token = match session.access_token() {
        Some(token) => match gg_auth::decode_claims(&token) {
            Ok(claims) => {
                tracing::info!("Session found for {}", claims.display_name());
                state.write().await.user = Some(claims);
                Some(token)
            }
            Err(e) => {
                tracing::warn!("Stored access token is invalid, clearing session: {}", e);
                session.clear();
                None
            }
        },
        None => {
            tracing::info!("No stored session, dashboard will ask for login");
            None
        }
    };

    // Fetch the greenhouse list and start on its first entry.
    if let Some(token) = token {
        match api.list_greenhouses(&token).await {
            Ok(greenhouses) => {
                tracing::debug!("Fetched {} greenhouses", greenhouses.len());
                let first = greenhouses.first().map(|g| g.id);
                state.write().await.greenhouses = greenhouses;
                if let Some(id) = first {
                    poller.select(Some(id)).await;
                }
            }
            Err(GreengrowError::Unauthorized) => {
                tracing::warn!("Backend rejected the stored session");
                session.clear();
                navigator.to_login().await;
            }
            Err(e) => {
                tracing::warn!("Failed to fetch greenhouse list: {}", e);
            }
        }
    }

    // Setup shutdown handler
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            cancel_for_signal.cancel();
        }
    });

    if config.dashboard.enabled {
        let router = dashboard::build_router(Arc::clone(&state), Arc::clone(&poller));
        let addr = SocketAddr::from(([0, 0, 0, 0], config.dashboard.port));
        tracing::info!("Dashboard listening on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;

        let cancel_for_server = cancel.clone();
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                cancel_for_server.cancelled().await;
            })
            .await?;
    } else {
        tracing::info!("Dashboard disabled, polling headless until shutdown");
        cancel.cancelled().await;
    }

    poller.shutdown().await;
    tracing::info!("GreenGrow dashboard stopped");

    Ok(())
}

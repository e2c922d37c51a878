//! Greenhouse backend REST client

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::io::HttpClient;
use crate::models::{Greenhouse, Overview, Sensor};
use crate::GreengrowError;

/// Client for the greenhouse backend's REST API
///
/// Performs authenticated GETs and maps response statuses onto the error
/// taxonomy: 401/403 become `Unauthorized`, 404 becomes `NotFound`, and any
/// other failure (transport, server, malformed body) is transient. Never
/// mutates shared state; callers apply results.
pub struct BackendClient {
    base_url: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl BackendClient {
    pub fn new(base_url: &str, http: Arc<dyn HttpClient>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    /// All greenhouses visible to the user.
    pub async fn list_greenhouses(&self, token: &str) -> crate::Result<Vec<Greenhouse>> {
        self.get_json("/api/greenhouses/", token).await
    }

    /// A single greenhouse's details.
    pub async fn greenhouse(&self, token: &str, id: u64) -> crate::Result<Greenhouse> {
        self.get_json(&format!("/api/greenhouses/{id}/"), token)
            .await
    }

    /// The sensor list for a greenhouse.
    pub async fn sensors(&self, token: &str, id: u64) -> crate::Result<Vec<Sensor>> {
        self.get_json(&format!("/api/greenhouses/{id}/sensors/"), token)
            .await
    }

    /// The overview payload: greenhouse info, actuator statuses, alerts.
    pub async fn overview(&self, token: &str, id: u64) -> crate::Result<Overview> {
        self.get_json(&format!("/api/greenhouses/{id}/overview/"), token)
            .await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, token: &str) -> crate::Result<T> {
        if token.is_empty() {
            return Err(GreengrowError::Unauthorized);
        }

        let url = format!("{}{}", self.base_url, path);
        let response = self.http.get(&url, token).await?;

        match response.status {
            200..=299 => Ok(serde_json::from_str(&response.body)?),
            401 | 403 => Err(GreengrowError::Unauthorized),
            404 => Err(GreengrowError::NotFound(url)),
            status => Err(GreengrowError::Http(format!("status {status}"))),
        }
    }
}

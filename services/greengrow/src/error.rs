//! Error types for the greengrow dashboard

/// Errors that can occur in the dashboard service
///
/// Fetch failures fall into three families: `Unauthorized` is fatal to the
/// session, `NotFound` is surfaced to the user as a not-found message, and
/// everything else is transient — the user sees a generic failure message
/// and the next poll retries.
#[derive(Debug, thiserror::Error)]
pub enum GreengrowError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not authorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for dashboard operations
pub type Result<T> = std::result::Result<T, GreengrowError>;

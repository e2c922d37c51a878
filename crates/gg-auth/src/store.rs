//! Persisted session storage
//!
//! The two token strings (`access_token` and `refresh_token`) live in a
//! small JSON file written by the external login flow. The file is re-read
//! on every access so a login performed while the service runs is picked up
//! on the next poll.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk shape of the session file
#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedTokens {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Read/clear access to the persisted session
///
/// Injected wherever session state is needed so consumers never touch the
/// storage location directly.
pub trait SessionStore: Send + Sync {
    /// The bearer token, if a session is present.
    fn access_token(&self) -> Option<String>;

    /// The refresh token, if one was stored alongside the access token.
    fn refresh_token(&self) -> Option<String>;

    /// Persist a new token pair.
    fn save(&self, access_token: &str, refresh_token: Option<&str>) -> crate::Result<()>;

    /// Destroy the persisted session.
    fn clear(&self);
}

/// File-backed session store
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Option<PersistedTokens> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Failed to read session file {:?}: {}", self.path, e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(tokens) => Some(tokens),
            Err(e) => {
                tracing::warn!("Session file {:?} is not valid JSON: {}", self.path, e);
                None
            }
        }
    }
}

impl SessionStore for FileSessionStore {
    fn access_token(&self) -> Option<String> {
        self.read()?.access_token.filter(|t| !t.is_empty())
    }

    fn refresh_token(&self) -> Option<String> {
        self.read()?.refresh_token.filter(|t| !t.is_empty())
    }

    fn save(&self, access_token: &str, refresh_token: Option<&str>) -> crate::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tokens = PersistedTokens {
            access_token: Some(access_token.to_string()),
            refresh_token: refresh_token.map(str::to_string),
        };
        std::fs::write(&self.path, serde_json::to_string_pretty(&tokens)?)?;
        tracing::debug!("Saved session to {:?}", self.path);
        Ok(())
    }

    fn clear(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::info!("Cleared session at {:?}", self.path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to clear session file {:?}: {}", self.path, e),
        }
    }
}

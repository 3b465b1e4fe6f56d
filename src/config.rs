//! Client configuration

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Client settings
///
/// Stored as JSON. Missing fields fall back to the defaults, so an old
/// settings file keeps loading after new options are added.
///
/// # Example
/// ```rust,no_run
/// use pos_admin::config::Settings;
///
/// let settings = Settings::load("pos-admin.json").expect("Failed to load");
/// println!("API: {}", settings.api_base_url);
/// println!("Reconnect after {:?}", settings.reconnect_delay());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the REST backend (endpoint paths are appended)
    pub api_base_url: String,
    /// WebSocket chat endpoint (the token is added as a query parameter)
    pub ws_url: String,
    /// Fixed delay before a chat reconnect attempt, in milliseconds
    pub reconnect_delay_ms: u64,
    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,
    /// Path of the SQLite file backing the local store
    pub storage_path: String,
    /// Lifetime of the persisted token cookie, in days
    pub token_cookie_days: i64,
    /// Number of receipt items shown before the "+N more" line
    pub receipt_preview_items: usize,
}

impl Settings {
    /// Load settings from a JSON file
    ///
    /// Returns the defaults if the file doesn't exist or is empty.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(path)
            .map_err(|e| Error::Storage(format!("Failed to read settings: {}", e)))?;

        if data.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_json::from_str(&data)
            .map_err(|e| Error::Storage(format!("Failed to parse settings: {}", e)))
    }

    /// Save settings to a JSON file, creating the parent directory if needed
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Storage(format!("Failed to create settings directory: {}", e)))?;
        }

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .map_err(|e| Error::Storage(format!("Failed to write settings: {}", e)))?;

        Ok(())
    }

    /// Reconnect delay as a `Duration`
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// Request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Token cookie lifetime
    pub fn token_cookie_lifetime(&self) -> chrono::Duration {
        chrono::Duration::days(self.token_cookie_days)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000/api".to_string(),
            ws_url: "ws://127.0.0.1:8000/api/chat/ws".to_string(),
            reconnect_delay_ms: 3000,
            request_timeout_secs: 30,
            storage_path: "./data/pos-admin.db".to_string(),
            token_cookie_days: 7,
            receipt_preview_items: 3,
        }
    }
}

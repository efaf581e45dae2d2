use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "config/chat.json";

const RELAY_URL_VAR: &str = "CHAT_RELAY_URL";
const DIRECTORY_URL_VAR: &str = "CHAT_DIRECTORY_URL";
const PEER_REFRESH_VAR: &str = "CHAT_PEER_REFRESH_SECS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// WebSocket base; the identity is appended as the last path segment.
    #[serde(default = "default_relay_url")]
    pub relay_url: String,
    /// HTTP base serving `/get_users/{identity}`.
    #[serde(default = "default_directory_url")]
    pub directory_url: String,
    /// Poll the directory on this period. Unset means refresh on demand only.
    #[serde(default)]
    pub peer_refresh_secs: Option<u64>,
    /// Re-fetch the directory when the relay announces presence changes.
    #[serde(default = "default_refresh_on_presence")]
    pub refresh_on_presence: bool,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_relay_url() -> String {
    "ws://localhost:8000/ws/chat".to_string()
}

fn default_directory_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_refresh_on_presence() -> bool {
    true
}

fn default_channel_capacity() -> usize {
    100
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            relay_url: default_relay_url(),
            directory_url: default_directory_url(),
            peer_refresh_secs: None,
            refresh_on_presence: default_refresh_on_presence(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl AppConfig {
    pub fn peer_refresh_interval(&self) -> Option<Duration> {
        self.peer_refresh_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Applies `CHAT_*` overrides from the process environment (and `.env`,
    /// once dotenvy has loaded it).
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(RELAY_URL_VAR) {
            self.relay_url = url;
        }
        if let Some(url) = lookup(DIRECTORY_URL_VAR) {
            self.directory_url = url;
        }
        if let Some(raw) = lookup(PEER_REFRESH_VAR) {
            match raw.trim().parse::<u64>() {
                Ok(secs) => self.peer_refresh_secs = Some(secs),
                Err(err) => log::warn!("Ignoring {PEER_REFRESH_VAR}={raw}: {err}"),
            }
        }
        self
    }
}

pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                AppConfig::default()
            }
        },
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
    }
}

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::network::{DEFAULT_RETRY_DELAY, HubError, TransportOptions, parse_hub_url};

pub const DEFAULT_CONFIG_PATH: &str = "config/client.json";
pub const SERVER_URL_ENV: &str = "HUB_CHAT_SERVER_URL";
/// Endpoint path the hub is mapped to on the server.
pub const HUB_PATH: &str = "/hub";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server_url: String,
    pub retry_delay_ms: u64,
    pub skip_negotiation: bool,
    pub handshake_timeout_ms: u64,
    pub keep_alive_interval_ms: u64,
    pub server_timeout_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:5000".to_string(),
            retry_delay_ms: DEFAULT_RETRY_DELAY.as_millis() as u64,
            skip_negotiation: false,
            handshake_timeout_ms: 15_000,
            keep_alive_interval_ms: 15_000,
            server_timeout_ms: 30_000,
        }
    }
}

impl AppConfig {
    /// Applies environment overrides. `lookup` is `std::env::var` in
    /// production.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(server_url) = lookup(SERVER_URL_ENV).filter(|value| !value.trim().is_empty()) {
            log::info!("Using server url from {SERVER_URL_ENV}");
            self.server_url = server_url.trim().to_string();
        }
    }

    pub fn hub_endpoint(&self) -> Result<Url, HubError> {
        parse_hub_url(&format!(
            "{}{HUB_PATH}",
            self.server_url.trim_end_matches('/')
        ))
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            skip_negotiation: self.skip_negotiation,
            handshake_timeout: Duration::from_millis(self.handshake_timeout_ms),
            keep_alive_interval: Duration::from_millis(self.keep_alive_interval_ms),
            server_timeout: Duration::from_millis(self.server_timeout_ms),
        }
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

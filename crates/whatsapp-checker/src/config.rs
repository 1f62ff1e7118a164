//! Configuration for the number checker.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// WhatsApp bridge configuration
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Device store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Frontend bundle configuration
    #[serde(default)]
    pub frontend: FrontendConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    /// WhatsApp bridge REST API URL
    #[serde(default = "default_bridge_api_url")]
    pub api_url: String,

    /// Timeout for a single bridge request
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// How often pairing events are polled
    #[serde(default = "default_pairing_poll_interval", with = "humantime_serde")]
    pub pairing_poll_interval: Duration,

    /// How often the live session state is re-checked
    #[serde(default = "default_status_interval", with = "humantime_serde")]
    pub status_interval: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the device record
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FrontendConfig {
    /// Directory holding the built single-page app
    #[serde(default = "default_frontend_dir")]
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            api_url: default_bridge_api_url(),
            request_timeout: default_request_timeout(),
            pairing_poll_interval: default_pairing_poll_interval(),
            status_interval: default_status_interval(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
        }
    }
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            dir: default_frontend_dir(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_bridge_api_url() -> String {
    "http://whatsapp-bridge:8080".into()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_pairing_poll_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_status_interval() -> Duration {
    Duration::from_secs(15)
}

fn default_store_path() -> PathBuf {
    PathBuf::from("store.json")
}

fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    3000
}

fn default_frontend_dir() -> PathBuf {
    PathBuf::from("frontend/build")
}

fn default_log_level() -> String {
    "info".into()
}

impl ServerConfig {
    /// Socket address to bind.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .listen_addr
            .parse()
            .with_context(|| format!("Invalid listen address: {}", self.listen_addr))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: Config = serde_json::from_value(serde_json::json!({})).unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.store.path, PathBuf::from("store.json"));
        assert_eq!(config.frontend.dir, PathBuf::from("frontend/build"));
        assert_eq!(config.bridge.request_timeout, Duration::from_secs(30));
        assert_eq!(config.log.level, "info");
        assert!(!config.log.json);
    }

    #[test]
    fn test_humantime_durations() {
        let config: Config = serde_json::from_value(serde_json::json!({
            "bridge": {"status_interval": "1m 30s", "pairing_poll_interval": "250ms"}
        }))
        .unwrap();

        assert_eq!(config.bridge.status_interval, Duration::from_secs(90));
        assert_eq!(config.bridge.pairing_poll_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_socket_addr() {
        let server = ServerConfig {
            listen_addr: "127.0.0.1".into(),
            port: 3000,
        };
        assert_eq!(server.socket_addr().unwrap(), "127.0.0.1:3000".parse::<SocketAddr>().unwrap());

        let bad = ServerConfig {
            listen_addr: "localhost".into(),
            port: 3000,
        };
        assert!(bad.socket_addr().is_err());
    }
}

//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.parley/config.json`) and environment.

use crate::channels::DEFAULT_SENDER_ID;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Input/output channel settings.
    #[serde(default)]
    pub channels: ChannelsConfig,
}

/// Server bind, port and the route all input channels are mounted under.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Port (default 5005).
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_server_bind")]
    pub bind: String,

    /// Base route for input channels (default "/webhooks"); a channel lives at `<route>/<prefix>`.
    #[serde(default = "default_server_route")]
    pub route: String,
}

fn default_server_port() -> u16 {
    5005
}

fn default_server_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_server_route() -> String {
    "/webhooks".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
            bind: default_server_bind(),
            route: default_server_route(),
        }
    }
}

/// Channel settings shared by all channels plus per-channel sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelsConfig {
    /// Sender id for messages that arrive without one (default "default").
    #[serde(default = "default_sender_id")]
    pub default_sender_id: String,

    #[serde(default)]
    pub rest: RestChannelConfig,

    #[serde(default)]
    pub telegram: TelegramChannelConfig,
}

fn default_sender_id() -> String {
    DEFAULT_SENDER_ID.to_string()
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            default_sender_id: default_sender_id(),
            rest: RestChannelConfig::default(),
            telegram: TelegramChannelConfig::default(),
        }
    }
}

/// REST webhook channel config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestChannelConfig {
    /// Path prefix under the server route (default "rest").
    pub url_prefix: Option<String>,
}

/// Telegram output config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramChannelConfig {
    /// Bot token from BotFather. Overridden by TELEGRAM_BOT_TOKEN env when set.
    pub bot_token: Option<String>,
    /// Bot API base URL (default https://api.telegram.org).
    pub api_base: Option<String>,
}

/// Resolve the Telegram bot token: env TELEGRAM_BOT_TOKEN overrides config.
pub fn resolve_telegram_token(channels: &ChannelsConfig) -> Option<String> {
    std::env::var("TELEGRAM_BOT_TOKEN")
        .ok()
        .and_then(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .or_else(|| {
            channels
                .telegram
                .bot_token
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("PARLEY_CONFIG_PATH").map(PathBuf::from).unwrap_or_else(|_| {
        dirs::home_dir()
            .map(|h| h.join(".parley").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    })
}

/// Load config from the given path, else the default path (or PARLEY_CONFIG_PATH).
/// Missing file => default config. Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_server_port_bind_and_route() {
        let s = ServerConfig::default();
        assert_eq!(s.port, 5005);
        assert_eq!(s.bind, "127.0.0.1");
        assert_eq!(s.route, "/webhooks");
    }

    #[test]
    fn default_sender_comes_from_the_named_constant() {
        assert_eq!(ChannelsConfig::default().default_sender_id, DEFAULT_SENDER_ID);
        let c: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(c.channels.default_sender_id, "default");
    }

    #[test]
    fn camel_case_keys() {
        let c: Config = serde_json::from_str(
            r#"{
                "server": { "port": 8080 },
                "channels": {
                    "defaultSenderId": "anonymous",
                    "rest": { "urlPrefix": "chat" },
                    "telegram": { "botToken": "t", "apiBase": "http://localhost:8081" }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(c.server.port, 8080);
        assert_eq!(c.server.bind, "127.0.0.1");
        assert_eq!(c.channels.default_sender_id, "anonymous");
        assert_eq!(c.channels.rest.url_prefix.as_deref(), Some("chat"));
        assert_eq!(c.channels.telegram.bot_token.as_deref(), Some("t"));
        assert_eq!(
            c.channels.telegram.api_base.as_deref(),
            Some("http://localhost:8081")
        );
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = std::env::temp_dir()
            .join(format!("parley-missing-{}", uuid::Uuid::new_v4()))
            .join("config.json");
        let (config, used) = load_config(Some(path.clone())).unwrap();
        assert_eq!(used, path);
        assert_eq!(config.server.port, 5005);
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = std::env::temp_dir().join(format!("parley-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_config(Some(path)).unwrap_err();
        assert!(format!("{:#}", err).contains("parsing config"));
        let _ = std::fs::remove_dir_all(dir);
    }
}

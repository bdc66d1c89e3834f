//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::application::errors::ConfigError;

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub server: ServerConfig,
    pub site: SiteConfig,
    pub verification: VerificationConfig,
    pub discord: DiscordConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Public base URL, used by the keep-alive self-pinger
    pub public_url: Option<String>,
    pub data_dir: PathBuf,
    pub templates_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SiteConfig {
    pub name: String,
    pub base_url: String,
    pub theme_color: String,
    pub discord_invite: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct VerificationConfig {
    /// Minimum seconds between starting and passing verification
    pub min_seconds: u64,
    pub turnstile_secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DiscordConfig {
    pub enabled: bool,
    pub token: Option<String>,
    /// Channels the bot watches for messages
    pub watch_channels: Vec<String>,
    /// Channel where server-boost announcements appear
    pub boost_channel: Option<String>,
    /// Channel receiving HWID authentication requests
    pub auth_log_channel: Option<String>,
    /// User ID to DM on authentication requests
    pub owner_id: Option<String>,
    pub poll_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                public_url: None,
                data_dir: PathBuf::from("data"),
                templates_dir: PathBuf::from("templates"),
            },
            site: SiteConfig {
                name: "Vadrifts".to_string(),
                base_url: "http://localhost:5000".to_string(),
                theme_color: "#9c88ff".to_string(),
                discord_invite: "https://discord.com/invite/example".to_string(),
            },
            verification: VerificationConfig {
                min_seconds: 75,
                turnstile_secret: None,
            },
            discord: DiscordConfig {
                enabled: false,
                token: None,
                watch_channels: Vec::new(),
                boost_channel: None,
                auth_log_channel: None,
                owner_id: None,
                poll_interval_secs: 3,
            },
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))
    }

    /// Environment overrides. Secrets only come from here.
    pub fn apply_env(&mut self) {
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(token) = std::env::var("DISCORD_TOKEN") {
            self.discord.token = Some(token);
            self.discord.enabled = true;
        }
        if let Ok(secret) = std::env::var("TURNSTILE_SECRET") {
            self.verification.turnstile_secret = Some(secret);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_yaml() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.server.port, 5000);
        assert_eq!(parsed.verification.min_seconds, 75);
        assert!(!parsed.discord.enabled);
    }
}

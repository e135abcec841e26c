//! Client configuration.
//!
//! Resolution order (later wins):
//!   1. built-in defaults
//!   2. config file: `--config PATH`, else `~/.dataleague.yaml` when present (YAML or JSON)
//!   3. environment: DL_ADDRESS, DL_SERVER_KEY, DL_AUTHOR_ID, DL_USERNAME,
//!      DL_DISCRIMINATOR, DL_CHANNEL_ID, DL_GUILD_ID
//!   4. global CLI flags

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_ADDRESS: &str = "http://nakama.dataleague.svc.cluster.local:7350";
pub const DEFAULT_SERVER_KEY: &str = "defaultkey";
/// Custom id used when no chat author is configured.
pub const ADMIN_CUSTOM_ID: &str = "administrator";
const HOME_CONFIG_NAME: &str = ".dataleague.yaml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Gateway base URL of the game backend
    pub address: String,
    /// Shared server key used for authentication
    pub server_key: String,
    pub keepalive: KeepAlive,
    /// The chat message this invocation originates from
    pub message: DiscordMessage,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            server_key: DEFAULT_SERVER_KEY.to_string(),
            keepalive: KeepAlive::default(),
            message: DiscordMessage::default(),
        }
    }
}

/// Transport keep-alive: ping when idle, short ack wait, ping without active streams.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KeepAlive {
    pub interval_secs: u64,
    pub timeout_secs: u64,
    pub while_idle: bool,
}

impl Default for KeepAlive {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            timeout_secs: 1,
            while_idle: true,
        }
    }
}

impl KeepAlive {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Originating chat message. Empty strings mean "not set".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiscordMessage {
    pub author_id: String,
    pub username: String,
    pub discriminator: String,
    pub channel_id: String,
    pub guild_id: String,
    pub message_id: String,
    pub content: String,
}

impl DiscordMessage {
    pub fn has_author(&self) -> bool {
        !self.author_id.is_empty()
    }

    /// Custom id and username to authenticate with.
    pub fn identity(&self) -> (String, String) {
        if self.has_author() {
            (
                self.author_id.clone(),
                format!("{}#{}", fix_username(&self.username), self.discriminator),
            )
        } else {
            (ADMIN_CUSTOM_ID.to_string(), ADMIN_CUSTOM_ID.to_string())
        }
    }

    /// Variables attached to the session at authentication.
    pub fn session_vars(&self) -> HashMap<String, String> {
        if !self.has_author() {
            return HashMap::new();
        }
        HashMap::from([
            ("ChannelID".to_string(), self.channel_id.clone()),
            ("GuildID".to_string(), self.guild_id.clone()),
            ("Author.ID".to_string(), self.author_id.clone()),
            ("Author.Username".to_string(), fix_username(&self.username)),
            ("Author.Discriminator".to_string(), self.discriminator.clone()),
            ("Content".to_string(), self.content.clone()),
        ])
    }
}

/// Usernames may not contain spaces on the backend.
pub fn fix_username(username: &str) -> String {
    username.replace(' ', "_")
}

/// Values supplied through global CLI flags.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub address: Option<String>,
    pub server_key: Option<String>,
    pub author_id: Option<String>,
    pub username: Option<String>,
    pub discriminator: Option<String>,
    pub channel_id: Option<String>,
    pub guild_id: Option<String>,
}

impl Config {
    /// Full resolution: defaults, file, process environment, CLI overrides.
    pub fn load(path: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match home_config_path().filter(|p| p.is_file()) {
                Some(p) => Self::from_file(&p)?,
                None => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.apply_overrides(overrides);
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let lower = path.to_string_lossy().to_ascii_lowercase();
        let config = if lower.ends_with(".yaml") || lower.ends_with(".yml") {
            serde_yaml::from_str(&raw).context("failed to parse YAML config file")?
        } else {
            serde_json::from_str(&raw).context("failed to parse JSON config file")?
        };
        tracing::debug!(path = %path.display(), "using config file");
        Ok(config)
    }

    /// Apply DL_* variables. `lookup` abstracts the environment for tests.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = get("DL_ADDRESS") {
            self.address = v;
        }
        if let Some(v) = get("DL_SERVER_KEY") {
            self.server_key = v;
        }
        if let Some(v) = get("DL_AUTHOR_ID") {
            self.message.author_id = v;
        }
        if let Some(v) = get("DL_USERNAME") {
            self.message.username = v;
        }
        if let Some(v) = get("DL_DISCRIMINATOR") {
            self.message.discriminator = v;
        }
        if let Some(v) = get("DL_CHANNEL_ID") {
            self.message.channel_id = v;
        }
        if let Some(v) = get("DL_GUILD_ID") {
            self.message.guild_id = v;
        }
    }

    pub fn apply_overrides(&mut self, o: Overrides) {
        let slots = [
            (o.address, &mut self.address),
            (o.server_key, &mut self.server_key),
            (o.author_id, &mut self.message.author_id),
            (o.username, &mut self.message.username),
            (o.discriminator, &mut self.message.discriminator),
            (o.channel_id, &mut self.message.channel_id),
            (o.guild_id, &mut self.message.guild_id),
        ];
        for (value, slot) in slots {
            if let Some(v) = value {
                *slot = v;
            }
        }
    }
}

fn home_config_path() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(|h| PathBuf::from(h).join(HOME_CONFIG_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_file_partial_fields_keep_defaults() {
        let path = std::env::temp_dir().join("dl_config_test.yaml");
        std::fs::write(
            &path,
            "address: http://localhost:7350\nmessage:\n  channel_id: \"123\"\n",
        )
        .unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.address, "http://localhost:7350");
        assert_eq!(config.server_key, DEFAULT_SERVER_KEY);
        assert_eq!(config.message.channel_id, "123");
        assert_eq!(config.keepalive, KeepAlive::default());
    }

    #[test]
    fn json_file_parsed() {
        let path = std::env::temp_dir().join("dl_config_test.json");
        std::fs::write(&path, r#"{"server_key":"s3cret","keepalive":{"interval_secs":30}}"#)
            .unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.server_key, "s3cret");
        assert_eq!(config.keepalive.interval_secs, 30);
        assert_eq!(config.keepalive.timeout_secs, 1);
    }

    #[test]
    fn env_then_cli_precedence() {
        let mut config = Config::default();
        config.apply_env(|k| match k {
            "DL_ADDRESS" => Some("http://env:7350".into()),
            "DL_SERVER_KEY" => Some("   ".into()),
            "DL_GUILD_ID" => Some("g-env".into()),
            _ => None,
        });
        assert_eq!(config.address, "http://env:7350");
        assert_eq!(config.server_key, DEFAULT_SERVER_KEY, "blank env ignored");

        config.apply_overrides(Overrides {
            address: Some("http://cli:7350".into()),
            ..Default::default()
        });
        assert_eq!(config.address, "http://cli:7350");
        assert_eq!(config.message.guild_id, "g-env");
    }

    #[test]
    fn identity_defaults_to_administrator() {
        let msg = DiscordMessage::default();
        assert_eq!(
            msg.identity(),
            (ADMIN_CUSTOM_ID.to_string(), ADMIN_CUSTOM_ID.to_string())
        );
        assert!(msg.session_vars().is_empty());
    }

    #[test]
    fn identity_from_author() {
        let msg = DiscordMessage {
            author_id: "554195751274807297".into(),
            username: "Data Leaguer".into(),
            discriminator: "0042".into(),
            channel_id: "c1".into(),
            ..Default::default()
        };
        let (id, username) = msg.identity();
        assert_eq!(id, "554195751274807297");
        assert_eq!(username, "Data_Leaguer#0042");
        assert_eq!(
            msg.session_vars().get("ChannelID").map(String::as_str),
            Some("c1")
        );
    }
}

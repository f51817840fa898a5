use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{INBOX_LABEL, LABEL_CACHE_TTL_SECS};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub undo: UndoConfig,
    #[serde(default)]
    pub mailbox: MailboxConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndoConfig {
    /// Append "(press refresh if not visible)" when restored messages may
    /// not belong to the active search or filter
    #[serde(default = "default_true")]
    pub show_refresh_hint: bool,
    /// How long label display names stay cached
    #[serde(default = "default_label_cache_ttl_secs")]
    pub label_cache_ttl_secs: u64,
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self {
            show_refresh_hint: true,
            label_cache_ttl_secs: default_label_cache_ttl_secs(),
        }
    }
}

impl UndoConfig {
    pub fn label_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.label_cache_ttl_secs.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailboxConfig {
    /// Label that marks inbox membership; a move removes it
    #[serde(default = "default_inbox_label")]
    pub inbox_label: String,
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            inbox_label: default_inbox_label(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogConfig {
    /// tracing-subscriber filter directive; RUST_LOG still wins when set
    #[serde(default)]
    pub filter: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_label_cache_ttl_secs() -> u64 {
    LABEL_CACHE_TTL_SECS
}

fn default_inbox_label() -> String {
    INBOX_LABEL.to_string()
}

impl Config {
    pub fn config_dir() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("mailrewind");
        Ok(dir)
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load the config file, falling back to defaults when it does not exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.mailbox.inbox_label.trim().is_empty() {
            anyhow::bail!("mailbox.inbox_label must not be empty");
        }
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        let dir = path
            .parent()
            .context("Config path has no parent directory")?;

        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(Self::config_dir()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [undo]
            show_refresh_hint = false
            label_cache_ttl_secs = 60

            [mailbox]
            inbox_label = "Inbox"

            [log]
            filter = "warn,mailrewind=info"
        "#;

        let config = Config::parse(toml).unwrap();
        assert!(!config.undo.show_refresh_hint);
        assert_eq!(config.undo.label_cache_ttl(), Duration::from_secs(60));
        assert_eq!(config.mailbox.inbox_label, "Inbox");
        assert_eq!(config.log.filter.as_deref(), Some("warn,mailrewind=info"));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert!(config.undo.show_refresh_hint);
        assert_eq!(config.undo.label_cache_ttl_secs, LABEL_CACHE_TTL_SECS);
        assert_eq!(config.mailbox.inbox_label, INBOX_LABEL);
        assert!(config.log.filter.is_none());
    }

    #[test]
    fn test_partial_section_fills_defaults() {
        let config = Config::parse("[undo]\nlabel_cache_ttl_secs = 0\n").unwrap();
        assert!(config.undo.show_refresh_hint);
        // Zero would disable caching entirely; clamp to one second
        assert_eq!(config.undo.label_cache_ttl(), Duration::from_secs(1));
    }

    #[test]
    fn test_blank_inbox_label_rejected() {
        assert!(Config::parse("[mailbox]\ninbox_label = \" \"\n").is_err());
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed = Config::parse(&text).unwrap();
        assert_eq!(parsed.mailbox.inbox_label, config.mailbox.inbox_label);
        assert_eq!(parsed.undo.show_refresh_hint, config.undo.show_refresh_hint);
    }
}

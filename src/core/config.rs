//! Environment configuration
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Delivery timeout and command rate limit settings
//! - 1.0.0: Discord token, database path, scan interval, timezone

use anyhow::{anyhow, bail, Context, Result};
use chrono_tz::Tz;
use log::info;
use std::time::Duration;

use crate::features::timeparse::parse_std_duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    /// Register commands for one guild only (instant updates during development)
    pub discord_guild_id: Option<String>,
    pub database_path: String,
    pub scan_interval: Duration,
    pub timezone: Tz,
    pub delivery_timeout: Duration,
    pub log_level: String,
    pub command_rate_limit: usize,
    pub command_rate_window: Duration,
}

impl Config {
    /// Read configuration from the process environment
    ///
    /// Call `dotenvy::dotenv()` first if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let discord_token = get("DISCORD_TOKEN").ok_or_else(|| anyhow!("DISCORD_TOKEN is required"))?;

        let scan_interval = duration_setting("SCAN_INTERVAL", &get_or("SCAN_INTERVAL", "60s"))?;
        let delivery_timeout =
            duration_setting("DELIVERY_TIMEOUT", &get_or("DELIVERY_TIMEOUT", "10s"))?;
        let command_rate_window =
            duration_setting("COMMAND_RATE_WINDOW", &get_or("COMMAND_RATE_WINDOW", "10s"))?;

        let timezone_name = get_or("TIMEZONE", "UTC");
        let timezone: Tz = timezone_name
            .trim()
            .parse()
            .map_err(|_| anyhow!("TIMEZONE '{timezone_name}' is not a valid IANA timezone"))?;

        let command_rate_limit: usize = get_or("COMMAND_RATE_LIMIT", "5")
            .trim()
            .parse()
            .context("COMMAND_RATE_LIMIT must be a positive integer")?;
        if command_rate_limit == 0 {
            bail!("COMMAND_RATE_LIMIT must be a positive integer");
        }

        Ok(Config {
            discord_token,
            discord_guild_id: get("DISCORD_GUILD_ID"),
            database_path: get_or("DATABASE_PATH", "memos.db"),
            scan_interval,
            timezone,
            delivery_timeout,
            log_level: get_or("LOG_LEVEL", "info"),
            command_rate_limit,
            command_rate_window,
        })
    }

    /// Log effective settings without secrets
    pub fn log_summary(&self) {
        info!("⚙️  Configuration loaded");
        info!("  DATABASE_PATH: {}", self.database_path);
        info!("  SCAN_INTERVAL: {:?}", self.scan_interval);
        info!("  TIMEZONE: {}", self.timezone.name());
        info!("  DELIVERY_TIMEOUT: {:?}", self.delivery_timeout);
        info!(
            "  COMMAND_RATE_LIMIT: {} per {:?}",
            self.command_rate_limit, self.command_rate_window
        );
        info!(
            "  DISCORD_GUILD_ID: {}",
            self.discord_guild_id.as_deref().unwrap_or("(global commands)")
        );
        info!("  DISCORD_TOKEN length: {}", self.discord_token.len());
    }
}

fn duration_setting(key: &str, value: &str) -> Result<Duration> {
    parse_std_duration(value)
        .ok_or_else(|| anyhow!("{key} '{value}' is not a valid duration (e.g. 30s, 5m, 1h)"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("DISCORD_TOKEN", "token")]).unwrap();
        assert_eq!(config.database_path, "memos.db");
        assert_eq!(config.scan_interval, Duration::from_secs(60));
        assert_eq!(config.timezone, chrono_tz::UTC);
        assert_eq!(config.delivery_timeout, Duration::from_secs(10));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.command_rate_limit, 5);
        assert!(config.discord_guild_id.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("DISCORD_TOKEN", "token"),
            ("DISCORD_GUILD_ID", "1234"),
            ("DATABASE_PATH", "/tmp/memos.db"),
            ("SCAN_INTERVAL", "5m"),
            ("TIMEZONE", "America/New_York"),
            ("COMMAND_RATE_LIMIT", "3"),
            ("COMMAND_RATE_WINDOW", "1m"),
        ])
        .unwrap();
        assert_eq!(config.discord_guild_id.as_deref(), Some("1234"));
        assert_eq!(config.database_path, "/tmp/memos.db");
        assert_eq!(config.scan_interval, Duration::from_secs(300));
        assert_eq!(config.timezone, chrono_tz::America::New_York);
        assert_eq!(config.command_rate_limit, 3);
        assert_eq!(config.command_rate_window, Duration::from_secs(60));
    }

    #[test]
    fn test_missing_token() {
        let err = config_from(&[]).unwrap_err();
        assert!(err.to_string().contains("DISCORD_TOKEN"));

        assert!(config_from(&[("DISCORD_TOKEN", "  ")]).is_err());
    }

    #[test]
    fn test_invalid_values() {
        assert!(config_from(&[("DISCORD_TOKEN", "t"), ("SCAN_INTERVAL", "often")]).is_err());
        assert!(config_from(&[("DISCORD_TOKEN", "t"), ("TIMEZONE", "Nowhere/Land")]).is_err());
        assert!(config_from(&[("DISCORD_TOKEN", "t"), ("COMMAND_RATE_LIMIT", "0")]).is_err());
        assert!(config_from(&[("DISCORD_TOKEN", "t"), ("COMMAND_RATE_LIMIT", "lots")]).is_err());
    }
}

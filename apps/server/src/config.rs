//! Application configuration.

use apartment_alerts::{NotifierConfig, Webhook};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_DATABASE_PATH: &str = "./apartments.db";
pub const DEFAULT_POLL_INTERVAL_MINUTES: u64 = 30;
/// One week. Longer intervals would overflow timer deadlines.
pub const MAX_POLL_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Application configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Channel for new-listing messages.
    pub listing_webhook: Webhook,
    pub error_webhook: Option<Webhook>,
    pub status_webhook: Option<Webhook>,
    /// SQLite file holding the seen set.
    pub database_path: PathBuf,
    /// Time between poll cycles.
    pub poll_interval: Duration,
}

impl AppConfig {
    /// Read from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read through `lookup`, which returns the value of a variable if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listing_webhook = Webhook::from_optional(lookup("DISCORD_WEBHOOK_URL"))
            .ok_or(ConfigError::Missing("DISCORD_WEBHOOK_URL"))?;

        let database_path = lookup("DATABASE_PATH")
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string());

        let poll_interval_minutes = match lookup("POLL_INTERVAL_MINUTES") {
            None => DEFAULT_POLL_INTERVAL_MINUTES,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(minutes) if (1..=MAX_POLL_INTERVAL_MINUTES).contains(&minutes) => minutes,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "POLL_INTERVAL_MINUTES",
                        value: raw,
                    })
                }
            },
        };

        Ok(Self {
            listing_webhook,
            error_webhook: Webhook::from_optional(lookup("DISCORD_ERROR_WEBHOOK_URL")),
            status_webhook: Webhook::from_optional(lookup("DISCORD_STATUS_WEBHOOK_URL")),
            database_path: PathBuf::from(database_path),
            poll_interval: Duration::from_secs(poll_interval_minutes * 60),
        })
    }

    pub fn notifier_config(&self) -> NotifierConfig {
        NotifierConfig::new(self.listing_webhook.clone())
            .with_error_webhook(self.error_webhook.clone())
            .with_status_webhook(self.status_webhook.clone())
    }
}

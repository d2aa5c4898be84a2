//! Bot settings loaded from the environment.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::DEFAULT_MAX_CHANNELS;

/// Runtime configuration for the bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Numeric identity of the single privileged administrator.
    pub admin_id: i64,

    /// Public username of the bot, used to build deep links.
    pub bot_username: String,

    /// Public channel (handle, e.g. `@movies`) where new entries are announced.
    pub announce_channel: String,

    /// Cap on required-subscription channels.
    #[serde(default = "default_max_channels")]
    pub max_channels: usize,

    /// Fixed sleep after every broadcast delivery attempt, in milliseconds.
    #[serde(default = "default_broadcast_delay_ms")]
    pub broadcast_delay_ms: u64,

    /// Greeting shown on first contact.
    #[serde(default = "default_welcome_message")]
    pub welcome_message: String,
}

fn default_max_channels() -> usize {
    DEFAULT_MAX_CHANNELS
}

fn default_broadcast_delay_ms() -> u64 {
    30
}

fn default_welcome_message() -> String {
    "🎬 Welcome! Enter a movie code or use the menu.".to_owned()
}

impl BotConfig {
    /// Creates configuration from environment variables.
    ///
    /// Expects `ADMIN_ID`, `BOT_USERNAME` and `CHANNEL_USERNAME` to be set;
    /// everything else falls back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let admin_id: i64 = std::env::var("ADMIN_ID")
            .map_err(|_| ConfigError::MissingEnvVar("ADMIN_ID"))?
            .parse()
            .map_err(|_| ConfigError::InvalidValue("ADMIN_ID"))?;

        let bot_username = std::env::var("BOT_USERNAME")
            .map_err(|_| ConfigError::MissingEnvVar("BOT_USERNAME"))?;

        let announce_channel = std::env::var("CHANNEL_USERNAME")
            .map_err(|_| ConfigError::MissingEnvVar("CHANNEL_USERNAME"))?;

        let max_channels = std::env::var("MAX_CHANNELS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(default_max_channels);

        let broadcast_delay_ms = std::env::var("BROADCAST_DELAY_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(default_broadcast_delay_ms);

        let welcome_message =
            std::env::var("WELCOME_MESSAGE").unwrap_or_else(|_| default_welcome_message());

        Ok(Self {
            admin_id,
            bot_username,
            announce_channel,
            max_channels,
            broadcast_delay_ms,
            welcome_message,
        })
    }

    /// Checks whether the given actor is the configured administrator.
    ///
    /// There is no role hierarchy; this single comparison guards every
    /// privileged operation.
    #[must_use]
    pub fn is_admin(&self, actor_id: i64) -> bool {
        actor_id == self.admin_id
    }

    /// Returns the broadcast delay as a [`Duration`].
    #[must_use]
    pub fn broadcast_delay(&self) -> Duration {
        Duration::from_millis(self.broadcast_delay_ms)
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            admin_id: 0,
            bot_username: "movie_code_bot".to_owned(),
            announce_channel: "@movies".to_owned(),
            max_channels: default_max_channels(),
            broadcast_delay_ms: default_broadcast_delay_ms(),
            welcome_message: default_welcome_message(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BotConfig::default();
        assert_eq!(config.max_channels, 5);
        assert_eq!(config.broadcast_delay(), Duration::from_millis(30));
    }

    #[test]
    fn test_is_admin() {
        let config = BotConfig {
            admin_id: 42,
            ..BotConfig::default()
        };
        assert!(config.is_admin(42));
        assert!(!config.is_admin(43));
    }
}

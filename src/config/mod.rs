//! Configuration module for the movie bot.
//!
//! Handles environment-driven settings and the validation bounds applied
//! by the content-intake wizard.

mod settings;

pub use settings::{BotConfig, ConfigError};

/// Minimum accepted title length (characters).
pub const MIN_TITLE_LEN: usize = 2;

/// Minimum accepted genre length (characters).
pub const MIN_GENRE_LEN: usize = 2;

/// Earliest accepted release year.
pub const MIN_YEAR: i32 = 1900;

/// How far past the current year a release year may point.
pub const MAX_YEAR_AHEAD: i32 = 5;

/// Minimum accepted duration in minutes.
pub const MIN_DURATION_MIN: u32 = 1;

/// Maximum accepted duration in minutes.
pub const MAX_DURATION_MIN: u32 = 500;

/// Maximum accepted external (IMDb-style) rating.
pub const MAX_EXTERNAL_RATING: f32 = 10.0;

/// Default cap on required-subscription channels.
pub const DEFAULT_MAX_CHANNELS: usize = 5;

/// Token an admin sends to skip an optional wizard step.
pub const SKIP_TOKEN: &str = "/skip";

//! Configuration loading and validation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::aggregate::{
    ContentThresholds, RegionThresholds, StandingOptions, DEFAULT_BEST_MATCHES,
    DEFAULT_EASY_MIN_PLAYS, DEFAULT_HARD_MIN_PLAYS, DEFAULT_LOW_POINTER_BOUND,
    DEFAULT_LOW_POINTER_EXAMPLES, DEFAULT_PLAYER_LIMIT, DEFAULT_REGION_MIN_ANSWERS,
    DEFAULT_REGION_TOP_PLAYERS, DEFAULT_SONG_LIMIT, DEFAULT_SPAM_MIN_PLAYERS,
};
use crate::store::StoreConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Date window defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Day the ranked data collection started. Windows with no
    /// explicit start open here.
    #[serde(default = "default_window_start")]
    pub default_start: NaiveDate,
}

fn default_window_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 10, 1).expect("valid collection start date")
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            default_start: default_window_start(),
        }
    }
}

/// Row limits for the derived tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Players kept on each leaderboard artifact.
    #[serde(default = "default_players")]
    pub players: usize,

    /// Song groups kept on each content artifact.
    #[serde(default = "default_songs")]
    pub songs: usize,
}

fn default_players() -> usize {
    DEFAULT_PLAYER_LIMIT
}

fn default_songs() -> usize {
    DEFAULT_SONG_LIMIT
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            players: default_players(),
            songs: default_songs(),
        }
    }
}

/// Eligibility floors and per-player report knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Answers a player needs in the window before counting toward a
    /// region's guess rate.
    #[serde(default = "default_region_min_answers")]
    pub region_min_answers: u64,

    /// Size of the accuracy pool averaged per region.
    #[serde(default = "default_region_top_players")]
    pub region_top_players: usize,

    /// Answer count a song must exceed to enter the spam ranking.
    #[serde(default = "default_spam_min_players")]
    pub spam_min_players: u64,

    /// Play count a song must exceed for the easiest-songs table.
    #[serde(default = "default_easy_min_plays")]
    pub easy_min_plays: u64,

    /// Play count a song must exceed for the hardest-songs table.
    #[serde(default = "default_hard_min_plays")]
    pub hard_min_plays: u64,

    /// Highest correct count still considered a low pointer.
    #[serde(default = "default_low_pointer_bound")]
    pub low_pointer_bound: u32,

    /// Example songs listed per low-pointer bucket.
    #[serde(default = "default_low_pointer_examples")]
    pub low_pointer_examples: usize,

    /// Best ranked matches shown in a player report.
    #[serde(default = "default_best_matches")]
    pub best_matches: usize,
}

fn default_region_min_answers() -> u64 {
    DEFAULT_REGION_MIN_ANSWERS
}

fn default_region_top_players() -> usize {
    DEFAULT_REGION_TOP_PLAYERS
}

fn default_spam_min_players() -> u64 {
    DEFAULT_SPAM_MIN_PLAYERS
}

fn default_easy_min_plays() -> u64 {
    DEFAULT_EASY_MIN_PLAYS
}

fn default_hard_min_plays() -> u64 {
    DEFAULT_HARD_MIN_PLAYS
}

fn default_low_pointer_bound() -> u32 {
    DEFAULT_LOW_POINTER_BOUND
}

fn default_low_pointer_examples() -> usize {
    DEFAULT_LOW_POINTER_EXAMPLES
}

fn default_best_matches() -> usize {
    DEFAULT_BEST_MATCHES
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            region_min_answers: default_region_min_answers(),
            region_top_players: default_region_top_players(),
            spam_min_players: default_spam_min_players(),
            easy_min_plays: default_easy_min_plays(),
            hard_min_plays: default_hard_min_plays(),
            low_pointer_bound: default_low_pointer_bound(),
            low_pointer_examples: default_low_pointer_examples(),
            best_matches: default_best_matches(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub window: WindowConfig,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub thresholds: ThresholdConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            window: WindowConfig::default(),
            limits: LimitsConfig::default(),
            thresholds: ThresholdConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file does
    /// not exist. A file that exists but fails to parse is still an
    /// error; falling back there would hide typos.
    pub fn load_or_default(path: &PathBuf) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.players == 0 {
            return Err(ConfigError::ValidationError(
                "limits.players must be greater than 0".to_string(),
            ));
        }

        if self.limits.songs == 0 {
            return Err(ConfigError::ValidationError(
                "limits.songs must be greater than 0".to_string(),
            ));
        }

        if self.thresholds.region_min_answers == 0 {
            return Err(ConfigError::ValidationError(
                "thresholds.region_min_answers must be greater than 0".to_string(),
            ));
        }

        if self.thresholds.region_top_players == 0 {
            return Err(ConfigError::ValidationError(
                "thresholds.region_top_players must be greater than 0".to_string(),
            ));
        }

        if self.thresholds.low_pointer_bound == 0 {
            return Err(ConfigError::ValidationError(
                "thresholds.low_pointer_bound must be greater than 0".to_string(),
            ));
        }

        if self.thresholds.best_matches == 0 {
            return Err(ConfigError::ValidationError(
                "thresholds.best_matches must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Store paths rooted at the configured data directory.
    pub fn store(&self) -> StoreConfig {
        StoreConfig::new(self.data_dir.clone())
    }

    pub fn region_thresholds(&self) -> RegionThresholds {
        RegionThresholds {
            min_answers: self.thresholds.region_min_answers,
            top_players: self.thresholds.region_top_players,
        }
    }

    pub fn content_thresholds(&self) -> ContentThresholds {
        ContentThresholds {
            spam_min_players: self.thresholds.spam_min_players,
            easy_min_plays: self.thresholds.easy_min_plays,
            hard_min_plays: self.thresholds.hard_min_plays,
        }
    }

    pub fn standing_options(&self) -> StandingOptions {
        StandingOptions {
            low_pointer_bound: self.thresholds.low_pointer_bound,
            max_examples: self.thresholds.low_pointer_examples,
            best_matches: self.thresholds.best_matches,
        }
    }
}

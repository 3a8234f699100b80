//! Configuration loading and typed config structures for the Reverie engine.
//!
//! The canonical configuration lives in `reverie-config.yaml`. This module
//! defines strongly-typed structs that mirror the YAML structure and a
//! loader that reads and validates the file. Every field is optional; an
//! empty document yields the defaults.
//!
//! ```yaml
//! leveling:
//!   min_threshold: 20
//!   per_level: 20
//! xp_rewards:
//!   dream: 10
//!   ritual: 20
//!   quest: 50
//!   offering: 30
//! logs:
//!   evolution_capacity: 12
//!   xp_capacity: 20
//! ```

use std::path::Path;

use reverie_progression::{LevelingCurve, ProgressionConfig, XpRewards};
use serde::Deserialize;

/// Smallest allowed recent-evolutions log capacity.
pub const MIN_EVOLUTION_LOG_CAPACITY: usize = 10;

/// Largest allowed recent-evolutions log capacity.
pub const MAX_EVOLUTION_LOG_CAPACITY: usize = 20;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but a value is out of range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Which value was rejected and why.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
///
/// Mirrors the structure of `reverie-config.yaml`. The leveling curve and
/// base XP values are untuned product values; nothing in the engine depends
/// on their specific numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// XP threshold curve.
    #[serde(default)]
    pub leveling: LevelingConfig,

    /// Base XP per journal activity.
    #[serde(default)]
    pub xp_rewards: XpRewardsConfig,

    /// Notification log capacities.
    #[serde(default)]
    pub logs: LogsConfig,
}

impl EngineConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.leveling.min_threshold == 0 {
            return Err(ConfigError::Invalid {
                reason: String::from("leveling.min_threshold must be at least 1"),
            });
        }
        let evolution = self.logs.evolution_capacity;
        if !(MIN_EVOLUTION_LOG_CAPACITY..=MAX_EVOLUTION_LOG_CAPACITY).contains(&evolution) {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "logs.evolution_capacity must be within \
                     {MIN_EVOLUTION_LOG_CAPACITY}..={MAX_EVOLUTION_LOG_CAPACITY}, got {evolution}"
                ),
            });
        }
        if self.logs.xp_capacity == 0 {
            return Err(ConfigError::Invalid {
                reason: String::from("logs.xp_capacity must be at least 1"),
            });
        }
        Ok(())
    }

    /// Build the progression parameters consumed by the companion manager.
    pub const fn progression(&self) -> ProgressionConfig {
        ProgressionConfig {
            leveling: LevelingCurve::new(self.leveling.min_threshold, self.leveling.per_level),
            xp_rewards: XpRewards {
                dream: self.xp_rewards.dream,
                ritual: self.xp_rewards.ritual,
                quest: self.xp_rewards.quest,
                offering: self.xp_rewards.offering,
            },
            evolution_log_capacity: self.logs.evolution_capacity,
            xp_log_capacity: self.logs.xp_capacity,
        }
    }
}

/// XP threshold curve parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LevelingConfig {
    /// Minimum XP any level above 1 requires.
    #[serde(default = "default_min_threshold")]
    pub min_threshold: u64,

    /// XP required per target level.
    #[serde(default = "default_per_level")]
    pub per_level: u64,
}

impl Default for LevelingConfig {
    fn default() -> Self {
        Self {
            min_threshold: default_min_threshold(),
            per_level: default_per_level(),
        }
    }
}

/// Base XP per journal activity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct XpRewardsConfig {
    /// Logging a dream.
    #[serde(default = "default_dream_xp")]
    pub dream: u64,

    /// Completing a ritual.
    #[serde(default = "default_ritual_xp")]
    pub ritual: u64,

    /// Completing a quest.
    #[serde(default = "default_quest_xp")]
    pub quest: u64,

    /// Making an offering.
    #[serde(default = "default_offering_xp")]
    pub offering: u64,
}

impl Default for XpRewardsConfig {
    fn default() -> Self {
        Self {
            dream: default_dream_xp(),
            ritual: default_ritual_xp(),
            quest: default_quest_xp(),
            offering: default_offering_xp(),
        }
    }
}

/// Notification log capacities.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogsConfig {
    /// Recent-evolutions log capacity (10 to 20).
    #[serde(default = "default_evolution_capacity")]
    pub evolution_capacity: usize,

    /// Recent-XP log capacity.
    #[serde(default = "default_xp_capacity")]
    pub xp_capacity: usize,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            evolution_capacity: default_evolution_capacity(),
            xp_capacity: default_xp_capacity(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_min_threshold() -> u64 {
    reverie_progression::leveling::DEFAULT_MIN_THRESHOLD
}

const fn default_per_level() -> u64 {
    reverie_progression::leveling::DEFAULT_PER_LEVEL
}

const fn default_dream_xp() -> u64 {
    10
}

const fn default_ritual_xp() -> u64 {
    20
}

const fn default_quest_xp() -> u64 {
    50
}

const fn default_offering_xp() -> u64 {
    30
}

const fn default_evolution_capacity() -> usize {
    reverie_progression::config::DEFAULT_EVOLUTION_LOG_CAPACITY
}

const fn default_xp_capacity() -> usize {
    reverie_progression::config::DEFAULT_XP_LOG_CAPACITY
}

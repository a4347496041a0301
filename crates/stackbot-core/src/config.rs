//! Configuration loading and typed config structures for the Stackbot game.
//!
//! The canonical configuration lives in `stackbot-config.yaml` next to the
//! binary's working directory. Every field has a default, so an empty file
//! (or no file at all) yields a playable game.

use std::path::Path;

use serde::Deserialize;

/// Environment variable overriding `session.tick_interval_ms`.
pub const TICK_INTERVAL_ENV: &str = "STACKBOT_TICK_INTERVAL_MS";

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

    /// A value is out of its permitted range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level game configuration.
///
/// Mirrors the structure of `stackbot-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GameConfig {
    /// Countdown and penalty settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Active window and difficulty progression.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Point values and reward conversion.
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Fever mode parameters.
    #[serde(default)]
    pub fever: FeverConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GameConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `STACKBOT_TICK_INTERVAL_MS` overrides `session.tick_interval_ms`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value fails validation.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value fails validation.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.session.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| {
            Err(ConfigError::Invalid {
                reason: reason.to_owned(),
            })
        };
        if self.session.total_ticks == 0 {
            return invalid("session.total_ticks must be at least 1");
        }
        if self.session.tick_interval_ms == 0 {
            return invalid("session.tick_interval_ms must be at least 1");
        }
        if self.queue.starting_capacity == 0 {
            return invalid("queue.starting_capacity must be at least 1");
        }
        if self.queue.starting_capacity > self.queue.max_capacity {
            return invalid("queue.starting_capacity must not exceed queue.max_capacity");
        }
        if self.scoring.reward_divisor == 0 {
            return invalid("scoring.reward_divisor must be at least 1");
        }
        if self.fever.score_multiplier == 0 {
            return invalid("fever.score_multiplier must be at least 1");
        }
        Ok(())
    }
}

/// Countdown configuration. All durations are whole ticks.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionConfig {
    /// Ticks on the clock when a session starts.
    #[serde(default = "default_total_ticks")]
    pub total_ticks: u64,

    /// Real-time milliseconds per tick.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Ticks removed from the clock by a wrong answer.
    #[serde(default = "default_wrong_penalty_ticks")]
    pub wrong_penalty_ticks: u64,
}

impl SessionConfig {
    /// Apply environment variable overrides.
    ///
    /// Unparseable values are ignored.
    fn apply_env_overrides(&mut self) {
        if let Some(ms) = std::env::var(TICK_INTERVAL_ENV)
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
        {
            self.tick_interval_ms = ms;
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            total_ticks: default_total_ticks(),
            tick_interval_ms: default_tick_interval_ms(),
            wrong_penalty_ticks: default_wrong_penalty_ticks(),
        }
    }
}

/// Active window configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueueConfig {
    /// Stack members (and window slots) admitted at session start.
    #[serde(default = "default_starting_capacity")]
    pub starting_capacity: u32,

    /// Upper bound on stack members. The effective cap is also limited by
    /// the catalog size.
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u32,

    /// Correct answers needed for each level-up. 0 disables level-ups.
    #[serde(default = "default_level_up_threshold")]
    pub level_up_threshold: u32,

    /// Seed for side assignment and window draws. `None` seeds from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            starting_capacity: default_starting_capacity(),
            max_capacity: default_max_capacity(),
            level_up_threshold: default_level_up_threshold(),
            seed: None,
        }
    }
}

/// Scoring configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScoringConfig {
    /// Points for a level-0 unit.
    #[serde(default = "default_base_points")]
    pub base_points: u64,

    /// Extra points per unit level.
    #[serde(default = "default_points_per_level")]
    pub points_per_level: u64,

    /// Final score is divided by this to get the currency reward.
    #[serde(default = "default_reward_divisor")]
    pub reward_divisor: u64,
}

impl ScoringConfig {
    /// Point value of a unit at the given level. Saturates on overflow.
    pub const fn points_for_level(&self, level: u32) -> u64 {
        self.points_per_level
            .saturating_mul(level as u64)
            .saturating_add(self.base_points)
    }

    /// Currency granted for a final score.
    pub fn reward_for(&self, final_score: u64) -> u64 {
        final_score.checked_div(self.reward_divisor).unwrap_or(0)
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_points: default_base_points(),
            points_per_level: default_points_per_level(),
            reward_divisor: default_reward_divisor(),
        }
    }
}

/// Fever mode configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeverConfig {
    /// Whether fever mode can trigger at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Consecutive correct answers that start fever.
    #[serde(default = "default_trigger_streak")]
    pub trigger_streak: u32,

    /// Running ticks fever lasts.
    #[serde(default = "default_fever_duration_ticks")]
    pub duration_ticks: u64,

    /// Multiplier applied to points while fever is active.
    #[serde(default = "default_score_multiplier")]
    pub score_multiplier: u64,
}

impl Default for FeverConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            trigger_streak: default_trigger_streak(),
            duration_ticks: default_fever_duration_ticks(),
            score_multiplier: default_score_multiplier(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_total_ticks() -> u64 {
    60
}

const fn default_tick_interval_ms() -> u64 {
    1000
}

const fn default_wrong_penalty_ticks() -> u64 {
    3
}

const fn default_starting_capacity() -> u32 {
    3
}

const fn default_max_capacity() -> u32 {
    8
}

const fn default_level_up_threshold() -> u32 {
    10
}

const fn default_base_points() -> u64 {
    10
}

const fn default_points_per_level() -> u64 {
    5
}

const fn default_reward_divisor() -> u64 {
    10
}

const fn default_trigger_streak() -> u32 {
    15
}

const fn default_fever_duration_ticks() -> u64 {
    5
}

const fn default_score_multiplier() -> u64 {
    2
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}

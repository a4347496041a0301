//! Stackbot engine binary.
//!
//! Runs one headless game session: loads configuration, spawns the session
//! actor over an in-memory store, lets the bot play until the clock runs
//! out, and logs the result.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `stackbot-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Create the in-memory store with the default catalog
//! 4. Spawn the session actor and stream loggers
//! 5. Start the session and run the bot
//! 6. Log the summary

mod bot;
mod error;
mod observers;

use std::path::Path;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use stackbot_core::actor::{TickSource, spawn_session};
use stackbot_core::collaborators::Collaborators;
use stackbot_core::config::{GameConfig, LoggingConfig};
use stackbot_core::storage::MemoryStorage;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::bot::BotConfig;
use crate::error::EngineError;
use crate::observers::{LogEffects, LogNavigator};

/// Config file looked up in the working directory.
const CONFIG_FILE: &str = "stackbot-config.yaml";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the session cannot be
/// spawned, or the actor stops before the session ends.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = Path::new(CONFIG_FILE);
    let config = load_config(config_path)?;
    let bot_config = load_bot_config(config_path)?;

    init_tracing(&config.logging);
    info!("stackbot-engine starting");
    info!(
        total_ticks = config.session.total_ticks,
        tick_interval_ms = config.session.tick_interval_ms,
        starting_capacity = config.queue.starting_capacity,
        max_capacity = config.queue.max_capacity,
        fever_enabled = config.fever.enabled,
        "Configuration loaded"
    );

    let store = Arc::new(MemoryStorage::with_default_catalog());
    let collaborators = Collaborators {
        store: Arc::clone(&store) as Arc<dyn stackbot_core::collaborators::ScoreStore>,
        navigator: Arc::new(LogNavigator),
        effects: Arc::new(LogEffects),
    };

    let (handle, actor) = spawn_session(
        &config,
        collaborators,
        TickSource::from_config(&config.session),
    )
    .map_err(EngineError::from)?;
    let loggers = observers::spawn_stream_loggers(&handle);

    handle.start().await.map_err(EngineError::from)?;

    let mut rng = bot_config
        .seed
        .map_or_else(SmallRng::from_os_rng, SmallRng::seed_from_u64);
    let stats = bot::play(&handle, &bot_config, &mut rng).await;
    let summary = handle.wait_ended().await.ok_or(EngineError::Aborted)?;

    info!(
        session_id = %summary.session_id,
        final_score = summary.final_score,
        reward = summary.reward,
        new_high_score = summary.new_high_score,
        correct_answers = summary.correct_answers,
        wrong_answers = summary.wrong_answers,
        level_ups = summary.level_ups,
        ticks_elapsed = summary.ticks_elapsed,
        bot_aimed_correct = stats.aimed_correct,
        bot_aimed_wrong = stats.aimed_wrong,
        "Session summary"
    );

    drop(handle);
    actor.await?;
    for logger in loggers {
        logger.await?;
    }

    info!(
        money = store.money(),
        high_score = store.high_score(),
        "stackbot-engine shutdown complete"
    );
    Ok(())
}

/// Install the tracing subscriber. `RUST_LOG` wins over the config level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Load the game configuration, falling back to defaults without a file.
///
/// Environment overrides apply either way.
fn load_config(path: &Path) -> Result<GameConfig, EngineError> {
    if path.exists() {
        Ok(GameConfig::from_file(path)?)
    } else {
        info!("Config file not found, using defaults");
        Ok(GameConfig::parse("{}")?)
    }
}

/// Read the `bot` section of the config file.
///
/// A missing file or missing section yields defaults.
fn load_bot_config(path: &Path) -> Result<BotConfig, EngineError> {
    if !path.exists() {
        return Ok(BotConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| EngineError::BotConfig {
        message: format!("failed to read config file: {e}"),
    })?;
    parse_bot_config(&contents)
}

fn parse_bot_config(contents: &str) -> Result<BotConfig, EngineError> {
    let raw: serde_yml::Value = serde_yml::from_str(contents).map_err(|e| EngineError::BotConfig {
        message: format!("failed to parse config YAML: {e}"),
    })?;
    raw.get("bot").map_or_else(
        || Ok(BotConfig::default()),
        |bot| {
            serde_yml::from_value(bot.clone()).map_err(|e| EngineError::BotConfig {
                message: format!("failed to parse bot config: {e}"),
            })
        },
    )
}

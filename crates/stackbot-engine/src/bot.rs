//! Automated player that drives a session through its handle.
//!
//! The bot reads the head unit from the latest snapshot on a fixed
//! cadence and answers it, correctly with the configured probability.

use std::time::Duration;

use rand::Rng;
use serde::Deserialize;
use stackbot_core::actor::SessionHandle;
use stackbot_types::SessionState;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Bot settings, read from the `bot` section of `stackbot-config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BotConfig {
    /// Milliseconds between answers.
    #[serde(default = "default_answer_interval_ms")]
    pub answer_interval_ms: u64,

    /// Chance of answering correctly, 0-100. Values above 100 are clamped.
    #[serde(default = "default_accuracy_percent")]
    pub accuracy_percent: u8,

    /// Seed for the bot's RNG. Random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl BotConfig {
    fn accuracy(&self) -> f64 {
        f64::from(self.accuracy_percent.min(100)) / 100.0
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            answer_interval_ms: default_answer_interval_ms(),
            accuracy_percent: default_accuracy_percent(),
            seed: None,
        }
    }
}

const fn default_answer_interval_ms() -> u64 {
    400
}

const fn default_accuracy_percent() -> u8 {
    85
}

/// Answers the bot sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BotStats {
    /// Answers aimed at the head unit's side.
    pub aimed_correct: u32,
    /// Answers deliberately sent the other way.
    pub aimed_wrong: u32,
}

/// Play until the session ends or the actor goes away.
pub async fn play(handle: &SessionHandle, config: &BotConfig, rng: &mut impl Rng) -> BotStats {
    let period = Duration::from_millis(config.answer_interval_ms.max(1));
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let accuracy = config.accuracy();
    let mut stats = BotStats::default();

    let ended = handle.wait_ended();
    tokio::pin!(ended);

    loop {
        tokio::select! {
            _ = &mut ended => break,
            _ = interval.tick() => {
                let snapshot = handle.snapshot();
                if snapshot.state != SessionState::Running {
                    continue;
                }
                let Some(head) = snapshot.window.first() else {
                    continue;
                };
                let aim_correct = rng.random_bool(accuracy);
                let direction = if aim_correct {
                    head.direction
                } else {
                    head.direction.opposite()
                };
                debug!(kind = %head.unit.kind, %direction, aim_correct, "Bot answering");
                if handle.answer(direction).await.is_err() {
                    break;
                }
                if aim_correct {
                    stats.aimed_correct = stats.aimed_correct.saturating_add(1);
                } else {
                    stats.aimed_wrong = stats.aimed_wrong.saturating_add(1);
                }
            }
        }
    }
    stats
}

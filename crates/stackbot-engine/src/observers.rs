//! Logging implementations of the session's outward-facing hooks.
//!
//! The engine has no screen or speaker, so navigation and effects become
//! structured log lines, and each observer stream gets a task that logs
//! what it receives.

use stackbot_core::actor::SessionHandle;
use stackbot_core::collaborators::{EffectSink, Navigator};
use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Navigator that logs the hand-off to the results screen.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn on_session_ended(&self, final_score: u64, reward: u64) {
        info!(final_score, reward, "Navigating to results");
    }
}

/// Effect sink that logs instead of playing sounds.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEffects;

impl EffectSink for LogEffects {
    fn on_wrong_answer(&self) {
        debug!("Effect: wrong answer");
    }

    fn on_fever_toggled(&self, active: bool) {
        info!(active, "Effect: fever toggled");
    }
}

/// Spawn one logging task per observer stream.
///
/// The tasks end on their own once the actor drops its senders.
pub fn spawn_stream_loggers(handle: &SessionHandle) -> Vec<JoinHandle<()>> {
    vec![
        tokio::spawn(drain("state", handle.subscribe_state(), |transition| {
            info!(from = %transition.from, to = %transition.to, "State changed");
        })),
        tokio::spawn(drain("answers", handle.subscribe_answers(), |resolved| {
            debug!(
                outcome = ?resolved.outcome,
                points = resolved.points,
                score = resolved.score,
                "Answer resolved"
            );
        })),
        tokio::spawn(drain("clock", handle.subscribe_clock(), |update| {
            debug!(remaining = update.remaining, total = update.total, "Clock");
        })),
        tokio::spawn(drain("members", handle.subscribe_members(), |member| {
            info!(kind = %member.unit.kind, direction = %member.direction, "Member admitted");
        })),
    ]
}

async fn drain<T: Clone + Send>(stream: &'static str, mut rx: Receiver<T>, mut log: impl FnMut(T)) {
    loop {
        match rx.recv().await {
            Ok(item) => log(item),
            Err(RecvError::Lagged(skipped)) => {
                warn!(stream, skipped, "Observer lagged behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

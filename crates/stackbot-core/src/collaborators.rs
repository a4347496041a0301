//! Capabilities the session consumes from the outside world.
//!
//! The session never performs I/O itself. At construction it asks the
//! [`ScoreStore`] for the unit catalog; at the end it hands over the frozen
//! score and reward. Effects (sound, haptics) are fire-and-forget. A
//! failing collaborator is logged and cannot corrupt session state,
//! because the summary is frozen before any collaborator is called.

use std::sync::Arc;

use stackbot_types::{Unit, UnitId};

/// Errors a collaborator can report back to the core.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    /// The backing store failed.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the failure.
        message: String,
    },

    /// A unit id is not in the store.
    #[error("unknown unit: {unit_id}")]
    UnknownUnit {
        /// The missing id.
        unit_id: UnitId,
    },

    /// Not enough currency for a purchase.
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds {
        /// Price of the purchase.
        needed: u64,
        /// Currency on hand.
        available: u64,
    },
}

/// Persistent storage for currency, high score, and the unit catalog.
pub trait ScoreStore: Send + Sync {
    /// Add earned currency.
    fn record_reward(&self, amount: u64) -> Result<(), CollaboratorError>;

    /// Offer a score. Returns `true` if it beat the stored high score.
    fn record_high_score(&self, candidate: u64) -> Result<bool, CollaboratorError>;

    /// Units the player owns, used to seed a session's catalog.
    fn current_catalog(&self) -> Result<Vec<Unit>, CollaboratorError>;
}

/// Screen navigation, told once when a session is over.
pub trait Navigator: Send + Sync {
    /// Called exactly once, after the `Ended` transition.
    fn on_session_ended(&self, final_score: u64, reward: u64);
}

/// Best-effort audio/haptic signals.
pub trait EffectSink: Send + Sync {
    /// A wrong answer was given (fever misses included).
    fn on_wrong_answer(&self);

    /// Fever mode started or ended.
    fn on_fever_toggled(&self, active: bool);
}

/// A navigator that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpNavigator;

impl Navigator for NoOpNavigator {
    fn on_session_ended(&self, _final_score: u64, _reward: u64) {}
}

/// An effect sink that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEffects;

impl EffectSink for NoOpEffects {
    fn on_wrong_answer(&self) {}

    fn on_fever_toggled(&self, _active: bool) {}
}

/// The full set of collaborators handed to a session actor.
#[derive(Clone)]
pub struct Collaborators {
    /// Score, currency, and catalog storage.
    pub store: Arc<dyn ScoreStore>,
    /// Navigation callback.
    pub navigator: Arc<dyn Navigator>,
    /// Audio/haptic effects.
    pub effects: Arc<dyn EffectSink>,
}

impl Collaborators {
    /// Collaborators with only a store; navigation and effects are no-ops.
    pub fn with_store(store: Arc<dyn ScoreStore>) -> Self {
        Self {
            store,
            navigator: Arc::new(NoOpNavigator),
            effects: Arc::new(NoOpEffects),
        }
    }
}

impl core::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

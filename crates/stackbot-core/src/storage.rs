//! In-memory [`ScoreStore`] implementation.
//!
//! Holds the player's currency, high score, and owned units for one
//! process. Atomics cover the counters so reward and high-score updates
//! never block; the unit list sits behind an [`RwLock`].

use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use stackbot_types::{Unit, UnitId};
use tracing::{debug, info};

use crate::collaborators::{CollaboratorError, ScoreStore};

/// Kinds owned by a fresh player.
pub const DEFAULT_KINDS: [&str; 8] = [
    "swift",
    "kotlin",
    "java",
    "javascript",
    "python",
    "go",
    "rust",
    "ruby",
];

/// Process-local store for currency, high score, and units.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    money: AtomicU64,
    high_score: AtomicU64,
    units: RwLock<Vec<Unit>>,
}

impl MemoryStorage {
    /// Create a store holding the given units and no currency.
    pub fn new(units: Vec<Unit>) -> Self {
        Self {
            money: AtomicU64::new(0),
            high_score: AtomicU64::new(0),
            units: RwLock::new(units),
        }
    }

    /// Create a store with one level-0 unit per [`DEFAULT_KINDS`] entry.
    pub fn with_default_catalog() -> Self {
        Self::new(DEFAULT_KINDS.iter().map(|kind| Unit::new(*kind)).collect())
    }

    /// Currency on hand.
    pub fn money(&self) -> u64 {
        self.money.load(Ordering::Acquire)
    }

    /// Best score recorded so far.
    pub fn high_score(&self) -> u64 {
        self.high_score.load(Ordering::Acquire)
    }

    /// Upgrade a unit, paying `cost` currency.
    ///
    /// The stored unit is replaced by its level-up copy (same id). Returns
    /// the new unit.
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError::UnknownUnit`] if the id is not stored,
    /// [`CollaboratorError::InsufficientFunds`] if the player cannot pay,
    /// or [`CollaboratorError::Storage`] if the unit lock is poisoned.
    pub fn raise_level(&self, unit_id: UnitId, cost: u64) -> Result<Unit, CollaboratorError> {
        let mut units = self.units.write().map_err(|_err| poisoned())?;
        let slot = units
            .iter_mut()
            .find(|unit| unit.id == unit_id)
            .ok_or(CollaboratorError::UnknownUnit { unit_id })?;

        self.money
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |money| {
                money.checked_sub(cost)
            })
            .map_err(|available| CollaboratorError::InsufficientFunds {
                needed: cost,
                available,
            })?;

        let upgraded = slot.leveled_up();
        *slot = upgraded.clone();
        info!(%unit_id, level = upgraded.level, cost, "Unit level raised");
        Ok(upgraded)
    }
}

impl ScoreStore for MemoryStorage {
    fn record_reward(&self, amount: u64) -> Result<(), CollaboratorError> {
        let _ = self
            .money
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |money| {
                Some(money.saturating_add(amount))
            });
        debug!(amount, total = self.money(), "Reward recorded");
        Ok(())
    }

    fn record_high_score(&self, candidate: u64) -> Result<bool, CollaboratorError> {
        let previous = self.high_score.fetch_max(candidate, Ordering::AcqRel);
        Ok(candidate > previous)
    }

    fn current_catalog(&self) -> Result<Vec<Unit>, CollaboratorError> {
        let units = self.units.read().map_err(|_err| poisoned())?;
        Ok(units.clone())
    }
}

fn poisoned() -> CollaboratorError {
    CollaboratorError::Storage {
        message: "unit store lock poisoned".to_owned(),
    }
}

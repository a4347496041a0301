//! Core entity structs and the immutable payloads published to observers.
//!
//! Everything that leaves the session actor is one of these owned values.
//! Observers never hold references into live session state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{AnswerOutcome, Direction, SessionState};
use crate::ids::{SessionId, UnitId};

// ---------------------------------------------------------------------------
// Units
// ---------------------------------------------------------------------------

/// A matchable unit definition from the catalog.
///
/// Units are immutable. Raising a unit's level produces a new value with
/// the same [`UnitId`] via [`Unit::leveled_up`]; the store swaps it in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Unit {
    /// Stable identifier, preserved across level-ups.
    pub id: UnitId,
    /// Kind identifier (image/asset name on the presentation side).
    pub kind: String,
    /// Difficulty/upgrade level, starting at 0.
    pub level: u32,
}

impl Unit {
    /// Create a level-0 unit of the given kind with a fresh id.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            id: UnitId::new(),
            kind: kind.into(),
            level: 0,
        }
    }

    /// Return a copy of this unit one level higher. Saturates at `u32::MAX`.
    #[must_use]
    pub fn leveled_up(&self) -> Self {
        Self {
            id: self.id,
            kind: self.kind.clone(),
            level: self.level.saturating_add(1),
        }
    }
}

/// A unit admitted into play together with its correct side.
///
/// `order` is the unit's index within its side's stack, counted from 0 in
/// admission order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct QueuedUnit {
    /// The unit definition.
    pub unit: Unit,
    /// The side this unit must be sent to.
    pub direction: Direction,
    /// Position within the side's stack.
    pub order: u32,
}

// ---------------------------------------------------------------------------
// Published payloads
// ---------------------------------------------------------------------------

/// A lifecycle transition, published on the state stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StateTransition {
    /// Session that transitioned.
    pub session_id: SessionId,
    /// State before the transition.
    pub from: SessionState,
    /// State after the transition.
    pub to: SessionState,
}

/// Countdown update, published at least once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ClockUpdate {
    /// Ticks left before the session ends.
    pub remaining: u64,
    /// Ticks the session started with.
    pub total: u64,
}

/// Window contents and outcome after each resolved answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AnswerResolved {
    /// What the answer did.
    pub outcome: AnswerOutcome,
    /// Points gained by this answer (0 unless correct).
    pub points: u64,
    /// Running score after the answer.
    pub score: u64,
    /// Active window, head first.
    pub window: Vec<QueuedUnit>,
}

/// Point-in-time copy of the whole session for late subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SessionSnapshot {
    /// Session identifier.
    pub session_id: SessionId,
    /// Lifecycle state.
    pub state: SessionState,
    /// Ticks left.
    pub remaining: u64,
    /// Ticks at start.
    pub total: u64,
    /// Current score.
    pub score: u64,
    /// Consecutive correct answers since the last miss or fever start.
    pub correct_streak: u32,
    /// Whether fever mode is active.
    pub fever_active: bool,
    /// Running ticks left before fever ends; 0 when inactive.
    pub fever_ticks_left: u64,
    /// Stack members in play, in admission order.
    pub members: Vec<QueuedUnit>,
    /// Active window, head first.
    pub window: Vec<QueuedUnit>,
    /// Last answer outcome, if any answer was resolved.
    pub last_outcome: Option<AnswerOutcome>,
}

/// Frozen result of a finished session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SessionSummary {
    /// Session identifier.
    pub session_id: SessionId,
    /// Final score.
    pub final_score: u64,
    /// Currency granted for the score.
    pub reward: u64,
    /// Whether the store reported a new high score.
    pub new_high_score: bool,
    /// Number of accepted answers.
    pub correct_answers: u32,
    /// Number of rejected answers, fever misses included.
    pub wrong_answers: u32,
    /// Number of level-ups that admitted a new stack member.
    pub level_ups: u32,
    /// Ticks delivered while running.
    pub ticks_elapsed: u64,
    /// Wall-clock time of the start transition.
    pub started_at: DateTime<Utc>,
    /// Wall-clock time of the end transition.
    pub ended_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_up_keeps_identity() {
        let unit = Unit::new("swift");
        let upgraded = unit.leveled_up();
        assert_eq!(upgraded.id, unit.id);
        assert_eq!(upgraded.kind, unit.kind);
        assert_eq!(upgraded.level, 1);
        assert_eq!(unit.level, 0);
    }

    #[test]
    fn level_up_saturates() {
        let unit = Unit {
            id: UnitId::new(),
            kind: "rust".to_owned(),
            level: u32::MAX,
        };
        assert_eq!(unit.leveled_up().level, u32::MAX);
    }
}

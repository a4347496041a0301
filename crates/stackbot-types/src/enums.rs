//! Enumeration types for the Stackbot game core.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// The side a unit must be sent to.
///
/// Every stack member is bound to one side when it is admitted; units
/// drawn from that member inherit the side as their correct answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Direction {
    /// The left stack.
    Left,
    /// The right stack.
    Right,
}

impl Direction {
    /// Both directions, left first.
    pub const ALL: [Self; 2] = [Self::Left, Self::Right];

    /// Return the other side.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

impl core::fmt::Display for Direction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
        }
    }
}

// ---------------------------------------------------------------------------
// Session lifecycle
// ---------------------------------------------------------------------------

/// Lifecycle state of a game session.
///
/// ```text
/// Ready --start--> Running --pause--> Paused
///                  ^   |              |
///                  |   +--clock 0--> Ended (terminal)
///                  +----resume--------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum SessionState {
    /// Constructed, waiting for `start`.
    Ready,
    /// Clock counting down, answers accepted.
    Running,
    /// Clock suspended, answers rejected.
    Paused,
    /// Clock reached zero. Terminal.
    Ended,
}

impl SessionState {
    /// Whether no further transition is possible from this state.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Ended)
    }
}

impl core::fmt::Display for SessionState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Ready => "ready",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Ended => "ended",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Answers
// ---------------------------------------------------------------------------

/// Result of validating one player answer against the head unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum AnswerOutcome {
    /// The head unit was sent to the right side and removed.
    Correct(Direction),
    /// Wrong side; the clock was penalized.
    Wrong,
    /// Wrong side while fever mode is active; no clock penalty.
    WrongDuringBonus,
}

impl AnswerOutcome {
    /// Whether the answer was accepted.
    pub const fn is_correct(self) -> bool {
        matches!(self, Self::Correct(_))
    }
}

//! Session countdown clock.
//!
//! The clock is the single source of truth for how much time a session has
//! left. It only counts whole ticks, so there is no drift across long
//! sessions.
//!
//! # Invariants
//!
//! - `0 <= remaining <= total` at all times.
//! - Every mutation saturates at zero; callers check [`SessionClock::is_expired`]
//!   after each decrement.

use stackbot_types::ClockUpdate;

use crate::config::SessionConfig;

/// Errors that can occur during clock construction.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// A session needs at least one tick on the clock.
    #[error("invalid clock configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Countdown for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionClock {
    /// Ticks left.
    remaining: u64,
    /// Ticks at start.
    total: u64,
}

impl SessionClock {
    /// Create a full clock from the session configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `total_ticks` is 0.
    pub fn new(config: &SessionConfig) -> Result<Self, ClockError> {
        Self::from_parts(config.total_ticks, config.total_ticks)
    }

    /// Create a clock with an explicit remaining value (for tests and
    /// state restoration). `remaining` is clamped to `total`.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `total` is 0.
    pub fn from_parts(remaining: u64, total: u64) -> Result<Self, ClockError> {
        if total == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "total_ticks must be at least 1".to_owned(),
            });
        }
        Ok(Self {
            remaining: remaining.min(total),
            total,
        })
    }

    /// Refill the clock to `total`.
    pub const fn reset(&mut self) {
        self.remaining = self.total;
    }

    /// Remove `ticks` from the clock. Returns `true` if it is now expired.
    pub const fn consume(&mut self, ticks: u64) -> bool {
        self.remaining = self.remaining.saturating_sub(ticks);
        self.is_expired()
    }

    /// Whether the clock has reached zero.
    pub const fn is_expired(&self) -> bool {
        self.remaining == 0
    }

    /// Ticks left.
    pub const fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Ticks at start.
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Ticks consumed so far, penalties included.
    pub const fn elapsed(&self) -> u64 {
        self.total.saturating_sub(self.remaining)
    }

    /// Owned payload for the clock stream.
    pub const fn update(&self) -> ClockUpdate {
        ClockUpdate {
            remaining: self.remaining,
            total: self.total,
        }
    }
}

//! Score accumulation and fever mode.
//!
//! `current` never decreases within a session; only [`ScoreState::reset`]
//! at session start puts it back to zero.

use crate::config::FeverConfig;

/// Running score and streak for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreState {
    current: u64,
    correct_streak: u32,
}

impl ScoreState {
    /// Credit a correct answer. Returns the new score.
    pub const fn record_correct(&mut self, points: u64) -> u64 {
        self.current = self.current.saturating_add(points);
        self.correct_streak = self.correct_streak.saturating_add(1);
        self.current
    }

    /// Break the streak after a wrong answer. The score is untouched.
    pub const fn record_wrong(&mut self) {
        self.correct_streak = 0;
    }

    /// Restart the streak count (fever consumed it).
    pub const fn clear_streak(&mut self) {
        self.correct_streak = 0;
    }

    /// Zero everything for a new session.
    pub const fn reset(&mut self) {
        self.current = 0;
        self.correct_streak = 0;
    }

    /// Current score.
    pub const fn current(&self) -> u64 {
        self.current
    }

    /// Consecutive correct answers.
    pub const fn correct_streak(&self) -> u32 {
        self.correct_streak
    }
}

/// Time-limited bonus state.
///
/// Fever starts when the correct streak reaches `trigger_streak` and lasts
/// `duration_ticks` running ticks. While active, points are multiplied and
/// wrong answers cost no time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fever {
    config: FeverConfig,
    /// Running ticks left; 0 means inactive.
    ticks_left: u64,
}

impl Fever {
    /// Create an inactive fever tracker.
    pub const fn new(config: FeverConfig) -> Self {
        Self {
            config,
            ticks_left: 0,
        }
    }

    /// Whether fever is running.
    pub const fn is_active(&self) -> bool {
        self.ticks_left > 0
    }

    /// Running ticks left before fever ends.
    pub const fn ticks_left(&self) -> u64 {
        self.ticks_left
    }

    /// Start fever if `streak` reached the trigger. Returns `true` on start.
    pub const fn maybe_start(&mut self, streak: u32) -> bool {
        let cfg = &self.config;
        if !cfg.enabled
            || self.is_active()
            || cfg.trigger_streak == 0
            || cfg.duration_ticks == 0
            || streak < cfg.trigger_streak
        {
            return false;
        }
        self.ticks_left = cfg.duration_ticks;
        true
    }

    /// Count one running tick. Returns `true` if fever just ended.
    pub const fn tick(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.ticks_left = self.ticks_left.saturating_sub(1);
        self.ticks_left == 0
    }

    /// Apply the fever multiplier to `points`.
    pub const fn scale(&self, points: u64) -> u64 {
        if self.is_active() {
            points.saturating_mul(self.config.score_multiplier)
        } else {
            points
        }
    }

    /// Force fever off. Returns `true` if it was active.
    pub const fn stop(&mut self) -> bool {
        let was_active = self.is_active();
        self.ticks_left = 0;
        was_active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fever(trigger_streak: u32, duration_ticks: u64) -> Fever {
        Fever::new(FeverConfig {
            enabled: true,
            trigger_streak,
            duration_ticks,
            score_multiplier: 2,
        })
    }

    #[test]
    fn score_accumulates_and_streak_breaks() {
        let mut score = ScoreState::default();
        assert_eq!(score.record_correct(10), 10);
        assert_eq!(score.record_correct(15), 25);
        assert_eq!(score.correct_streak(), 2);
        score.record_wrong();
        assert_eq!(score.current(), 25);
        assert_eq!(score.correct_streak(), 0);
    }

    #[test]
    fn reset_zeroes_score() {
        let mut score = ScoreState::default();
        let _ = score.record_correct(40);
        score.reset();
        assert_eq!(score, ScoreState::default());
    }

    #[test]
    fn fever_starts_at_trigger_and_runs_for_duration() {
        let mut fever = fever(3, 2);
        assert!(!fever.maybe_start(2));
        assert!(fever.maybe_start(3));
        assert!(fever.is_active());
        assert!(!fever.maybe_start(4));
        assert!(!fever.tick());
        assert!(fever.tick());
        assert!(!fever.is_active());
        assert!(!fever.tick());
    }

    #[test]
    fn fever_doubles_points_only_while_active() {
        let mut fever = fever(1, 5);
        assert_eq!(fever.scale(10), 10);
        let _ = fever.maybe_start(1);
        assert_eq!(fever.scale(10), 20);
        assert!(fever.stop());
        assert_eq!(fever.scale(10), 10);
    }

    #[test]
    fn disabled_fever_never_starts() {
        let mut fever = Fever::new(FeverConfig {
            enabled: false,
            ..FeverConfig::default()
        });
        assert!(!fever.maybe_start(u32::MAX));
    }

    #[test]
    fn zero_duration_never_starts() {
        let mut fever = fever(1, 0);
        assert!(!fever.maybe_start(10));
    }
}

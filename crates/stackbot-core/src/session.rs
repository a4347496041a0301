//! The game session state machine.
//!
//! [`GameSession`] owns the session state, the countdown, the score, fever
//! mode, and the [`UnitQueueManager`]. It is a plain synchronous value:
//! every input is applied to completion by [`GameSession::apply`], which
//! returns the events the input produced. The async actor in
//! [`crate::actor`] feeds it one input at a time and fans the events out.
//!
//! # Transitions
//!
//! | Input | From | To |
//! |-------|------|----|
//! | `Start` | `Ready` | `Running` |
//! | `Pause` | `Running` | `Paused` |
//! | `Resume` | `Paused` | `Running` |
//! | `Tick` / wrong `Answer` reaching 0 | `Running` | `Ended` |
//!
//! Anything else is a [`TransitionError::InvalidTransition`] and leaves the
//! session untouched.

use chrono::{DateTime, Utc};
use stackbot_types::{
    AnswerOutcome, AnswerResolved, ClockUpdate, Direction, QueuedUnit, SessionId,
    SessionSnapshot, SessionState, SessionSummary, StateTransition, Unit,
};
use tracing::{debug, info};

use crate::catalog::{CatalogError, UnitCatalog};
use crate::clock::{ClockError, SessionClock};
use crate::config::{GameConfig, ScoringConfig, SessionConfig};
use crate::queue::UnitQueueManager;
use crate::score::{Fever, ScoreState};

/// Errors that can occur while constructing a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The unit catalog could not be built.
    #[error("catalog error: {source}")]
    Catalog {
        /// The underlying catalog error.
        #[from]
        source: CatalogError,
    },

    /// The clock could not be built.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// An input rejected because the current state does not permit it.
///
/// This is the only condition the session raises at runtime. Callers log
/// it and carry on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// The input is not valid in the current state.
    #[error("{action} is not permitted while {state}")]
    InvalidTransition {
        /// Name of the rejected input.
        action: &'static str,
        /// State the session was in.
        state: SessionState,
    },
}

/// One unit of work for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionInput {
    /// `Ready -> Running`.
    Start,
    /// `Running -> Paused`.
    Pause,
    /// `Paused -> Running`.
    Resume,
    /// One tick of the countdown elapsed.
    Tick,
    /// The player sent the head unit to a side.
    Answer(Direction),
}

impl SessionInput {
    /// Short name used in logs and errors.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Tick => "tick",
            Self::Answer(_) => "answer",
        }
    }
}

/// Something observable that happened while applying an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The lifecycle state changed.
    StateChanged(StateTransition),
    /// The clock changed.
    ClockUpdated(ClockUpdate),
    /// A stack member was admitted (start or level-up).
    MemberAdmitted(QueuedUnit),
    /// The window was filled at session start.
    WindowFilled(Vec<QueuedUnit>),
    /// An answer was resolved.
    AnswerResolved(AnswerResolved),
    /// Fever mode started (`true`) or ended (`false`).
    FeverToggled(bool),
    /// The session ended; the summary is frozen.
    Ended(SessionSummary),
}

/// Single-owner state for one game session.
#[derive(Debug)]
pub struct GameSession {
    id: SessionId,
    state: SessionState,
    queue: UnitQueueManager,
    clock: SessionClock,
    score: ScoreState,
    fever: Fever,
    session_config: SessionConfig,
    scoring: ScoringConfig,
    starting_capacity: u32,
    correct_answers: u32,
    wrong_answers: u32,
    level_ups: u32,
    ticks_elapsed: u64,
    last_outcome: Option<AnswerOutcome>,
    started_at: Option<DateTime<Utc>>,
    summary: Option<SessionSummary>,
}

impl GameSession {
    /// Build a `Ready` session from configuration and the store's catalog.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Catalog`] for an empty or inconsistent
    /// catalog, or one with fewer units than the starting window, and
    /// [`SessionError::Clock`] for a zero-length session.
    pub fn new(config: &GameConfig, units: Vec<Unit>) -> Result<Self, SessionError> {
        let catalog = UnitCatalog::new(units)?;
        let starting = usize::try_from(config.queue.starting_capacity).unwrap_or(usize::MAX);
        catalog.require(starting)?;
        let clock = SessionClock::new(&config.session)?;
        let queue = UnitQueueManager::new(catalog, config.queue.clone(), config.scoring.clone());
        Ok(Self {
            id: SessionId::new(),
            state: SessionState::Ready,
            queue,
            clock,
            score: ScoreState::default(),
            fever: Fever::new(config.fever.clone()),
            session_config: config.session.clone(),
            scoring: config.scoring.clone(),
            starting_capacity: config.queue.starting_capacity,
            correct_answers: 0,
            wrong_answers: 0,
            level_ups: 0,
            ticks_elapsed: 0,
            last_outcome: None,
            started_at: None,
            summary: None,
        })
    }

    /// Apply one input to completion.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::InvalidTransition`] if the input is not
    /// permitted in the current state. The session is unchanged in that
    /// case.
    pub fn apply(&mut self, input: SessionInput) -> Result<Vec<SessionEvent>, TransitionError> {
        match (input, self.state) {
            (SessionInput::Start, SessionState::Ready) => Ok(self.start()),
            (SessionInput::Pause, SessionState::Running) => {
                Ok(vec![self.transition(SessionState::Paused)])
            }
            (SessionInput::Resume, SessionState::Paused) => {
                Ok(vec![self.transition(SessionState::Running)])
            }
            (SessionInput::Tick, SessionState::Running) => Ok(self.tick()),
            (SessionInput::Answer(direction), SessionState::Running) => {
                Ok(self.answer(direction))
            }
            (_, state) => Err(TransitionError::InvalidTransition {
                action: input.name(),
                state,
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    fn start(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        self.queue.reset_all();
        for _ in 0..self.starting_capacity {
            match self.queue.new_member() {
                Some(member) => events.push(SessionEvent::MemberAdmitted(member)),
                None => break,
            }
        }
        let window = self.queue.startings();
        events.push(SessionEvent::WindowFilled(window));

        self.score.reset();
        let _ = self.fever.stop();
        self.clock.reset();
        self.correct_answers = 0;
        self.wrong_answers = 0;
        self.level_ups = 0;
        self.ticks_elapsed = 0;
        self.last_outcome = None;
        self.started_at = Some(Utc::now());

        events.push(self.transition(SessionState::Running));
        events.push(SessionEvent::ClockUpdated(self.clock.update()));

        info!(
            session_id = %self.id,
            total = self.clock.total(),
            capacity = self.queue.capacity(),
            "Session started"
        );
        events
    }

    fn tick(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        self.ticks_elapsed = self.ticks_elapsed.saturating_add(1);
        let expired = self.clock.consume(1);
        events.push(SessionEvent::ClockUpdated(self.clock.update()));

        if self.fever.tick() {
            debug!(session_id = %self.id, "Fever ended");
            events.push(SessionEvent::FeverToggled(false));
        }
        if expired {
            self.end(&mut events);
        }
        events
    }

    fn answer(&mut self, direction: Direction) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        let Some(points) = self.queue.current_head_unit_score() else {
            debug!(session_id = %self.id, "Answer with empty window ignored");
            return events;
        };

        if self.queue.is_move_action_correct(direction) {
            let gained = self.fever.scale(points);
            let score = self.score.record_correct(gained);
            self.correct_answers = self.correct_answers.saturating_add(1);
            self.queue.raise_answer_count();

            if self.queue.is_time_to_level_up() {
                if let Some(member) = self.queue.new_member() {
                    self.level_ups = self.level_ups.saturating_add(1);
                    info!(
                        session_id = %self.id,
                        capacity = self.queue.capacity(),
                        "Level up"
                    );
                    events.push(SessionEvent::MemberAdmitted(member));
                }
            }

            let window = self.queue.remove_and_refilled();
            let outcome = AnswerOutcome::Correct(direction);
            self.last_outcome = Some(outcome);
            events.push(SessionEvent::AnswerResolved(AnswerResolved {
                outcome,
                points: gained,
                score,
                window,
            }));

            if self.fever.maybe_start(self.score.correct_streak()) {
                self.score.clear_streak();
                debug!(session_id = %self.id, "Fever started");
                events.push(SessionEvent::FeverToggled(true));
            }
            return events;
        }

        self.wrong_answers = self.wrong_answers.saturating_add(1);
        self.score.record_wrong();

        let (outcome, expired) = if self.fever.is_active() {
            (AnswerOutcome::WrongDuringBonus, false)
        } else {
            let expired = self.clock.consume(self.session_config.wrong_penalty_ticks);
            events.push(SessionEvent::ClockUpdated(self.clock.update()));
            (AnswerOutcome::Wrong, expired)
        };
        self.last_outcome = Some(outcome);
        events.push(SessionEvent::AnswerResolved(AnswerResolved {
            outcome,
            points: 0,
            score: self.score.current(),
            window: self.queue.window_snapshot(),
        }));

        if expired {
            self.end(&mut events);
        }
        events
    }

    fn end(&mut self, events: &mut Vec<SessionEvent>) {
        if self.fever.stop() {
            events.push(SessionEvent::FeverToggled(false));
        }
        events.push(self.transition(SessionState::Ended));

        let final_score = self.score.current();
        let ended_at = Utc::now();
        let summary = SessionSummary {
            session_id: self.id,
            final_score,
            reward: self.scoring.reward_for(final_score),
            new_high_score: false,
            correct_answers: self.correct_answers,
            wrong_answers: self.wrong_answers,
            level_ups: self.level_ups,
            ticks_elapsed: self.ticks_elapsed,
            started_at: self.started_at.unwrap_or(ended_at),
            ended_at,
        };
        info!(
            session_id = %self.id,
            final_score,
            reward = summary.reward,
            correct = summary.correct_answers,
            wrong = summary.wrong_answers,
            clock_consumed = self.clock.elapsed(),
            "Session ended"
        );
        self.summary = Some(summary.clone());
        events.push(SessionEvent::Ended(summary));
    }

    fn transition(&mut self, to: SessionState) -> SessionEvent {
        let from = self.state;
        self.state = to;
        debug!(session_id = %self.id, %from, %to, "Session transition");
        SessionEvent::StateChanged(StateTransition {
            session_id: self.id,
            from,
            to,
        })
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    /// Session identifier.
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Lifecycle state.
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// The countdown.
    pub const fn clock(&self) -> &SessionClock {
        &self.clock
    }

    /// Score and streak.
    pub const fn score(&self) -> &ScoreState {
        &self.score
    }

    /// Whether fever mode is active.
    pub const fn fever_active(&self) -> bool {
        self.fever.is_active()
    }

    /// The queue manager (read-only; mutation goes through [`Self::apply`]).
    pub const fn queue(&self) -> &UnitQueueManager {
        &self.queue
    }

    /// The frozen summary, once the session has ended.
    pub const fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    /// Owned copy of everything an observer may want.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            state: self.state,
            remaining: self.clock.remaining(),
            total: self.clock.total(),
            score: self.score.current(),
            correct_streak: self.score.correct_streak(),
            fever_active: self.fever.is_active(),
            fever_ticks_left: self.fever.ticks_left(),
            members: self.queue.members().to_vec(),
            window: self.queue.window_snapshot(),
            last_outcome: self.last_outcome,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::config::{FeverConfig, QueueConfig};

    fn units(count: usize) -> Vec<Unit> {
        (0..count).map(|i| Unit::new(format!("kind-{i}"))).collect()
    }

    fn config(total: u64, penalty: u64, threshold: u32) -> GameConfig {
        GameConfig {
            session: SessionConfig {
                total_ticks: total,
                tick_interval_ms: 1000,
                wrong_penalty_ticks: penalty,
            },
            queue: QueueConfig {
                starting_capacity: 3,
                max_capacity: 8,
                level_up_threshold: threshold,
                seed: Some(9),
            },
            fever: FeverConfig {
                enabled: false,
                ..FeverConfig::default()
            },
            ..GameConfig::default()
        }
    }

    fn started(config: &GameConfig) -> GameSession {
        let mut session = GameSession::new(config, units(8)).unwrap();
        let _ = session.apply(SessionInput::Start).unwrap();
        session
    }

    fn head_direction(session: &GameSession) -> Direction {
        session.queue().head().unwrap().direction
    }

    fn answer_right(session: &mut GameSession) -> Vec<SessionEvent> {
        let direction = head_direction(session);
        session.apply(SessionInput::Answer(direction)).unwrap()
    }

    fn answer_wrong(session: &mut GameSession) -> Vec<SessionEvent> {
        let direction = head_direction(session).opposite();
        session.apply(SessionInput::Answer(direction)).unwrap()
    }

    fn has_state(events: &[SessionEvent], to: SessionState) -> bool {
        events
            .iter()
            .any(|e| matches!(e, SessionEvent::StateChanged(t) if t.to == to))
    }

    #[test]
    fn start_fills_window_and_clock() {
        let mut session = GameSession::new(&config(30, 3, 5), units(8)).unwrap();
        assert_eq!(session.state(), SessionState::Ready);

        let events = session.apply(SessionInput::Start).unwrap();
        let admitted = events
            .iter()
            .filter(|e| matches!(e, SessionEvent::MemberAdmitted(_)))
            .count();
        assert_eq!(admitted, 3);
        assert!(has_state(&events, SessionState::Running));
        assert_eq!(session.queue().window_snapshot().len(), 3);
        assert_eq!(session.clock().remaining(), 30);
        assert_eq!(session.score().current(), 0);
    }

    #[test]
    fn five_correct_answers_level_up_once() {
        let mut session = started(&config(30, 3, 5));
        for _ in 0..5 {
            let _ = session.apply(SessionInput::Tick).unwrap();
            let _ = answer_right(&mut session);
        }
        assert_eq!(session.clock().remaining(), 25);
        assert_eq!(session.queue().capacity(), 4);
        assert_eq!(session.queue().window_snapshot().len(), 4);
    }

    #[test]
    fn window_size_constant_below_threshold() {
        let mut session = started(&config(30, 3, 5));
        for _ in 0..4 {
            let events = answer_right(&mut session);
            let resolved = events.iter().find_map(|e| match e {
                SessionEvent::AnswerResolved(r) => Some(r),
                _ => None,
            });
            assert_eq!(resolved.unwrap().window.len(), 3);
        }
        let events = answer_right(&mut session);
        let admitted = events
            .iter()
            .filter(|e| matches!(e, SessionEvent::MemberAdmitted(_)))
            .count();
        assert_eq!(admitted, 1);
    }

    #[test]
    fn wrong_answer_at_two_remaining_ends_session() {
        let mut session = started(&config(2, 3, 5));
        let _ = answer_right(&mut session);
        let score_before = session.score().current();
        assert!(score_before > 0);

        let _ = session.apply(SessionInput::Tick).unwrap();
        assert_eq!(session.clock().remaining(), 1);

        let events = answer_wrong(&mut session);
        assert_eq!(session.clock().remaining(), 0);
        assert_eq!(session.state(), SessionState::Ended);
        assert!(has_state(&events, SessionState::Ended));
        assert_eq!(session.score().current(), score_before);
        assert_eq!(session.summary().unwrap().final_score, score_before);
    }

    #[test]
    fn wrong_answer_keeps_head() {
        let mut session = started(&config(30, 3, 5));
        let before = session.queue().window_snapshot();
        let events = answer_wrong(&mut session);
        assert_eq!(session.queue().window_snapshot(), before);
        assert_eq!(session.clock().remaining(), 27);
        assert!(events.iter().any(|e| matches!(
            e,
            SessionEvent::AnswerResolved(AnswerResolved {
                outcome: AnswerOutcome::Wrong,
                ..
            })
        )));
    }

    #[test]
    fn pause_then_resume_changes_nothing() {
        let mut session = started(&config(30, 3, 5));
        let _ = session.apply(SessionInput::Tick).unwrap();
        let before = session.snapshot();

        let _ = session.apply(SessionInput::Pause).unwrap();
        assert_eq!(session.state(), SessionState::Paused);
        let _ = session.apply(SessionInput::Resume).unwrap();

        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn invalid_transitions_are_rejected_without_change() {
        let mut session = GameSession::new(&config(30, 3, 5), units(8)).unwrap();
        assert_eq!(
            session.apply(SessionInput::Pause),
            Err(TransitionError::InvalidTransition {
                action: "pause",
                state: SessionState::Ready,
            })
        );
        assert!(session.apply(SessionInput::Tick).is_err());

        let _ = session.apply(SessionInput::Start).unwrap();
        assert!(session.apply(SessionInput::Start).is_err());
        assert!(session.apply(SessionInput::Resume).is_err());

        let _ = session.apply(SessionInput::Pause).unwrap();
        let before = session.snapshot();
        assert!(session.apply(SessionInput::Answer(Direction::Left)).is_err());
        assert!(session.apply(SessionInput::Tick).is_err());
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn ended_is_terminal() {
        let mut session = started(&config(1, 3, 5));
        let events = session.apply(SessionInput::Tick).unwrap();
        assert!(matches!(events.last(), Some(SessionEvent::Ended(_))));
        for input in [
            SessionInput::Start,
            SessionInput::Pause,
            SessionInput::Resume,
            SessionInput::Tick,
            SessionInput::Answer(Direction::Right),
        ] {
            assert!(session.apply(input).is_err());
        }
        assert_eq!(session.state(), SessionState::Ended);
    }

    #[test]
    fn catalog_smaller_than_starting_window_rejected() {
        let result = GameSession::new(&config(30, 3, 5), units(2));
        assert!(matches!(
            result,
            Err(SessionError::Catalog {
                source: CatalogError::TooSmall {
                    needed: 3,
                    available: 2
                }
            })
        ));

        let mut exact = GameSession::new(&config(30, 3, 5), units(3)).unwrap();
        let _ = exact.apply(SessionInput::Start).unwrap();
        assert_eq!(exact.queue().window_snapshot().len(), 3);
    }

    #[test]
    fn arrival_order_decides_outcome() {
        // Tick first: the clock runs out before the answer lands.
        let mut tick_first = started(&config(1, 3, 5));
        let direction = head_direction(&tick_first);
        let _ = tick_first.apply(SessionInput::Tick).unwrap();
        assert!(tick_first.apply(SessionInput::Answer(direction)).is_err());
        assert_eq!(tick_first.summary().unwrap().final_score, 0);

        // Answer first: the point counts, then the tick ends the session.
        let mut answer_first = started(&config(1, 3, 5));
        let direction = head_direction(&answer_first);
        let _ = answer_first.apply(SessionInput::Answer(direction)).unwrap();
        let _ = answer_first.apply(SessionInput::Tick).unwrap();
        assert_eq!(answer_first.summary().unwrap().final_score, 10);
    }

    #[test]
    fn summary_reports_reward() {
        let mut session = started(&config(1, 3, 5));
        for _ in 0..3 {
            let _ = answer_right(&mut session);
        }
        let _ = session.apply(SessionInput::Tick).unwrap();
        let summary = session.summary().unwrap();
        assert_eq!(summary.final_score, 30);
        assert_eq!(summary.reward, 3);
        assert_eq!(summary.correct_answers, 3);
        assert_eq!(summary.ticks_elapsed, 1);
    }

    #[test]
    fn fever_doubles_points_and_forgives_misses() {
        let mut cfg = config(30, 3, 0);
        cfg.fever = FeverConfig {
            enabled: true,
            trigger_streak: 2,
            duration_ticks: 2,
            score_multiplier: 2,
        };
        let mut session = started(&cfg);

        let _ = answer_right(&mut session);
        let events = answer_right(&mut session);
        assert!(events.contains(&SessionEvent::FeverToggled(true)));
        assert!(session.fever_active());
        assert_eq!(session.score().correct_streak(), 0);
        assert_eq!(session.snapshot().fever_ticks_left, 2);

        let _ = answer_right(&mut session);
        assert_eq!(session.score().current(), 40);

        let events = answer_wrong(&mut session);
        assert_eq!(session.clock().remaining(), 30);
        assert!(events.iter().any(|e| matches!(
            e,
            SessionEvent::AnswerResolved(AnswerResolved {
                outcome: AnswerOutcome::WrongDuringBonus,
                ..
            })
        )));

        let _ = session.apply(SessionInput::Tick).unwrap();
        let events = session.apply(SessionInput::Tick).unwrap();
        assert!(events.contains(&SessionEvent::FeverToggled(false)));
        assert!(!session.fever_active());
        assert_eq!(session.snapshot().fever_ticks_left, 0);
    }

    #[test]
    fn random_inputs_keep_invariants() {
        let mut rng = SmallRng::seed_from_u64(2024);
        let mut cfg = config(40, 3, 4);
        cfg.fever = FeverConfig {
            enabled: true,
            trigger_streak: 6,
            duration_ticks: 3,
            score_multiplier: 2,
        };
        let mut session = GameSession::new(&cfg, units(6)).unwrap();
        let _ = session.apply(SessionInput::Start).unwrap();

        let mut last_score = 0;
        let mut ended_events = 0;
        for _ in 0..500 {
            let input = match rng.random_range(0..10) {
                0..=3 => SessionInput::Tick,
                4..=7 => SessionInput::Answer(Direction::ALL[rng.random_range(0..2)]),
                8 => SessionInput::Pause,
                _ => SessionInput::Resume,
            };
            let Ok(events) = session.apply(input) else {
                continue;
            };
            ended_events = events
                .iter()
                .filter(|e| matches!(e, SessionEvent::Ended(_)))
                .count()
                .saturating_add(ended_events);

            let clock = session.clock();
            assert!(clock.remaining() <= clock.total());
            assert!(session.score().current() >= last_score);
            last_score = session.score().current();
            assert_eq!(session.state() == SessionState::Ended, clock.is_expired());
            if session.state() == SessionState::Running {
                assert_eq!(session.queue().window_snapshot().len(), session.queue().capacity());
            }
        }
        assert!(ended_events <= 1);
    }
}

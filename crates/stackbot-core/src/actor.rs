//! Single-consumer actor that owns a [`GameSession`].
//!
//! Every mutation arrives as a [`SessionInput`] on one bounded mpsc channel
//! and is applied to completion before the next is read. The countdown
//! timer is just another producer on that channel, so a tick and an answer
//! can never interleave inside a transition.
//!
//! Observers read from broadcast channels (state, answers, clock, members)
//! and from a watch channel that always holds the latest
//! [`SessionSnapshot`].
//!
//! # Timer
//!
//! The timer task holds a [`WeakSender`], so it never keeps the actor
//! alive on its own. It is spawned on every transition into `Running` and
//! aborted on `Paused` and `Ended`; partial progress toward the next tick
//! is discarded on pause. Ticks delayed by a busy runtime are delivered in
//! a burst, each decrementing the clock by one.

use std::time::Duration;

use stackbot_types::{
    AnswerResolved, ClockUpdate, Direction, QueuedUnit, SessionId, SessionSnapshot, SessionState,
    SessionSummary, StateTransition,
};
use tokio::sync::mpsc::WeakSender;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::collaborators::{CollaboratorError, Collaborators};
use crate::config::{GameConfig, SessionConfig};
use crate::session::{GameSession, SessionError, SessionEvent, SessionInput};

/// Capacity of the input channel.
const COMMAND_CAPACITY: usize = 256;

/// Capacity of each broadcast channel. Slow subscribers lag rather than
/// block the actor.
const BROADCAST_CAPACITY: usize = 256;

/// Errors that can occur while spawning a session actor.
#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    /// The store could not supply a catalog.
    #[error("catalog fetch failed: {source}")]
    Store {
        /// The underlying collaborator error.
        #[from]
        source: CollaboratorError,
    },

    /// The session could not be built.
    #[error("session error: {source}")]
    Session {
        /// The underlying session error.
        #[from]
        source: SessionError,
    },
}

/// Errors returned by [`SessionHandle`] commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HandleError {
    /// The actor has stopped and no longer accepts input.
    #[error("session actor is no longer running")]
    SessionClosed,
}

/// Where ticks come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickSource {
    /// An internal timer fires every period while `Running`.
    Interval(Duration),
    /// No timer; the host calls [`SessionHandle::tick`].
    Manual,
}

impl TickSource {
    /// Interval ticks at the configured rate.
    pub const fn from_config(config: &SessionConfig) -> Self {
        Self::Interval(Duration::from_millis(config.tick_interval_ms))
    }
}

/// Sender half of every observer stream.
#[derive(Debug, Clone)]
struct Streams {
    state: broadcast::Sender<StateTransition>,
    answers: broadcast::Sender<AnswerResolved>,
    clock: broadcast::Sender<ClockUpdate>,
    members: broadcast::Sender<QueuedUnit>,
}

impl Streams {
    fn new() -> Self {
        Self {
            state: broadcast::channel(BROADCAST_CAPACITY).0,
            answers: broadcast::channel(BROADCAST_CAPACITY).0,
            clock: broadcast::channel(BROADCAST_CAPACITY).0,
            members: broadcast::channel(BROADCAST_CAPACITY).0,
        }
    }
}

/// Cloneable front end to a running session actor.
///
/// Commands only enqueue; their effect is visible once the actor has
/// processed them, through the streams or [`SessionHandle::snapshot`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    session_id: SessionId,
    tx: mpsc::Sender<SessionInput>,
    streams: Streams,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
    summary_rx: watch::Receiver<Option<SessionSummary>>,
}

impl SessionHandle {
    /// Id of the session behind this handle.
    pub const fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Request `Ready -> Running`.
    pub async fn start(&self) -> Result<(), HandleError> {
        self.send(SessionInput::Start).await
    }

    /// Request `Running -> Paused`.
    pub async fn pause(&self) -> Result<(), HandleError> {
        self.send(SessionInput::Pause).await
    }

    /// Request `Paused -> Running`.
    pub async fn resume(&self) -> Result<(), HandleError> {
        self.send(SessionInput::Resume).await
    }

    /// Send the head unit to `direction`.
    pub async fn answer(&self, direction: Direction) -> Result<(), HandleError> {
        self.send(SessionInput::Answer(direction)).await
    }

    /// Enqueue one tick. Intended for [`TickSource::Manual`] sessions.
    pub async fn tick(&self) -> Result<(), HandleError> {
        self.send(SessionInput::Tick).await
    }

    /// Subscribe to lifecycle transitions.
    pub fn subscribe_state(&self) -> broadcast::Receiver<StateTransition> {
        self.streams.state.subscribe()
    }

    /// Subscribe to resolved answers.
    pub fn subscribe_answers(&self) -> broadcast::Receiver<AnswerResolved> {
        self.streams.answers.subscribe()
    }

    /// Subscribe to clock changes.
    pub fn subscribe_clock(&self) -> broadcast::Receiver<ClockUpdate> {
        self.streams.clock.subscribe()
    }

    /// Subscribe to admitted stack members.
    pub fn subscribe_members(&self) -> broadcast::Receiver<QueuedUnit> {
        self.streams.members.subscribe()
    }

    /// Latest snapshot published by the actor.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// A receiver that is notified whenever the snapshot changes.
    pub fn watch_snapshot(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Wait for the session to end and return its summary.
    ///
    /// The summary is published only after the store and navigator have
    /// been called. Returns `None` if the actor stopped without ending.
    pub async fn wait_ended(&self) -> Option<SessionSummary> {
        let mut rx = self.summary_rx.clone();
        rx.wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|summary| summary.as_ref().cloned())
    }

    async fn send(&self, input: SessionInput) -> Result<(), HandleError> {
        self.tx
            .send(input)
            .await
            .map_err(|_closed| HandleError::SessionClosed)
    }
}

/// Build a session from the store's catalog and spawn its actor.
///
/// The actor runs until every [`SessionHandle`] is dropped. The returned
/// [`JoinHandle`] completes at that point.
///
/// # Errors
///
/// Returns [`SpawnError`] if the catalog cannot be fetched or the session
/// cannot be built from it.
pub fn spawn_session(
    config: &GameConfig,
    collaborators: Collaborators,
    ticks: TickSource,
) -> Result<(SessionHandle, JoinHandle<()>), SpawnError> {
    let units = collaborators.store.current_catalog()?;
    let session = GameSession::new(config, units)?;
    let session_id = session.id();

    let (tx, rx) = mpsc::channel(COMMAND_CAPACITY);
    let streams = Streams::new();
    let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot());
    let (summary_tx, summary_rx) = watch::channel(None);

    let actor = SessionActor {
        session,
        rx,
        weak_tx: tx.downgrade(),
        streams: streams.clone(),
        snapshot_tx,
        summary_tx,
        collaborators,
        ticks,
        timer: None,
    };

    info!(%session_id, ?ticks, "Session actor spawned");
    let join = tokio::spawn(actor.run());

    let handle = SessionHandle {
        session_id,
        tx,
        streams,
        snapshot_rx,
        summary_rx,
    };
    Ok((handle, join))
}

/// Owner of the session and the only task that mutates it.
struct SessionActor {
    session: GameSession,
    rx: mpsc::Receiver<SessionInput>,
    weak_tx: WeakSender<SessionInput>,
    streams: Streams,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    summary_tx: watch::Sender<Option<SessionSummary>>,
    collaborators: Collaborators,
    ticks: TickSource,
    timer: Option<JoinHandle<()>>,
}

impl SessionActor {
    async fn run(mut self) {
        while let Some(input) = self.rx.recv().await {
            self.handle(input);
        }
        debug!(session_id = %self.session.id(), "Session actor stopped");
    }

    fn handle(&mut self, input: SessionInput) {
        match self.session.apply(input) {
            Ok(events) => {
                for event in events {
                    self.dispatch(event);
                }
                self.snapshot_tx.send_replace(self.session.snapshot());
            }
            Err(err) => {
                debug!(session_id = %self.session.id(), error = %err, "Input ignored");
            }
        }
    }

    fn dispatch(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::StateChanged(transition) => {
                if transition.to == SessionState::Running {
                    self.start_timer();
                } else if transition.to == SessionState::Paused || transition.to.is_terminal() {
                    self.stop_timer();
                }
                let _ = self.streams.state.send(transition);
            }
            SessionEvent::ClockUpdated(update) => {
                let _ = self.streams.clock.send(update);
            }
            SessionEvent::MemberAdmitted(member) => {
                let _ = self.streams.members.send(member);
            }
            SessionEvent::WindowFilled(window) => {
                debug!(size = window.len(), "Window filled");
            }
            SessionEvent::AnswerResolved(resolved) => {
                if !resolved.outcome.is_correct() {
                    self.collaborators.effects.on_wrong_answer();
                }
                let _ = self.streams.answers.send(resolved);
            }
            SessionEvent::FeverToggled(active) => {
                self.collaborators.effects.on_fever_toggled(active);
            }
            SessionEvent::Ended(summary) => self.finish(summary),
        }
    }

    /// Hand the frozen summary to the collaborators, then publish it.
    fn finish(&self, mut summary: SessionSummary) {
        let store = &self.collaborators.store;
        if let Err(err) = store.record_reward(summary.reward) {
            warn!(session_id = %summary.session_id, error = %err, "Failed to record reward");
        }
        match store.record_high_score(summary.final_score) {
            Ok(new_high) => summary.new_high_score = new_high,
            Err(err) => {
                warn!(session_id = %summary.session_id, error = %err, "Failed to record high score");
            }
        }
        self.collaborators
            .navigator
            .on_session_ended(summary.final_score, summary.reward);

        info!(
            session_id = %summary.session_id,
            final_score = summary.final_score,
            reward = summary.reward,
            new_high_score = summary.new_high_score,
            "Session finished"
        );
        self.summary_tx.send_replace(Some(summary));
    }

    fn start_timer(&mut self) {
        let TickSource::Interval(period) = self.ticks else {
            return;
        };
        self.stop_timer();
        let weak = self.weak_tx.clone();
        let period = period.max(Duration::from_millis(1));
        self.timer = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(tx) = weak.upgrade() else {
                    break;
                };
                if tx.send(SessionInput::Tick).await.is_err() {
                    break;
                }
            }
        }));
    }

    fn stop_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for SessionActor {
    fn drop(&mut self) {
        self.stop_timer();
    }
}

//! Session engine for the Stackbot sorting game.
//!
//! A session shows a short window of units, each tagged with a side. The
//! player sends the head unit left or right; the arrival order of answers
//! and clock ticks alone decides every outcome.
//!
//! # Modules
//!
//! - [`actor`] -- Tokio actor that serializes ticks and player input into
//!   one channel and fans events out to observers.
//! - [`catalog`] -- Validated set of units a session draws from.
//! - [`clock`] -- Whole-tick countdown with saturating penalties.
//! - [`collaborators`] -- Storage, navigation, and effect traits.
//! - [`config`] -- Configuration loading from `stackbot-config.yaml` into
//!   strongly-typed structs.
//! - [`queue`] -- Stack members, the active window, and level-up pacing.
//! - [`score`] -- Score, streak, and fever mode.
//! - [`session`] -- The synchronous [`GameSession`] state machine.
//! - [`storage`] -- In-memory [`ScoreStore`] implementation.
//!
//! [`GameSession`]: session::GameSession
//! [`ScoreStore`]: collaborators::ScoreStore

pub mod actor;
pub mod catalog;
pub mod clock;
pub mod collaborators;
pub mod config;
pub mod queue;
pub mod score;
pub mod session;
pub mod storage;

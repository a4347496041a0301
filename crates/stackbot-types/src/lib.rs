//! Shared type definitions for the Stackbot game core.
//!
//! This crate is the single source of truth for the data model shared by
//! the session engine and anything that presents it. Types flow to
//! `TypeScript` via `ts-rs` for a presentation layer.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for units and sessions
//! - [`enums`] -- Direction, session state, and answer outcome
//! - [`structs`] -- Units, queued units, and the payloads published to observers

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{AnswerOutcome, Direction, SessionState};
pub use ids::{SessionId, UnitId};
pub use structs::{
    AnswerResolved, ClockUpdate, QueuedUnit, SessionSnapshot, SessionSummary, StateTransition,
    Unit,
};

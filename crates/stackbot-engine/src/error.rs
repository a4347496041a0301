//! Error types for the Stackbot engine binary.
//!
//! [`EngineError`] wraps every failure mode during startup and play so
//! `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: stackbot_core::config::ConfigError,
    },

    /// The `bot` section of the config file is malformed.
    #[error("bot config error: {message}")]
    BotConfig {
        /// Description of the failure.
        message: String,
    },

    /// The session actor could not be spawned.
    #[error("spawn error: {source}")]
    Spawn {
        /// The underlying spawn error.
        #[from]
        source: stackbot_core::actor::SpawnError,
    },

    /// A command could not reach the session actor.
    #[error("session error: {source}")]
    Session {
        /// The underlying handle error.
        #[from]
        source: stackbot_core::actor::HandleError,
    },

    /// The session actor stopped before the session ended.
    #[error("session actor stopped before the session ended")]
    Aborted,
}

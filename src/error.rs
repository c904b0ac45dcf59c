//! Engine error types
//!
//! Only configuration and programmer errors surface here. Physics and timing
//! anomalies are recovered inside the simulation and never reach the caller.

use thiserror::Error;

use crate::outcome::GameKind;

/// Root error type for all engine failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Target outcome is illegal for the mini-game it was handed to.
    #[error("invalid target for {kind}: {reason}")]
    Configuration { kind: GameKind, reason: String },

    /// `start_play` while a session is still running.
    #[error("a play is already active")]
    DuplicatePlay,

    /// Input that needs a running session arrived without one.
    #[error("no play is active")]
    NoActivePlay,

    /// Pointer input sent to a physics game (or the reverse).
    #[error("{kind} does not accept this input")]
    WrongModality { kind: GameKind },

    /// Tuning or settings document could not be used.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

impl EngineError {
    pub fn configuration(kind: GameKind, reason: impl Into<String>) -> Self {
        Self::Configuration {
            kind,
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidSettings(err.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

use thiserror::Error;

use crate::cards::CardParseError;

/// Errors surfaced by engines and their building blocks.
///
/// Every variant except `Resource` leaves engine state untouched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("{0}")]
    Turn(String),
    #[error("{0}")]
    IllegalAction(String),
    #[error("resource exhausted: {0}")]
    Resource(String),
    #[error("mutual destruction: the round must be replayed")]
    MutualDestruction,
    #[error("end of deck")]
    EndOfDeck,
    #[error(transparent)]
    CardParse(#[from] CardParseError),
    #[error("bad payload: {0}")]
    Payload(String),
}

impl GameError {
    pub fn not_your_turn() -> Self {
        GameError::Turn("it is not your turn".to_string())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        GameError::Config(msg.into())
    }

    pub fn turn(msg: impl Into<String>) -> Self {
        GameError::Turn(msg.into())
    }

    pub fn illegal(msg: impl Into<String>) -> Self {
        GameError::IllegalAction(msg.into())
    }

    pub fn payload(msg: impl Into<String>) -> Self {
        GameError::Payload(msg.into())
    }
}

/// Failures while loading a [`crate::config::GameConfig`] from disk or text.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported config format: {0}")]
    Format(String),
    #[error(transparent)]
    Invalid(#[from] GameError),
}

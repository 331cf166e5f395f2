//! Error types for match-core

use crate::session::SessionState;
use thiserror::Error;

/// Main error type for the session registry
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Owner already has an active session")]
    OwnerExists,

    #[error("Session id already in use")]
    SessionExists,

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Secret does not match")]
    SecretMismatch,

    #[error("No matching sessions")]
    NoResults,

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: SessionState,
        to: SessionState,
    },

    #[error("Used slots {used} exceed capacity {total}")]
    SlotsExceeded { used: u32, total: u32 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for match-core
pub type Result<T> = std::result::Result<T, Error>;

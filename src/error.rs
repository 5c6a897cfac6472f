//! Error types for the roster store and roll engine.

use thiserror::Error;

/// Main error type for roster storage operations.
///
/// These never cross the public boundary of [`crate::RosterStore`]'s
/// roster operations; they surface only from initialization, the
/// import/export adapters and settings loading.
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Corruption detected: {0}")]
    Corruption(String),

    #[error("Checksum mismatch: expected {expected}, got {got}")]
    ChecksumMismatch { expected: u32, got: u32 },

    #[error("Roster store is locked by another process")]
    Locked,

    #[error("Roster store not initialized")]
    NotInitialized,

    #[error("Invalid store format: {0}")]
    InvalidFormat(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Roster is empty")]
    EmptyRoster,
}

impl From<serde_json::Error> for RosterError {
    fn from(e: serde_json::Error) -> Self {
        RosterError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::encode::Error> for RosterError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        RosterError::Serialization(e.to_string())
    }
}

/// Result type for roster storage operations.
pub type Result<T> = std::result::Result<T, RosterError>;

/// Reasons the roll engine refuses a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RollError {
    #[error("Cannot start a roll: the roster is empty")]
    EmptyRoster,

    #[error("Invalid roll configuration: {0}")]
    InvalidConfig(String),
}

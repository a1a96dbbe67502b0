//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`], the crate-wide [Result] alias and
//! [`SpawnError`], the per-item failure reported by an
//! [`crate::factory::EntityFactory`]. Variants cover invalid configuration, a
//! missing entity factory, re-entrant session starts, and regeneration without a
//! previous session. Running out of candidates is not an error; it is reported
//! through [`crate::session::SessionReport`].
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("entity factory is not ready to create obstacles")]
    FactoryUnavailable,

    #[error("a generation session is already running")]
    AlreadyGenerating,

    #[error("no previous session to regenerate")]
    NoPreviousSession,
}

/// Failure to create a single entity. The scheduler skips the candidate and continues.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to create entity: {message}")]
pub struct SpawnError {
    pub message: String,
}

impl SpawnError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

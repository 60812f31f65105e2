//! Error types for match setup and driver misuse
//!
//! The physics pipeline itself has no recoverable errors; everything here is
//! either a rejected configuration or a driver calling into a match in the
//! wrong phase.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatchError {
    /// A setting is outside its allowed range. Raised before a match starts.
    #[error("invalid setting `{field}`: {reason}")]
    Configuration { field: &'static str, reason: String },
    /// The driver asked for something the match cannot do in its current phase.
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl MatchError {
    pub(crate) fn config(field: &'static str, reason: impl Into<String>) -> Self {
        MatchError::Configuration {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_state(msg: impl Into<String>) -> Self {
        MatchError::InvalidState(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, MatchError>;

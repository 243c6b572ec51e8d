//! Error types for the gamepad tracker and its backends

use thiserror::Error;

/// Errors reported by a platform input backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend library could not be loaded or initialized
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The backend refused a command for a slot
    #[error("slot {slot} rejected command: {reason}")]
    Rejected { slot: usize, reason: String },
}

/// Errors returned by tracker operations that mutate state
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("invalid slot index {index} (valid range is 0..{max})", max = super::MAX_DEVICES)]
    InvalidSlot { index: usize },

    #[error("gamepad slot {slot} is not connected")]
    NotConnected { slot: usize },

    #[error(transparent)]
    Backend(#[from] BackendError),
}

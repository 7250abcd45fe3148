//! Centralized error types for the Warden workspace.
//!
//! A missing whitelist file and an event without a resolvable actor are not
//! errors: the first yields an empty store, the second is evaluated as an
//! unknown actor.

use thiserror::Error;

/// Top-level error enum. Variants map to subsystems.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WardenError {
    /// Whitelist file exists but is not a JSON object.
    #[error("Corrupt whitelist: {0}")]
    ConfigCorrupt(String),

    /// Whitelist file exists but could not be read.
    #[error("Unreadable whitelist: {0}")]
    ConfigUnreadable(String),

    #[error("Persist error: {0}")]
    Persist(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Handler error: {0}")]
    Handler(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl WardenError {
    /// Load-time failures must abort startup instead of falling back to a
    /// default allow-list.
    pub fn is_fatal_at_startup(&self) -> bool {
        matches!(
            self,
            WardenError::ConfigCorrupt(_) | WardenError::ConfigUnreadable(_)
        )
    }
}

pub type WardenResult<T> = Result<T, WardenError>;

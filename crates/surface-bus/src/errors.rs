//! Error types for bus operations.

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum BusError {
    /// The receiving context no longer exists (navigated away, unloaded).
    /// Callers decide whether to retry or abandon.
    #[error("delivery failed: context {target} is gone")]
    Delivery { target: String },

    /// Envelope could not be serialized across the isolation boundary.
    #[error("envelope serialization failed: {0}")]
    Serialize(String),

    /// An endpoint with the same handler name is already registered.
    #[error("handler '{0}' already registered on this context")]
    AlreadyRegistered(String),
}

impl BusError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, BusError::Delivery { .. })
    }
}

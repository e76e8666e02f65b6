//! Error types for action execution.
//!
//! A missing element or parameter is never an error here; these cover
//! genuine failures that must be reported back over the bus.

use element_resolver::DomError;
use surface_bus::BusError;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ExecError {
    /// DOM mutation failed mid-action.
    #[error("dom failure: {0}")]
    Dom(#[from] DomError),

    /// Controller-bound dispatch failed.
    #[error("bus failure: {0}")]
    Bus(#[from] BusError),

    /// A composed URL was not valid.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl ExecError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExecError::Bus(err) if err.is_retryable())
    }
}

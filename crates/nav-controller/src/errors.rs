//! Controller error taxonomy.

use surface_bus::BusError;
use thiserror::Error;

use crate::host::HostError;

#[derive(Debug, Error, Clone)]
pub enum ControllerError {
    #[error("host failure: {0}")]
    Host(#[from] HostError),

    #[error("bus failure: {0}")]
    Bus(#[from] BusError),

    #[error("navigation did not complete: {0}")]
    LoadTimeout(String),
}

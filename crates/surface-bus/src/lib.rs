//! Message bus between the privileged controller context and per-page
//! executor contexts.
//!
//! The two context kinds share no memory: every envelope is serialized on
//! send and re-materialized on delivery, so nothing that crosses the bus
//! can alias sender state. Contexts can disappear at any time (a page
//! navigation tears its executor down); delivery to a missing context is a
//! retryable [`BusError::Delivery`], never a panic.

mod bus;
mod envelope;
mod errors;

pub use bus::*;
pub use envelope::*;
pub use errors::*;

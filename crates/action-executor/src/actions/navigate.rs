//! Controller-mediated page changes.
//!
//! The executor never mutates the location itself; routing every change
//! through the controller keeps its state machine authoritative.

use surface_bus::Envelope;
use tracing::debug;
use voicepilot_core_types::{HistoryDirection, ParameterSet};

use crate::errors::ExecError;
use crate::instance::ExecutorInstance;

pub(crate) async fn navigate(
    exec: &ExecutorInstance,
    params: &ParameterSet,
) -> Result<(), ExecError> {
    let Some(url) = params.url.as_deref() else {
        // Absent parameter: no-op, and nothing is in flight.
        exec.clear_navigation();
        return Ok(());
    };

    debug!(target: "action-executor", url, "requesting navigation");
    exec.request_navigation(Envelope::NavigateTab {
        url: url.to_string(),
    })
    .await?;
    exec.clear_navigation();
    Ok(())
}

pub(crate) async fn history_back(exec: &ExecutorInstance) -> Result<(), ExecError> {
    history(exec, HistoryDirection::Back).await
}

pub(crate) async fn history_forward(exec: &ExecutorInstance) -> Result<(), ExecError> {
    history(exec, HistoryDirection::Forward).await
}

async fn history(exec: &ExecutorInstance, direction: HistoryDirection) -> Result<(), ExecError> {
    exec.request_navigation(Envelope::NavigateHistory { direction })
        .await?;
    exec.clear_navigation();
    Ok(())
}

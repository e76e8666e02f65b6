//! Viewport displacement.

use voicepilot_core_types::{Direction, ParameterSet};

use crate::errors::ExecError;
use crate::instance::ExecutorInstance;

pub(crate) async fn scroll(
    exec: &ExecutorInstance,
    params: &ParameterSet,
) -> Result<(), ExecError> {
    let direction = params.direction.unwrap_or(Direction::Down);
    let amount = exec.dom().viewport_height().await * exec.cfg().scroll_fraction;
    let dy = match direction {
        Direction::Down => amount,
        Direction::Up => -amount,
    };
    exec.dom().scroll_by(0.0, dy).await?;
    Ok(())
}

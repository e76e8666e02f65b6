//! Programmatic text entry with synthetic input events.

use element_resolver::{SelectorChain, SyntheticEvent};
use tracing::debug;
use voicepilot_core_types::ParameterSet;

use crate::errors::ExecError;
use crate::instance::ExecutorInstance;

pub(crate) async fn type_text(
    exec: &ExecutorInstance,
    params: &ParameterSet,
) -> Result<(), ExecError> {
    let Some(text) = params.text.as_deref() else {
        return Ok(());
    };

    let chain = params
        .selector
        .as_deref()
        .map(SelectorChain::single)
        .unwrap_or_else(SelectorChain::typeables);

    let Some(matched) = exec
        .resolver()
        .resolve_chain(exec.dom(), &chain, exec.wait_timeout())
        .await
    else {
        debug!(target: "action-executor", "no input target; skipping type");
        return Ok(());
    };

    let target = matched.elements[0].handle;
    exec.dom().focus(target).await?;
    exec.dom().set_value(target, text).await?;
    // Frameworks that mirror input state listen for this.
    exec.dom().dispatch(target, SyntheticEvent::Input).await?;
    Ok(())
}

//! In-page search driving, with a results-page navigation fallback.

use element_resolver::SyntheticEvent;
use surface_bus::Envelope;
use tracing::debug;
use voicepilot_core_types::{urls, ParameterSet};

use crate::errors::ExecError;
use crate::instance::ExecutorInstance;

pub(crate) async fn search(
    exec: &ExecutorInstance,
    params: &ParameterSet,
) -> Result<(), ExecError> {
    let Some(query) = params.query.as_deref() else {
        exec.clear_navigation();
        return Ok(());
    };

    let chain = exec.cfg().search_inputs.clone();
    match exec
        .resolver()
        .resolve_chain(exec.dom(), &chain, exec.wait_timeout())
        .await
    {
        Some(matched) => {
            let input = matched.elements[0].handle;
            exec.dom().focus(input).await?;
            exec.dom().set_value(input, query).await?;
            exec.dom().dispatch(input, SyntheticEvent::Input).await?;
            exec.dom().dispatch(input, SyntheticEvent::Change).await?;
            if !exec.dom().submit_form(input).await? {
                exec.dom()
                    .dispatch(input, SyntheticEvent::EnterKeydown)
                    .await?;
            }
            // The submit reloads the page; the navigation flag rides out
            // the rest of this context's life.
            debug!(target: "action-executor", strategy = %matched.strategy, "search submitted");
            Ok(())
        }
        None => {
            // No search input on this page: fall back to a search-engine
            // results navigation.
            debug!(target: "action-executor", "no search input; falling back to results page");
            exec.request_navigation(Envelope::NavigateTab {
                url: urls::google_search_url(query),
            })
            .await?;
            exec.clear_navigation();
            Ok(())
        }
    }
}

pub(crate) async fn site_search(
    exec: &ExecutorInstance,
    params: &ParameterSet,
) -> Result<(), ExecError> {
    let Some(query) = params.query.as_deref() else {
        exec.clear_navigation();
        return Ok(());
    };

    exec.request_navigation(Envelope::NavigateTab {
        url: urls::google_search_url(query),
    })
    .await?;
    exec.clear_navigation();
    Ok(())
}

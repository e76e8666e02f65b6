//! Media search-and-play: either a two-step navigation via the
//! controller, or driving the site's own search box when already there.

use std::time::Duration;

use element_resolver::SyntheticEvent;
use surface_bus::Envelope;
use tracing::debug;
use voicepilot_core_types::{urls, ActionKind, ParameterSet};

use crate::actions::click::on_media_site;
use crate::errors::ExecError;
use crate::instance::ExecutorInstance;

pub(crate) async fn play_media(
    exec: &ExecutorInstance,
    params: &ParameterSet,
) -> Result<(), ExecError> {
    let Some(query) = params.query.as_deref() else {
        exec.clear_navigation();
        return Ok(());
    };

    if !on_media_site(exec).await {
        // Leave the page first; the controller re-delivers this command
        // once the results page has an executor again.
        let results = urls::media_results_url(&exec.cfg().media_site.results_base, query);
        debug!(target: "action-executor", url = %results, "leaving for media results");
        exec.request_navigation(Envelope::NavigateAndThen {
            url: results,
            next_command: Box::new(Envelope::execute(
                ActionKind::PlayMedia,
                ParameterSet::with_query(query),
            )),
        })
        .await?;
        exec.clear_navigation();
        return Ok(());
    }

    drive_site_search(exec, query).await
}

/// On the media site: fill the search box, submit, settle, then
/// auto-select the first visible result.
async fn drive_site_search(exec: &ExecutorInstance, query: &str) -> Result<(), ExecError> {
    let cfg = exec.cfg().media_site.clone();

    let Some(search_box) = exec
        .resolver()
        .resolve_chain(exec.dom(), &cfg.search_box, exec.wait_timeout())
        .await
    else {
        // Even the search box is missing; a results navigation still
        // gets the user where they asked to go.
        debug!(target: "action-executor", "media search box missing; navigating to results");
        exec.request_navigation(Envelope::NavigateTab {
            url: urls::media_results_url(&cfg.results_base, query),
        })
        .await?;
        exec.clear_navigation();
        return Ok(());
    };

    let input = search_box.elements[0].handle;
    exec.dom().focus(input).await?;
    exec.dom().set_value(input, query).await?;
    exec.dom().dispatch(input, SyntheticEvent::Input).await?;

    match exec
        .resolver()
        .resolve_chain(exec.dom(), &cfg.search_button, exec.wait_timeout())
        .await
    {
        Some(button) => exec.dom().click(button.elements[0].handle).await?,
        None => {
            exec.dom()
                .dispatch(input, SyntheticEvent::EnterKeydown)
                .await?
        }
    }

    // Results render asynchronously; give them a moment before picking
    // the first one.
    tokio::time::sleep(Duration::from_millis(exec.cfg().media_result_settle_ms)).await;

    if let Some(results) = exec
        .resolver()
        .resolve_chain(exec.dom(), &cfg.result_links, exec.wait_timeout())
        .await
    {
        let first = results.elements[0].handle;
        exec.dom().scroll_into_center(first).await?;
        exec.dom().click(first).await?;
        debug!(target: "action-executor", strategy = %results.strategy, "first media result selected");
    }

    Ok(())
}

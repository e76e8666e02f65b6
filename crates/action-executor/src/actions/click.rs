//! Click with fallback chains, ordinal selection, and the
//! scroll-then-click protocol.

use std::time::Duration;

use element_resolver::{ElementResolver, SelectorChain};
use tracing::debug;
use voicepilot_core_types::ParameterSet;

use crate::errors::ExecError;
use crate::instance::ExecutorInstance;

pub(crate) async fn click(
    exec: &ExecutorInstance,
    params: &ParameterSet,
) -> Result<(), ExecError> {
    let chain = click_chain(exec, params).await;

    let Some(matched) = exec
        .resolver()
        .resolve_chain(exec.dom(), &chain, exec.wait_timeout())
        .await
    else {
        debug!(target: "action-executor", "no clickable match; skipping");
        return Ok(());
    };

    let Some(snapshot) = ElementResolver::select_ordinal(&matched.elements, params.index) else {
        debug!(
            target: "action-executor",
            index = ?params.index,
            matches = matched.elements.len(),
            "ordinal outside visible matches; skipping"
        );
        return Ok(());
    };

    // Some hosts ignore clicks on elements outside the visible viewport:
    // center the target first and give layout a beat to settle.
    exec.dom().scroll_into_center(snapshot.handle).await?;
    tokio::time::sleep(Duration::from_millis(exec.cfg().click_settle_ms)).await;
    exec.dom().click(snapshot.handle).await?;

    debug!(
        target: "action-executor",
        strategy = %matched.strategy,
        "clicked"
    );
    Ok(())
}

/// Explicit selector wins; otherwise the media-site result chain on the
/// media site, then the generic clickables.
async fn click_chain(exec: &ExecutorInstance, params: &ParameterSet) -> SelectorChain {
    if let Some(selector) = params.selector.as_deref() {
        return SelectorChain::single(selector);
    }

    let mut strategies = Vec::new();
    if on_media_site(exec).await {
        strategies.extend(exec.cfg().media_site.result_links.strategies.clone());
    }
    strategies.extend(SelectorChain::clickables().strategies);
    SelectorChain::new(strategies)
}

pub(crate) async fn on_media_site(exec: &ExecutorInstance) -> bool {
    let current = exec.dom().current_url().await;
    url::Url::parse(&current)
        .ok()
        .and_then(|url| url.host_str().map(|host| host.to_string()))
        .map(|host| host.contains(&exec.cfg().media_site.host_fragment))
        .unwrap_or(false)
}

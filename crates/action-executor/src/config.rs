//! Tunables for the executor, including the media-site selector chains
//! kept as ordered configuration data.

use element_resolver::{SelectorChain, SelectorStrategy};
use serde::{Deserialize, Serialize};

/// Site-specific configuration for the search-and-play flow.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MediaSiteConfig {
    /// Hostname fragment identifying the media site.
    pub host_fragment: String,
    /// Results URL base; the percent-encoded query is appended.
    pub results_base: String,
    /// In-page search box, most specific first.
    pub search_box: SelectorChain,
    /// Search submit button; falling back to a synthesized Enter.
    pub search_button: SelectorChain,
    /// Result links on a results page, most specific first.
    pub result_links: SelectorChain,
}

impl Default for MediaSiteConfig {
    fn default() -> Self {
        Self {
            host_fragment: "youtube.com".to_string(),
            results_base: "https://www.youtube.com/results?search_query=".to_string(),
            search_box: SelectorChain::new(vec![
                SelectorStrategy::new("id-search-input", "input#search"),
                SelectorStrategy::new("id-search", "#search"),
            ]),
            search_button: SelectorChain::new(vec![
                SelectorStrategy::new("legacy-icon", "#search-icon-legacy"),
                SelectorStrategy::new("aria-search", r#"button[aria-label*="Search"]"#),
            ]),
            result_links: SelectorChain::new(vec![
                SelectorStrategy::new("video-title", "a#video-title"),
                SelectorStrategy::new("renderer-link", ".ytd-video-renderer a"),
            ]),
        }
    }
}

/// Executor tunables. The delays are empirically tuned, not derived from
/// any documented contract.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Budget for element resolution before giving up on a strategy
    /// chain.
    pub wait_timeout_ms: u64,
    /// Settle after scrolling a click target into view.
    pub click_settle_ms: u64,
    /// Settle before auto-selecting the first media result.
    pub media_result_settle_ms: u64,
    /// Viewport fraction displaced per scroll command.
    pub scroll_fraction: f64,
    pub media_site: MediaSiteConfig,
    pub search_inputs: SelectorChain,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            wait_timeout_ms: 5_000,
            click_settle_ms: 100,
            media_result_settle_ms: 2_000,
            scroll_fraction: 0.8,
            media_site: MediaSiteConfig::default(),
            search_inputs: SelectorChain::search_inputs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_media_site_targets_youtube() {
        let cfg = MediaSiteConfig::default();
        assert_eq!(cfg.host_fragment, "youtube.com");
        assert_eq!(cfg.result_links.strategies[0].selector, "a#video-title");
    }

    #[test]
    fn executor_defaults_match_tuned_constants() {
        let cfg = ExecutorConfig::default();
        assert_eq!(cfg.media_result_settle_ms, 2_000);
        assert_eq!(cfg.scroll_fraction, 0.8);
    }
}

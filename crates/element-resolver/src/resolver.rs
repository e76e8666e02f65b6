//! Polling resolver with visibility filtering and ordinal selection.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::dom::{DomSurface, ElementSnapshot, ElementStyle};
use crate::strategies::SelectorChain;

/// Result of a successful chain resolution.
#[derive(Clone, Debug)]
pub struct ChainMatch {
    /// Name of the strategy that produced the matches.
    pub strategy: String,
    /// Visible matches in document order.
    pub elements: Vec<ElementSnapshot>,
}

/// Element resolver shared by all action handlers of a page context.
#[derive(Clone, Debug)]
pub struct ElementResolver {
    /// Fixed polling interval for wait loops.
    pub poll_interval: Duration,
}

impl Default for ElementResolver {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl ElementResolver {
    /// Poll until at least one match for `selector` exists.
    ///
    /// `None` on timeout is not an error; callers try their next
    /// strategy.
    pub async fn wait_for(
        &self,
        dom: &dyn DomSurface,
        selector: &str,
        timeout: Duration,
    ) -> Option<Vec<ElementSnapshot>> {
        let deadline = Instant::now() + timeout;
        loop {
            let matches = dom.query_all(selector).await;
            if !matches.is_empty() {
                return Some(matches);
            }
            if Instant::now() >= deadline {
                debug!(target: "element-resolver", selector, "wait_for timed out");
                return None;
            }
            sleep(self.poll_interval).await;
        }
    }

    /// Try the chain's strategies in priority order, repeatedly until the
    /// timeout. The first strategy yielding >= 1 visible match wins and
    /// short-circuits the rest.
    pub async fn resolve_chain(
        &self,
        dom: &dyn DomSurface,
        chain: &SelectorChain,
        timeout: Duration,
    ) -> Option<ChainMatch> {
        let deadline = Instant::now() + timeout;
        loop {
            for strategy in &chain.strategies {
                let visible = visible_only(dom.query_all(&strategy.selector).await);
                if !visible.is_empty() {
                    debug!(
                        target: "element-resolver",
                        strategy = %strategy.name,
                        matches = visible.len(),
                        "chain resolved"
                    );
                    return Some(ChainMatch {
                        strategy: strategy.name.clone(),
                        elements: visible,
                    });
                }
            }
            if Instant::now() >= deadline {
                debug!(target: "element-resolver", "chain exhausted within timeout");
                return None;
            }
            sleep(self.poll_interval).await;
        }
    }

    /// Pick the ordinal match: `index` is 1-based from the command layer
    /// and converted here; out of range yields no match, not a fault. No
    /// index means the first match.
    pub fn select_ordinal(
        matches: &[ElementSnapshot],
        index: Option<u32>,
    ) -> Option<&ElementSnapshot> {
        match index {
            None => matches.first(),
            Some(0) => None,
            Some(ordinal) => matches.get(ordinal as usize - 1),
        }
    }
}

/// Visibility predicate: computed style must not hide the element and it
/// must participate in layout (non-null offset parent).
pub fn is_visible(style: &ElementStyle) -> bool {
    style.display != "none"
        && style.visibility != "hidden"
        && style.opacity > 0.0
        && style.has_offset_parent
}

/// Keep only visible matches, preserving document order.
pub fn visible_only(matches: Vec<ElementSnapshot>) -> Vec<ElementSnapshot> {
    matches
        .into_iter()
        .filter(|snapshot| is_visible(&snapshot.style))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{DomError, ElementHandle, SyntheticEvent};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Fake document: selector -> snapshots, appearing after N queries.
    #[derive(Default)]
    struct FakeDom {
        matches: Mutex<HashMap<String, Vec<ElementSnapshot>>>,
        appear_after: Mutex<HashMap<String, usize>>,
        queries: Mutex<usize>,
    }

    impl FakeDom {
        fn insert(&self, selector: &str, snapshots: Vec<ElementSnapshot>) {
            self.matches.lock().insert(selector.to_string(), snapshots);
        }

        fn appear_after(&self, selector: &str, queries: usize) {
            self.appear_after
                .lock()
                .insert(selector.to_string(), queries);
        }
    }

    #[async_trait]
    impl DomSurface for FakeDom {
        async fn query_all(&self, selector: &str) -> Vec<ElementSnapshot> {
            *self.queries.lock() += 1;
            let seen = *self.queries.lock();
            if let Some(threshold) = self.appear_after.lock().get(selector) {
                if seen <= *threshold {
                    return Vec::new();
                }
            }
            self.matches
                .lock()
                .get(selector)
                .cloned()
                .unwrap_or_default()
        }

        async fn click(&self, _element: ElementHandle) -> Result<(), DomError> {
            Ok(())
        }

        async fn scroll_into_center(&self, _element: ElementHandle) -> Result<(), DomError> {
            Ok(())
        }

        async fn scroll_by(&self, _dx: f64, _dy: f64) -> Result<(), DomError> {
            Ok(())
        }

        async fn viewport_height(&self) -> f64 {
            800.0
        }

        async fn focus(&self, _element: ElementHandle) -> Result<(), DomError> {
            Ok(())
        }

        async fn set_value(&self, _element: ElementHandle, _value: &str) -> Result<(), DomError> {
            Ok(())
        }

        async fn dispatch(
            &self,
            _element: ElementHandle,
            _event: SyntheticEvent,
        ) -> Result<(), DomError> {
            Ok(())
        }

        async fn submit_form(&self, _element: ElementHandle) -> Result<bool, DomError> {
            Ok(false)
        }

        async fn current_url(&self) -> String {
            "https://example.com/".to_string()
        }
    }

    fn snapshot(id: u64, style: ElementStyle) -> ElementSnapshot {
        ElementSnapshot {
            handle: ElementHandle(id),
            style,
        }
    }

    fn quick() -> ElementResolver {
        ElementResolver {
            poll_interval: Duration::from_millis(5),
        }
    }

    #[tokio::test]
    async fn wait_for_returns_matches_that_appear_late() {
        let dom = Arc::new(FakeDom::default());
        dom.insert("a", vec![snapshot(1, ElementStyle::default())]);
        dom.appear_after("a", 2);

        let found = quick()
            .wait_for(dom.as_ref(), "a", Duration::from_millis(500))
            .await;
        assert_eq!(found.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn wait_for_times_out_to_none() {
        let dom = FakeDom::default();
        let found = quick()
            .wait_for(&dom, ".missing", Duration::from_millis(30))
            .await;
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn chain_short_circuits_on_first_visible_strategy() {
        let dom = FakeDom::default();
        dom.insert("#primary", vec![snapshot(1, ElementStyle::hidden())]);
        dom.insert(".fallback", vec![snapshot(2, ElementStyle::default())]);

        let chain = SelectorChain::new(vec![
            crate::SelectorStrategy::new("primary", "#primary"),
            crate::SelectorStrategy::new("fallback", ".fallback"),
        ]);

        let resolved = quick()
            .resolve_chain(&dom, &chain, Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(resolved.strategy, "fallback");
        assert_eq!(resolved.elements[0].handle, ElementHandle(2));
    }

    #[tokio::test]
    async fn chain_with_no_visible_matches_is_none() {
        let dom = FakeDom::default();
        dom.insert("#primary", vec![snapshot(1, ElementStyle::hidden())]);
        let chain = SelectorChain::single("#primary");
        let resolved = quick()
            .resolve_chain(&dom, &chain, Duration::from_millis(30))
            .await;
        assert!(resolved.is_none());
    }

    #[test]
    fn ordinal_selection_is_one_based() {
        let matches = vec![
            snapshot(10, ElementStyle::default()),
            snapshot(11, ElementStyle::default()),
            snapshot(12, ElementStyle::default()),
        ];
        let third = ElementResolver::select_ordinal(&matches, Some(3)).unwrap();
        assert_eq!(third.handle, ElementHandle(12));
        assert_eq!(
            ElementResolver::select_ordinal(&matches, None).unwrap().handle,
            ElementHandle(10)
        );
    }

    #[test]
    fn out_of_range_ordinal_is_no_match() {
        let matches = vec![snapshot(10, ElementStyle::default())];
        assert!(ElementResolver::select_ordinal(&matches, Some(4)).is_none());
        assert!(ElementResolver::select_ordinal(&matches, Some(0)).is_none());
        assert!(ElementResolver::select_ordinal(&[], Some(1)).is_none());
    }

    #[test]
    fn visibility_predicate_covers_all_hiding_styles() {
        assert!(is_visible(&ElementStyle::default()));
        assert!(!is_visible(&ElementStyle::hidden()));
        assert!(!is_visible(&ElementStyle {
            visibility: "hidden".into(),
            ..Default::default()
        }));
        assert!(!is_visible(&ElementStyle {
            opacity: 0.0,
            ..Default::default()
        }));
        assert!(!is_visible(&ElementStyle {
            has_offset_parent: false,
            ..Default::default()
        }));
    }
}

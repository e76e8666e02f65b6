//! Selector strategy chains as ordered configuration data.
//!
//! Keeping the chains as data (rather than inline conditionals) lets each
//! strategy be tested on its own and tuned per site without touching the
//! resolver.

use serde::{Deserialize, Serialize};

/// One named selector tried against the document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SelectorStrategy {
    pub name: String,
    pub selector: String,
}

impl SelectorStrategy {
    pub fn new(name: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selector: selector.into(),
        }
    }
}

/// An ordered list of strategies, most structurally specific first. The
/// first strategy yielding at least one visible match wins.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SelectorChain {
    pub strategies: Vec<SelectorStrategy>,
}

impl SelectorChain {
    pub fn new(strategies: Vec<SelectorStrategy>) -> Self {
        Self { strategies }
    }

    /// A single ad-hoc selector wrapped as a one-strategy chain.
    pub fn single(selector: impl Into<String>) -> Self {
        Self {
            strategies: vec![SelectorStrategy::new("explicit", selector)],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Prioritized attribute-based lookup for in-page search inputs.
    pub fn search_inputs() -> Self {
        Self::new(vec![
            SelectorStrategy::new("type-search", r#"input[type="search"]"#),
            SelectorStrategy::new("name-search", r#"input[name*="search"]"#),
            SelectorStrategy::new("placeholder-search", r#"input[placeholder*="search" i]"#),
            SelectorStrategy::new("id-search", "#search"),
            SelectorStrategy::new("class-search", ".search-input"),
        ])
    }

    /// Default clickable targets when the command carries no selector.
    pub fn clickables() -> Self {
        Self::single(r#"a, button, [role="button"]"#)
    }

    /// Generic typing targets when the command carries no selector.
    pub fn typeables() -> Self {
        Self::single("input, textarea")
    }
}

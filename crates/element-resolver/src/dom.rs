//! Abstraction over the live document of one page context.
//!
//! The resolver and the action handlers only ever touch the page through
//! this trait; the page itself supplies the implementation (and tests
//! supply fakes).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque handle to a DOM node, valid only within its page context.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ElementHandle(pub u64);

/// Computed-style facts needed for the visibility filter, captured at
/// query time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ElementStyle {
    pub display: String,
    pub visibility: String,
    pub opacity: f64,
    pub has_offset_parent: bool,
}

impl Default for ElementStyle {
    fn default() -> Self {
        Self {
            display: "block".to_string(),
            visibility: "visible".to_string(),
            opacity: 1.0,
            has_offset_parent: true,
        }
    }
}

impl ElementStyle {
    pub fn hidden() -> Self {
        Self {
            display: "none".to_string(),
            ..Default::default()
        }
    }
}

/// One query match: the handle plus the style snapshot taken with it.
#[derive(Clone, Debug)]
pub struct ElementSnapshot {
    pub handle: ElementHandle,
    pub style: ElementStyle,
}

/// Synthetic event kinds dispatched after programmatic value changes, for
/// frameworks that listen for them.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SyntheticEvent {
    Input,
    Change,
    EnterKeydown,
}

#[derive(Debug, Error, Clone)]
pub enum DomError {
    /// The node disappeared between resolution and use.
    #[error("element is gone: {0}")]
    NodeGone(String),

    #[error("dom operation failed: {0}")]
    Io(String),
}

/// The live-document surface of one page context.
#[async_trait]
pub trait DomSurface: Send + Sync {
    /// All current matches for a CSS selector, in document order.
    async fn query_all(&self, selector: &str) -> Vec<ElementSnapshot>;

    async fn click(&self, element: ElementHandle) -> Result<(), DomError>;

    /// Scroll the element to the viewport center before interacting;
    /// some hosts ignore clicks outside the visible viewport.
    async fn scroll_into_center(&self, element: ElementHandle) -> Result<(), DomError>;

    /// Displace the viewport by the given deltas.
    async fn scroll_by(&self, dx: f64, dy: f64) -> Result<(), DomError>;

    async fn viewport_height(&self) -> f64;

    async fn focus(&self, element: ElementHandle) -> Result<(), DomError>;

    async fn set_value(&self, element: ElementHandle, value: &str) -> Result<(), DomError>;

    async fn dispatch(&self, element: ElementHandle, event: SyntheticEvent)
        -> Result<(), DomError>;

    /// Submit the element's enclosing form; `Ok(false)` when it has none.
    async fn submit_form(&self, element: ElementHandle) -> Result<bool, DomError>;

    /// Current location of the page this surface belongs to.
    async fn current_url(&self) -> String;
}

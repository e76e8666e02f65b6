//! Shared types for the Voicepilot command pipeline.
//!
//! Everything that crosses a crate boundary lives here: the structured
//! command produced by the intent collaborator, the closed action
//! vocabulary, and the identifiers for target surfaces and frames.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod urls;

/// Unique identifier for a target surface (page/tab).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SurfaceId(pub Uuid);

impl SurfaceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SurfaceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a frame within a surface.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct FrameId(pub Uuid);

impl FrameId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FrameId {
    fn default() -> Self {
        Self::new()
    }
}

/// Closed action vocabulary shared with the intent collaborator.
///
/// Unknown strings deserialize to `None` rather than failing, so a
/// collaborator that invents an action degrades to a no-op instead of an
/// error.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Navigate,
    Search,
    Click,
    Scroll,
    Type,
    PlayMedia,
    SiteSearch,
    GoBack,
    GoForward,
    None,
}

impl<'de> Deserialize<'de> for ActionKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(ActionKind::from_wire(&raw))
    }
}

impl ActionKind {
    /// Wire-name lookup; anything outside the closed vocabulary is a
    /// no-op command, never an error.
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "navigate" => ActionKind::Navigate,
            "search" => ActionKind::Search,
            "click" => ActionKind::Click,
            "scroll" => ActionKind::Scroll,
            "type" => ActionKind::Type,
            "play_media" => ActionKind::PlayMedia,
            "site_search" => ActionKind::SiteSearch,
            "go_back" => ActionKind::GoBack,
            "go_forward" => ActionKind::GoForward,
            _ => ActionKind::None,
        }
    }

    /// Actions that leave the current page and therefore destroy the
    /// executor context before their await resolves.
    pub fn is_navigation_class(&self) -> bool {
        matches!(
            self,
            ActionKind::Navigate
                | ActionKind::Search
                | ActionKind::SiteSearch
                | ActionKind::PlayMedia
                | ActionKind::GoBack
                | ActionKind::GoForward
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Navigate => "navigate",
            ActionKind::Search => "search",
            ActionKind::Click => "click",
            ActionKind::Scroll => "scroll",
            ActionKind::Type => "type",
            ActionKind::PlayMedia => "play_media",
            ActionKind::SiteSearch => "site_search",
            ActionKind::GoBack => "go_back",
            ActionKind::GoForward => "go_forward",
            ActionKind::None => "none",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scroll direction parameter.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// History traversal direction for `navigateHistory` envelopes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryDirection {
    Back,
    Forward,
}

/// Sparse parameter record attached to a command.
///
/// Absence of a parameter is always a no-op for the handler that would
/// have consumed it, never an error.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    /// 1-based ordinal ("the third video"); converted to 0-based at the
    /// resolver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
}

impl ParameterSet {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn with_query(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Default::default()
        }
    }
}

/// A structured command produced once per utterance by the intent
/// collaborator and consumed once by the dispatcher.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub action: ActionKind,
    #[serde(default)]
    pub parameters: ParameterSet,
    /// Short user-facing confirmation carried alongside the action.
    #[serde(default)]
    pub response: String,
}

impl Command {
    pub fn new(action: ActionKind, parameters: ParameterSet, response: impl Into<String>) -> Self {
        Self {
            action,
            parameters,
            response: response.into(),
        }
    }

    /// Sentinel command carrying only a spoken/displayed message.
    pub fn sentinel(response: impl Into<String>) -> Self {
        Self {
            action: ActionKind::None,
            parameters: ParameterSet::default(),
            response: response.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_kind_wire_names_round_trip() {
        let json = serde_json::to_string(&ActionKind::PlayMedia).unwrap();
        assert_eq!(json, "\"play_media\"");
        let parsed: ActionKind = serde_json::from_str("\"go_back\"").unwrap();
        assert_eq!(parsed, ActionKind::GoBack);
    }

    #[test]
    fn unknown_action_degrades_to_none() {
        let parsed: ActionKind = serde_json::from_str("\"dance\"").unwrap();
        assert_eq!(parsed, ActionKind::None);
    }

    #[test]
    fn navigation_class_membership() {
        assert!(ActionKind::Navigate.is_navigation_class());
        assert!(ActionKind::PlayMedia.is_navigation_class());
        assert!(ActionKind::GoBack.is_navigation_class());
        assert!(!ActionKind::Click.is_navigation_class());
        assert!(!ActionKind::Scroll.is_navigation_class());
        assert!(!ActionKind::None.is_navigation_class());
    }

    #[test]
    fn sparse_parameters_skip_absent_fields() {
        let params = ParameterSet::with_query("weather");
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json, serde_json::json!({ "query": "weather" }));
    }

    #[test]
    fn command_deserializes_without_parameters() {
        let cmd: Command =
            serde_json::from_str(r#"{"action":"scroll","response":"ok"}"#).unwrap();
        assert_eq!(cmd.action, ActionKind::Scroll);
        assert_eq!(cmd.parameters, ParameterSet::default());
    }
}

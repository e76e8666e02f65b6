//! Wire shapes shared by both contexts.
//!
//! The JSON layout is part of the interop contract and must not drift:
//! `action` is the discriminator, everything else is payload.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use voicepilot_core_types::{ActionKind, HistoryDirection, ParameterSet};

use crate::errors::BusError;

/// A message crossing the context boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Envelope {
    /// Liveness probe; the executor replies `{"status":"alive"}` without
    /// side effects.
    Ping,

    /// Execute a structured command in the receiving page context.
    #[serde(rename_all = "camelCase")]
    ExecuteCommand {
        command: ActionKind,
        #[serde(default)]
        parameters: ParameterSet,
    },

    /// Ask the controller to navigate the sender's surface.
    #[serde(rename_all = "camelCase")]
    NavigateTab { url: String },

    /// Ask the controller to traverse the sender surface's history.
    #[serde(rename_all = "camelCase")]
    NavigateHistory { direction: HistoryDirection },

    /// Ask the controller to navigate, then deliver `nextCommand` to the
    /// executor re-established in the new page. Acked immediately; the
    /// delivery happens asynchronously.
    #[serde(rename_all = "camelCase")]
    NavigateAndThen {
        url: String,
        next_command: Box<Envelope>,
    },
}

impl Envelope {
    pub fn execute(command: ActionKind, parameters: ParameterSet) -> Self {
        Envelope::ExecuteCommand {
            command,
            parameters,
        }
    }

    /// Serialized form used both as the wire frame and as the
    /// duplicate-suppression key.
    pub fn to_frame(&self) -> Result<String, BusError> {
        serde_json::to_string(self).map_err(|err| BusError::Serialize(err.to_string()))
    }

    pub fn from_frame(frame: &str) -> Result<Self, BusError> {
        serde_json::from_str(frame).map_err(|err| BusError::Serialize(err.to_string()))
    }
}

/// Reply constructors matching the interop wire shapes.
pub mod reply {
    use super::*;

    pub fn alive() -> Value {
        json!({ "status": "alive" })
    }

    pub fn skipped() -> Value {
        json!({ "status": "skipped" })
    }

    pub fn unknown_command() -> Value {
        json!({ "status": "unknown_command" })
    }

    pub fn success() -> Value {
        json!({ "success": true })
    }

    pub fn failure(error: impl std::fmt::Display) -> Value {
        json!({ "success": false, "error": error.to_string() })
    }
}

/// Reply inspection helpers for callers that branch on the outcome.
pub fn is_success(reply: &Value) -> bool {
    reply
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

pub fn status_of(reply: &Value) -> Option<&str> {
    reply.get("status").and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_wire_shape() {
        let frame = Envelope::Ping.to_frame().unwrap();
        assert_eq!(frame, r#"{"action":"ping"}"#);
    }

    #[test]
    fn execute_command_wire_shape() {
        let env = Envelope::execute(ActionKind::Scroll, ParameterSet::default());
        let value: Value = serde_json::from_str(&env.to_frame().unwrap()).unwrap();
        assert_eq!(value["action"], "executeCommand");
        assert_eq!(value["command"], "scroll");
    }

    #[test]
    fn navigate_and_then_nests_next_command() {
        let env = Envelope::NavigateAndThen {
            url: "https://example.com".into(),
            next_command: Box::new(Envelope::execute(
                ActionKind::Click,
                ParameterSet::default(),
            )),
        };
        let value: Value = serde_json::from_str(&env.to_frame().unwrap()).unwrap();
        assert_eq!(value["action"], "navigateAndThen");
        assert_eq!(value["nextCommand"]["action"], "executeCommand");

        let round = Envelope::from_frame(&env.to_frame().unwrap()).unwrap();
        assert_eq!(round, env);
    }

    #[test]
    fn history_direction_wire_names() {
        let env = Envelope::NavigateHistory {
            direction: HistoryDirection::Back,
        };
        let value: Value = serde_json::from_str(&env.to_frame().unwrap()).unwrap();
        assert_eq!(value["direction"], "back");
    }

    #[test]
    fn reply_shapes() {
        assert_eq!(status_of(&reply::alive()), Some("alive"));
        assert_eq!(status_of(&reply::skipped()), Some("skipped"));
        assert!(is_success(&reply::success()));
        let failure = reply::failure("boom");
        assert!(!is_success(&failure));
        assert_eq!(failure["error"], "boom");
    }
}

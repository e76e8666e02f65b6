//! Navigation state machine phases.

use std::fmt;

/// Phase of the per-surface navigation state machine. Every request
/// walks `Idle → Navigating → AwaitingLoad → Injecting → Delivering →
/// Idle`; failures at any step still return to `Idle` (surfaced, never
/// retried).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NavPhase {
    Idle,
    Navigating,
    AwaitingLoad,
    Injecting,
    Delivering,
}

impl NavPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            NavPhase::Idle => "idle",
            NavPhase::Navigating => "navigating",
            NavPhase::AwaitingLoad => "awaiting_load",
            NavPhase::Injecting => "injecting",
            NavPhase::Delivering => "delivering",
        }
    }
}

impl fmt::Display for NavPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Pending actions awaiting a navigation boundary.

use dashmap::DashMap;
use tracing::debug;
use voicepilot_core_types::{ActionKind, SurfaceId};

/// A follow-up queued until its surface signals readiness.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingAction {
    pub action: ActionKind,
    pub query: String,
}

/// Per-surface pending actions. Each entry lives across exactly one
/// navigation boundary: consumed by the first completion event for its
/// key, or replaced by the next write for the same key.
#[derive(Default)]
pub struct PendingActions {
    entries: DashMap<SurfaceId, PendingAction>,
}

impl PendingActions {
    pub fn insert(&self, surface: SurfaceId, pending: PendingAction) {
        if self.entries.insert(surface, pending).is_some() {
            // A stale entry for this surface never got consumed; the new
            // write supersedes it.
            debug!(target: "nav-controller", %surface, "stale pending action replaced");
        }
    }

    /// Consume the entry for this surface. At most one caller observes
    /// `Some` per insert.
    pub fn take(&self, surface: SurfaceId) -> Option<PendingAction> {
        self.entries.remove(&surface).map(|(_, pending)| pending)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_consumes_exactly_once() {
        let pending = PendingActions::default();
        let surface = SurfaceId::new();
        pending.insert(
            surface,
            PendingAction {
                action: ActionKind::PlayMedia,
                query: "lofi".into(),
            },
        );
        assert!(pending.take(surface).is_some());
        assert!(pending.take(surface).is_none());
    }

    #[test]
    fn rewrite_replaces_stale_entry() {
        let pending = PendingActions::default();
        let surface = SurfaceId::new();
        pending.insert(
            surface,
            PendingAction {
                action: ActionKind::PlayMedia,
                query: "first".into(),
            },
        );
        pending.insert(
            surface,
            PendingAction {
                action: ActionKind::PlayMedia,
                query: "second".into(),
            },
        );
        assert_eq!(pending.take(surface).unwrap().query, "second");
        assert!(pending.is_empty());
    }
}

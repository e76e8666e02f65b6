//! Envelope dispatch for one executor instance.
//!
//! Every failure is caught here and turned into a structured reply; an
//! error escaping this layer would break the bus for the whole context.

use serde_json::Value;
use surface_bus::{reply, Envelope, SenderInfo};
use tracing::{debug, warn};
use voicepilot_core_types::{ActionKind, ParameterSet};

use crate::actions;
use crate::instance::ExecutorInstance;

impl ExecutorInstance {
    /// Entry point for every envelope delivered to this context.
    pub(crate) async fn handle_envelope(
        self: std::sync::Arc<Self>,
        envelope: Envelope,
        _sender: SenderInfo,
    ) -> Option<Value> {
        // Overlapping listener registrations can deliver the same
        // logical event twice in a row; only the last key is remembered,
        // so non-consecutive repeats pass.
        let frame = match envelope.to_frame() {
            Ok(frame) => frame,
            Err(err) => {
                warn!(target: "action-executor", %err, "unserializable envelope");
                return Some(reply::failure(err));
            }
        };
        if self.is_consecutive_duplicate(&frame) {
            debug!(target: "action-executor", "consecutive duplicate suppressed");
            return Some(reply::skipped());
        }

        match envelope {
            Envelope::Ping => Some(reply::alive()),
            Envelope::ExecuteCommand {
                command,
                parameters,
            } => Some(self.execute(command, parameters).await),
            // Controller-addressed envelopes have no meaning here.
            _ => Some(reply::unknown_command()),
        }
    }

    async fn execute(&self, command: ActionKind, parameters: ParameterSet) -> Value {
        if self.is_navigating() {
            // A navigation is already underway and this context is about
            // to be destroyed; dropping the command is by design, not an
            // error.
            debug!(
                target: "action-executor",
                %command,
                "command dropped: navigation in flight"
            );
            return reply::success();
        }

        if command == ActionKind::None {
            return reply::unknown_command();
        }

        // The context may be torn down before a navigation-class await
        // resolves, so the flag goes up first.
        if command.is_navigation_class() {
            self.begin_navigation();
        }

        let result = match command {
            ActionKind::Navigate => actions::navigate(self, &parameters).await,
            ActionKind::Search => actions::search(self, &parameters).await,
            ActionKind::SiteSearch => actions::site_search(self, &parameters).await,
            ActionKind::Click => actions::click(self, &parameters).await,
            ActionKind::Scroll => actions::scroll(self, &parameters).await,
            ActionKind::Type => actions::type_text(self, &parameters).await,
            ActionKind::PlayMedia => actions::play_media(self, &parameters).await,
            ActionKind::GoBack => actions::history_back(self).await,
            ActionKind::GoForward => actions::history_forward(self).await,
            ActionKind::None => unreachable!("handled above"),
        };

        match result {
            Ok(()) => reply::success(),
            Err(err) => {
                if command.is_navigation_class() {
                    // Nothing is in flight anymore; un-wedge the context.
                    self.clear_navigation();
                }
                warn!(target: "action-executor", %command, %err, "action failed");
                reply::failure(err)
            }
        }
    }
}

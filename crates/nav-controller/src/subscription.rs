//! One-shot event waits.
//!
//! A completion listener must fire exactly once and then go away;
//! leaving it registered causes duplicate downstream effects on every
//! later navigation. Modelled as a future that resolves on the first
//! matching event and is dropped afterwards, so there is no listener
//! left to leak.

use std::time::Duration;

use tokio::sync::broadcast;
use tracing::debug;

use crate::host::HostEvent;

/// Await the first event satisfying `matches`, or `None` on timeout.
/// Non-matching events (other surfaces, subframes) are discarded without
/// consuming the wait.
pub async fn wait_for_event(
    mut rx: broadcast::Receiver<HostEvent>,
    timeout: Duration,
    matches: impl Fn(&HostEvent) -> bool,
) -> Option<HostEvent> {
    let wait = async {
        loop {
            match rx.recv().await {
                Ok(event) if matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(target: "nav-controller", skipped, "event wait lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    };

    tokio::time::timeout(timeout, wait).await.ok().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use voicepilot_core_types::SurfaceId;

    #[tokio::test]
    async fn resolves_on_first_match_and_skips_non_matching() {
        let (tx, rx) = broadcast::channel(16);
        let wanted = SurfaceId::new();
        let other = SurfaceId::new();

        let wait = tokio::spawn(wait_for_event(
            rx,
            Duration::from_millis(500),
            move |event| {
                matches!(
                    event,
                    HostEvent::NavigationCompleted { surface, main_frame: true }
                        if *surface == wanted
                )
            },
        ));

        tx.send(HostEvent::NavigationCompleted {
            surface: other,
            main_frame: true,
        })
        .unwrap();
        tx.send(HostEvent::NavigationCompleted {
            surface: wanted,
            main_frame: false,
        })
        .unwrap();
        tx.send(HostEvent::NavigationCompleted {
            surface: wanted,
            main_frame: true,
        })
        .unwrap();

        let event = wait.await.unwrap().unwrap();
        assert!(matches!(
            event,
            HostEvent::NavigationCompleted { surface, main_frame: true } if surface == wanted
        ));
    }

    #[tokio::test]
    async fn times_out_to_none() {
        let (_tx, rx) = broadcast::channel::<HostEvent>(4);
        let found = wait_for_event(rx, Duration::from_millis(20), |_| true).await;
        assert!(found.is_none());
    }
}

//! Host platform surface: the privileged APIs the controller consumes.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;
use voicepilot_core_types::{HistoryDirection, SurfaceId};

/// Lifecycle events emitted by the host platform. Payloads carry nothing
/// beyond target-surface identity (and the URL where the platform
/// provides it).
#[derive(Clone, Debug)]
pub enum HostEvent {
    /// Install/setup finished.
    Installed,
    /// The user performed the action-surface activation gesture.
    Activated { surface: SurfaceId },
    /// A new surface came into existence.
    SurfaceOpened { surface: SurfaceId, url: String },
    /// A surface finished loading its document.
    LoadCompleted { surface: SurfaceId, url: String },
    /// A navigation finished in some frame of a surface. Only
    /// `main_frame` events count for the navigation state machine;
    /// subframe completions must be filtered out.
    NavigationCompleted { surface: SurfaceId, main_frame: bool },
}

#[derive(Debug, Error, Clone)]
pub enum HostError {
    #[error("surface is gone: {0}")]
    SurfaceGone(String),

    #[error("executor bundle unavailable: {0}")]
    Bundle(String),

    #[error("host operation failed: {0}")]
    Io(String),
}

/// Privileged host operations.
#[async_trait]
pub trait SurfaceHost: Send + Sync {
    /// Point the surface at a new URL. The old page context dies with
    /// everything in it.
    async fn navigate(&self, surface: SurfaceId, url: &str) -> Result<(), HostError>;

    /// Traverse the surface's history.
    async fn history(
        &self,
        surface: SurfaceId,
        direction: HistoryDirection,
    ) -> Result<(), HostError>;

    /// Resolve the executor bundle to inject. Queried once per process
    /// and memoized by the controller.
    async fn executor_bundle(&self) -> Result<String, HostError>;

    /// Inject the executor bundle into the surface's current page
    /// context. Must be a no-op when an executor is already registered
    /// there.
    async fn inject(&self, surface: SurfaceId, bundle: &str) -> Result<(), HostError>;

    /// Current URL of the surface, if it still exists.
    async fn surface_url(&self, surface: SurfaceId) -> Option<String>;

    /// Open the control surface in response to the activation gesture.
    async fn open_control_surface(&self) -> Result<(), HostError>;

    /// Subscribe to host lifecycle events.
    fn subscribe(&self) -> broadcast::Receiver<HostEvent>;
}

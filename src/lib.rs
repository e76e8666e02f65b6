//! Voicepilot session wiring.
//!
//! Everything the binary needs is assembled here so integration tests
//! can drive the same stack: bus, simulated host, navigation controller,
//! and an intent provider.

pub mod config;
pub mod shell;
pub mod sim;

use std::sync::Arc;

use anyhow::Result;
use intent_core::{
    FileCredentialStore, GeminiIntentProvider, IntentProvider, MockIntentProvider,
};
use nav_controller::NavigationController;
use surface_bus::LocalBus;
use voicepilot_core_types::SurfaceId;

use crate::config::AppConfig;
use crate::sim::SimHost;

/// One wired-up Voicepilot runtime.
pub struct Session {
    pub bus: Arc<LocalBus>,
    pub host: Arc<SimHost>,
    pub controller: Arc<NavigationController>,
    pub provider: Arc<dyn IntentProvider>,
    /// The single active target surface.
    pub surface: SurfaceId,
}

impl Session {
    /// Build a session against the simulated host.
    pub async fn build(cfg: &AppConfig, mock_intent: bool) -> Result<Self> {
        let bus = LocalBus::new();
        let host = SimHost::new(bus.clone(), cfg.executor_config());
        let controller =
            NavigationController::new(bus.clone(), host.clone(), cfg.controller_config());
        controller.start().await?;

        let provider: Arc<dyn IntentProvider> = if mock_intent {
            Arc::new(MockIntentProvider)
        } else {
            let store = Arc::new(FileCredentialStore::default());
            Arc::new(GeminiIntentProvider::new(store, cfg.model.clone()))
        };

        let surface = host.open_surface("about:blank").await;

        Ok(Self {
            bus,
            host,
            controller,
            provider,
            surface,
        })
    }

    pub async fn shutdown(&self) {
        self.controller.shutdown().await;
    }
}

//! The per-context executor instance and its idempotent installation.

use std::sync::Arc;

use element_resolver::{DomSurface, ElementResolver};
use parking_lot::Mutex;
use surface_bus::{Envelope, Handler, LocalBus, SenderInfo, Target};
use tracing::{debug, warn};
use voicepilot_core_types::SurfaceId;

use crate::config::ExecutorConfig;
use crate::errors::ExecError;

/// Bus handler name under which the executor registers; uniqueness of
/// the name is what makes repeated injection a no-op.
pub const EXECUTOR_HANDLER: &str = "executor";

/// Outcome of an installation attempt.
#[derive(Debug)]
pub enum InstallOutcome {
    Installed(Arc<ExecutorInstance>),
    /// An executor already lives in this context; nothing was
    /// registered.
    AlreadyPresent,
}

impl InstallOutcome {
    pub fn is_fresh(&self) -> bool {
        matches!(self, InstallOutcome::Installed(_))
    }
}

/// Mutable cells owned by exactly one single-threaded context; no other
/// context can reach them except through the bus.
#[derive(Default)]
struct InstanceState {
    /// True while a navigation-class action is in flight.
    navigating: bool,
    /// Serialized form of the most recent envelope, for consecutive
    /// duplicate suppression.
    last_frame: Option<String>,
}

/// The per-page object that receives commands and mutates the DOM.
///
/// Destroyed implicitly when its context is detached; recreated by the
/// next injection.
pub struct ExecutorInstance {
    surface: SurfaceId,
    bus: Arc<LocalBus>,
    dom: Arc<dyn DomSurface>,
    resolver: ElementResolver,
    cfg: ExecutorConfig,
    state: Mutex<InstanceState>,
}

impl std::fmt::Debug for ExecutorInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorInstance")
            .field("surface", &self.surface)
            .finish_non_exhaustive()
    }
}

impl ExecutorInstance {
    /// Install an executor into the page context of `surface`.
    ///
    /// Installation is idempotent per context lifetime: if an executor
    /// handler is already registered there, this is a no-op.
    pub fn install(
        bus: Arc<LocalBus>,
        surface: SurfaceId,
        dom: Arc<dyn DomSurface>,
        cfg: ExecutorConfig,
    ) -> Result<InstallOutcome, surface_bus::BusError> {
        let target = Target::Page(surface);
        if bus.has_handler(target, EXECUTOR_HANDLER) {
            debug!(target: "action-executor", %surface, "executor already present; skipping install");
            return Ok(InstallOutcome::AlreadyPresent);
        }

        let instance = Arc::new(Self {
            surface,
            bus: bus.clone(),
            dom,
            resolver: ElementResolver::default(),
            cfg,
            state: Mutex::new(InstanceState::default()),
        });

        let handler: Handler = {
            let instance = instance.clone();
            Arc::new(move |envelope, sender| {
                let instance = instance.clone();
                Box::pin(async move { instance.handle_envelope(envelope, sender).await })
            })
        };

        bus.register(target, EXECUTOR_HANDLER, handler)?;
        debug!(target: "action-executor", %surface, "executor installed");
        Ok(InstallOutcome::Installed(instance))
    }

    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    pub(crate) fn dom(&self) -> &dyn DomSurface {
        self.dom.as_ref()
    }

    pub(crate) fn resolver(&self) -> &ElementResolver {
        &self.resolver
    }

    pub(crate) fn cfg(&self) -> &ExecutorConfig {
        &self.cfg
    }

    pub(crate) fn wait_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.cfg.wait_timeout_ms)
    }

    /// Whether a navigation-class action is currently in flight.
    pub fn is_navigating(&self) -> bool {
        self.state.lock().navigating
    }

    pub(crate) fn begin_navigation(&self) {
        self.state.lock().navigating = true;
    }

    /// Clear the navigation flag once the transition has been handed off
    /// (or has failed and nothing is in flight anymore). An in-page
    /// reload path never calls this; the flag dies with the context.
    pub(crate) fn clear_navigation(&self) {
        self.state.lock().navigating = false;
    }

    /// Consecutive-duplicate check: remembers only the last frame, so
    /// non-consecutive repeats are deliberately let through.
    pub(crate) fn is_consecutive_duplicate(&self, frame: &str) -> bool {
        let mut state = self.state.lock();
        if state.last_frame.as_deref() == Some(frame) {
            return true;
        }
        state.last_frame = Some(frame.to_string());
        false
    }

    /// Hand a navigation request to the controller over the bus.
    pub(crate) async fn request_navigation(&self, envelope: Envelope) -> Result<(), ExecError> {
        match self
            .bus
            .send(SenderInfo::page(self.surface), Target::Controller, &envelope)
            .await
        {
            Ok(_) => Ok(()),
            Err(err) => {
                warn!(target: "action-executor", %err, "navigation dispatch failed");
                Err(err.into())
            }
        }
    }
}

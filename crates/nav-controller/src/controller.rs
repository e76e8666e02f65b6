//! The navigation controller.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use surface_bus::{reply, Envelope, LocalBus, SenderInfo, Target};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use voicepilot_core_types::{urls, ActionKind, Command, ParameterSet, SurfaceId};

use crate::errors::ControllerError;
use crate::host::{HostEvent, SurfaceHost};
use crate::pending::{PendingAction, PendingActions};
use crate::state::NavPhase;
use crate::subscription::wait_for_event;

/// Controller tunables. The settle delay is empirically tuned; it exists
/// to let a freshly injected executor finish self-registration before a
/// command lands on it.
#[derive(Clone, Debug)]
pub struct ControllerConfig {
    pub inject_settle_ms: u64,
    pub load_timeout_ms: u64,
    /// Results base used for the blank-surface media fast path.
    pub media_results_base: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            inject_settle_ms: 500,
            load_timeout_ms: 10_000,
            media_results_base: "https://www.youtube.com/results?search_query=".to_string(),
        }
    }
}

/// Privileged-context state machine owner.
pub struct NavigationController {
    bus: Arc<LocalBus>,
    host: Arc<dyn SurfaceHost>,
    cfg: ControllerConfig,
    /// Executor bundle location, resolved once per process.
    bundle: OnceCell<String>,
    pending: PendingActions,
    phases: DashMap<SurfaceId, NavPhase>,
    shutdown: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl NavigationController {
    pub fn new(bus: Arc<LocalBus>, host: Arc<dyn SurfaceHost>, cfg: ControllerConfig) -> Arc<Self> {
        Arc::new(Self {
            bus,
            host,
            cfg,
            bundle: OnceCell::new(),
            pending: PendingActions::default(),
            phases: DashMap::new(),
            shutdown: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Register the controller endpoint and start the lifecycle loop.
    /// Idempotent.
    pub async fn start(self: &Arc<Self>) -> Result<(), ControllerError> {
        {
            let guard = self.tasks.lock().await;
            if !guard.is_empty() {
                return Ok(());
            }
        }

        self.bus.attach(Target::Controller);
        let handler: surface_bus::Handler = {
            let controller = Arc::clone(self);
            Arc::new(move |envelope, sender| {
                let controller = controller.clone();
                Box::pin(async move { controller.handle_envelope(envelope, sender).await })
            })
        };
        self.bus.register(Target::Controller, "controller", handler)?;

        let loop_task = tokio::spawn(Self::event_loop(Arc::clone(self)));
        self.tasks.lock().await.push(loop_task);
        info!(target: "nav-controller", "controller started");
        Ok(())
    }

    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let mut handles = self.tasks.lock().await;
        while let Some(handle) = handles.pop() {
            let _ = handle.await;
        }
    }

    pub fn phase(&self, surface: SurfaceId) -> NavPhase {
        self.phases
            .get(&surface)
            .map(|entry| *entry.value())
            .unwrap_or(NavPhase::Idle)
    }

    fn set_phase(&self, surface: SurfaceId, phase: NavPhase) {
        debug!(target: "nav-controller", %surface, %phase, "phase");
        self.phases.insert(surface, phase);
    }

    async fn handle_envelope(
        self: Arc<Self>,
        envelope: Envelope,
        sender: SenderInfo,
    ) -> Option<serde_json::Value> {
        match envelope {
            Envelope::NavigateTab { url } => {
                let Some(surface) = sender.surface else {
                    return Some(reply::failure("no sender surface for navigation"));
                };
                match self.host.navigate(surface, &url).await {
                    Ok(()) => Some(reply::success()),
                    Err(err) => {
                        warn!(target: "nav-controller", %surface, %err, "navigation failed");
                        Some(reply::failure(err))
                    }
                }
            }
            Envelope::NavigateHistory { direction } => {
                let Some(surface) = sender.surface else {
                    return Some(reply::failure("no sender surface for history"));
                };
                match self.host.history(surface, direction).await {
                    Ok(()) => Some(reply::success()),
                    Err(err) => Some(reply::failure(err)),
                }
            }
            Envelope::NavigateAndThen { url, next_command } => {
                let Some(surface) = sender.surface else {
                    return Some(reply::failure("no sender surface for navigation"));
                };
                // Ack immediately; the state machine runs on its own and
                // delivers nextCommand once the new context is ready.
                let controller = Arc::clone(&self);
                tokio::spawn(async move {
                    controller
                        .run_navigate_and_then(surface, url, *next_command)
                        .await;
                });
                Some(reply::success())
            }
            _ => Some(reply::unknown_command()),
        }
    }

    /// Walk one navigation request through the state machine. Errors are
    /// surfaced in the log and the machine returns to `Idle`; there is
    /// no retry loop.
    async fn run_navigate_and_then(&self, surface: SurfaceId, url: String, next: Envelope) {
        // Subscribe before issuing the navigation so the completion
        // signal cannot slip past.
        let events = self.host.subscribe();

        self.set_phase(surface, NavPhase::Navigating);
        if let Err(err) = self.host.navigate(surface, &url).await {
            warn!(target: "nav-controller", %surface, %err, "navigate step failed");
            self.set_phase(surface, NavPhase::Idle);
            return;
        }

        self.set_phase(surface, NavPhase::AwaitingLoad);
        let completed = wait_for_event(
            events,
            Duration::from_millis(self.cfg.load_timeout_ms),
            move |event| {
                matches!(
                    event,
                    HostEvent::NavigationCompleted { surface: s, main_frame: true }
                        if *s == surface
                )
            },
        )
        .await;
        if completed.is_none() {
            warn!(target: "nav-controller", %surface, "load completion timed out");
            self.set_phase(surface, NavPhase::Idle);
            return;
        }

        self.set_phase(surface, NavPhase::Injecting);
        if let Err(err) = self.inject_executor(surface).await {
            warn!(target: "nav-controller", %surface, %err, "injection failed");
            self.set_phase(surface, NavPhase::Idle);
            return;
        }
        // Let the injected executor finish self-registration.
        tokio::time::sleep(Duration::from_millis(self.cfg.inject_settle_ms)).await;

        self.set_phase(surface, NavPhase::Delivering);
        match self
            .bus
            .send(SenderInfo::controller(), Target::Page(surface), &next)
            .await
        {
            Ok(_) => debug!(target: "nav-controller", %surface, "queued command delivered"),
            Err(err) => {
                warn!(target: "nav-controller", %surface, %err, "queued command undeliverable")
            }
        }
        self.set_phase(surface, NavPhase::Idle);
    }

    /// Resolve (once) and inject the executor bundle.
    async fn inject_executor(&self, surface: SurfaceId) -> Result<(), ControllerError> {
        let bundle = match self.bundle.get() {
            Some(bundle) => bundle.clone(),
            None => {
                let resolved = self.host.executor_bundle().await?;
                self.bundle.get_or_init(|| resolved).clone()
            }
        };
        self.host.inject(surface, &bundle).await?;
        Ok(())
    }

    /// Entry point for the shell: run one structured command against a
    /// surface.
    pub async fn dispatch_command(
        &self,
        surface: SurfaceId,
        command: &Command,
    ) -> Result<(), ControllerError> {
        if command.action == ActionKind::None {
            // Sentinels carry only a message for the user.
            return Ok(());
        }

        // Blank surfaces have no page to execute in; navigation-class
        // commands are handled directly by the controller.
        if command.action.is_navigation_class() && self.surface_is_blank(surface).await {
            if let Some(url) = self.direct_navigation_url(command) {
                if command.action == ActionKind::PlayMedia {
                    // Two-step: the remainder runs when the results page
                    // signals readiness.
                    if let Some(query) = command.parameters.query.clone() {
                        self.pending.insert(
                            surface,
                            PendingAction {
                                action: ActionKind::PlayMedia,
                                query,
                            },
                        );
                    }
                }
                self.host.navigate(surface, &url).await?;
                return Ok(());
            }
        }

        // Probe the executor; inject only when nothing answers.
        let envelope = Envelope::execute(command.action, command.parameters.clone());
        let alive = matches!(
            self.bus
                .send(SenderInfo::controller(), Target::Page(surface), &Envelope::Ping)
                .await,
            Ok(Some(_))
        );
        if !alive {
            debug!(target: "nav-controller", %surface, "executor not responding; injecting");
            self.inject_executor(surface).await?;
            tokio::time::sleep(Duration::from_millis(self.cfg.inject_settle_ms)).await;
        }

        self.bus
            .send(SenderInfo::controller(), Target::Page(surface), &envelope)
            .await?;
        Ok(())
    }

    async fn surface_is_blank(&self, surface: SurfaceId) -> bool {
        match self.host.surface_url(surface).await {
            Some(url) => is_blank_url(&url),
            None => true,
        }
    }

    fn direct_navigation_url(&self, command: &Command) -> Option<String> {
        match command.action {
            ActionKind::Navigate => command.parameters.url.clone(),
            ActionKind::Search | ActionKind::SiteSearch => command
                .parameters
                .query
                .as_deref()
                .map(urls::google_search_url),
            ActionKind::PlayMedia => command
                .parameters
                .query
                .as_deref()
                .map(|query| urls::media_results_url(&self.cfg.media_results_base, query)),
            _ => None,
        }
    }

    /// Lifecycle loop: pending-action consumption, blank-surface
    /// auto-injection, activation gesture.
    async fn event_loop(self: Arc<Self>) {
        debug!(target: "nav-controller", "event loop entered");
        let mut events = self.host.subscribe();
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                event = events.recv() => {
                    match event {
                        Ok(event) => self.handle_host_event(event).await,
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(target: "nav-controller", skipped, "lifecycle events lagged");
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        }
        debug!(target: "nav-controller", "event loop exiting");
    }

    async fn handle_host_event(&self, event: HostEvent) {
        match event {
            HostEvent::LoadCompleted { surface, url } => {
                if let Some(pending) = self.pending.take(surface) {
                    debug!(target: "nav-controller", %surface, "resuming pending action");
                    if let Err(err) = self.deliver_pending(surface, pending).await {
                        warn!(target: "nav-controller", %surface, %err, "pending delivery failed");
                    }
                } else if is_blank_url(&url) {
                    // Fresh blank surfaces get an executor up front so the
                    // first command does not pay the injection latency.
                    if let Err(err) = self.inject_executor(surface).await {
                        warn!(target: "nav-controller", %surface, %err, "auto-inject failed");
                    }
                }
            }
            HostEvent::Activated { .. } => {
                if let Err(err) = self.host.open_control_surface().await {
                    warn!(target: "nav-controller", %err, "control surface open failed");
                }
            }
            HostEvent::Installed => {
                info!(target: "nav-controller", "host installed");
            }
            HostEvent::SurfaceOpened { surface, .. } => {
                debug!(target: "nav-controller", %surface, "surface opened");
            }
            HostEvent::NavigationCompleted { .. } => {}
        }
    }

    async fn deliver_pending(
        &self,
        surface: SurfaceId,
        pending: PendingAction,
    ) -> Result<(), ControllerError> {
        self.inject_executor(surface).await?;
        tokio::time::sleep(Duration::from_millis(self.cfg.inject_settle_ms)).await;
        let envelope = Envelope::execute(pending.action, ParameterSet::with_query(pending.query));
        self.bus
            .send(SenderInfo::controller(), Target::Page(surface), &envelope)
            .await?;
        Ok(())
    }
}

fn is_blank_url(url: &str) -> bool {
    url.is_empty() || url == "about:blank" || url.ends_with("://newtab") || url.ends_with("://newtab/")
}

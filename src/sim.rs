//! Simulated host platform.
//!
//! Stands in for a real browser so the whole orchestration stack can run
//! (and be tested) offline: surfaces are records, pages are synthetic
//! element sets, and navigation tears page contexts down exactly the way
//! a reload would.

use std::sync::Arc;

use action_executor::{ExecutorConfig, ExecutorInstance};
use async_trait::async_trait;
use dashmap::DashMap;
use element_resolver::{
    DomError, DomSurface, ElementHandle, ElementSnapshot, ElementStyle, SyntheticEvent,
};
use nav_controller::{HostError, HostEvent, SurfaceHost};
use parking_lot::{Mutex, RwLock};
use surface_bus::{LocalBus, Target};
use tokio::sync::broadcast;
use tracing::{debug, info};
use voicepilot_core_types::{HistoryDirection, SurfaceId};

/// One synthetic element and the selectors it answers to.
#[derive(Clone, Debug)]
struct SimElement {
    handle: ElementHandle,
    label: String,
    selectors: Vec<String>,
    style: ElementStyle,
    in_form: bool,
}

/// Synthetic document for one page context.
pub struct SimDom {
    url: String,
    elements: Vec<SimElement>,
    log: Mutex<Vec<String>>,
    scroll_y: Mutex<f64>,
}

impl SimDom {
    /// Build the page content a URL would have.
    pub fn for_url(url: &str) -> Arc<Self> {
        let mut builder = SimDomBuilder::new(url);

        if url.is_empty() || url == "about:blank" {
            return builder.finish();
        }

        if url.contains("youtube.com") {
            builder.element(
                "media search box",
                &["input#search", "#search"],
                false,
            );
            builder.element("media search button", &["#search-icon-legacy"], false);
            for n in 1..=3 {
                builder.element(
                    &format!("video {n}"),
                    &["a#video-title", r#"a, button, [role="button"]"#],
                    false,
                );
            }
        } else if url.contains("google.com/search") {
            for n in 1..=5 {
                builder.element(
                    &format!("result {n}"),
                    &[r#"a, button, [role="button"]"#],
                    false,
                );
            }
        } else {
            builder.element(
                "site search input",
                &[r#"input[name*="search"]"#, "input, textarea"],
                true,
            );
            builder.element("comment box", &["input, textarea"], false);
            for n in 1..=3 {
                builder.element(
                    &format!("link {n}"),
                    &[r#"a, button, [role="button"]"#],
                    false,
                );
            }
        }

        builder.finish()
    }

    fn record(&self, entry: String) {
        info!(target: "sim-host", "{entry}");
        self.log.lock().push(entry);
    }

    fn label_of(&self, element: ElementHandle) -> Result<&SimElement, DomError> {
        self.elements
            .iter()
            .find(|candidate| candidate.handle == element)
            .ok_or_else(|| DomError::NodeGone(format!("{element:?}")))
    }

    /// Everything this document saw happen, in order.
    pub fn action_log(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    pub fn clicked_labels(&self) -> Vec<String> {
        self.log
            .lock()
            .iter()
            .filter_map(|entry| entry.strip_prefix("click ").map(str::to_string))
            .collect()
    }
}

struct SimDomBuilder {
    url: String,
    elements: Vec<SimElement>,
    next_id: u64,
}

impl SimDomBuilder {
    fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            elements: Vec::new(),
            next_id: 1,
        }
    }

    fn element(&mut self, label: &str, selectors: &[&str], in_form: bool) {
        self.elements.push(SimElement {
            handle: ElementHandle(self.next_id),
            label: label.to_string(),
            selectors: selectors.iter().map(|s| s.to_string()).collect(),
            style: ElementStyle::default(),
            in_form,
        });
        self.next_id += 1;
    }

    fn finish(self) -> Arc<SimDom> {
        Arc::new(SimDom {
            url: self.url,
            elements: self.elements,
            log: Mutex::new(Vec::new()),
            scroll_y: Mutex::new(0.0),
        })
    }
}

#[async_trait]
impl DomSurface for SimDom {
    async fn query_all(&self, selector: &str) -> Vec<ElementSnapshot> {
        self.elements
            .iter()
            .filter(|element| element.selectors.iter().any(|s| s == selector))
            .map(|element| ElementSnapshot {
                handle: element.handle,
                style: element.style.clone(),
            })
            .collect()
    }

    async fn click(&self, element: ElementHandle) -> Result<(), DomError> {
        let label = self.label_of(element)?.label.clone();
        self.record(format!("click {label}"));
        Ok(())
    }

    async fn scroll_into_center(&self, element: ElementHandle) -> Result<(), DomError> {
        let label = self.label_of(element)?.label.clone();
        self.record(format!("center {label}"));
        Ok(())
    }

    async fn scroll_by(&self, _dx: f64, dy: f64) -> Result<(), DomError> {
        let mut scroll_y = self.scroll_y.lock();
        *scroll_y = (*scroll_y + dy).max(0.0);
        self.record(format!("scroll by {dy} to {scroll_y}"));
        Ok(())
    }

    async fn viewport_height(&self) -> f64 {
        900.0
    }

    async fn focus(&self, element: ElementHandle) -> Result<(), DomError> {
        let label = self.label_of(element)?.label.clone();
        self.record(format!("focus {label}"));
        Ok(())
    }

    async fn set_value(&self, element: ElementHandle, value: &str) -> Result<(), DomError> {
        let label = self.label_of(element)?.label.clone();
        self.record(format!("value {label}={value}"));
        Ok(())
    }

    async fn dispatch(
        &self,
        element: ElementHandle,
        event: SyntheticEvent,
    ) -> Result<(), DomError> {
        let label = self.label_of(element)?.label.clone();
        self.record(format!("event {label}:{event:?}"));
        Ok(())
    }

    async fn submit_form(&self, element: ElementHandle) -> Result<bool, DomError> {
        let found = self.label_of(element)?;
        if found.in_form {
            self.record(format!("submit form of {}", found.label));
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn current_url(&self) -> String {
        self.url.clone()
    }
}

struct SimSurface {
    dom: RwLock<Arc<SimDom>>,
    history: Mutex<(Vec<String>, usize)>,
}

/// Simulated privileged host. Owns the surfaces and replays the page
/// lifecycle a real platform would: navigation destroys the page
/// context, then load-completion events fire for the new one.
pub struct SimHost {
    bus: Arc<LocalBus>,
    executor_cfg: ExecutorConfig,
    surfaces: DashMap<SurfaceId, Arc<SimSurface>>,
    events: broadcast::Sender<HostEvent>,
}

impl SimHost {
    pub fn new(bus: Arc<LocalBus>, executor_cfg: ExecutorConfig) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            bus,
            executor_cfg,
            surfaces: DashMap::new(),
            events,
        })
    }

    /// Create a surface showing `url`.
    pub async fn open_surface(&self, url: &str) -> SurfaceId {
        let surface = SurfaceId::new();
        self.surfaces.insert(
            surface,
            Arc::new(SimSurface {
                dom: RwLock::new(SimDom::for_url(url)),
                history: Mutex::new((vec![url.to_string()], 0)),
            }),
        );
        self.bus.attach(Target::Page(surface));
        debug!(target: "sim-host", %surface, url, "surface opened");
        let _ = self.events.send(HostEvent::SurfaceOpened {
            surface,
            url: url.to_string(),
        });
        let _ = self.events.send(HostEvent::LoadCompleted {
            surface,
            url: url.to_string(),
        });
        surface
    }

    /// The document currently shown by a surface.
    pub fn dom(&self, surface: SurfaceId) -> Option<Arc<SimDom>> {
        self.surfaces
            .get(&surface)
            .map(|entry| entry.dom.read().clone())
    }

    pub fn current_url(&self, surface: SurfaceId) -> Option<String> {
        self.surfaces.get(&surface).map(|entry| {
            let history = entry.history.lock();
            history.0[history.1].clone()
        })
    }

    /// Replace the page context: the old executor dies with its
    /// endpoint, the new document attaches empty.
    fn swap_page(&self, surface: SurfaceId, entry: &SimSurface, url: &str) {
        let target = Target::Page(surface);
        self.bus.detach(target);
        *entry.dom.write() = SimDom::for_url(url);
        self.bus.attach(target);

        // Subframe completions fire too; consumers must filter them.
        let _ = self.events.send(HostEvent::NavigationCompleted {
            surface,
            main_frame: false,
        });
        let _ = self.events.send(HostEvent::NavigationCompleted {
            surface,
            main_frame: true,
        });
        let _ = self.events.send(HostEvent::LoadCompleted {
            surface,
            url: url.to_string(),
        });
    }

    fn surface_entry(&self, surface: SurfaceId) -> Result<Arc<SimSurface>, HostError> {
        self.surfaces
            .get(&surface)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| HostError::SurfaceGone(surface.to_string()))
    }
}

#[async_trait]
impl SurfaceHost for SimHost {
    async fn navigate(&self, surface: SurfaceId, url: &str) -> Result<(), HostError> {
        let entry = self.surface_entry(surface)?;
        {
            let mut history = entry.history.lock();
            let cursor = history.1;
            history.0.truncate(cursor + 1);
            history.0.push(url.to_string());
            history.1 = history.0.len() - 1;
        }
        info!(target: "sim-host", %surface, url, "navigating");
        self.swap_page(surface, &entry, url);
        Ok(())
    }

    async fn history(
        &self,
        surface: SurfaceId,
        direction: HistoryDirection,
    ) -> Result<(), HostError> {
        let entry = self.surface_entry(surface)?;
        let url = {
            let mut history = entry.history.lock();
            let cursor = match direction {
                HistoryDirection::Back => history.1.checked_sub(1),
                HistoryDirection::Forward => {
                    (history.1 + 1 < history.0.len()).then(|| history.1 + 1)
                }
            };
            let Some(cursor) = cursor else {
                debug!(target: "sim-host", %surface, ?direction, "history edge reached");
                return Ok(());
            };
            history.1 = cursor;
            history.0[cursor].clone()
        };
        info!(target: "sim-host", %surface, url, ?direction, "history traversal");
        self.swap_page(surface, &entry, &url);
        Ok(())
    }

    async fn executor_bundle(&self) -> Result<String, HostError> {
        Ok("assets/executor-bundle.js".to_string())
    }

    async fn inject(&self, surface: SurfaceId, bundle: &str) -> Result<(), HostError> {
        let entry = self.surface_entry(surface)?;
        let dom = entry.dom.read().clone();
        debug!(target: "sim-host", %surface, bundle, "injecting executor");
        ExecutorInstance::install(
            self.bus.clone(),
            surface,
            dom,
            self.executor_cfg.clone(),
        )
        .map(|_| ())
        .map_err(|err| HostError::Io(err.to_string()))
    }

    async fn surface_url(&self, surface: SurfaceId) -> Option<String> {
        self.current_url(surface)
    }

    async fn open_control_surface(&self) -> Result<(), HostError> {
        info!(target: "sim-host", "control surface opened");
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.events.subscribe()
    }
}

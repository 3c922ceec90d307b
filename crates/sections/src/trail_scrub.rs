//! Scroll-scrubbed trail map.
//!
//! Mount decision tree:
//! - no capability token: fallback notice (`MountedDegraded`);
//! - token and reduced motion: static overview (`MountedStatic`);
//! - token and full motion: trail on a render surface, marker and progress
//!   bar driven by scroll (`MountedAnimated`).

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use foundation::SectionId;
use foundation::math::LngLat;
use formats::{DEFAULT_TRAIL_URL, Trail, default_trail};
use futures_util::future::LocalBoxFuture;
use runtime::{DiagnosticKind, Diagnostics};
use scrub::{FrameSink, ProgressDriver, ScrollRange, ScrubFrame, TriggerPosition};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::capability::{CapabilityToken, TokenResolver};
use crate::descriptor::{
    CssMode, MountError, SectionControl, SectionHandle, SectionModule, SectionOptions,
    UnmountError,
};
use crate::host::{
    MotionPreference, PathSource, ProgressCallback, RenderSurface, ScrollBinding, ScrollCoupler,
    SectionView, StyleSheets, SurfaceFactory, SurfaceRequest, TargetElement, TargetResolver,
};
use crate::lifecycle::{Lifecycle, MountPlan, MountSession, SectionState};

/// Class added to the container while mounted.
pub const TRAIL_SCRUB_CLASS: &str = "scrolly-trail-scrub";
pub const TRAIL_SCRUB_STYLE_KEY: &str = "scrolly-trail-scrub";
pub const TRAIL_SCRUB_CSS: &str = "\
.scrolly-trail-scrub { position: relative; min-height: 300vh; }
.scrolly-trail-scrub .scrolly-map { position: sticky; top: 0; height: 100vh; }
.scrolly-trail-scrub .scrolly-progress { position: absolute; left: 1rem; right: 1rem; bottom: 1rem; height: 4px; background: rgba(0,0,0,.2); }
.scrolly-trail-scrub .scrolly-progress-fill { height: 100%; background: #e4572e; }
.scrolly-trail-scrub .scrolly-notice { padding: 2rem; text-align: center; }
";

pub const DEFAULT_MAP_CENTER: [f64; 2] = [-107.575507, 37.771122];
pub const DEFAULT_MAP_ZOOM: f64 = 12.0;

/// Per-section settings read from the descriptor's `extra` map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrailScrubConfig {
    pub trail_data_url: String,
    pub start: TriggerPosition,
    pub end: TriggerPosition,
    /// `[lon, lat]` in degrees.
    pub map_center: [f64; 2],
    pub map_zoom: f64,
    /// Keys this section does not interpret.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Default for TrailScrubConfig {
    fn default() -> Self {
        let range = ScrollRange::default();
        Self {
            trail_data_url: DEFAULT_TRAIL_URL.to_string(),
            start: range.start,
            end: range.end,
            map_center: DEFAULT_MAP_CENTER,
            map_zoom: DEFAULT_MAP_ZOOM,
            other: Map::new(),
        }
    }
}

impl TrailScrubConfig {
    pub fn from_extra(extra: &Map<String, Value>) -> Result<Self, MountError> {
        let config: Self = serde_json::from_value(Value::Object(extra.clone()))
            .map_err(|e| MountError::InvalidConfig(e.to_string()))?;
        if !config.map_zoom.is_finite() || !LngLat::from(config.map_center).is_finite() {
            return Err(MountError::InvalidConfig(
                "map center and zoom must be finite".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn scroll_range(&self) -> ScrollRange {
        ScrollRange::new(self.start, self.end)
    }

    pub fn center(&self) -> LngLat {
        LngLat::from(self.map_center)
    }
}

/// Host services a trail-scrub section needs.
#[derive(Clone)]
pub struct TrailScrubEnv {
    pub resolver: Rc<dyn TargetResolver>,
    pub motion: Rc<dyn MotionPreference>,
    /// Shared across sections so each stylesheet lands on the page once.
    pub styles: Rc<StyleSheets>,
    pub tokens: TokenResolver,
    pub surfaces: Rc<dyn SurfaceFactory>,
    pub scroll: Rc<dyn ScrollCoupler>,
    pub paths: Rc<dyn PathSource>,
    pub diagnostics: Diagnostics,
}

pub struct TrailScrubModule {
    env: TrailScrubEnv,
}

impl TrailScrubModule {
    pub fn new(env: TrailScrubEnv) -> Self {
        Self { env }
    }
}

impl SectionModule for TrailScrubModule {
    fn create_section(&self) -> Rc<dyn SectionHandle> {
        Rc::new(TrailScrubSection::new(self.env.clone()))
    }
}

/// Forwards driver frames to the render surface.
struct SurfaceFrames(Rc<dyn RenderSurface>);

impl FrameSink for SurfaceFrames {
    fn apply_frame(&self, frame: &ScrubFrame) {
        self.0.apply_frame(frame);
    }
}

#[derive(Default)]
struct Parts {
    options: Option<SectionOptions>,
    container: Option<Rc<dyn TargetElement>>,
    trail: Option<Trail>,
    surface: Option<Rc<dyn RenderSurface>>,
    driver: Option<Rc<ProgressDriver>>,
    binding: Option<Box<dyn ScrollBinding>>,
}

pub struct TrailScrubSection {
    env: TrailScrubEnv,
    lifecycle: Lifecycle,
    parts: RefCell<Parts>,
    /// Survives remounts.
    marker_visible: Cell<bool>,
}

impl TrailScrubSection {
    pub fn new(env: TrailScrubEnv) -> Self {
        Self {
            env,
            lifecycle: Lifecycle::new(),
            parts: RefCell::new(Parts::default()),
            marker_visible: Cell::new(true),
        }
    }

    pub fn state(&self) -> SectionState {
        self.lifecycle.state()
    }

    pub fn progress(&self) -> Option<f64> {
        self.driver().map(|d| d.progress())
    }

    pub fn trail_name(&self) -> Option<String> {
        let parts = self.parts.borrow();
        parts.trail.as_ref()?.name().map(str::to_string)
    }

    fn driver(&self) -> Option<Rc<ProgressDriver>> {
        self.parts.borrow().driver.clone()
    }

    async fn mount_inner(&self, options: SectionOptions) -> Result<(), MountError> {
        let Some(session) = self.lifecycle.begin_mount() else {
            return Ok(());
        };
        match self.run_mount(session, options).await {
            Ok(Some(plan)) => {
                self.lifecycle.finish_mount(session, plan);
                Ok(())
            }
            // Unmounted while suspended; the unmount already cleaned up.
            Ok(None) => Ok(()),
            Err(err) => {
                self.lifecycle.abort_mount(session);
                Err(err)
            }
        }
    }

    async fn run_mount(
        &self,
        session: MountSession,
        options: SectionOptions,
    ) -> Result<Option<MountPlan>, MountError> {
        let container = self
            .env
            .resolver
            .resolve(&options.target)
            .ok_or_else(|| MountError::TargetNotFound(options.target.to_string()))?;
        let id = options.id.clone();
        let reduced_motion = options
            .reduced_motion
            .unwrap_or_else(|| self.env.motion.prefers_reduced_motion());
        let token = self.env.tokens.resolve(&*container);
        let plan = MountPlan::decide(token.is_some(), reduced_motion);
        // Only the animated branch reads map and scroll settings.
        let config = match plan {
            MountPlan::Animated => Some(TrailScrubConfig::from_extra(&options.extra)?),
            MountPlan::Static | MountPlan::Degraded => None,
        };

        if options.css == CssMode::Lazy
            && self.env.styles.ensure(TRAIL_SCRUB_STYLE_KEY, TRAIL_SCRUB_CSS)
        {
            self.env.diagnostics.info(Some(&id), "injected trail scrub stylesheet");
        }
        container.add_class(TRAIL_SCRUB_CLASS);
        {
            let mut parts = self.parts.borrow_mut();
            parts.container = Some(Rc::clone(&container));
            parts.options = Some(options);
        }

        tracing::debug!(section = id.as_str(), ?plan, "mounting trail scrub");
        match (plan, token, config) {
            (MountPlan::Animated, Some(token), Some(config)) => {
                Ok(self
                    .mount_animated(session, &id, &container, &config, token)
                    .await)
            }
            (MountPlan::Static, _, _) => {
                container.render(&static_view(
                    "Scroll animation is off because reduced motion is preferred.",
                ));
                Ok(Some(MountPlan::Static))
            }
            _ => {
                self.env.diagnostics.report(
                    DiagnosticKind::CapabilityMissing,
                    Some(&id),
                    "no map access token; rendering fallback notice",
                );
                container.render(&SectionView::MissingToken {
                    message: "Map unavailable: no access token configured.".to_string(),
                });
                Ok(Some(MountPlan::Degraded))
            }
        }
    }

    /// `None` when the mount session was cancelled while suspended.
    async fn mount_animated(
        &self,
        session: MountSession,
        id: &SectionId,
        container: &Rc<dyn TargetElement>,
        config: &TrailScrubConfig,
        token: CapabilityToken,
    ) -> Option<MountPlan> {
        let trail = self.load_trail(id, &config.trail_data_url).await;
        if !self.lifecycle.is_current(session) {
            return None;
        }

        container.render(&SectionView::Surface);
        let request = SurfaceRequest {
            container: Rc::clone(container),
            token,
            center: config.center(),
            zoom: config.map_zoom,
        };
        let created = self.env.surfaces.create(request).await;
        if !self.lifecycle.is_current(session) {
            if let Ok(surface) = created {
                self.dispose_surface(id, &*surface);
            }
            return None;
        }
        let surface = match created {
            Ok(surface) => surface,
            Err(err) => return Some(self.degrade(id, container, &err.to_string())),
        };
        if let Err(err) = surface.show_trail(&trail) {
            self.dispose_surface(id, &*surface);
            return Some(self.degrade(id, container, &err.to_string()));
        }

        let sink: Rc<dyn FrameSink> = Rc::new(SurfaceFrames(Rc::clone(&surface)));
        let driver = Rc::new(ProgressDriver::new(trail.path.clone(), sink));
        if !self.marker_visible.get() {
            driver.set_marker_visible(false);
        }

        let weak: Weak<ProgressDriver> = Rc::downgrade(&driver);
        let on_progress: ProgressCallback = Rc::new(move |progress: f64| {
            if let Some(driver) = weak.upgrade() {
                driver.update(progress);
            }
        });
        match self
            .env
            .scroll
            .bind(Rc::clone(container), config.scroll_range(), on_progress)
        {
            Ok(binding) => {
                let mut parts = self.parts.borrow_mut();
                parts.trail = Some(trail);
                parts.surface = Some(surface);
                parts.driver = Some(driver);
                parts.binding = Some(binding);
                Some(MountPlan::Animated)
            }
            Err(err) => {
                self.env.diagnostics.report(
                    DiagnosticKind::CapabilityMissing,
                    Some(id),
                    format!("{err}; falling back to static render"),
                );
                drop(driver);
                self.dispose_surface(id, &*surface);
                self.parts.borrow_mut().trail = Some(trail);
                container.render(&static_view("Scroll animation is unavailable."));
                Some(MountPlan::Static)
            }
        }
    }

    fn degrade(&self, id: &SectionId, container: &Rc<dyn TargetElement>, reason: &str) -> MountPlan {
        self.env.diagnostics.report(
            DiagnosticKind::CapabilityMissing,
            Some(id),
            format!("{reason}; rendering fallback notice"),
        );
        container.render(&SectionView::MissingToken {
            message: format!("Map unavailable: {reason}"),
        });
        MountPlan::Degraded
    }

    /// Fetches the configured trail, falling back to the embedded one.
    async fn load_trail(&self, id: &SectionId, url: &str) -> Trail {
        let loaded = match self.env.paths.fetch(url).await {
            Ok(body) => Trail::from_geojson_str(&body).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        loaded.unwrap_or_else(|reason| {
            self.env.diagnostics.report(
                DiagnosticKind::PathDataFailure,
                Some(id),
                format!("failed to load trail from {url}: {reason}; using embedded trail"),
            );
            default_trail()
        })
    }

    fn dispose_surface(&self, id: &SectionId, surface: &dyn RenderSurface) {
        if let Err(err) = surface.dispose() {
            self.env
                .diagnostics
                .report(DiagnosticKind::UnmountFailure, Some(id), err.to_string());
        }
    }

    fn unmount_now(&self) -> Result<(), UnmountError> {
        if !self.lifecycle.begin_unmount() {
            return Ok(());
        }
        let parts = std::mem::take(&mut *self.parts.borrow_mut());
        let mut failed_steps = Vec::new();

        if let Some(mut binding) = parts.binding {
            if let Err(err) = binding.kill() {
                failed_steps.push(err.to_string());
            }
        }
        drop(parts.driver);
        if let Some(surface) = parts.surface {
            if let Err(err) = surface.dispose() {
                failed_steps.push(err.to_string());
            }
        }
        if let Some(container) = parts.container {
            container.clear();
            container.remove_class(TRAIL_SCRUB_CLASS);
        }
        self.lifecycle.finish_unmount();

        if failed_steps.is_empty() {
            return Ok(());
        }
        let section = parts.options.as_ref().map(|o| o.id.as_str()).unwrap_or("-");
        tracing::warn!(section, steps = failed_steps.len(), "unmount finished with errors");
        Err(UnmountError { failed_steps })
    }

    async fn apply_control(&self, control: SectionControl) {
        match control {
            SectionControl::SeekToStart => {
                if let Some(driver) = self.driver() {
                    driver.seek_to_start();
                }
            }
            SectionControl::SeekToEnd => {
                if let Some(driver) = self.driver() {
                    driver.seek_to_end();
                }
            }
            SectionControl::SetMarkerVisible(visible) => {
                self.marker_visible.set(visible);
                if let Some(driver) = self.driver() {
                    driver.set_marker_visible(visible);
                }
            }
            SectionControl::SetReducedMotion(reduced) => {
                let options = self.parts.borrow().options.clone();
                let Some(mut options) = options else {
                    return;
                };
                options.reduced_motion = Some(reduced);
                let id = options.id.clone();
                if let Err(err) = self.unmount_now() {
                    self.env.diagnostics.report(
                        DiagnosticKind::UnmountFailure,
                        Some(&id),
                        err.to_string(),
                    );
                }
                if let Err(err) = self.mount_inner(options).await {
                    self.env
                        .diagnostics
                        .report(DiagnosticKind::LoadFailure, Some(&id), err.to_string());
                }
            }
        }
    }
}

fn static_view(message: &str) -> SectionView {
    SectionView::Static {
        title: "Trail overview".to_string(),
        message: message.to_string(),
    }
}

impl SectionHandle for TrailScrubSection {
    fn mount(&self, options: SectionOptions) -> LocalBoxFuture<'_, Result<(), MountError>> {
        Box::pin(self.mount_inner(options))
    }

    fn unmount(&self) -> LocalBoxFuture<'_, Result<(), UnmountError>> {
        let result = self.unmount_now();
        Box::pin(async move { result })
    }

    fn is_mounted(&self) -> bool {
        self.lifecycle.is_mounted()
    }

    fn control(&self, control: SectionControl) -> LocalBoxFuture<'_, ()> {
        Box::pin(self.apply_control(control))
    }
}

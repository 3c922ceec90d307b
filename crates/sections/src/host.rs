//! Host-side collaborators.
//!
//! Section logic never touches a concrete UI runtime. Everything it needs from
//! the page (element lookup, visibility events, media queries, stylesheets,
//! rendering surfaces, scroll coupling and network fetches) comes through the
//! traits in this module, implemented by the browser host or by test fakes.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use foundation::math::LngLat;
use formats::Trail;
use futures_util::future::LocalBoxFuture;
use scrub::{ScrollRange, ScrubFrame};

use crate::capability::CapabilityToken;
use crate::config::RootMargin;

/// Attribute written onto observed targets so visibility events can be
/// mapped back to a section id.
pub const SECTION_ID_ATTRIBUTE: &str = "section-id";

/// Content a section asks its container to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionView {
    /// Capability token missing; the section is inert.
    MissingToken { message: String },
    /// Reduced-motion placeholder.
    Static { title: String, message: String },
    /// Container prepared to host a rendering surface.
    Surface,
}

/// A page element a section can be attached to.
pub trait TargetElement {
    /// Short label for logs, e.g. `#trail-scrub`.
    fn describe(&self) -> String;
    fn data_attribute(&self, name: &str) -> Option<String>;
    fn set_data_attribute(&self, name: &str, value: &str);
    fn remove_data_attribute(&self, name: &str);
    fn add_class(&self, class: &str);
    fn remove_class(&self, class: &str);
    /// Replace the element's content with `view`.
    fn render(&self, view: &SectionView);
    /// Remove all content.
    fn clear(&self);
    /// Lets a host recover its concrete element type.
    fn as_any(&self) -> &dyn Any;
}

/// Where a section lives: a selector resolved on demand, or an element the
/// caller already holds.
#[derive(Clone)]
pub enum TargetRef {
    Selector(String),
    Element(Rc<dyn TargetElement>),
}

impl std::fmt::Debug for TargetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetRef::Selector(s) => f.debug_tuple("Selector").field(s).finish(),
            TargetRef::Element(e) => f.debug_tuple("Element").field(&e.describe()).finish(),
        }
    }
}

impl std::fmt::Display for TargetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetRef::Selector(s) => f.write_str(s),
            TargetRef::Element(e) => f.write_str(&e.describe()),
        }
    }
}

impl From<&str> for TargetRef {
    fn from(s: &str) -> Self {
        TargetRef::Selector(s.to_string())
    }
}

impl From<String> for TargetRef {
    fn from(s: String) -> Self {
        TargetRef::Selector(s)
    }
}

impl From<Rc<dyn TargetElement>> for TargetRef {
    fn from(e: Rc<dyn TargetElement>) -> Self {
        TargetRef::Element(e)
    }
}

pub trait TargetResolver {
    fn query(&self, selector: &str) -> Option<Rc<dyn TargetElement>>;

    fn resolve(&self, target: &TargetRef) -> Option<Rc<dyn TargetElement>> {
        match target {
            TargetRef::Selector(s) => self.query(s),
            TargetRef::Element(e) => Some(Rc::clone(e)),
        }
    }
}

/// One visibility change delivered by the host's detector.
#[derive(Clone)]
pub struct VisibilityEntry {
    pub target: Rc<dyn TargetElement>,
    pub is_intersecting: bool,
}

impl VisibilityEntry {
    pub fn entered(target: Rc<dyn TargetElement>) -> Self {
        Self {
            target,
            is_intersecting: true,
        }
    }
}

/// Asynchronous viewport-proximity detector. Entries are delivered back to
/// the orchestrator through `ScrollySections::handle_entries`.
pub trait VisibilityObserver {
    fn observe(&self, target: Rc<dyn TargetElement>, margin: &RootMargin);
    fn unobserve(&self, target: &Rc<dyn TargetElement>);
    fn disconnect(&self);
}

pub trait MotionPreference {
    fn prefers_reduced_motion(&self) -> bool;
}

pub trait StyleInjector {
    fn inject(&self, key: &str, css: &str);
}

/// Page-wide record of injected stylesheets; each key is injected once.
pub struct StyleSheets {
    injector: Rc<dyn StyleInjector>,
    injected: RefCell<HashSet<String>>,
}

impl StyleSheets {
    pub fn new(injector: Rc<dyn StyleInjector>) -> Self {
        Self {
            injector,
            injected: RefCell::new(HashSet::new()),
        }
    }

    /// Injects `css` under `key` unless already present. Returns `true` if
    /// this call injected it.
    pub fn ensure(&self, key: &str, css: &str) -> bool {
        if !self.injected.borrow_mut().insert(key.to_string()) {
            return false;
        }
        self.injector.inject(key, css);
        true
    }

    pub fn contains(&self, key: &str) -> bool {
        self.injected.borrow().contains(key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    Unavailable(String),
    Render(String),
    Dispose(String),
}

impl std::fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurfaceError::Unavailable(m) => write!(f, "render surface unavailable: {m}"),
            SurfaceError::Render(m) => write!(f, "render failed: {m}"),
            SurfaceError::Dispose(m) => write!(f, "surface disposal failed: {m}"),
        }
    }
}

impl std::error::Error for SurfaceError {}

pub struct SurfaceRequest {
    pub container: Rc<dyn TargetElement>,
    pub token: CapabilityToken,
    pub center: LngLat,
    pub zoom: f64,
}

/// Creates rendering surfaces; the returned future resolves once the surface
/// is ready to accept layers.
pub trait SurfaceFactory {
    fn create(
        &self,
        request: SurfaceRequest,
    ) -> LocalBoxFuture<'static, Result<Rc<dyn RenderSurface>, SurfaceError>>;
}

pub trait RenderSurface {
    /// Adds the full trail line and the progress-reveal layer.
    fn show_trail(&self, trail: &Trail) -> Result<(), SurfaceError>;
    fn apply_frame(&self, frame: &ScrubFrame);
    fn dispose(&self) -> Result<(), SurfaceError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    Unavailable(String),
    Kill(String),
}

impl std::fmt::Display for BindError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindError::Unavailable(m) => write!(f, "scroll coupling unavailable: {m}"),
            BindError::Kill(m) => write!(f, "failed to release scroll binding: {m}"),
        }
    }
}

impl std::error::Error for BindError {}

pub type ProgressCallback = Rc<dyn Fn(f64)>;

/// Couples scroll position over `range` of a trigger element to a progress
/// callback.
pub trait ScrollCoupler {
    fn bind(
        &self,
        trigger: Rc<dyn TargetElement>,
        range: ScrollRange,
        on_progress: ProgressCallback,
    ) -> Result<Box<dyn ScrollBinding>, BindError>;
}

pub trait ScrollBinding {
    fn kill(&mut self) -> Result<(), BindError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    Network(String),
    Status(u16),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Network(m) => write!(f, "network error: {m}"),
            FetchError::Status(code) => write!(f, "unexpected HTTP status {code}"),
        }
    }
}

impl std::error::Error for FetchError {}

pub trait PathSource {
    fn fetch(&self, url: &str) -> LocalBoxFuture<'static, Result<String, FetchError>>;
}

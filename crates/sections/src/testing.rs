//! In-memory host fakes shared by the unit tests.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use futures_util::future::LocalBoxFuture;
use scrub::{ScrollRange, ScrubFrame};

use crate::config::RootMargin;
use crate::descriptor::{
    Loader, MountError, SectionControl, SectionHandle, SectionModule, SectionOptions,
    UnmountError,
};
use crate::host::{
    BindError, FetchError, MotionPreference, PathSource, ProgressCallback, RenderSurface,
    ScrollBinding, ScrollCoupler, SectionView, StyleInjector, SurfaceError, SurfaceFactory,
    SurfaceRequest, TargetElement, TargetResolver, VisibilityObserver,
};

async fn yield_times(n: usize) {
    for _ in 0..n {
        tokio::task::yield_now().await;
    }
}

pub struct FakeElement {
    name: String,
    attrs: RefCell<HashMap<String, String>>,
    classes: RefCell<Vec<String>>,
    view: RefCell<Option<SectionView>>,
    renders: Cell<usize>,
    clears: Cell<usize>,
}

impl FakeElement {
    pub fn new(name: &str) -> Rc<Self> {
        Rc::new(Self {
            name: name.to_string(),
            attrs: RefCell::new(HashMap::new()),
            classes: RefCell::new(Vec::new()),
            view: RefCell::new(None),
            renders: Cell::new(0),
            clears: Cell::new(0),
        })
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.borrow().iter().any(|c| c == class)
    }

    pub fn view(&self) -> Option<SectionView> {
        self.view.borrow().clone()
    }

    pub fn render_count(&self) -> usize {
        self.renders.get()
    }

    pub fn clear_count(&self) -> usize {
        self.clears.get()
    }
}

impl TargetElement for FakeElement {
    fn describe(&self) -> String {
        self.name.clone()
    }

    fn data_attribute(&self, name: &str) -> Option<String> {
        self.attrs.borrow().get(name).cloned()
    }

    fn set_data_attribute(&self, name: &str, value: &str) {
        self.attrs
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
    }

    fn remove_data_attribute(&self, name: &str) {
        self.attrs.borrow_mut().remove(name);
    }

    fn add_class(&self, class: &str) {
        if !self.has_class(class) {
            self.classes.borrow_mut().push(class.to_string());
        }
    }

    fn remove_class(&self, class: &str) {
        self.classes.borrow_mut().retain(|c| c != class);
    }

    fn render(&self, view: &SectionView) {
        self.renders.set(self.renders.get() + 1);
        *self.view.borrow_mut() = Some(view.clone());
    }

    fn clear(&self) {
        self.clears.set(self.clears.get() + 1);
        *self.view.borrow_mut() = None;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Selector lookup over a fixed set of elements.
#[derive(Default)]
pub struct FakeDom {
    elements: RefCell<HashMap<String, Rc<FakeElement>>>,
}

impl FakeDom {
    pub fn add(&self, selector: &str) -> Rc<FakeElement> {
        let el = FakeElement::new(selector);
        self.elements
            .borrow_mut()
            .insert(selector.to_string(), el.clone());
        el
    }
}

impl TargetResolver for FakeDom {
    fn query(&self, selector: &str) -> Option<Rc<dyn TargetElement>> {
        let el = self.elements.borrow().get(selector).cloned()?;
        Some(el as Rc<dyn TargetElement>)
    }
}

#[derive(Default)]
pub struct FakeObserver {
    active: RefCell<Vec<String>>,
    margins: RefCell<Vec<RootMargin>>,
    disconnects: Cell<usize>,
}

impl FakeObserver {
    pub fn watching(&self, name: &str) -> bool {
        self.active.borrow().iter().any(|n| n == name)
    }

    pub fn watched_count(&self) -> usize {
        self.active.borrow().len()
    }

    pub fn margins(&self) -> Vec<RootMargin> {
        self.margins.borrow().clone()
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.get()
    }
}

impl VisibilityObserver for FakeObserver {
    fn observe(&self, target: Rc<dyn TargetElement>, margin: &RootMargin) {
        self.active.borrow_mut().push(target.describe());
        self.margins.borrow_mut().push(*margin);
    }

    fn unobserve(&self, target: &Rc<dyn TargetElement>) {
        let name = target.describe();
        self.active.borrow_mut().retain(|n| *n != name);
    }

    fn disconnect(&self) {
        self.disconnects.set(self.disconnects.get() + 1);
        self.active.borrow_mut().clear();
    }
}

#[derive(Default)]
pub struct FakeMotion {
    pub reduced: Cell<bool>,
}

impl MotionPreference for FakeMotion {
    fn prefers_reduced_motion(&self) -> bool {
        self.reduced.get()
    }
}

#[derive(Default)]
pub struct RecordingInjector {
    pub keys: RefCell<Vec<String>>,
}

impl StyleInjector for RecordingInjector {
    fn inject(&self, key: &str, _css: &str) {
        self.keys.borrow_mut().push(key.to_string());
    }
}

#[derive(Default)]
pub struct FakeSurface {
    pub trails_shown: Cell<usize>,
    pub frames: RefCell<Vec<ScrubFrame>>,
    pub disposals: Cell<usize>,
    pub fail_dispose: Cell<bool>,
}

impl FakeSurface {
    pub fn last_frame(&self) -> Option<ScrubFrame> {
        self.frames.borrow().last().cloned()
    }
}

impl RenderSurface for FakeSurface {
    fn show_trail(&self, _trail: &formats::Trail) -> Result<(), SurfaceError> {
        self.trails_shown.set(self.trails_shown.get() + 1);
        Ok(())
    }

    fn apply_frame(&self, frame: &ScrubFrame) {
        self.frames.borrow_mut().push(frame.clone());
    }

    fn dispose(&self) -> Result<(), SurfaceError> {
        self.disposals.set(self.disposals.get() + 1);
        if self.fail_dispose.get() {
            return Err(SurfaceError::Dispose("context lost".to_string()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeSurfaceFactory {
    pub fail: Cell<bool>,
    pub fail_dispose: Cell<bool>,
    /// Scheduler turns each `create` waits before resolving.
    pub yields: Cell<usize>,
    pub surfaces: RefCell<Vec<Rc<FakeSurface>>>,
}

impl FakeSurfaceFactory {
    pub fn created(&self) -> usize {
        self.surfaces.borrow().len()
    }

    pub fn last(&self) -> Option<Rc<FakeSurface>> {
        self.surfaces.borrow().last().cloned()
    }
}

impl SurfaceFactory for FakeSurfaceFactory {
    fn create(
        &self,
        _request: SurfaceRequest,
    ) -> LocalBoxFuture<'static, Result<Rc<dyn RenderSurface>, SurfaceError>> {
        let yields = self.yields.get();
        if self.fail.get() {
            return Box::pin(async move {
                yield_times(yields).await;
                Err(SurfaceError::Unavailable("webgl disabled".to_string()))
            });
        }
        let surface = Rc::new(FakeSurface::default());
        surface.fail_dispose.set(self.fail_dispose.get());
        self.surfaces.borrow_mut().push(surface.clone());
        Box::pin(async move {
            yield_times(yields).await;
            Ok(surface as Rc<dyn RenderSurface>)
        })
    }
}

struct FakeBinding {
    kills: Rc<Cell<usize>>,
    fail: bool,
}

impl ScrollBinding for FakeBinding {
    fn kill(&mut self) -> Result<(), BindError> {
        self.kills.set(self.kills.get() + 1);
        if self.fail {
            return Err(BindError::Kill("trigger already gone".to_string()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeScroll {
    pub fail_bind: Cell<bool>,
    pub fail_kill: Cell<bool>,
    pub kills: Rc<Cell<usize>>,
    callbacks: RefCell<Vec<ProgressCallback>>,
    ranges: RefCell<Vec<ScrollRange>>,
}

impl FakeScroll {
    pub fn bind_count(&self) -> usize {
        self.callbacks.borrow().len()
    }

    pub fn last_range(&self) -> Option<ScrollRange> {
        self.ranges.borrow().last().copied()
    }

    /// Delivers `progress` to the most recent binding.
    pub fn scroll_to(&self, progress: f64) {
        let callback = self.callbacks.borrow().last().cloned();
        if let Some(callback) = callback {
            callback(progress);
        }
    }
}

impl ScrollCoupler for FakeScroll {
    fn bind(
        &self,
        _trigger: Rc<dyn TargetElement>,
        range: ScrollRange,
        on_progress: ProgressCallback,
    ) -> Result<Box<dyn ScrollBinding>, BindError> {
        if self.fail_bind.get() {
            return Err(BindError::Unavailable("plugin missing".to_string()));
        }
        self.callbacks.borrow_mut().push(on_progress);
        self.ranges.borrow_mut().push(range);
        Ok(Box::new(FakeBinding {
            kills: self.kills.clone(),
            fail: self.fail_kill.get(),
        }))
    }
}

#[derive(Default)]
pub struct FakePathSource {
    responses: RefCell<HashMap<String, Result<String, FetchError>>>,
    pub fetched: RefCell<Vec<String>>,
    pub yields: Cell<usize>,
}

impl FakePathSource {
    pub fn respond(&self, url: &str, response: Result<String, FetchError>) {
        self.responses
            .borrow_mut()
            .insert(url.to_string(), response);
    }
}

impl PathSource for FakePathSource {
    fn fetch(&self, url: &str) -> LocalBoxFuture<'static, Result<String, FetchError>> {
        self.fetched.borrow_mut().push(url.to_string());
        let response = self
            .responses
            .borrow()
            .get(url)
            .cloned()
            .unwrap_or(Err(FetchError::Status(404)));
        let yields = self.yields.get();
        Box::pin(async move {
            yield_times(yields).await;
            response
        })
    }
}

/// Section module whose handles only count lifecycle calls.
#[derive(Default)]
pub struct CountingModule {
    pub fail_mount: Cell<bool>,
    pub fail_unmount: Cell<bool>,
    pub mount_yields: Cell<usize>,
    handles: RefCell<Vec<Rc<CountingHandle>>>,
}

impl CountingModule {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn handles(&self) -> Vec<Rc<CountingHandle>> {
        self.handles.borrow().clone()
    }

    pub fn total_mounts(&self) -> usize {
        self.handles.borrow().iter().map(|h| h.mounts.get()).sum()
    }

    /// Lazy loader over this module plus a counter of loader invocations.
    pub fn loader(self: &Rc<Self>) -> (Loader, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let module = self.clone();
        let loader = Loader::new(move || {
            counter.set(counter.get() + 1);
            let module = module.clone();
            async move {
                tokio::task::yield_now().await;
                Ok(module as Rc<dyn SectionModule>)
            }
        });
        (loader, calls)
    }
}

impl SectionModule for CountingModule {
    fn create_section(&self) -> Rc<dyn SectionHandle> {
        let handle = Rc::new(CountingHandle {
            fail_mount: self.fail_mount.get(),
            fail_unmount: self.fail_unmount.get(),
            mount_yields: self.mount_yields.get(),
            ..CountingHandle::default()
        });
        self.handles.borrow_mut().push(handle.clone());
        handle
    }
}

#[derive(Default)]
pub struct CountingHandle {
    fail_mount: bool,
    fail_unmount: bool,
    mount_yields: usize,
    mounted: Cell<bool>,
    pub mounts: Cell<usize>,
    pub unmounts: Cell<usize>,
    pub controls: RefCell<Vec<SectionControl>>,
    pub last_options: RefCell<Option<SectionOptions>>,
}

impl SectionHandle for CountingHandle {
    fn mount(&self, options: SectionOptions) -> LocalBoxFuture<'_, Result<(), MountError>> {
        Box::pin(async move {
            yield_times(self.mount_yields).await;
            if self.fail_mount {
                return Err(MountError::InvalidConfig("refused".to_string()));
            }
            if self.mounted.get() {
                return Ok(());
            }
            self.mounts.set(self.mounts.get() + 1);
            self.mounted.set(true);
            *self.last_options.borrow_mut() = Some(options);
            Ok(())
        })
    }

    fn unmount(&self) -> LocalBoxFuture<'_, Result<(), UnmountError>> {
        Box::pin(async move {
            if !self.mounted.replace(false) {
                return Ok(());
            }
            self.unmounts.set(self.unmounts.get() + 1);
            if self.fail_unmount {
                return Err(UnmountError {
                    failed_steps: vec!["dispose".to_string()],
                });
            }
            Ok(())
        })
    }

    fn is_mounted(&self) -> bool {
        self.mounted.get()
    }

    fn control(&self, control: SectionControl) -> LocalBoxFuture<'_, ()> {
        self.controls.borrow_mut().push(control);
        Box::pin(async {})
    }
}

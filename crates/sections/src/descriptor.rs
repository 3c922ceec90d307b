use std::future::Future;
use std::rc::Rc;

use foundation::SectionId;
use futures_util::FutureExt;
use futures_util::future::LocalBoxFuture;
use serde_json::{Map, Value};

use crate::host::TargetRef;

/// How a section's stylesheet reaches the page.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum CssMode {
    /// The section ships no styles of its own.
    #[default]
    None,
    /// Styles are already on the page (bundled with the host).
    Eager,
    /// Styles are injected on first mount.
    Lazy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    MissingImplementation,
    Loader(String),
    Mount(MountError),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::MissingImplementation => write!(f, "no section or loader provided"),
            LoadError::Loader(m) => write!(f, "section loader failed: {m}"),
            LoadError::Mount(e) => write!(f, "mount failed: {e}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Mount(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountError {
    TargetNotFound(String),
    InvalidConfig(String),
}

impl std::fmt::Display for MountError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MountError::TargetNotFound(t) => write!(f, "target element not found: {t}"),
            MountError::InvalidConfig(m) => write!(f, "invalid section config: {m}"),
        }
    }
}

impl std::error::Error for MountError {}

/// Teardown completed, but some steps failed along the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmountError {
    pub failed_steps: Vec<String>,
}

impl std::fmt::Display for UnmountError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unmount finished with errors: {}", self.failed_steps.join("; "))
    }
}

impl std::error::Error for UnmountError {}

/// User-facing controls forwarded to a mounted section.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SectionControl {
    SeekToStart,
    SeekToEnd,
    SetMarkerVisible(bool),
    /// Re-mounts with an explicit reduced-motion override.
    SetReducedMotion(bool),
}

/// Descriptor fields handed to `SectionHandle::mount`.
#[derive(Debug, Clone)]
pub struct SectionOptions {
    pub id: SectionId,
    pub target: TargetRef,
    pub css: CssMode,
    pub reduced_motion: Option<bool>,
    /// Per-kind settings, validated by the section that receives them.
    pub extra: Map<String, Value>,
}

/// A mountable instance of a section.
///
/// Implementations must make `mount` a no-op unless unmounted, and `unmount`
/// a no-op when already unmounted.
pub trait SectionHandle {
    fn mount(&self, options: SectionOptions) -> LocalBoxFuture<'_, Result<(), MountError>>;

    /// Always leaves the handle unmounted; `Err` reports steps that failed.
    fn unmount(&self) -> LocalBoxFuture<'_, Result<(), UnmountError>>;

    fn is_mounted(&self) -> bool;

    fn control(&self, _control: SectionControl) -> LocalBoxFuture<'_, ()> {
        Box::pin(async {})
    }
}

/// Stateless factory for section handles.
pub trait SectionModule {
    fn create_section(&self) -> Rc<dyn SectionHandle>;
}

pub type ModuleFuture = LocalBoxFuture<'static, Result<Rc<dyn SectionModule>, LoadError>>;

/// Deferred module resolution, invoked at most once per successful load.
#[derive(Clone)]
pub struct Loader(Rc<dyn Fn() -> ModuleFuture>);

impl Loader {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<Rc<dyn SectionModule>, LoadError>> + 'static,
    {
        Loader(Rc::new(move || f().boxed_local()))
    }

    pub fn load(&self) -> ModuleFuture {
        (self.0)()
    }
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Loader(..)")
    }
}

#[derive(Clone)]
pub enum ModuleSource {
    Direct(Rc<dyn SectionModule>),
    Lazy(Loader),
}

impl std::fmt::Debug for ModuleSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModuleSource::Direct(_) => f.write_str("Direct(..)"),
            ModuleSource::Lazy(l) => write!(f, "Lazy({l:?})"),
        }
    }
}

impl ModuleSource {
    pub async fn resolve(&self) -> Result<Rc<dyn SectionModule>, LoadError> {
        match self {
            ModuleSource::Direct(m) => Ok(Rc::clone(m)),
            ModuleSource::Lazy(loader) => loader.load().await,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SectionDescriptor {
    pub id: SectionId,
    pub target: TargetRef,
    pub css: CssMode,
    pub module: Option<ModuleSource>,
    pub reduced_motion: Option<bool>,
    pub extra: Map<String, Value>,
}

impl SectionDescriptor {
    pub fn new(id: impl Into<SectionId>, target: impl Into<TargetRef>) -> Self {
        Self {
            id: id.into(),
            target: target.into(),
            css: CssMode::None,
            module: None,
            reduced_motion: None,
            extra: Map::new(),
        }
    }

    pub fn with_loader(mut self, loader: Loader) -> Self {
        self.module = Some(ModuleSource::Lazy(loader));
        self
    }

    pub fn with_module(mut self, module: Rc<dyn SectionModule>) -> Self {
        self.module = Some(ModuleSource::Direct(module));
        self
    }

    pub fn with_css(mut self, css: CssMode) -> Self {
        self.css = css;
        self
    }

    pub fn with_reduced_motion(mut self, reduced_motion: bool) -> Self {
        self.reduced_motion = Some(reduced_motion);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn mount_options(&self) -> SectionOptions {
        SectionOptions {
            id: self.id.clone(),
            target: self.target.clone(),
            css: self.css,
            reduced_motion: self.reduced_motion,
            extra: self.extra.clone(),
        }
    }
}

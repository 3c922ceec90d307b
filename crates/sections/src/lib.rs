//! Viewport-driven lazy loading of scrollytelling sections.
//!
//! [`ScrollySections`] registers section descriptors, watches their targets
//! through a host [`VisibilityObserver`], and loads plus mounts each section
//! once when it approaches the viewport. Sections talk to the page only via
//! the host traits in [`host`], so everything here runs (and is tested)
//! without a browser.

pub mod capability;
pub mod config;
pub mod descriptor;
pub mod host;
pub mod lifecycle;
pub mod orchestrator;
pub mod registry;
pub mod trail_scrub;

#[cfg(test)]
mod testing;

pub use capability::{CapabilityToken, TOKEN_ATTRIBUTE, TokenResolver};
pub use config::{ConfigError, MarginLength, OrchestratorOptions, RootMargin};
pub use descriptor::{
    CssMode, LoadError, Loader, ModuleFuture, ModuleSource, MountError, SectionControl,
    SectionDescriptor, SectionHandle, SectionModule, SectionOptions, UnmountError,
};
pub use host::VisibilityObserver;
pub use lifecycle::{Lifecycle, MountPlan, SectionState};
pub use orchestrator::{OrchestratorHost, ScrollySections};
pub use trail_scrub::{TrailScrubConfig, TrailScrubEnv, TrailScrubModule, TrailScrubSection};

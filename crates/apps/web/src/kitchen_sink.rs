//! The demo page: one lazily loaded trail-scrub section at `#trail-scrub`.

use std::rc::Rc;

use formats::DEFAULT_TRAIL_URL;
use sections::{
    CssMode, Loader, OrchestratorOptions, SectionControl, SectionDescriptor, SectionModule,
    TrailScrubEnv, TrailScrubModule,
};

pub const TRAIL_SCRUB_ID: &str = "trail-scrub";
pub const TRAIL_SCRUB_SELECTOR: &str = "#trail-scrub";

/// Builds the trail-scrub module only when its section first loads.
pub fn trail_scrub_loader(env: TrailScrubEnv) -> Loader {
    Loader::new(move || {
        let env = env.clone();
        async move {
            tracing::debug!("resolving trail scrub module");
            Ok(Rc::new(TrailScrubModule::new(env)) as Rc<dyn SectionModule>)
        }
    })
}

pub fn trail_scrub_descriptor(loader: Loader) -> SectionDescriptor {
    SectionDescriptor::new(TRAIL_SCRUB_ID, TRAIL_SCRUB_SELECTOR)
        .with_css(CssMode::Lazy)
        .with_loader(loader)
        .with_extra("trailDataUrl", DEFAULT_TRAIL_URL)
}

pub fn kitchen_sink_options(debug: bool) -> OrchestratorOptions {
    OrchestratorOptions {
        debug,
        ..OrchestratorOptions::default()
    }
}

/// Maps a page button action to a section control.
pub fn parse_control(action: &str, value: bool) -> Option<SectionControl> {
    match action {
        "seek-start" => Some(SectionControl::SeekToStart),
        "seek-end" => Some(SectionControl::SeekToEnd),
        "marker" => Some(SectionControl::SetMarkerVisible(value)),
        "reduced-motion" => Some(SectionControl::SetReducedMotion(value)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use sections::{CssMode, LoadError, Loader, SectionControl, SectionModule};

    use super::{parse_control, trail_scrub_descriptor};

    #[test]
    fn descriptor_is_lazy_with_lazy_css() {
        let loader = Loader::new(|| async {
            Err::<Rc<dyn SectionModule>, _>(LoadError::MissingImplementation)
        });
        let descriptor = trail_scrub_descriptor(loader);
        assert_eq!(descriptor.id.as_str(), "trail-scrub");
        assert_eq!(descriptor.target.to_string(), "#trail-scrub");
        assert_eq!(descriptor.css, CssMode::Lazy);
        assert!(descriptor.module.is_some());
        assert_eq!(
            descriptor.extra["trailDataUrl"],
            "/data/trails/highland-mary.geojson"
        );
    }

    #[test]
    fn parses_page_controls() {
        assert_eq!(parse_control("seek-end", false), Some(SectionControl::SeekToEnd));
        assert_eq!(
            parse_control("marker", false),
            Some(SectionControl::SetMarkerVisible(false))
        );
        assert_eq!(
            parse_control("reduced-motion", true),
            Some(SectionControl::SetReducedMotion(true))
        );
        assert_eq!(parse_control("explode", true), None);
    }
}

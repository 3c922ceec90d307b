use std::cell::RefCell;
use std::rc::Rc;

use console_error_panic_hook::set_once;
use runtime::Diagnostics;
use sections::host::{StyleSheets, VisibilityEntry};
use sections::{OrchestratorHost, ScrollySections, TokenResolver, TrailScrubEnv};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::dom::{DocumentStyles, DomResolver, MediaQueryMotion};
use crate::kitchen_sink::{
    TRAIL_SCRUB_ID, kitchen_sink_options, parse_control, trail_scrub_descriptor,
    trail_scrub_loader,
};
use crate::net::FetchPathSource;
use crate::scroll::WindowScrollCoupler;
use crate::surface::CanvasSurfaceFactory;
use crate::visibility::IntersectionVisibility;

struct Page {
    sections: ScrollySections,
    visibility: Rc<IntersectionVisibility>,
}

impl Page {
    fn teardown(self) {
        self.visibility.clear_listener();
        let sections = self.sections;
        spawn_local(async move { sections.destroy().await });
    }
}

thread_local! {
    static PAGE: RefCell<Option<Page>> = const { RefCell::new(None) };
}

fn current_sections() -> Option<ScrollySections> {
    PAGE.with(|page| page.borrow().as_ref().map(|p| p.sections.clone()))
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    tracing_wasm::set_as_global_default();
    Ok(())
}

/// Wires the demo page and starts watching `#trail-scrub`.
#[wasm_bindgen]
pub fn start_kitchen_sink(debug: bool) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let diagnostics = Diagnostics::new();
    let resolver = Rc::new(DomResolver::new(document.clone()));
    let visibility = Rc::new(IntersectionVisibility::new());
    let env = TrailScrubEnv {
        resolver: resolver.clone(),
        motion: Rc::new(MediaQueryMotion::new(window.clone())),
        styles: Rc::new(StyleSheets::new(Rc::new(DocumentStyles::new(document)))),
        tokens: TokenResolver::new(option_env!("SCROLLY_MAPBOX_TOKEN")),
        surfaces: Rc::new(CanvasSurfaceFactory),
        scroll: Rc::new(WindowScrollCoupler::new(window)),
        paths: Rc::new(FetchPathSource),
        diagnostics: diagnostics.clone(),
    };

    let sections = ScrollySections::new(
        kitchen_sink_options(debug),
        OrchestratorHost {
            resolver,
            observer: visibility.clone(),
            diagnostics,
        },
    );
    let handler = sections.clone();
    visibility.set_listener(Rc::new(move |entries: Vec<VisibilityEntry>| {
        let handler = handler.clone();
        spawn_local(async move { handler.handle_entries(entries).await });
    }));
    sections.init(vec![trail_scrub_descriptor(trail_scrub_loader(env))]);

    let previous = PAGE.with(|page| page.borrow_mut().replace(Page { sections, visibility }));
    if let Some(previous) = previous {
        previous.teardown();
    }
    Ok(())
}

/// `action` is one of `seek-start`, `seek-end`, `marker`, `reduced-motion`.
#[wasm_bindgen]
pub fn trail_scrub_control(action: &str, value: bool) -> Result<(), JsValue> {
    let control = parse_control(action, value)
        .ok_or_else(|| JsValue::from_str(&format!("unknown control: {action}")))?;
    let Some(sections) = current_sections() else {
        return Err(JsValue::from_str("kitchen sink not started"));
    };
    spawn_local(async move {
        if !sections.control(TRAIL_SCRUB_ID, control).await {
            tracing::debug!(action = ?control, "trail scrub not loaded yet");
        }
    });
    Ok(())
}

#[wasm_bindgen]
pub fn destroy_kitchen_sink() {
    if let Some(page) = PAGE.with(|page| page.borrow_mut().take()) {
        page.teardown();
    }
}

/// Recorded diagnostics as a JSON array, for the page's debug panel.
#[wasm_bindgen]
pub fn diagnostics_json() -> String {
    let Some(sections) = current_sections() else {
        return "[]".to_string();
    };
    let events: Vec<serde_json::Value> = sections
        .diagnostics()
        .events()
        .into_iter()
        .map(|d| {
            serde_json::json!({
                "sequence": d.sequence,
                "kind": d.kind.as_str(),
                "section": d.section.as_ref().map(|s| s.as_str()),
                "message": d.message,
            })
        })
        .collect();
    serde_json::Value::Array(events).to_string()
}

use std::cell::RefCell;
use std::rc::Rc;

use sections::RootMargin;
use sections::host::{TargetElement, VisibilityEntry, VisibilityObserver};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{HtmlElement, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

use crate::dom::DomElement;

pub type EntryListener = Rc<dyn Fn(Vec<VisibilityEntry>)>;

type ObserverCallback = Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>;

/// `IntersectionObserver` backed proximity detector.
///
/// The browser observer is created on first `observe`, since its root margin
/// is fixed at construction.
#[derive(Default)]
pub struct IntersectionVisibility {
    listener: Rc<RefCell<Option<EntryListener>>>,
    observer: RefCell<Option<(IntersectionObserver, ObserverCallback)>>,
}

impl IntersectionVisibility {
    pub fn new() -> Self {
        Self::default()
    }

    /// Where entry batches go; usually the orchestrator's `handle_entries`.
    pub fn set_listener(&self, listener: EntryListener) {
        *self.listener.borrow_mut() = Some(listener);
    }

    /// Drops the listener, breaking the orchestrator <-> observer cycle.
    pub fn clear_listener(&self) {
        self.listener.borrow_mut().take();
    }

    fn ensure_observer(&self, margin: &RootMargin) -> Option<IntersectionObserver> {
        if let Some((observer, _)) = self.observer.borrow().as_ref() {
            return Some(observer.clone());
        }

        let listener = Rc::clone(&self.listener);
        let callback: ObserverCallback = Closure::new(
            move |entries: js_sys::Array, _observer: IntersectionObserver| {
                let batch: Vec<VisibilityEntry> = entries
                    .iter()
                    .filter_map(|e| e.dyn_into::<IntersectionObserverEntry>().ok())
                    .filter_map(|e| {
                        let element = e.target().dyn_into::<HtmlElement>().ok()?;
                        Some(VisibilityEntry {
                            target: Rc::new(DomElement::new(element)),
                            is_intersecting: e.is_intersecting(),
                        })
                    })
                    .collect();
                let current = listener.borrow().clone();
                if let Some(deliver) = current {
                    deliver(batch);
                }
            },
        );

        let init = IntersectionObserverInit::new();
        init.set_root_margin(&margin.to_string());
        let observer =
            match IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init) {
                Ok(observer) => observer,
                Err(err) => {
                    tracing::error!(?err, "IntersectionObserver unavailable");
                    return None;
                }
            };
        *self.observer.borrow_mut() = Some((observer.clone(), callback));
        Some(observer)
    }
}

impl VisibilityObserver for IntersectionVisibility {
    fn observe(&self, target: Rc<dyn TargetElement>, margin: &RootMargin) {
        let Some(element) = DomElement::of(&*target) else {
            tracing::warn!(element = %target.describe(), "not a DOM element; cannot observe");
            return;
        };
        if let Some(observer) = self.ensure_observer(margin) {
            observer.observe(element);
        }
    }

    fn unobserve(&self, target: &Rc<dyn TargetElement>) {
        let Some(element) = DomElement::of(&**target) else {
            return;
        };
        if let Some((observer, _)) = self.observer.borrow().as_ref() {
            observer.unobserve(element);
        }
    }

    fn disconnect(&self) {
        if let Some((observer, _callback)) = self.observer.borrow_mut().take() {
            observer.disconnect();
        }
    }
}

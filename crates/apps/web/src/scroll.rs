use std::rc::Rc;

use scrub::{ElementRect, ScrollRange};
use sections::host::{BindError, ProgressCallback, ScrollBinding, ScrollCoupler, TargetElement};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::Window;

use crate::dom::DomElement;
use crate::listeners::add_all;

const EVENTS: [&str; 2] = ["scroll", "resize"];

/// Recomputes progress from the trigger's bounding rect on every window
/// scroll or resize.
pub struct WindowScrollCoupler {
    window: Window,
}

impl WindowScrollCoupler {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl ScrollCoupler for WindowScrollCoupler {
    fn bind(
        &self,
        trigger: Rc<dyn TargetElement>,
        range: ScrollRange,
        on_progress: ProgressCallback,
    ) -> Result<Box<dyn ScrollBinding>, BindError> {
        let element = DomElement::of(&*trigger)
            .cloned()
            .ok_or_else(|| BindError::Unavailable("trigger is not a DOM element".into()))?;
        let window = self.window.clone();

        let listener = Closure::<dyn Fn()>::new(move || {
            let rect = element.get_bounding_client_rect();
            let viewport = window
                .inner_height()
                .ok()
                .and_then(|h| h.as_f64())
                .unwrap_or(0.0);
            on_progress(range.progress_at(ElementRect::new(rect.top(), rect.height()), viewport));
        });

        let callback: &js_sys::Function = listener.as_ref().unchecked_ref();
        add_all(
            &EVENTS,
            |event| self.window.add_event_listener_with_callback(event, callback),
            |event| {
                let _ = self.window.remove_event_listener_with_callback(event, callback);
            },
        )
        .map_err(|e| BindError::Unavailable(format!("{e:?}")))?;
        // Sync with the current scroll position.
        let _ = callback.call0(&wasm_bindgen::JsValue::NULL);

        Ok(Box::new(WindowScrollBinding {
            window: self.window.clone(),
            listener: Some(listener),
        }))
    }
}

struct WindowScrollBinding {
    window: Window,
    listener: Option<Closure<dyn Fn()>>,
}

impl ScrollBinding for WindowScrollBinding {
    fn kill(&mut self) -> Result<(), BindError> {
        let Some(listener) = self.listener.take() else {
            return Ok(());
        };
        let mut failures = Vec::new();
        for event in EVENTS {
            if let Err(e) = self
                .window
                .remove_event_listener_with_callback(event, listener.as_ref().unchecked_ref())
            {
                failures.push(format!("{event}: {e:?}"));
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(BindError::Kill(failures.join(", ")))
        }
    }
}

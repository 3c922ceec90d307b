use std::any::Any;
use std::rc::Rc;

use sections::host::{MotionPreference, SectionView, StyleInjector, TargetElement, TargetResolver};
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement, Window};

/// `TargetElement` over a live DOM node.
pub struct DomElement {
    element: HtmlElement,
}

impl DomElement {
    pub fn new(element: HtmlElement) -> Self {
        Self { element }
    }

    pub fn element(&self) -> &HtmlElement {
        &self.element
    }

    /// Recovers the DOM node behind a section target created by this host.
    pub fn of(target: &dyn TargetElement) -> Option<&HtmlElement> {
        target
            .as_any()
            .downcast_ref::<DomElement>()
            .map(DomElement::element)
    }

    fn document(&self) -> Option<Document> {
        self.element.owner_document()
    }

    fn append(&self, tag: &str, class: &str, text: Option<&str>) -> Option<HtmlElement> {
        let el = self
            .document()?
            .create_element(tag)
            .ok()?
            .dyn_into::<HtmlElement>()
            .ok()?;
        el.set_class_name(class);
        if let Some(text) = text {
            el.set_text_content(Some(text));
        }
        self.element.append_child(&el).ok()?;
        Some(el)
    }
}

impl TargetElement for DomElement {
    fn describe(&self) -> String {
        let id = self.element.id();
        if id.is_empty() {
            format!("<{}>", self.element.tag_name().to_lowercase())
        } else {
            format!("#{id}")
        }
    }

    fn data_attribute(&self, name: &str) -> Option<String> {
        self.element.get_attribute(&format!("data-{name}"))
    }

    fn set_data_attribute(&self, name: &str, value: &str) {
        let _ = self.element.set_attribute(&format!("data-{name}"), value);
    }

    fn remove_data_attribute(&self, name: &str) {
        let _ = self.element.remove_attribute(&format!("data-{name}"));
    }

    fn add_class(&self, class: &str) {
        let _ = self.element.class_list().add_1(class);
    }

    fn remove_class(&self, class: &str) {
        let _ = self.element.class_list().remove_1(class);
    }

    fn render(&self, view: &SectionView) {
        self.clear();
        match view {
            SectionView::MissingToken { message } => {
                self.append("div", "scrolly-notice", Some(message.as_str()));
            }
            SectionView::Static { title, message } => {
                if let Some(notice) = self.append("div", "scrolly-notice", None) {
                    let inner = DomElement::new(notice);
                    inner.append("h3", "scrolly-title", Some(title.as_str()));
                    inner.append("p", "scrolly-message", Some(message.as_str()));
                }
            }
            SectionView::Surface => {
                self.append("div", "scrolly-map", None);
                if let Some(bar) = self.append("div", "scrolly-progress", None) {
                    DomElement::new(bar).append("div", "scrolly-progress-fill", None);
                }
                self.append("div", "scrolly-label", Some("0%"));
            }
        }
    }

    fn clear(&self) {
        self.element.set_inner_html("");
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct DomResolver {
    document: Document,
}

impl DomResolver {
    pub fn new(document: Document) -> Self {
        Self { document }
    }
}

impl TargetResolver for DomResolver {
    fn query(&self, selector: &str) -> Option<Rc<dyn TargetElement>> {
        let element = self
            .document
            .query_selector(selector)
            .ok()??
            .dyn_into::<HtmlElement>()
            .ok()?;
        Some(Rc::new(DomElement::new(element)) as Rc<dyn TargetElement>)
    }
}

/// `prefers-reduced-motion` media query.
pub struct MediaQueryMotion {
    window: Window,
}

impl MediaQueryMotion {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl MotionPreference for MediaQueryMotion {
    fn prefers_reduced_motion(&self) -> bool {
        self.window
            .match_media("(prefers-reduced-motion: reduce)")
            .ok()
            .flatten()
            .is_some_and(|query| query.matches())
    }
}

/// Appends one `<style data-scrolly="key">` element per stylesheet.
pub struct DocumentStyles {
    document: Document,
}

impl DocumentStyles {
    pub fn new(document: Document) -> Self {
        Self { document }
    }
}

impl StyleInjector for DocumentStyles {
    fn inject(&self, key: &str, css: &str) {
        let Some(head) = self.document.head() else {
            tracing::warn!(key, "document has no <head>; stylesheet skipped");
            return;
        };
        let Ok(style) = self.document.create_element("style") else {
            return;
        };
        let _ = style.set_attribute("data-scrolly", key);
        style.set_text_content(Some(css));
        let _ = head.append_child(&style);
    }
}

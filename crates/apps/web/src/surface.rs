use std::cell::RefCell;
use std::f64::consts::TAU;
use std::rc::Rc;

use foundation::math::{LngLat, Path};
use formats::Trail;
use futures_util::future::LocalBoxFuture;
use scrub::ScrubFrame;
use sections::host::{RenderSurface, SurfaceError, SurfaceFactory, SurfaceRequest};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlElement};

use crate::dom::DomElement;
use crate::projection::Projection;

const PADDING_PX: f64 = 24.0;
const TRAIL_COLOR: &str = "#9aa5b1";
const REVEAL_COLOR: &str = "#e4572e";

fn unavailable(err: JsValue) -> SurfaceError {
    SurfaceError::Unavailable(format!("{err:?}"))
}

/// Renders trails onto a 2D canvas inside the section's `.scrolly-map`.
#[derive(Default)]
pub struct CanvasSurfaceFactory;

impl CanvasSurfaceFactory {
    fn build(request: &SurfaceRequest) -> Result<CanvasSurface, SurfaceError> {
        let container = DomElement::of(&*request.container)
            .ok_or_else(|| SurfaceError::Unavailable("container is not a DOM element".into()))?;
        let document = container
            .owner_document()
            .ok_or_else(|| SurfaceError::Unavailable("container is detached".into()))?;
        let find = |selector: &str| -> Option<HtmlElement> {
            container
                .query_selector(selector)
                .ok()
                .flatten()
                .and_then(|e| e.dyn_into::<HtmlElement>().ok())
        };
        let host = find(".scrolly-map").unwrap_or_else(|| container.clone());

        let canvas = document
            .create_element("canvas")
            .map_err(unavailable)?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| SurfaceError::Unavailable("canvas element rejected".into()))?;
        let width = match host.client_width() {
            w if w > 0 => w as u32,
            _ => 800,
        };
        let height = match host.client_height() {
            h if h > 0 => h as u32,
            _ => 600,
        };
        canvas.set_width(width);
        canvas.set_height(height);
        host.append_child(&canvas).map_err(unavailable)?;

        let ctx = canvas
            .get_context("2d")
            .map_err(unavailable)?
            .ok_or_else(|| SurfaceError::Unavailable("2d context unsupported".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(unavailable)?;

        tracing::debug!(
            width,
            height,
            center = ?request.center,
            zoom = request.zoom,
            "canvas surface ready"
        );
        Ok(CanvasSurface {
            canvas,
            ctx,
            fill: find(".scrolly-progress-fill"),
            label: find(".scrolly-label"),
            center: request.center,
            drawn: RefCell::new(None),
        })
    }
}

impl SurfaceFactory for CanvasSurfaceFactory {
    fn create(
        &self,
        request: SurfaceRequest,
    ) -> LocalBoxFuture<'static, Result<Rc<dyn RenderSurface>, SurfaceError>> {
        // A 2D canvas needs no credential; the token only gates the mount.
        let built = Self::build(&request).map(|s| Rc::new(s) as Rc<dyn RenderSurface>);
        Box::pin(async move { built })
    }
}

struct DrawnTrail {
    path: Path,
    projection: Projection,
}

pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    fill: Option<HtmlElement>,
    label: Option<HtmlElement>,
    center: LngLat,
    drawn: RefCell<Option<DrawnTrail>>,
}

impl CanvasSurface {
    fn stroke(&self, projection: &Projection, points: &[LngLat], color: &str, width: f64) {
        let Some((head, rest)) = points.split_first() else {
            return;
        };
        self.ctx.begin_path();
        let (x, y) = projection.project(*head);
        self.ctx.move_to(x, y);
        for p in rest {
            let (x, y) = projection.project(*p);
            self.ctx.line_to(x, y);
        }
        self.ctx.set_stroke_style_str(color);
        self.ctx.set_line_width(width);
        self.ctx.stroke();
    }

    fn redraw(&self, frame: Option<&ScrubFrame>) {
        let w = f64::from(self.canvas.width());
        let h = f64::from(self.canvas.height());
        self.ctx.clear_rect(0.0, 0.0, w, h);

        let drawn = self.drawn.borrow();
        let Some(drawn) = drawn.as_ref() else {
            return;
        };
        self.ctx.set_global_alpha(1.0);
        self.stroke(&drawn.projection, drawn.path.points(), TRAIL_COLOR, 3.0);

        let Some(frame) = frame else {
            return;
        };
        self.ctx.set_global_alpha(frame.reveal_opacity);
        let revealed = drawn.path.prefix_at_progress(frame.progress);
        self.stroke(&drawn.projection, &revealed, REVEAL_COLOR, 4.0);
        self.ctx.set_global_alpha(1.0);

        if frame.marker_visible {
            let (x, y) = drawn.projection.project(frame.marker_position);
            self.ctx.begin_path();
            let _ = self.ctx.arc(x, y, 6.0, 0.0, TAU);
            self.ctx.set_fill_style_str(REVEAL_COLOR);
            self.ctx.fill();
            self.ctx.set_stroke_style_str("#ffffff");
            self.ctx.set_line_width(2.0);
            self.ctx.stroke();
        }
    }
}

impl RenderSurface for CanvasSurface {
    fn show_trail(&self, trail: &Trail) -> Result<(), SurfaceError> {
        let w = f64::from(self.canvas.width());
        let h = f64::from(self.canvas.height());
        let projection = Projection::fit(trail.path.points(), w, h, PADDING_PX)
            .ok_or_else(|| SurfaceError::Render("trail has no points".into()))?;
        tracing::debug!(
            trail = trail.name().unwrap_or("unnamed"),
            center = ?self.center,
            "drawing trail"
        );
        *self.drawn.borrow_mut() = Some(DrawnTrail {
            path: trail.path.clone(),
            projection,
        });
        self.redraw(None);
        Ok(())
    }

    fn apply_frame(&self, frame: &ScrubFrame) {
        self.redraw(Some(frame));
        if let Some(fill) = &self.fill {
            let _ = fill
                .style()
                .set_property("width", &format!("{}%", frame.fill_percent));
        }
        if let Some(label) = &self.label {
            label.set_text_content(Some(&frame.label));
        }
    }

    fn dispose(&self) -> Result<(), SurfaceError> {
        self.drawn.borrow_mut().take();
        self.canvas.remove();
        Ok(())
    }
}

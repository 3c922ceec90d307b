use std::cell::RefCell;
use std::rc::Rc;

use foundation::math::{LngLat, Path, clamp_progress};

/// Visual state derived from one progress value.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrubFrame {
    /// Clamped progress in `[0, 1]`.
    pub progress: f64,
    /// Opacity of the revealed-path layer.
    pub reveal_opacity: f64,
    /// Marker position at `total_length * progress`.
    pub marker_position: LngLat,
    pub marker_visible: bool,
    /// Width of the progress bar fill, `0..=100`.
    pub fill_percent: f64,
    /// Human readable progress, e.g. `"42%"`.
    pub label: String,
}

/// Pure frame computation shared by scroll updates and manual seeks.
pub fn compute_frame(path: &Path, progress: f64, marker_visible: bool) -> ScrubFrame {
    let progress = clamp_progress(progress);
    let fill_percent = progress * 100.0;
    ScrubFrame {
        progress,
        reveal_opacity: progress,
        marker_position: path.at_progress(progress),
        marker_visible,
        fill_percent,
        label: format!("{}%", fill_percent.round() as u32),
    }
}

/// Receives every frame the driver produces.
pub trait FrameSink {
    fn apply_frame(&self, frame: &ScrubFrame);
}

#[derive(Debug)]
struct DriverState {
    progress: f64,
    marker_visible: bool,
    updates: u64,
}

/// Owns the progress value for one animated mount and pushes a recomputed
/// [`ScrubFrame`] to its sink on every change.
pub struct ProgressDriver {
    path: Path,
    sink: Rc<dyn FrameSink>,
    state: RefCell<DriverState>,
}

impl std::fmt::Debug for ProgressDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressDriver")
            .field("points", &self.path.points().len())
            .field("state", &self.state.borrow())
            .finish()
    }
}

impl ProgressDriver {
    /// Creates the driver at progress `0` and emits the initial frame.
    pub fn new(path: Path, sink: Rc<dyn FrameSink>) -> Self {
        let driver = Self {
            path,
            sink,
            state: RefCell::new(DriverState {
                progress: 0.0,
                marker_visible: true,
                updates: 0,
            }),
        };
        driver.update(0.0);
        driver
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn progress(&self) -> f64 {
        self.state.borrow().progress
    }

    pub fn marker_visible(&self) -> bool {
        self.state.borrow().marker_visible
    }

    /// Number of frames pushed to the sink so far.
    pub fn update_count(&self) -> u64 {
        self.state.borrow().updates
    }

    pub fn current_frame(&self) -> ScrubFrame {
        let state = self.state.borrow();
        compute_frame(&self.path, state.progress, state.marker_visible)
    }

    pub fn update(&self, progress: f64) -> ScrubFrame {
        self.state.borrow_mut().progress = clamp_progress(progress);
        self.emit()
    }

    pub fn seek_to_start(&self) -> ScrubFrame {
        self.update(0.0)
    }

    pub fn seek_to_end(&self) -> ScrubFrame {
        self.update(1.0)
    }

    /// Shows or hides the marker without touching progress.
    pub fn set_marker_visible(&self, visible: bool) -> ScrubFrame {
        self.state.borrow_mut().marker_visible = visible;
        self.emit()
    }

    fn emit(&self) -> ScrubFrame {
        let frame = {
            let mut state = self.state.borrow_mut();
            state.updates += 1;
            compute_frame(&self.path, state.progress, state.marker_visible)
        };
        tracing::trace!(progress = frame.progress, "scrub frame");
        self.sink.apply_frame(&frame);
        frame
    }
}

use std::cell::RefCell;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use formats::{Trail, default_trail};
use scrub::{FrameSink, ProgressDriver, ScrubFrame};
use sections::OrchestratorOptions;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

const DEFAULT_STEPS: usize = 10;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let mut args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(usage());
    }

    let cmd = args[1].clone();
    args.drain(0..2);

    let output = match cmd.as_str() {
        "path-info" => cmd_path_info(args)?,
        "scrub" => cmd_scrub(args)?,
        "check-config" => cmd_check_config(args)?,
        _ => return Err(usage()),
    };
    println!("{output}");
    Ok(())
}

/// Reads a trail file, falling back to the embedded trail when the file is
/// missing or unparseable.
fn load_trail(path: Option<&PathBuf>) -> Trail {
    let Some(path) = path else {
        return default_trail();
    };
    let parsed = fs::read_to_string(path)
        .map_err(|e| format!("read {path:?}: {e}"))
        .and_then(|s| Trail::from_geojson_str(&s).map_err(|e| format!("parse {path:?}: {e}")));
    match parsed {
        Ok(trail) => trail,
        Err(e) => {
            tracing::warn!(error = %e, "using embedded trail");
            default_trail()
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
struct PathInfo {
    name: Option<String>,
    points: usize,
    total_length_m: f64,
    start: [f64; 2],
    end: [f64; 2],
}

fn path_info(trail: &Trail) -> PathInfo {
    let first = trail.path.first();
    let last = trail.path.last();
    PathInfo {
        name: trail.name().map(str::to_string),
        points: trail.path.points().len(),
        total_length_m: trail.path.total_length_m(),
        start: [first.lon_deg, first.lat_deg],
        end: [last.lon_deg, last.lat_deg],
    }
}

fn cmd_path_info(args: Vec<String>) -> Result<String, String> {
    // scrolly path-info [trail.geojson]
    if args.len() > 1 {
        return Err(usage());
    }
    let trail = load_trail(args.first().map(PathBuf::from).as_ref());
    serde_json::to_string_pretty(&path_info(&trail)).map_err(|e| e.to_string())
}

#[derive(Default)]
struct CollectFrames {
    frames: RefCell<Vec<ScrubFrame>>,
}

impl FrameSink for CollectFrames {
    fn apply_frame(&self, frame: &ScrubFrame) {
        self.frames.borrow_mut().push(frame.clone());
    }
}

#[derive(Debug, Serialize)]
struct FrameRow {
    progress: f64,
    marker: [f64; 2],
    marker_visible: bool,
    reveal_opacity: f64,
    label: String,
}

impl From<&ScrubFrame> for FrameRow {
    fn from(frame: &ScrubFrame) -> Self {
        Self {
            progress: frame.progress,
            marker: [frame.marker_position.lon_deg, frame.marker_position.lat_deg],
            marker_visible: frame.marker_visible,
            reveal_opacity: frame.reveal_opacity,
            label: frame.label.clone(),
        }
    }
}

/// Drives `steps + 1` evenly spaced updates through a progress driver and
/// returns the frames it produced, skipping the initial frame.
fn scrub_frames(trail: &Trail, steps: usize, marker_visible: bool) -> Vec<ScrubFrame> {
    let sink = Rc::new(CollectFrames::default());
    let driver = ProgressDriver::new(trail.path.clone(), sink.clone());
    if !marker_visible {
        driver.set_marker_visible(false);
    }
    sink.frames.borrow_mut().clear();
    for i in 0..=steps {
        driver.update(i as f64 / steps as f64);
    }
    sink.frames.take()
}

fn cmd_scrub(args: Vec<String>) -> Result<String, String> {
    // scrolly scrub [trail.geojson] [--steps N] [--hide-marker]
    let mut trail_path: Option<PathBuf> = None;
    let mut steps = DEFAULT_STEPS;
    let mut marker_visible = true;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--steps" => {
                i += 1;
                let raw = args
                    .get(i)
                    .ok_or_else(|| "--steps requires a value".to_string())?;
                steps = raw
                    .parse()
                    .map_err(|_| format!("--steps expects a positive integer, got {raw}"))?;
                if steps == 0 {
                    return Err("--steps must be at least 1".to_string());
                }
            }
            "--hide-marker" => marker_visible = false,
            s if s.starts_with('-') => {
                return Err(format!("unknown arg: {s}\n\n{}", usage()));
            }
            s => {
                if trail_path.is_some() {
                    return Err(format!("unexpected arg: {s}\n\n{}", usage()));
                }
                trail_path = Some(PathBuf::from(s));
            }
        }
        i += 1;
    }

    let trail = load_trail(trail_path.as_ref());
    let rows: Vec<String> = scrub_frames(&trail, steps, marker_visible)
        .iter()
        .map(|f| serde_json::to_string(&FrameRow::from(f)).map_err(|e| e.to_string()))
        .collect::<Result<_, _>>()?;
    Ok(rows.join("\n"))
}

fn cmd_check_config(args: Vec<String>) -> Result<String, String> {
    // scrolly check-config <options.json>
    let [path] = args.as_slice() else {
        return Err(usage());
    };
    let payload = fs::read_to_string(path).map_err(|e| format!("read {path}: {e}"))?;
    let options =
        OrchestratorOptions::from_json_str(&payload).map_err(|e| format!("{path}: {e}"))?;
    Ok(format!(
        "ok: preloadMargin={} debug={}",
        options.preload_margin, options.debug
    ))
}

fn usage() -> String {
    [
        "usage:",
        "  scrolly path-info [trail.geojson]",
        "  scrolly scrub [trail.geojson] [--steps N] [--hide-marker]",
        "  scrolly check-config <options.json>",
        "",
        "Without a trail file (or with an unreadable one) the embedded Highland Mary trail is used.",
    ]
    .join("\n")
}

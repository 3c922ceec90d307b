use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Offset along one axis, measured from the top edge.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Offset {
    /// Fraction of the measured length (`top` = 0, `center` = 0.5, `bottom` = 1).
    Fraction(f64),
    Px(f64),
}

impl Offset {
    pub fn resolve(self, length: f64) -> f64 {
        match self {
            Offset::Fraction(f) => f * length,
            Offset::Px(px) => px,
        }
    }
}

impl FromStr for Offset {
    type Err = TriggerParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "top" => return Ok(Offset::Fraction(0.0)),
            "center" => return Ok(Offset::Fraction(0.5)),
            "bottom" => return Ok(Offset::Fraction(1.0)),
            _ => {}
        }
        let number = |n: &str| {
            n.trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| TriggerParseError::BadOffset(s.to_string()))
        };
        if let Some(pct) = s.strip_suffix('%') {
            return Ok(Offset::Fraction(number(pct)? / 100.0));
        }
        if let Some(px) = s.strip_suffix("px") {
            return Ok(Offset::Px(number(px)?));
        }
        Err(TriggerParseError::BadOffset(s.to_string()))
    }
}

impl std::fmt::Display for Offset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Offset::Fraction(v) if v == 0.0 => write!(f, "top"),
            Offset::Fraction(v) if v == 0.5 => write!(f, "center"),
            Offset::Fraction(v) if v == 1.0 => write!(f, "bottom"),
            Offset::Fraction(v) => write!(f, "{}%", v * 100.0),
            Offset::Px(px) => write!(f, "{px}px"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerParseError {
    BadOffset(String),
    WrongArity(String),
}

impl std::fmt::Display for TriggerParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerParseError::BadOffset(s) => write!(f, "invalid trigger offset: {s:?}"),
            TriggerParseError::WrongArity(s) => {
                write!(f, "trigger position needs \"<element> <viewport>\", got {s:?}")
            }
        }
    }
}

impl std::error::Error for TriggerParseError {}

/// The moment a given point of the element meets a given point of the
/// viewport, written `"<element> <viewport>"` (e.g. `"top center"`).
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TriggerPosition {
    pub element: Offset,
    pub viewport: Offset,
}

impl TriggerPosition {
    pub fn new(element: Offset, viewport: Offset) -> Self {
        Self { element, viewport }
    }

    /// Remaining scroll distance until this position is reached; negative once
    /// it has been passed.
    fn remaining(&self, rect: ElementRect, viewport_height: f64) -> f64 {
        rect.top + self.element.resolve(rect.height) - self.viewport.resolve(viewport_height)
    }
}

impl FromStr for TriggerPosition {
    type Err = TriggerParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        let [element, viewport] = parts.as_slice() else {
            return Err(TriggerParseError::WrongArity(s.to_string()));
        };
        Ok(Self::new(element.parse()?, viewport.parse()?))
    }
}

impl TryFrom<String> for TriggerPosition {
    type Error = TriggerParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TriggerPosition> for String {
    fn from(p: TriggerPosition) -> Self {
        p.to_string()
    }
}

impl std::fmt::Display for TriggerPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.element, self.viewport)
    }
}

/// Element bounds relative to the viewport, as reported by the host.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ElementRect {
    pub top: f64,
    pub height: f64,
}

impl ElementRect {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }
}

/// Scroll window over which progress runs from 0 to 1.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollRange {
    pub start: TriggerPosition,
    pub end: TriggerPosition,
}

impl Default for ScrollRange {
    fn default() -> Self {
        Self {
            start: TriggerPosition::new(Offset::Fraction(0.0), Offset::Fraction(0.5)),
            end: TriggerPosition::new(Offset::Fraction(1.0), Offset::Fraction(0.5)),
        }
    }
}

impl ScrollRange {
    pub fn new(start: TriggerPosition, end: TriggerPosition) -> Self {
        Self { start, end }
    }

    /// Progress in `[0, 1]` for the element's current viewport rect.
    pub fn progress_at(&self, rect: ElementRect, viewport_height: f64) -> f64 {
        let to_start = self.start.remaining(rect, viewport_height);
        let to_end = self.end.remaining(rect, viewport_height);
        let span = to_end - to_start;
        if !span.is_finite() || span <= 0.0 {
            return if to_start <= 0.0 { 1.0 } else { 0.0 };
        }
        (-to_start / span).clamp(0.0, 1.0)
    }
}

use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum MarginLength {
    Px(f64),
    Percent(f64),
}

impl FromStr for MarginLength {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ConfigError::Margin(s.to_string());
        let number = |n: &str| {
            n.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(bad)
        };
        if let Some(px) = s.strip_suffix("px") {
            return Ok(MarginLength::Px(number(px)?));
        }
        if let Some(pct) = s.strip_suffix('%') {
            return Ok(MarginLength::Percent(number(pct)?));
        }
        // Unitless zero is the only bare number CSS accepts.
        if number(s)? == 0.0 {
            return Ok(MarginLength::Px(0.0));
        }
        Err(bad())
    }
}

impl std::fmt::Display for MarginLength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarginLength::Px(v) => write!(f, "{v}px"),
            MarginLength::Percent(v) => write!(f, "{v}%"),
        }
    }
}

/// Viewport expansion used when detecting section proximity, written with
/// CSS margin shorthand (`"200px"`, `"10% 0px"`, `"1px 2px 3px 4px"`).
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RootMargin {
    pub top: MarginLength,
    pub right: MarginLength,
    pub bottom: MarginLength,
    pub left: MarginLength,
}

impl RootMargin {
    pub fn uniform(length: MarginLength) -> Self {
        Self {
            top: length,
            right: length,
            bottom: length,
            left: length,
        }
    }
}

impl Default for RootMargin {
    fn default() -> Self {
        Self::uniform(MarginLength::Px(200.0))
    }
}

impl FromStr for RootMargin {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split_whitespace()
            .map(str::parse)
            .collect::<Result<Vec<MarginLength>, _>>()?;
        let (top, right, bottom, left) = match parts.as_slice() {
            [a] => (*a, *a, *a, *a),
            [v, h] => (*v, *h, *v, *h),
            [t, h, b] => (*t, *h, *b, *h),
            [t, r, b, l] => (*t, *r, *b, *l),
            _ => return Err(ConfigError::Margin(s.to_string())),
        };
        Ok(Self {
            top,
            right,
            bottom,
            left,
        })
    }
}

impl std::fmt::Display for RootMargin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.top == self.right && self.top == self.bottom && self.top == self.left {
            return write!(f, "{}", self.top);
        }
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}

impl TryFrom<String> for RootMargin {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<RootMargin> for String {
    fn from(m: RootMargin) -> Self {
        m.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Margin(String),
    Json(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Margin(s) => write!(f, "invalid preload margin: {s:?}"),
            ConfigError::Json(e) => write!(f, "invalid options JSON: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Orchestrator-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrchestratorOptions {
    pub preload_margin: RootMargin,
    /// Records registration and load events in diagnostics.
    pub debug: bool,
}

impl OrchestratorOptions {
    pub fn from_json_str(payload: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(payload).map_err(|e| ConfigError::Json(e.to_string()))
    }
}

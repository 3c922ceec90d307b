use foundation::math::{LngLat, Path, PathError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// URL a trail section fetches when its config does not name one.
pub const DEFAULT_TRAIL_URL: &str = "/data/trails/highland-mary.geojson";

const HIGHLAND_MARY_GEOJSON: &str = include_str!("../assets/highland-mary.geojson");

/// Descriptive feature properties. Carried through for display; none of them
/// participate in path interpolation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrailProperties {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub length_miles: Option<f64>,
    #[serde(default)]
    pub elevation_gain_ft: Option<f64>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trail {
    pub properties: TrailProperties,
    pub path: Path,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrailError {
    Json(String),
    NotAFeatureCollection,
    NoLineFeature,
    InvalidFeature { index: usize, reason: String },
    InvalidPath { index: usize, source: PathError },
}

impl std::fmt::Display for TrailError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrailError::Json(e) => write!(f, "JSON parse error: {e}"),
            TrailError::NotAFeatureCollection => write!(f, "expected GeoJSON FeatureCollection"),
            TrailError::NoLineFeature => write!(f, "collection has no LineString feature"),
            TrailError::InvalidFeature { index, reason } => {
                write!(f, "invalid feature at index {index}: {reason}")
            }
            TrailError::InvalidPath { index, source } => {
                write!(f, "invalid trail path at index {index}: {source}")
            }
        }
    }
}

impl std::error::Error for TrailError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TrailError::InvalidPath { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl TrailProperties {
    /// Typed fields that do not parse are kept verbatim in `other` rather than
    /// rejecting the feature.
    pub fn from_map(props: &Map<String, Value>) -> Self {
        let mut out = TrailProperties::default();
        for (key, value) in props {
            let parsed = match key.as_str() {
                "name" => typed(value).map(|v| out.name = v),
                "difficulty" => typed(value).map(|v| out.difficulty = v),
                "length_miles" => typed(value).map(|v| out.length_miles = v),
                "elevation_gain_ft" => typed(value).map(|v| out.elevation_gain_ft = v),
                _ => None,
            };
            if parsed.is_none() {
                out.other.insert(key.clone(), value.clone());
            }
        }
        out
    }
}

fn typed<T: DeserializeOwned>(value: &Value) -> Option<T> {
    serde_json::from_value(value.clone()).ok()
}

impl Trail {
    pub fn name(&self) -> Option<&str> {
        self.properties.name.as_deref()
    }

    /// Parse the first line-shaped feature of a GeoJSON FeatureCollection.
    pub fn from_geojson_str(payload: &str) -> Result<Self, TrailError> {
        let value: Value =
            serde_json::from_str(payload).map_err(|e| TrailError::Json(e.to_string()))?;
        Self::from_geojson_value(&value)
    }

    pub fn from_geojson_value(value: &Value) -> Result<Self, TrailError> {
        let obj = value.as_object().ok_or(TrailError::NotAFeatureCollection)?;
        if obj.get("type").and_then(|v| v.as_str()) != Some("FeatureCollection") {
            return Err(TrailError::NotAFeatureCollection);
        }
        let features = obj
            .get("features")
            .and_then(|v| v.as_array())
            .ok_or(TrailError::NotAFeatureCollection)?;

        for (index, feature) in features.iter().enumerate() {
            let Some(coords) = line_coordinates(feature) else {
                continue;
            };
            let points = parse_points(coords)
                .map_err(|reason| TrailError::InvalidFeature { index, reason })?;
            let path = Path::new(points).map_err(|source| TrailError::InvalidPath { index, source })?;

            let properties = match feature.get("properties") {
                Some(Value::Object(props)) => TrailProperties::from_map(props),
                _ => TrailProperties::default(),
            };

            return Ok(Self { properties, path });
        }

        Err(TrailError::NoLineFeature)
    }
}

/// The embedded Highland Mary trail used whenever trail data cannot be loaded.
pub fn default_trail() -> Trail {
    Trail::from_geojson_str(HIGHLAND_MARY_GEOJSON).expect("embedded trail asset is valid")
}

/// Coordinates of a `LineString` feature, or the first line of a
/// `MultiLineString`. `None` for any other geometry.
fn line_coordinates(feature: &Value) -> Option<&Value> {
    let geometry = feature.get("geometry")?.as_object()?;
    let coords = geometry.get("coordinates")?;
    match geometry.get("type")?.as_str()? {
        "LineString" => Some(coords),
        "MultiLineString" => coords.as_array()?.first(),
        _ => None,
    }
}

fn parse_points(coords: &Value) -> Result<Vec<LngLat>, String> {
    let arr = coords
        .as_array()
        .ok_or("coordinates must be an array".to_string())?;
    let mut out = Vec::with_capacity(arr.len());
    for item in arr {
        let pair = item
            .as_array()
            .ok_or("position must be an array".to_string())?;
        if pair.len() < 2 {
            return Err("position must have [lon, lat]".to_string());
        }
        let lon = pair[0].as_f64().ok_or("lon must be a number".to_string())?;
        let lat = pair[1].as_f64().ok_or("lat must be a number".to_string())?;
        out.push(LngLat::new(lon, lat));
    }
    Ok(out)
}

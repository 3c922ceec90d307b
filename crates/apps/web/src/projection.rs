use foundation::math::LngLat;

/// Equirectangular fit of a set of points into a canvas, longitude scaled by
/// the cosine of the mean latitude so short trails keep their shape.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Projection {
    origin: LngLat,
    lon_scale: f64,
    px_per_deg: f64,
    offset: (f64, f64),
}

impl Projection {
    pub fn fit(points: &[LngLat], width: f64, height: f64, padding: f64) -> Option<Self> {
        let first = points.first()?;
        let (mut min, mut max) = (*first, *first);
        for p in points {
            min.lon_deg = min.lon_deg.min(p.lon_deg);
            min.lat_deg = min.lat_deg.min(p.lat_deg);
            max.lon_deg = max.lon_deg.max(p.lon_deg);
            max.lat_deg = max.lat_deg.max(p.lat_deg);
        }

        let lon_scale = ((min.lat_deg + max.lat_deg) / 2.0).to_radians().cos();
        let span_x = (max.lon_deg - min.lon_deg) * lon_scale;
        let span_y = max.lat_deg - min.lat_deg;
        let avail_w = (width - 2.0 * padding).max(1.0);
        let avail_h = (height - 2.0 * padding).max(1.0);
        let px_per_deg = match (span_x > 0.0, span_y > 0.0) {
            (true, true) => (avail_w / span_x).min(avail_h / span_y),
            (true, false) => avail_w / span_x,
            (false, true) => avail_h / span_y,
            (false, false) => 1.0,
        };

        // Center the fitted box.
        let offset = (
            (width - span_x * px_per_deg) / 2.0,
            (height - span_y * px_per_deg) / 2.0,
        );
        Some(Self {
            origin: LngLat::new(min.lon_deg, max.lat_deg),
            lon_scale,
            px_per_deg,
            offset,
        })
    }

    /// Canvas pixel position; y grows downward.
    pub fn project(&self, p: LngLat) -> (f64, f64) {
        (
            self.offset.0 + (p.lon_deg - self.origin.lon_deg) * self.lon_scale * self.px_per_deg,
            self.offset.1 + (self.origin.lat_deg - p.lat_deg) * self.px_per_deg,
        )
    }
}

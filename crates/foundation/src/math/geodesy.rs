/// Mean Earth radius (meters), IUGG value.
pub const EARTH_MEAN_RADIUS_M: f64 = 6_371_008.8;

/// Geographic coordinate pair in degrees, GeoJSON axis order (lon, lat).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LngLat {
    pub lon_deg: f64,
    pub lat_deg: f64,
}

impl LngLat {
    pub fn new(lon_deg: f64, lat_deg: f64) -> Self {
        Self { lon_deg, lat_deg }
    }

    pub fn is_finite(&self) -> bool {
        self.lon_deg.is_finite() && self.lat_deg.is_finite()
    }

    /// Component-wise linear interpolation. `t` is not clamped.
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self {
            lon_deg: self.lon_deg + t * (other.lon_deg - self.lon_deg),
            lat_deg: self.lat_deg + t * (other.lat_deg - self.lat_deg),
        }
    }
}

impl From<[f64; 2]> for LngLat {
    fn from(v: [f64; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(p: LngLat) -> Self {
        [p.lon_deg, p.lat_deg]
    }
}

/// Great-circle distance (meters) using the haversine formula on a sphere of
/// radius [`EARTH_MEAN_RADIUS_M`].
pub fn haversine_distance_m(a: LngLat, b: LngLat) -> f64 {
    let lat_a = a.lat_deg.to_radians();
    let lat_b = b.lat_deg.to_radians();
    let d_lat = (b.lat_deg - a.lat_deg).to_radians();
    let d_lon = (b.lon_deg - a.lon_deg).to_radians();

    let h = (d_lat * 0.5).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon * 0.5).sin().powi(2);
    2.0 * EARTH_MEAN_RADIUS_M * h.sqrt().min(1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::{EARTH_MEAN_RADIUS_M, LngLat, haversine_distance_m};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn zero_distance_for_identical_points() {
        let p = LngLat::new(-107.5755, 37.7711);
        assert_eq!(haversine_distance_m(p, p), 0.0);
    }

    #[test]
    fn quarter_meridian_length() {
        let d = haversine_distance_m(LngLat::new(0.0, 0.0), LngLat::new(0.0, 90.0));
        assert_close(d, EARTH_MEAN_RADIUS_M * std::f64::consts::FRAC_PI_2, 1e-6);
    }

    #[test]
    fn one_degree_of_longitude_on_equator() {
        let d = haversine_distance_m(LngLat::new(0.0, 0.0), LngLat::new(1.0, 0.0));
        assert_close(d, 111_195.08, 0.1);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = LngLat::new(-107.575507, 37.771122);
        let b = LngLat::new(-107.58203, 37.76817);
        assert_close(haversine_distance_m(a, b), haversine_distance_m(b, a), 1e-9);
    }

    #[test]
    fn lerp_midpoint() {
        let m = LngLat::new(0.0, 10.0).lerp(LngLat::new(2.0, 20.0), 0.5);
        assert_eq!(m, LngLat::new(1.0, 15.0));
    }
}

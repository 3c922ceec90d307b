use super::geodesy::{LngLat, haversine_distance_m};

#[derive(Debug, Clone, PartialEq)]
pub enum PathError {
    TooFewPoints(usize),
    NonFinitePoint { index: usize },
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::TooFewPoints(n) => write!(f, "path needs at least 2 points, got {n}"),
            PathError::NonFinitePoint { index } => {
                write!(f, "path point {index} has a non-finite coordinate")
            }
        }
    }
}

impl std::error::Error for PathError {}

/// An ordered polyline of geographic points with cached cumulative lengths.
///
/// Lengths are geodesic (haversine) and the same metric is used for both
/// [`Path::total_length_m`] and [`Path::along`], so
/// `along(total_length_m() * p)` never drifts from the walked distance.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    points: Vec<LngLat>,
    /// `cumulative_m[i]` is the walked distance from `points[0]` to `points[i]`.
    cumulative_m: Vec<f64>,
}

impl Path {
    pub fn new(points: Vec<LngLat>) -> Result<Self, PathError> {
        if points.len() < 2 {
            return Err(PathError::TooFewPoints(points.len()));
        }
        if let Some(index) = points.iter().position(|p| !p.is_finite()) {
            return Err(PathError::NonFinitePoint { index });
        }

        let mut cumulative_m = Vec::with_capacity(points.len());
        let mut acc = 0.0;
        cumulative_m.push(acc);
        for pair in points.windows(2) {
            acc += haversine_distance_m(pair[0], pair[1]);
            cumulative_m.push(acc);
        }

        Ok(Self {
            points,
            cumulative_m,
        })
    }

    pub fn points(&self) -> &[LngLat] {
        &self.points
    }

    pub fn first(&self) -> LngLat {
        self.points[0]
    }

    pub fn last(&self) -> LngLat {
        self.points[self.points.len() - 1]
    }

    pub fn total_length_m(&self) -> f64 {
        self.cumulative_m[self.cumulative_m.len() - 1]
    }

    /// Position at `distance_m` along the path.
    ///
    /// Distances at or below zero return the first point and distances at or
    /// beyond the total length return the last point, both exactly.
    pub fn along(&self, distance_m: f64) -> LngLat {
        if distance_m.is_nan() || distance_m <= 0.0 {
            return self.first();
        }
        if distance_m >= self.total_length_m() {
            return self.last();
        }

        for i in 0..self.points.len() - 1 {
            let before = self.cumulative_m[i];
            let after = self.cumulative_m[i + 1];
            if after < distance_m {
                continue;
            }

            let segment_m = after - before;
            if segment_m <= 0.0 {
                return self.points[i];
            }
            let t = (distance_m - before) / segment_m;
            return self.points[i].lerp(self.points[i + 1], t);
        }

        self.last()
    }

    /// Position at a normalized progress value; see [`clamp_progress`].
    pub fn at_progress(&self, progress: f64) -> LngLat {
        let p = clamp_progress(progress);
        if p >= 1.0 {
            return self.last();
        }
        self.along(self.total_length_m() * p)
    }

    /// The walked part of the path at `progress`: every vertex already passed
    /// followed by the current position.
    pub fn prefix_at_progress(&self, progress: f64) -> Vec<LngLat> {
        let p = clamp_progress(progress);
        if p >= 1.0 {
            return self.points.clone();
        }
        let distance_m = self.total_length_m() * p;
        let passed = self
            .cumulative_m
            .iter()
            .take_while(|&&c| c < distance_m)
            .count()
            .max(1);
        let mut prefix = self.points[..passed].to_vec();
        prefix.push(self.along(distance_m));
        prefix
    }
}

/// Clamp a progress value into `[0, 1]`; NaN maps to `0`.
pub fn clamp_progress(progress: f64) -> f64 {
    if progress.is_nan() {
        return 0.0;
    }
    progress.clamp(0.0, 1.0)
}

/// Total geodesic length (meters) of an arbitrary point list.
pub fn path_length_m(points: &[LngLat]) -> f64 {
    points
        .windows(2)
        .map(|pair| haversine_distance_m(pair[0], pair[1]))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::{Path, PathError, clamp_progress, path_length_m};
    use crate::math::geodesy::{LngLat, haversine_distance_m};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn three_point_path() -> Path {
        Path::new(vec![
            LngLat::new(-107.575507, 37.771122),
            LngLat::new(-107.576451, 37.770138),
            LngLat::new(-107.581215, 37.769222),
        ])
        .expect("path")
    }

    #[test]
    fn rejects_short_paths() {
        assert_eq!(Path::new(vec![]), Err(PathError::TooFewPoints(0)));
        assert_eq!(
            Path::new(vec![LngLat::new(0.0, 0.0)]),
            Err(PathError::TooFewPoints(1))
        );
    }

    #[test]
    fn rejects_non_finite_points() {
        let err = Path::new(vec![LngLat::new(0.0, 0.0), LngLat::new(f64::NAN, 1.0)]);
        assert_eq!(err, Err(PathError::NonFinitePoint { index: 1 }));
    }

    #[test]
    fn total_length_matches_segment_sum() {
        let path = three_point_path();
        assert_close(path.total_length_m(), path_length_m(path.points()), 1e-9);
        assert!(path.total_length_m() > 0.0);
    }

    #[test]
    fn endpoints_are_exact() {
        let path = three_point_path();
        assert_eq!(path.at_progress(0.0), path.first());
        assert_eq!(path.at_progress(1.0), path.last());
        assert_eq!(path.along(-5.0), path.first());
        assert_eq!(path.along(path.total_length_m() * 2.0), path.last());
    }

    #[test]
    fn out_of_range_progress_is_clamped() {
        let path = three_point_path();
        assert_eq!(path.at_progress(-0.25), path.first());
        assert_eq!(path.at_progress(1.75), path.last());
        assert_eq!(path.at_progress(f64::NAN), path.first());
        assert_eq!(clamp_progress(f64::NAN), 0.0);
        assert_eq!(clamp_progress(0.4), 0.4);
    }

    #[test]
    fn two_point_scenario_reaches_last_point_exactly() {
        let path = Path::new(vec![
            LngLat::new(-107.5755, 37.7711),
            LngLat::new(-107.5765, 37.7701),
        ])
        .expect("path");
        assert_eq!(path.at_progress(1.0), LngLat::new(-107.5765, 37.7701));
    }

    #[test]
    fn half_progress_equals_walking_half_the_length() {
        let path = three_point_path();
        let pts = path.points();
        let half = path.total_length_m() / 2.0;

        // Walk by hand.
        let first_seg = haversine_distance_m(pts[0], pts[1]);
        let expected = if half <= first_seg {
            pts[0].lerp(pts[1], half / first_seg)
        } else {
            let second_seg = haversine_distance_m(pts[1], pts[2]);
            pts[1].lerp(pts[2], (half - first_seg) / second_seg)
        };

        let got = path.at_progress(0.5);
        assert_close(got.lon_deg, expected.lon_deg, 1e-12);
        assert_close(got.lat_deg, expected.lat_deg, 1e-12);
    }

    #[test]
    fn zero_length_segments_do_not_stall_the_walk() {
        let a = LngLat::new(0.0, 0.0);
        let b = LngLat::new(0.0, 1.0);
        let path = Path::new(vec![a, a, b]).expect("path");
        let mid = path.at_progress(0.5);
        assert_close(mid.lat_deg, 0.5, 1e-9);

        let degenerate = Path::new(vec![a, a]).expect("path");
        assert_eq!(degenerate.total_length_m(), 0.0);
        assert_eq!(degenerate.at_progress(0.5), a);
    }

    #[test]
    fn distance_on_a_vertex_returns_that_vertex() {
        let path = three_point_path();
        let pts = path.points();
        let d = haversine_distance_m(pts[0], pts[1]);
        let got = path.along(d);
        assert_close(got.lon_deg, pts[1].lon_deg, 1e-12);
        assert_close(got.lat_deg, pts[1].lat_deg, 1e-12);
    }

    #[test]
    fn prefix_follows_progress() {
        let path = three_point_path();
        assert_eq!(path.prefix_at_progress(1.0), path.points().to_vec());
        assert_eq!(path.prefix_at_progress(0.0), vec![path.first(), path.first()]);

        let mid = path.prefix_at_progress(0.5);
        assert_eq!(mid.first(), Some(&path.first()));
        assert_eq!(mid.last(), Some(&path.at_progress(0.5)));
        assert!(mid.len() >= 2 && mid.len() <= 3);
    }
}

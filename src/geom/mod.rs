//! 2D geometric primitives
//!
//! The polygon algebra every later stage builds on lives in
//! [`polygon`]; this module holds the few scalar helpers that do not
//! belong to any one shape.

mod polygon;

pub use polygon::Polygon;

use glam::DVec2;

/// Intersect two parametric lines `o1 + t1*d1` and `o2 + t2*d2`
///
/// Returns `(t1, t2)`, or `None` for (nearly) parallel lines.
pub(crate) fn intersect_lines(o1: DVec2, d1: DVec2, o2: DVec2, d2: DVec2) -> Option<(f64, f64)> {
    let denom = d1.perp_dot(d2);
    if denom.abs() < 1e-12 {
        return None;
    }
    let t2 = (d1.y * (o2.x - o1.x) - d1.x * (o2.y - o1.y)) / denom;
    let t1 = if d1.x.abs() > d1.y.abs() {
        (o2.x - o1.x + d2.x * t2) / d1.x
    } else {
        (o2.y - o1.y + d2.y * t2) / d1.y
    };
    Some((t1, t2))
}

/// Distance from point `p` to the segment `a + t*d`, `t` clamped to `[0, 1]`
pub(crate) fn distance_to_segment(a: DVec2, d: DVec2, p: DVec2) -> f64 {
    let len_sq = d.length_squared();
    if len_sq < 1e-18 {
        return a.distance(p);
    }
    let t = ((p - a).dot(d) / len_sq).clamp(0.0, 1.0);
    (a + d * t).distance(p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersect_lines() {
        // x-axis against a vertical line through (1, -1)
        let (t1, t2) = intersect_lines(
            DVec2::ZERO,
            DVec2::new(1.0, 0.0),
            DVec2::new(1.0, -1.0),
            DVec2::new(0.0, 1.0),
        )
        .unwrap();
        assert!((t1 - 1.0).abs() < 1e-12);
        assert!((t2 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_intersect_parallel() {
        let r = intersect_lines(
            DVec2::ZERO,
            DVec2::new(1.0, 1.0),
            DVec2::new(0.0, 1.0),
            DVec2::new(2.0, 2.0),
        );
        assert!(r.is_none());
    }

    #[test]
    fn test_distance_to_segment() {
        let a = DVec2::new(0.0, 0.0);
        let d = DVec2::new(10.0, 0.0);
        assert!((distance_to_segment(a, d, DVec2::new(5.0, 3.0)) - 3.0).abs() < 1e-12);
        // Beyond the endpoint the distance is to the endpoint itself
        assert!((distance_to_segment(a, d, DVec2::new(13.0, 4.0)) - 5.0).abs() < 1e-12);
    }
}

//! Value polygon algebra
//!
//! A [`Polygon`] is an ordered list of vertices in counter-clockwise order,
//! with the last vertex implicitly connected to the first. Everything the
//! building generator cuts, shrinks and smooths is a plain value polygon;
//! the identity-shared city mesh is a separate structure that resolves into
//! these for geometric work.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use glam::DVec2;

use super::intersect_lines;

/// A simple 2D polygon (counter-clockwise vertex order)
///
/// # Example
///
/// ```
/// use medieval_city::Polygon;
///
/// let square = Polygon::rect(2.0, 2.0);
/// assert!((square.area() - 4.0).abs() < 1e-9);
/// assert!(square.is_convex());
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polygon {
    vertices: Vec<DVec2>,
}

impl Polygon {
    /// Create a polygon from vertices (counter-clockwise)
    pub fn new(vertices: Vec<DVec2>) -> Self {
        Polygon { vertices }
    }

    /// Number of vertices
    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// True if the polygon has no vertices
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Vertices in counter-clockwise order
    #[inline]
    pub fn vertices(&self) -> &[DVec2] {
        &self.vertices
    }

    /// Edge `i`, from vertex `i` to vertex `i + 1` (wrapping)
    #[inline]
    pub fn edge(&self, i: usize) -> (DVec2, DVec2) {
        let n = self.vertices.len();
        (self.vertices[i], self.vertices[(i + 1) % n])
    }

    /// Iterate over all edges, wrapping from the last vertex to the first
    pub fn edges(&self) -> impl Iterator<Item = (DVec2, DVec2)> + '_ {
        (0..self.vertices.len()).map(move |i| self.edge(i))
    }

    /// Signed area via the shoelace formula (positive for counter-clockwise)
    pub fn signed_area(&self) -> f64 {
        if self.vertices.len() < 3 {
            return 0.0;
        }
        let mut s = 0.0;
        for (v0, v1) in self.edges() {
            s += v0.x * v1.y - v1.x * v0.y;
        }
        s * 0.5
    }

    /// Absolute area
    #[inline]
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Total edge length
    pub fn perimeter(&self) -> f64 {
        if self.vertices.len() < 2 {
            return 0.0;
        }
        self.edges().map(|(v0, v1)| v0.distance(v1)).sum()
    }

    /// Compactness `4*pi*area / perimeter^2`
    ///
    /// 1.0 for a circle, ~0.79 for a square, lower for elongated shapes.
    pub fn compactness(&self) -> f64 {
        let p = self.perimeter();
        if p == 0.0 {
            return 0.0;
        }
        4.0 * std::f64::consts::PI * self.area() / (p * p)
    }

    /// Vertex mean (fast center approximation)
    pub fn center(&self) -> DVec2 {
        if self.vertices.is_empty() {
            return DVec2::ZERO;
        }
        self.vertices.iter().sum::<DVec2>() / self.vertices.len() as f64
    }

    /// True area-weighted centroid (falls back to [`center`](Self::center)
    /// for degenerate polygons)
    pub fn centroid(&self) -> DVec2 {
        if self.vertices.len() < 3 {
            return self.center();
        }
        let mut a = 0.0;
        let mut c = DVec2::ZERO;
        for (v0, v1) in self.edges() {
            let f = v0.perp_dot(v1);
            a += f;
            c += (v0 + v1) * f;
        }
        if a.abs() < 1e-10 {
            return self.center();
        }
        c / (3.0 * a)
    }

    /// True if every vertex turn is a left turn
    pub fn is_convex(&self) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }
        for i in 0..n {
            let v0 = self.vertices[(i + n - 1) % n];
            let v = self.vertices[i];
            let v2 = self.vertices[(i + 1) % n];
            if (v - v0).perp_dot(v2 - v) <= 0.0 {
                return false;
            }
        }
        true
    }

    /// Index of the vertex starting the longest edge (first of equals)
    pub fn longest_edge(&self) -> usize {
        let mut best = 0;
        let mut best_len = -1.0;
        for (i, (v0, v1)) in self.edges().enumerate() {
            let len = v0.distance(v1);
            if len > best_len {
                best_len = len;
                best = i;
            }
        }
        best
    }

    /// Index of the vertex closest to a point
    pub fn closest_vertex(&self, p: DVec2) -> usize {
        let mut best = 0;
        let mut best_d = f64::INFINITY;
        for (i, v) in self.vertices.iter().enumerate() {
            let d = v.distance(p);
            if d < best_d {
                best_d = d;
                best = i;
            }
        }
        best
    }

    /// Minimal distance from any vertex to a point
    pub fn distance(&self, p: DVec2) -> f64 {
        self.vertices
            .iter()
            .map(|v| v.distance(p))
            .fold(f64::INFINITY, f64::min)
    }

    /// Smooth every vertex toward its neighbors: `(prev + f*v + next) / (2 + f)`
    ///
    /// Returns a fresh polygon; the input is untouched. Note that this is a
    /// contracting operator: repeated application pulls any polygon toward
    /// its center.
    pub fn smooth_vertex_eq(&self, f: f64) -> Polygon {
        let n = self.vertices.len();
        if n < 3 {
            return self.clone();
        }
        let vertices = (0..n)
            .map(|i| {
                let v0 = self.vertices[(i + n - 1) % n];
                let v1 = self.vertices[i];
                let v2 = self.vertices[(i + 1) % n];
                (v0 + v1 * f + v2) / (2.0 + f)
            })
            .collect();
        Polygon { vertices }
    }

    /// Rotate all vertices around the origin
    pub fn rotate(&mut self, angle: f64) {
        let rot = DVec2::from_angle(angle);
        for v in &mut self.vertices {
            *v = rot.rotate(*v);
        }
    }

    /// Translate all vertices
    pub fn offset(&mut self, delta: DVec2) {
        for v in &mut self.vertices {
            *v += delta;
        }
    }

    /// Inverse-distance weights of point `p` with respect to the vertices
    ///
    /// The weights sum to 1 and approximately reconstruct `p` as a convex
    /// combination of the vertices; used to interpolate per-vertex densities
    /// at a building's center.
    pub fn interpolate(&self, p: DVec2) -> Vec<f64> {
        let weights: Vec<f64> = self
            .vertices
            .iter()
            .map(|v| {
                let d = v.distance(p);
                if d > 0.0 {
                    1.0 / d
                } else {
                    1e10
                }
            })
            .collect();
        let total: f64 = weights.iter().sum();
        if total == 0.0 {
            return vec![0.0; self.vertices.len()];
        }
        weights.into_iter().map(|w| w / total).collect()
    }

    /// Split the polygon by the infinite line through `p1` and `p2`
    ///
    /// Returns two polygons when the line crosses the boundary exactly
    /// twice, ordered so that for a cut along an inward-offset edge the
    /// remainder comes first; otherwise returns the polygon unchanged.
    /// With `gap > 0` the line becomes a corridor of that total width and
    /// the strip between the halves is removed.
    pub fn cut(&self, p1: DVec2, p2: DVec2, gap: f64) -> Vec<Polygon> {
        let d1 = p2 - p1;
        let n = self.vertices.len();

        let mut edge1 = 0;
        let mut ratio1 = 0.0;
        let mut edge2 = 0;
        let mut ratio2 = 0.0;
        let mut count = 0;

        for i in 0..n {
            let (v0, v1) = self.edge(i);
            if let Some((t1, t2)) = intersect_lines(p1, d1, v0, v1 - v0) {
                if (0.0..=1.0).contains(&t2) {
                    match count {
                        0 => {
                            edge1 = i;
                            ratio1 = t1;
                        }
                        1 => {
                            edge2 = i;
                            ratio2 = t1;
                        }
                        _ => {}
                    }
                    count += 1;
                }
            }
        }

        if count != 2 {
            return vec![self.clone()];
        }

        let point1 = p1 + d1 * ratio1;
        let point2 = p1 + d1 * ratio2;

        let mut half1 = Vec::with_capacity(edge2 - edge1 + 2);
        half1.push(point1);
        half1.extend_from_slice(&self.vertices[edge1 + 1..=edge2]);
        half1.push(point2);

        let mut half2 = Vec::with_capacity(n - (edge2 - edge1) + 2);
        half2.push(point2);
        half2.extend_from_slice(&self.vertices[edge2 + 1..]);
        half2.extend_from_slice(&self.vertices[..=edge1]);
        half2.push(point1);

        let mut half1 = Polygon { vertices: half1 };
        let mut half2 = Polygon { vertices: half2 };

        if gap > 0.0 {
            half1 = half1.peel_last_edge(gap / 2.0);
            half2 = half2.peel_last_edge(gap / 2.0);
        }

        let (a0, a1) = self.edge(edge1);
        if d1.perp_dot(a1 - a0) > 0.0 {
            vec![half1, half2]
        } else {
            vec![half2, half1]
        }
    }

    /// Shrink the closing edge (last vertex to first) inward by `d`
    fn peel_last_edge(&self, d: f64) -> Polygon {
        let n = self.vertices.len();
        if n == 0 {
            return self.clone();
        }
        let mut dists = vec![0.0; n];
        dists[n - 1] = d;
        self.buffer(&dists)
    }

    /// Inset every edge by its distance and re-intersect the neighbors
    ///
    /// Valid for convex polygons; the caller checks
    /// [`is_convex`](Self::is_convex) and falls back to
    /// [`buffer`](Self::buffer) otherwise.
    pub fn shrink(&self, dists: &[f64]) -> Polygon {
        self.buffer(dists)
    }

    /// Shrink every edge by the same distance
    pub fn shrink_eq(&self, d: f64) -> Polygon {
        self.shrink(&vec![d; self.vertices.len()])
    }

    /// Generalized inset for possibly non-convex polygons
    ///
    /// Each edge moves inward along its left normal by its distance; each
    /// output vertex is the intersection of the two adjacent offset edges,
    /// falling back to the plain offset point when they are parallel.
    pub fn buffer(&self, dists: &[f64]) -> Polygon {
        let n = self.vertices.len();
        if n < 3 {
            return self.clone();
        }

        // Offset line per edge: origin and direction
        let lines: Vec<(DVec2, DVec2)> = (0..n)
            .map(|i| {
                let (v0, v1) = self.edge(i);
                let dir = v1 - v0;
                let d = dists.get(i).copied().unwrap_or(0.0);
                let normal = dir.perp().normalize_or_zero() * d;
                (v0 + normal, dir)
            })
            .collect();

        let vertices = (0..n)
            .map(|i| {
                let (po, pd) = lines[(i + n - 1) % n];
                let (o, d) = lines[i];
                match intersect_lines(po, pd, o, d) {
                    Some((t1, _)) => po + pd * t1,
                    None => o,
                }
            })
            .collect();

        Polygon { vertices }
    }

    /// Buffer every edge by the same distance
    pub fn buffer_eq(&self, d: f64) -> Polygon {
        self.buffer(&vec![d; self.vertices.len()])
    }

    /// Axis-aligned rectangle centered at the origin
    pub fn rect(w: f64, h: f64) -> Polygon {
        Polygon {
            vertices: vec![
                DVec2::new(-w / 2.0, -h / 2.0),
                DVec2::new(w / 2.0, -h / 2.0),
                DVec2::new(w / 2.0, h / 2.0),
                DVec2::new(-w / 2.0, h / 2.0),
            ],
        }
    }

    /// Regular polygon with `n` vertices and circumradius `r`
    pub fn regular(n: usize, r: f64) -> Polygon {
        let vertices = (0..n)
            .map(|i| {
                let a = i as f64 / n as f64 * std::f64::consts::TAU;
                DVec2::new(r * a.cos(), r * a.sin())
            })
            .collect();
        Polygon { vertices }
    }

    /// 16-gon approximation of a circle with radius `r`
    pub fn circle(r: f64) -> Polygon {
        Polygon::regular(16, r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Polygon {
        Polygon::new(vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(0.0, 1.0),
        ])
    }

    #[test]
    fn test_area_and_perimeter() {
        let sq = unit_square();
        assert!((sq.signed_area() - 1.0).abs() < 1e-12);
        assert!((sq.perimeter() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_compactness_ordering() {
        // circle > square > elongated rectangle
        let circle = Polygon::circle(1.0);
        let square = Polygon::rect(1.0, 1.0);
        let sliver = Polygon::rect(10.0, 0.5);
        assert!(circle.compactness() > 0.97);
        assert!(square.compactness() < circle.compactness());
        assert!(sliver.compactness() < square.compactness());
    }

    #[test]
    fn test_centroid_of_square() {
        let sq = unit_square();
        let c = sq.centroid();
        assert!((c - DVec2::new(0.5, 0.5)).length() < 1e-12);
    }

    #[test]
    fn test_is_convex() {
        assert!(unit_square().is_convex());
        let concave = Polygon::new(vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(2.0, 2.0),
            DVec2::new(1.0, 0.5),
            DVec2::new(0.0, 2.0),
        ]);
        assert!(!concave.is_convex());
    }

    #[test]
    fn test_shrink_zero_is_identity() {
        let sq = unit_square();
        let out = sq.shrink(&[0.0, 0.0, 0.0, 0.0]);
        for (a, b) in sq.vertices().iter().zip(out.vertices()) {
            assert!((*a - *b).length() < 1e-9);
        }
    }

    #[test]
    fn test_shrink_square() {
        let sq = unit_square();
        let out = sq.shrink_eq(0.1);
        assert!((out.area() - 0.64).abs() < 1e-9);
        // Still centered on the same spot
        assert!((out.centroid() - sq.centroid()).length() < 1e-9);
    }

    #[test]
    fn test_shrink_uneven() {
        // Only the bottom edge moves in
        let sq = unit_square();
        let out = sq.shrink(&[0.25, 0.0, 0.0, 0.0]);
        assert!((out.area() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_cut_halves_preserve_area() {
        let sq = unit_square();
        let halves = sq.cut(DVec2::new(0.3, -5.0), DVec2::new(0.3, 5.0), 0.0);
        assert_eq!(halves.len(), 2);
        let total: f64 = halves.iter().map(|h| h.area()).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cut_with_gap_removes_strip() {
        let sq = unit_square();
        let halves = sq.cut(DVec2::new(0.5, -5.0), DVec2::new(0.5, 5.0), 0.2);
        assert_eq!(halves.len(), 2);
        let total: f64 = halves.iter().map(|h| h.area()).sum();
        assert!((total - 0.8).abs() < 1e-9, "total {}", total);
    }

    #[test]
    fn test_cut_miss_returns_original() {
        let sq = unit_square();
        let halves = sq.cut(DVec2::new(5.0, 0.0), DVec2::new(5.0, 1.0), 0.0);
        assert_eq!(halves.len(), 1);
        assert_eq!(halves[0].len(), 4);
    }

    #[test]
    fn test_cut_inward_offset_keeps_remainder_first() {
        // Cutting along the inward offset of the bottom edge must return
        // the remainder (away from that edge) as the first half.
        let sq = unit_square();
        let halves = sq.cut(DVec2::new(0.0, 0.1), DVec2::new(1.0, 0.1), 0.0);
        assert_eq!(halves.len(), 2);
        assert!((halves[0].area() - 0.9).abs() < 1e-9);
        assert!((halves[1].area() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_smooth_preserves_centroid() {
        let tri = Polygon::regular(3, 5.0);
        let smoothed = tri.smooth_vertex_eq(3.0);
        assert!((smoothed.centroid() - tri.centroid()).length() < 1e-9);
        // Contracts toward the centroid but keeps the shape regular
        assert!(smoothed.area() < tri.area());
        let d0 = smoothed.vertices()[0].length();
        for v in smoothed.vertices() {
            assert!((v.length() - d0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_interpolate_weights() {
        let sq = unit_square();
        let w = sq.interpolate(DVec2::new(0.5, 0.5));
        assert_eq!(w.len(), 4);
        assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        // Center is equidistant from all corners
        for wi in &w {
            assert!((wi - 0.25).abs() < 1e-12);
        }
    }

    #[test]
    fn test_buffer_concave() {
        let concave = Polygon::new(vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(4.0, 0.0),
            DVec2::new(4.0, 4.0),
            DVec2::new(2.0, 1.5),
            DVec2::new(0.0, 4.0),
        ]);
        let out = concave.buffer_eq(0.2);
        assert_eq!(out.len(), concave.len());
        assert!(out.area() < concave.area());
    }

    #[test]
    fn test_constructors() {
        assert_eq!(Polygon::rect(2.0, 3.0).len(), 4);
        assert_eq!(Polygon::regular(7, 1.0).len(), 7);
        assert_eq!(Polygon::circle(1.0).len(), 16);
        assert!(Polygon::regular(6, 1.0).signed_area() > 0.0);
    }
}

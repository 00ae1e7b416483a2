//! Incremental Voronoi tessellation
//!
//! Bowyer–Watson Delaunay triangulation over a four-corner bounding frame,
//! with Voronoi regions read off as the ring of triangle circumcenters
//! around each seed. Rebuild-based relaxation nudges chosen seeds toward
//! their region centers.
//!
//! Points are referenced by index into the diagram's point list; the first
//! four indices are always the frame corners. Triangle indices stay stable
//! once insertion is finished, which is what lets the patch builder intern
//! one mesh vertex per triangle and get identity-shared circumcenters for
//! free.

use glam::DVec2;

/// One Delaunay triangle: seed indices plus its circumcircle
#[derive(Debug, Clone)]
pub struct Triangle {
    pub a: usize,
    pub b: usize,
    pub c: usize,
    /// Circumcenter; doubles as a Voronoi region vertex
    pub center: DVec2,
    /// Circumradius
    pub radius: f64,
}

impl Triangle {
    fn new(points: &[DVec2], i: usize, j: usize, k: usize) -> Triangle {
        let p1 = points[i];
        let p2 = points[j];
        let p3 = points[k];

        // Orient consistently so shared edges appear reversed in neighbors
        let s = (p2.x - p1.x) * (p2.y + p1.y)
            + (p3.x - p2.x) * (p3.y + p2.y)
            + (p1.x - p3.x) * (p1.y + p3.y);
        let (b, c) = if s > 0.0 { (j, k) } else { (k, j) };
        let (pb, pc) = (points[b], points[c]);

        let d = 2.0 * (p1.x * (pb.y - pc.y) + pb.x * (pc.y - p1.y) + pc.x * (p1.y - pb.y));
        let center = if d.abs() < 1e-12 {
            (p1 + pb + pc) / 3.0
        } else {
            let a2 = p1.length_squared();
            let b2 = pb.length_squared();
            let c2 = pc.length_squared();
            DVec2::new(
                (a2 * (pb.y - pc.y) + b2 * (pc.y - p1.y) + c2 * (p1.y - pb.y)) / d,
                (a2 * (pc.x - pb.x) + b2 * (p1.x - pc.x) + c2 * (pb.x - p1.x)) / d,
            )
        };

        Triangle {
            a: i,
            b,
            c,
            center,
            radius: center.distance(p1),
        }
    }

    /// True if the triangle has the directed edge `a -> b`
    fn has_edge(&self, a: usize, b: usize) -> bool {
        (self.a == a && self.b == b) || (self.b == a && self.c == b) || (self.c == a && self.a == b)
    }

    fn has_vertex(&self, v: usize) -> bool {
        self.a == v || self.b == v || self.c == v
    }
}

/// The Voronoi region of one seed: its incident triangles in angular order
#[derive(Debug, Clone)]
pub struct Region {
    pub seed: usize,
    /// Triangle indices ordered counter-clockwise around the seed
    pub triangles: Vec<usize>,
}

impl Region {
    /// Mean of the region's circumcenters
    pub fn center(&self, voronoi: &Voronoi) -> DVec2 {
        if self.triangles.is_empty() {
            return voronoi.points[self.seed];
        }
        let sum: DVec2 = self
            .triangles
            .iter()
            .map(|&t| voronoi.triangles[t].center)
            .sum();
        sum / self.triangles.len() as f64
    }
}

/// Incremental Delaunay/Voronoi diagram
#[derive(Debug, Clone)]
pub struct Voronoi {
    /// Frame corners first (indices 0..4), then inserted points in order
    pub points: Vec<DVec2>,
    triangles: Vec<Triangle>,
}

const FRAME_LEN: usize = 4;

impl Voronoi {
    /// Create an empty diagram covering the given bounding box
    pub fn with_frame(minx: f64, miny: f64, maxx: f64, maxy: f64) -> Voronoi {
        let points = vec![
            DVec2::new(minx, miny),
            DVec2::new(minx, maxy),
            DVec2::new(maxx, miny),
            DVec2::new(maxx, maxy),
        ];
        let triangles = vec![
            Triangle::new(&points, 0, 1, 2),
            Triangle::new(&points, 1, 2, 3),
        ];
        Voronoi { points, triangles }
    }

    /// Build a diagram from a point set
    ///
    /// The bounding frame extends a quarter width beyond the points on each
    /// side so that every input point lands strictly inside the initial
    /// triangulation.
    pub fn build(vertices: &[DVec2]) -> Voronoi {
        if vertices.is_empty() {
            return Voronoi::with_frame(-100.0, -100.0, 100.0, 100.0);
        }

        let minx = vertices.iter().map(|v| v.x).fold(f64::INFINITY, f64::min);
        let miny = vertices.iter().map(|v| v.y).fold(f64::INFINITY, f64::min);
        let maxx = vertices.iter().map(|v| v.x).fold(f64::NEG_INFINITY, f64::max);
        let maxy = vertices.iter().map(|v| v.y).fold(f64::NEG_INFINITY, f64::max);

        let dx = (maxx - minx) * 0.5;
        let dy = (maxy - miny) * 0.5;

        let mut voronoi = Voronoi::with_frame(
            minx - dx / 2.0,
            miny - dy / 2.0,
            maxx + dx / 2.0,
            maxy + dy / 2.0,
        );
        for &v in vertices {
            voronoi.add_point(v);
        }
        voronoi
    }

    /// True if the point index is a frame corner
    #[inline]
    pub fn is_frame(&self, index: usize) -> bool {
        index < FRAME_LEN
    }

    fn is_real(&self, tr: &Triangle) -> bool {
        !(self.is_frame(tr.a) || self.is_frame(tr.b) || self.is_frame(tr.c))
    }

    /// Circumcenter of a triangle by index
    #[inline]
    pub fn triangle_center(&self, index: usize) -> DVec2 {
        self.triangles[index].center
    }

    /// Insert a point, retriangulating the star of invalidated triangles
    ///
    /// Points falling inside no circumcircle (duplicates, or outside the
    /// frame) are silently dropped, matching the incremental construction
    /// this diagram mirrors.
    pub fn add_point(&mut self, p: DVec2) {
        let to_split: Vec<usize> = (0..self.triangles.len())
            .filter(|&t| p.distance(self.triangles[t].center) < self.triangles[t].radius)
            .collect();
        if to_split.is_empty() {
            return;
        }

        let new_index = self.points.len();
        self.points.push(p);

        // Boundary edges of the star polygon: edges not shared (reversed)
        // with another invalidated triangle
        let mut a: Vec<usize> = Vec::new();
        let mut b: Vec<usize> = Vec::new();
        for &ti in &to_split {
            let t1 = &self.triangles[ti];
            let mut e1 = true;
            let mut e2 = true;
            let mut e3 = true;
            for &tj in &to_split {
                if tj == ti {
                    continue;
                }
                let t2 = &self.triangles[tj];
                if e1 && t2.has_edge(t1.b, t1.a) {
                    e1 = false;
                }
                if e2 && t2.has_edge(t1.c, t1.b) {
                    e2 = false;
                }
                if e3 && t2.has_edge(t1.a, t1.c) {
                    e3 = false;
                }
                if !(e1 || e2 || e3) {
                    break;
                }
            }
            if e1 {
                a.push(t1.a);
                b.push(t1.b);
            }
            if e2 {
                a.push(t1.b);
                b.push(t1.c);
            }
            if e3 {
                a.push(t1.c);
                b.push(t1.a);
            }
        }

        // Walk the boundary cycle, fanning new triangles around the point
        if !a.is_empty() {
            let mut index = 0;
            for _ in 0..a.len() {
                self.triangles
                    .push(Triangle::new(&self.points, new_index, a[index], b[index]));
                match a.iter().position(|&x| x == b[index]) {
                    Some(next) if next != 0 => index = next,
                    _ => break,
                }
            }
        }

        let mut keep = vec![true; self.triangles.len()];
        for &t in &to_split {
            keep[t] = false;
        }
        let mut i = 0;
        self.triangles.retain(|_| {
            let k = keep[i];
            i += 1;
            k
        });
    }

    /// The Voronoi region of one seed (triangles in angular order)
    pub fn region(&self, seed: usize) -> Region {
        let seed_pt = self.points[seed];
        let mut triangles: Vec<usize> = (0..self.triangles.len())
            .filter(|&t| self.triangles[t].has_vertex(seed))
            .collect();
        triangles.sort_by(|&t1, &t2| {
            let c1 = self.triangles[t1].center - seed_pt;
            let c2 = self.triangles[t2].center - seed_pt;
            let k1 = (c1.y.atan2(c1.x), c1.length());
            let k2 = (c2.y.atan2(c2.x), c2.length());
            k1.partial_cmp(&k2).unwrap_or(std::cmp::Ordering::Equal)
        });
        Region { seed, triangles }
    }

    /// Bounded regions: those whose triangles never touch the frame
    ///
    /// Returned in point order (frame seeds are naturally excluded since
    /// every triangle of theirs touches the frame).
    pub fn partitioning(&self) -> Vec<Region> {
        (0..self.points.len())
            .map(|p| self.region(p))
            .filter(|r| {
                !r.triangles.is_empty()
                    && r.triangles.iter().all(|&t| self.is_real(&self.triangles[t]))
            })
            .collect()
    }

    /// Move the chosen seeds to their region centers and rebuild
    ///
    /// Relaxed seeds migrate to the end of the point list, matching the
    /// remove-then-append of the incremental construction; callers that
    /// care about ordering sort afterwards.
    pub fn relax(&self, to_relax: &[usize]) -> Voronoi {
        let regions = self.partitioning();

        let mut points: Vec<(usize, DVec2)> = (FRAME_LEN..self.points.len())
            .map(|i| (i, self.points[i]))
            .collect();

        for r in &regions {
            if to_relax.contains(&r.seed) {
                points.retain(|&(i, _)| i != r.seed);
                points.push((usize::MAX, r.center(self)));
            }
        }

        let coords: Vec<DVec2> = points.into_iter().map(|(_, p)| p).collect();
        Voronoi::build(&coords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circumcenter_right_triangle() {
        let points = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(0.0, 1.0),
        ];
        let t = Triangle::new(&points, 0, 1, 2);
        assert!((t.center - DVec2::new(0.5, 0.5)).length() < 1e-12);
        assert!((t.radius - 0.5_f64.sqrt()).abs() < 1e-12);
    }

    fn plus_points() -> Vec<DVec2> {
        vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(10.0, 0.0),
            DVec2::new(-10.0, 0.0),
            DVec2::new(0.0, 10.0),
            DVec2::new(0.0, -10.0),
        ]
    }

    #[test]
    fn test_central_region_is_bounded() {
        let voronoi = Voronoi::build(&plus_points());
        assert_eq!(voronoi.points.len(), 4 + 5);

        let regions = voronoi.partitioning();
        // Only the central point has a bounded region
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].seed, 4);
        assert!(regions[0].triangles.len() >= 3);

        // Its region is the square of circumcenters around the origin,
        // symmetric in all four quadrants
        let center = regions[0].center(&voronoi);
        assert!(center.length() < 1e-9, "center {:?}", center);
    }

    #[test]
    fn test_partitioning_excludes_frame() {
        let voronoi = Voronoi::build(&plus_points());
        for r in voronoi.partitioning() {
            assert!(!voronoi.is_frame(r.seed));
        }
    }

    #[test]
    fn test_build_determinism() {
        let pts: Vec<DVec2> = (0..40)
            .map(|i| {
                let a = i as f64 * 0.7;
                DVec2::new(a.cos() * (5.0 + i as f64), a.sin() * (5.0 + i as f64))
            })
            .collect();
        let v1 = Voronoi::build(&pts);
        let v2 = Voronoi::build(&pts);
        assert_eq!(v1.points, v2.points);
        let r1: Vec<usize> = v1.partitioning().iter().map(|r| r.seed).collect();
        let r2: Vec<usize> = v2.partitioning().iter().map(|r| r.seed).collect();
        assert_eq!(r1, r2);
    }

    #[test]
    fn test_duplicate_point_dropped() {
        let mut voronoi = Voronoi::build(&plus_points());
        let before = voronoi.points.len();
        voronoi.add_point(DVec2::new(0.0, 0.0));
        // Exact duplicate is inside no circumcircle boundary consistently;
        // either way the diagram stays well-formed
        assert!(voronoi.points.len() <= before + 1);
        assert!(!voronoi.partitioning().is_empty());
    }

    #[test]
    fn test_relax_moves_seed_toward_region_center() {
        // An off-center interior point surrounded by a ring
        let mut pts: Vec<DVec2> = (0..8)
            .map(|i| {
                let a = i as f64 / 8.0 * std::f64::consts::TAU;
                DVec2::new(20.0 * a.cos(), 20.0 * a.sin())
            })
            .collect();
        pts.push(DVec2::new(3.0, 0.0));
        let voronoi = Voronoi::build(&pts);

        let seed = 4 + 8; // the interior point
        let regions = voronoi.partitioning();
        let region = regions
            .iter()
            .find(|r| r.seed == seed)
            .expect("interior region should be bounded");
        let target = region.center(&voronoi);

        let relaxed = voronoi.relax(&[seed]);
        // The relaxed point is appended at the end of the rebuilt list
        let after = relaxed.points[relaxed.points.len() - 1];
        assert!((after - target).length() < 1e-9);
    }
}

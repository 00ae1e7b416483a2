//! Building-block cutters
//!
//! The primitives that carve a city block into footprints: perpendicular
//! bisection, radial and ring slicing, grid-aligned ortho subdivision and
//! the recursive alley generator shared by the common ward family.

use glam::DVec2;

use crate::geom::Polygon;
use crate::rng::Rng;

/// Half-width of a main street (wall roads, arteries, plaza frontage)
pub(crate) const MAIN_STREET: f64 = 2.0;
/// Half-width of a regular inner-city street
pub(crate) const REGULAR_STREET: f64 = 1.0;
/// Half-width of an alley / outskirts lane
pub(crate) const ALLEY: f64 = 0.6;

/// Recursion guard for the alley generator
const ALLEY_DEPTH_LIMIT: usize = 24;
/// Recursion guard for ortho slicing
const SLICE_DEPTH_LIMIT: usize = 50;
/// How often an empty ortho subdivision is retried before giving up
const ORTHO_RETRIES: usize = 100;

/// Split a polygon across the edge starting at `edge`
///
/// The cut runs through the point at `ratio` along the edge,
/// perpendicular to it but tilted by `angle`; `gap` carves a corridor of
/// that total width between the halves.
pub fn bisect(poly: &Polygon, edge: usize, ratio: f64, angle: f64, gap: f64) -> Vec<Polygon> {
    let (v0, v1) = poly.edge(edge);
    let p1 = v0.lerp(v1, ratio);
    let rotated = DVec2::from_angle(angle).rotate(v1 - v0);
    let p2 = p1 + rotated.perp();
    poly.cut(p1, p2, gap)
}

/// One triangle per edge, fanned out from a center point
///
/// The two center-incident sides of each sector are pulled in by half the
/// gap so neighboring sectors do not touch.
pub fn radial(poly: &Polygon, center: Option<DVec2>, gap: f64) -> Vec<Polygon> {
    let center = center.unwrap_or_else(|| poly.centroid());
    poly.edges()
        .map(|(v0, v1)| {
            let sector = Polygon::new(vec![center, v0, v1]);
            if gap > 0.0 {
                sector.shrink(&[gap / 2.0, 0.0, gap / 2.0])
            } else {
                sector
            }
        })
        .collect()
}

/// Radial slicing anchored at the vertex closest to the centroid
///
/// Sectors degenerate at the anchor are skipped, and the gap applies only
/// to sides that are not original polygon edges.
pub fn semi_radial(poly: &Polygon, gap: f64) -> Vec<Polygon> {
    let n = poly.len();
    if n < 3 {
        return Vec::new();
    }
    let ci = poly.closest_vertex(poly.centroid());
    let center = poly.vertices()[ci];
    let half = gap / 2.0;

    let mut sectors = Vec::new();
    for i in 0..n {
        if i == ci || (i + 1) % n == ci {
            continue;
        }
        let (v0, v1) = poly.edge(i);
        let mut sector = Polygon::new(vec![center, v0, v1]);
        if gap > 0.0 {
            let d = [
                if i == (ci + 1) % n { 0.0 } else { half },
                0.0,
                if (i + 2) % n == ci { 0.0 } else { half },
            ];
            sector = sector.shrink(&d);
        }
        sectors.push(sector);
    }
    sectors
}

/// Peel concentric shell slices of the given thickness off every edge
///
/// Shortest edges are peeled first; the central remainder is discarded,
/// only the shell slices are returned.
pub fn ring(poly: &Polygon, thickness: f64) -> Vec<Polygon> {
    let mut slices: Vec<(DVec2, DVec2, f64)> = poly
        .edges()
        .map(|(v1, v2)| {
            let v = v2 - v1;
            let n = v.perp().normalize_or_zero() * thickness;
            (v1 + n, v2 + n, v.length())
        })
        .collect();
    slices.sort_by(|a, b| a.2.total_cmp(&b.2));

    let mut peel = Vec::new();
    let mut remainder = poly.clone();
    for (p1, p2, _) in slices {
        let mut halves = remainder.cut(p1, p2, 0.0);
        if halves.len() == 2 {
            if let Some(shell) = halves.pop() {
                peel.push(shell);
            }
        }
        if let Some(rest) = halves.pop() {
            remainder = rest;
        }
    }
    peel
}

/// Recursive perpendicular subdivision into building footprints
///
/// Splits across the longest edge with ratio and angle jitter scaled by
/// `grid_chaos`, stops once a half falls under a size threshold jittered
/// by `size_chaos`, drops blocks with probability `empty_prob`, and only
/// carves alley corridors while `split_allowed` holds.
#[allow(clippy::too_many_arguments)]
pub fn alleys(
    poly: &Polygon,
    min_sq: f64,
    grid_chaos: f64,
    size_chaos: f64,
    empty_prob: f64,
    split_allowed: bool,
    depth: usize,
    rng: &mut Rng,
) -> Vec<Polygon> {
    if depth > ALLEY_DEPTH_LIMIT || poly.len() < 3 {
        return if poly.area() >= min_sq {
            vec![poly.clone()]
        } else {
            Vec::new()
        };
    }

    let edge = poly.longest_edge();

    let spread = 0.8 * grid_chaos;
    let ratio = (1.0 - spread) / 2.0 + rng.float() * spread;

    let angle_spread = if poly.area() < min_sq * 4.0 {
        0.0
    } else {
        std::f64::consts::PI / 6.0 * grid_chaos
    };
    let angle = (rng.float() - 0.5) * angle_spread;

    let gap = if split_allowed { ALLEY } else { 0.0 };
    let halves = bisect(poly, edge, ratio, angle, gap);

    let mut buildings = Vec::new();
    for half in halves {
        if half.len() < 3 {
            continue;
        }
        let threshold = min_sq * 2f64.powf(4.0 * size_chaos * (rng.float() - 0.5));
        if half.area() < threshold {
            if !rng.bool(empty_prob) {
                buildings.push(half);
            }
        } else {
            let child_split = half.area() > min_sq / (rng.float() * rng.float());
            buildings.extend(alleys(
                &half,
                min_sq,
                grid_chaos,
                size_chaos,
                empty_prob,
                child_split,
                depth + 1,
                rng,
            ));
        }
    }
    buildings
}

/// Grid-aligned recursive subdivision
///
/// Both cut directions come from the longest edge of the original block;
/// each level cuts with whichever basis vector is more perpendicular to
/// its current longest edge, giving rectangular-ish structures. Leaves
/// below a jittered threshold survive with probability `fill`; an empty
/// outcome is retried from the top.
pub fn ortho_building(poly: &Polygon, min_block_sq: f64, fill: f64, rng: &mut Rng) -> Vec<Polygon> {
    if poly.len() < 3 || poly.area() < min_block_sq {
        return vec![poly.clone()];
    }

    let (v0, v1) = poly.edge(poly.longest_edge());
    let c1 = v1 - v0;
    let c2 = c1.perp();

    for _ in 0..ORTHO_RETRIES {
        let blocks = ortho_slice(poly, c1, c2, min_block_sq, fill, 0, rng);
        if !blocks.is_empty() {
            return blocks;
        }
    }
    vec![poly.clone()]
}

fn ortho_slice(
    poly: &Polygon,
    c1: DVec2,
    c2: DVec2,
    min_block_sq: f64,
    fill: f64,
    depth: usize,
    rng: &mut Rng,
) -> Vec<Polygon> {
    if depth > SLICE_DEPTH_LIMIT || poly.len() < 3 {
        return Vec::new();
    }

    let (v0, v1) = poly.edge(poly.longest_edge());
    let v = v1 - v0;

    let ratio = 0.4 + rng.float() * 0.2;
    let p1 = v0.lerp(v1, ratio);

    let c = if v.dot(c1).abs() < v.dot(c2).abs() {
        c1
    } else {
        c2
    };

    let halves = poly.cut(p1, p1 + c, 0.0);
    let mut out = Vec::new();
    for half in halves {
        if half.area() < min_block_sq * 2f64.powf(rng.normal() * 2.0 - 1.0) {
            if rng.bool(fill) {
                out.push(half);
            }
        } else {
            out.extend(ortho_slice(&half, c1, c2, min_block_sq, fill, depth + 1, rng));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block() -> Polygon {
        Polygon::new(vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(30.0, 0.0),
            DVec2::new(32.0, 24.0),
            DVec2::new(-2.0, 26.0),
        ])
    }

    #[test]
    fn test_bisect_no_gap_preserves_area() {
        let poly = block();
        let halves = bisect(&poly, 0, 0.5, 0.0, 0.0);
        assert_eq!(halves.len(), 2);
        let total: f64 = halves.iter().map(|h| h.area()).sum();
        assert!((total - poly.area()).abs() < 1e-6);
    }

    #[test]
    fn test_bisect_gap_carves_corridor() {
        let poly = block();
        let halves = bisect(&poly, 0, 0.5, 0.0, ALLEY);
        assert_eq!(halves.len(), 2);
        let total: f64 = halves.iter().map(|h| h.area()).sum();
        assert!(total < poly.area());
    }

    #[test]
    fn test_radial_one_sector_per_edge() {
        let poly = Polygon::rect(10.0, 10.0);
        let sectors = radial(&poly, None, 0.0);
        assert_eq!(sectors.len(), 4);
        let total: f64 = sectors.iter().map(|s| s.area()).sum();
        assert!((total - poly.area()).abs() < 1e-6);
    }

    #[test]
    fn test_radial_gap_shrinks_sectors() {
        let poly = Polygon::rect(10.0, 10.0);
        let sectors = radial(&poly, None, ALLEY);
        let total: f64 = sectors.iter().map(|s| s.area()).sum();
        assert!(total < poly.area());
    }

    #[test]
    fn test_semi_radial_skips_anchor_edges() {
        let poly = Polygon::regular(6, 10.0);
        let sectors = semi_radial(&poly, 0.0);
        // Two of the six edges touch the anchor vertex
        assert_eq!(sectors.len(), 4);
    }

    #[test]
    fn test_ring_shells() {
        let poly = Polygon::rect(20.0, 20.0);
        let shells = ring(&poly, 3.0);
        assert_eq!(shells.len(), 4);
        let total: f64 = shells.iter().map(|s| s.area()).sum();
        // Four 3-wide shells peeled off a 20x20 block
        assert!(total > 0.0 && total < poly.area());
        for s in &shells {
            assert!(s.area() > 0.0);
        }
    }

    #[test]
    fn test_alleys_subdivide_large_block() {
        let mut rng = Rng::new(5);
        let poly = block();
        let buildings = alleys(&poly, 40.0, 0.3, 0.6, 0.0, true, 0, &mut rng);
        assert!(buildings.len() > 2, "got {} buildings", buildings.len());
        let total: f64 = buildings.iter().map(|b| b.area()).sum();
        // Alleys carve corridors, so coverage is partial
        assert!(total < poly.area());
        for b in &buildings {
            assert!(b.len() >= 3);
        }
    }

    #[test]
    fn test_alleys_determinism() {
        let poly = block();
        let mut r1 = Rng::new(99);
        let mut r2 = Rng::new(99);
        let b1 = alleys(&poly, 40.0, 0.5, 0.6, 0.04, true, 0, &mut r1);
        let b2 = alleys(&poly, 40.0, 0.5, 0.6, 0.04, true, 0, &mut r2);
        assert_eq!(b1.len(), b2.len());
        for (a, b) in b1.iter().zip(&b2) {
            assert_eq!(a.vertices(), b.vertices());
        }
    }

    #[test]
    fn test_ortho_building_returns_blocks() {
        let mut rng = Rng::new(3);
        let poly = Polygon::rect(40.0, 30.0);
        let buildings = ortho_building(&poly, 100.0, 0.8, &mut rng);
        assert!(!buildings.is_empty());
        let total: f64 = buildings.iter().map(|b| b.area()).sum();
        assert!(total <= poly.area() + 1e-6);
    }

    #[test]
    fn test_ortho_small_block_kept_whole() {
        let mut rng = Rng::new(3);
        let poly = Polygon::rect(2.0, 2.0);
        let buildings = ortho_building(&poly, 100.0, 0.8, &mut rng);
        assert_eq!(buildings.len(), 1);
        assert_eq!(buildings[0].len(), 4);
    }
}

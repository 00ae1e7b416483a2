//! Ward kinds, placement template and location ratings
//!
//! Wards are a closed sum over the kinds a city knows; each kind carries
//! its subdivision parameters (drawn at assignment time so the random
//! stream stays in template order) and, for the rated kinds, a location
//! score where lower is better and infinity forbids a patch outright.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use glam::DVec2;

use crate::generation::blocks;
use crate::generation::mesh::VertexId;
use crate::generation::patch::PatchId;
use crate::generation::wall::CurtainWall;
use crate::generation::CityBuilder;
use crate::geom::{distance_to_segment, Polygon};
use crate::rng::Rng;

/// The functional role assigned to a patch
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WardKind {
    Craftsmen,
    Merchant,
    Slum,
    Market,
    Cathedral,
    Administration,
    Military,
    Patriciate,
    Park,
    Farm,
    Gate,
    Castle,
    /// Unremarkable countryside with no geometry of its own
    Common,
}

impl WardKind {
    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            WardKind::Craftsmen => "Craftsmen",
            WardKind::Merchant => "Merchant",
            WardKind::Slum => "Slum",
            WardKind::Market => "Market",
            WardKind::Cathedral => "Cathedral",
            WardKind::Administration => "Administration",
            WardKind::Military => "Military",
            WardKind::Patriciate => "Patriciate",
            WardKind::Park => "Park",
            WardKind::Farm => "Farm",
            WardKind::Gate => "Gate",
            WardKind::Castle => "Castle",
            WardKind::Common => "Common",
        }
    }

    /// True for kinds that score candidate patches instead of picking at
    /// random
    pub(crate) fn has_rating(self) -> bool {
        matches!(
            self,
            WardKind::Slum
                | WardKind::Market
                | WardKind::Cathedral
                | WardKind::Administration
                | WardKind::Merchant
                | WardKind::Patriciate
                | WardKind::Military
        )
    }

    /// Location rating, lower is better; infinity forbids the patch
    pub(crate) fn rate(self, b: &CityBuilder, pid: PatchId) -> f64 {
        let shape = &b.patch(pid).shape;
        let plaza_center = b
            .plaza
            .map(|p| b.patch(p).shape.to_polygon(&b.mesh).center());
        let focus = plaza_center.unwrap_or_else(|| b.center_point());

        match self {
            // Slums belong to the fringe: the farther from the center the
            // better
            WardKind::Slum => -shape.distance(&b.mesh, focus),

            WardKind::Merchant => shape.distance(&b.mesh, focus),

            // One market should not touch another; otherwise prefer
            // plaza-sized patches
            WardKind::Market => {
                for &p in &b.inner {
                    let other = b.patch(p);
                    let is_market = other
                        .ward
                        .as_ref()
                        .map_or(false, |w| w.kind == WardKind::Market);
                    if is_market && other.shape.borders(shape) {
                        return f64::INFINITY;
                    }
                }
                match b.plaza {
                    Some(plaza) => {
                        shape.to_polygon(&b.mesh).area()
                            / b.patch(plaza).shape.to_polygon(&b.mesh).area()
                    }
                    None => shape.distance(&b.mesh, b.center_point()),
                }
            }

            // The cathedral overlooks the plaza if it can, the bigger the
            // patch the better; otherwise close and small
            WardKind::Cathedral => match b.plaza {
                Some(plaza) if b.patch(plaza).shape.borders(shape) => {
                    -1.0 / shape.to_polygon(&b.mesh).area()
                }
                _ => shape.distance(&b.mesh, focus) * shape.to_polygon(&b.mesh).area(),
            },

            WardKind::Administration => match b.plaza {
                Some(plaza) if b.patch(plaza).shape.borders(shape) => 0.0,
                _ => shape.distance(&b.mesh, focus),
            },

            // Prefers parks, avoids slums
            WardKind::Patriciate => {
                let mut rate = 0.0;
                for &p in &b.patches {
                    let other = b.patch(p);
                    if let Some(ward) = &other.ward {
                        if other.shape.borders(shape) {
                            match ward.kind {
                                WardKind::Park => rate -= 1.0,
                                WardKind::Slum => rate += 1.0,
                                _ => {}
                            }
                        }
                    }
                }
                rate
            }

            // Garrison sits against the citadel, or failing that the wall
            WardKind::Military => {
                let citadel_adjacent = b
                    .citadel
                    .map_or(false, |c| b.patch(c).shape.borders(shape));
                if citadel_adjacent {
                    0.0
                } else if b.wall().map_or(false, |w| w.borders(pid, shape)) {
                    1.0
                } else if b.citadel.is_none() && b.wall().is_none() {
                    0.0
                } else {
                    f64::INFINITY
                }
            }

            _ => 0.0,
        }
    }
}

/// Subdivision parameters for the common ward family
#[derive(Debug, Clone, Copy)]
pub struct AlleyParams {
    /// Target building-block area
    pub min_sq: f64,
    /// Grid irregularity, 0 for a regular grid
    pub grid_chaos: f64,
    /// Spread of block sizes
    pub size_chaos: f64,
    /// Probability of leaving a block empty
    pub empty_prob: f64,
}

impl AlleyParams {
    /// Draw assignment-time parameters for a kind, if it has any
    ///
    /// The military ward computes its parameters against the finished
    /// block instead, and the special wards carry none.
    fn draw(kind: WardKind, rng: &mut Rng) -> Option<AlleyParams> {
        let params = match kind {
            WardKind::Craftsmen => AlleyParams {
                min_sq: 10.0 + 80.0 * rng.float() * rng.float(),
                grid_chaos: 0.5 + rng.float() * 0.2,
                size_chaos: 0.6,
                empty_prob: 0.04,
            },
            WardKind::Slum => AlleyParams {
                min_sq: 10.0 + 30.0 * rng.float() * rng.float(),
                grid_chaos: 0.6 + rng.float() * 0.4,
                size_chaos: 0.8,
                empty_prob: 0.03,
            },
            WardKind::Merchant => AlleyParams {
                min_sq: 50.0 + 60.0 * rng.float() * rng.float(),
                grid_chaos: 0.5 + rng.float() * 0.3,
                size_chaos: 0.7,
                empty_prob: 0.15,
            },
            WardKind::Gate => AlleyParams {
                min_sq: 10.0 + 50.0 * rng.float() * rng.float(),
                grid_chaos: 0.5 + rng.float() * 0.3,
                size_chaos: 0.7,
                empty_prob: 0.04,
            },
            WardKind::Administration => AlleyParams {
                min_sq: 80.0 + 30.0 * rng.float() * rng.float(),
                grid_chaos: 0.1 + rng.float() * 0.3,
                size_chaos: 0.3,
                empty_prob: 0.04,
            },
            WardKind::Patriciate => AlleyParams {
                min_sq: 80.0 + 30.0 * rng.float() * rng.float(),
                grid_chaos: 0.5 + rng.float() * 0.3,
                size_chaos: 0.8,
                empty_prob: 0.2,
            },
            _ => return None,
        };
        Some(params)
    }
}

/// A ward under construction: kind, parameters and accumulated geometry
#[derive(Debug, Clone)]
pub struct WardPlan {
    pub kind: WardKind,
    pub params: Option<AlleyParams>,
    /// The castle's own curtain wall
    pub wall: Option<CurtainWall>,
    pub geometry: Vec<Polygon>,
}

impl WardPlan {
    /// Assign a kind, drawing its parameters from the stream
    pub fn new(kind: WardKind, rng: &mut Rng) -> WardPlan {
        WardPlan {
            kind,
            params: AlleyParams::draw(kind, rng),
            wall: None,
            geometry: Vec::new(),
        }
    }

    /// The castle ward wrapping the citadel's own wall
    pub fn castle(wall: CurtainWall) -> WardPlan {
        WardPlan {
            kind: WardKind::Castle,
            params: None,
            wall: Some(wall),
            geometry: Vec::new(),
        }
    }
}

/// Fixed ward mix for a full-size city
///
/// Popped front to back during placement; smaller cities simply consume a
/// prefix, and once the template runs dry everything else becomes slums.
pub(crate) fn ward_template() -> Vec<WardKind> {
    use WardKind::*;
    vec![
        Craftsmen,
        Craftsmen,
        Merchant,
        Craftsmen,
        Craftsmen,
        Cathedral,
        Craftsmen,
        Craftsmen,
        Craftsmen,
        Craftsmen,
        Craftsmen,
        Craftsmen,
        Craftsmen,
        Craftsmen,
        Administration,
        Craftsmen,
        Slum,
        Craftsmen,
        Slum,
        Patriciate,
        Market,
        Slum,
        Craftsmen,
        Craftsmen,
        Craftsmen,
        Slum,
        Craftsmen,
        Craftsmen,
        Craftsmen,
        Military,
        Slum,
        Craftsmen,
        Park,
        Patriciate,
        Market,
        Merchant,
    ]
}

/// Build the geometry for one assigned ward
///
/// Dispatches on kind: the common family subdivides its city block into
/// alleys, the special wards place their own structures.
pub(crate) fn build_geometry(
    b: &CityBuilder,
    pid: PatchId,
    kind: WardKind,
    params: Option<AlleyParams>,
    rng: &mut Rng,
) -> Vec<Polygon> {
    match kind {
        WardKind::Craftsmen
        | WardKind::Merchant
        | WardKind::Slum
        | WardKind::Gate
        | WardKind::Administration
        | WardKind::Patriciate
        | WardKind::Military => common_geometry(b, pid, kind, params, rng),
        WardKind::Market => market_geometry(b, pid, rng),
        WardKind::Castle => castle_geometry(b, pid, rng),
        WardKind::Cathedral => cathedral_geometry(b, pid, rng),
        WardKind::Park => park_geometry(b, pid),
        WardKind::Farm => farm_geometry(b, pid, rng),
        WardKind::Common => Vec::new(),
    }
}

fn common_geometry(
    b: &CityBuilder,
    pid: PatchId,
    kind: WardKind,
    params: Option<AlleyParams>,
    rng: &mut Rng,
) -> Vec<Polygon> {
    let block = city_block(b, pid);
    let params = match kind {
        // Sized against the block: a handful of large regular structures
        WardKind::Military => AlleyParams {
            min_sq: block.area().sqrt() * (1.0 + rng.float()),
            grid_chaos: 0.1 + rng.float() * 0.3,
            size_chaos: 0.3,
            empty_prob: 0.25,
        },
        _ => params.unwrap_or(AlleyParams {
            min_sq: 15.0,
            grid_chaos: 0.5,
            size_chaos: 0.6,
            empty_prob: 0.04,
        }),
    };

    let geometry = blocks::alleys(
        &block,
        params.min_sq,
        params.grid_chaos,
        params.size_chaos,
        params.empty_prob,
        true,
        0,
        rng,
    );

    if b.is_enclosed(pid) {
        geometry
    } else {
        filter_outskirts(b, pid, geometry, rng)
    }
}

/// The buildable block inside a patch, inset by half a street per edge
///
/// Wall-facing edges and artery or plaza frontages get the main street,
/// other edges a regular street inside the city and an alley outside.
pub(crate) fn city_block(b: &CityBuilder, pid: PatchId) -> Polygon {
    let patch = b.patch(pid);
    let shape = &patch.shape;
    let poly = shape.to_polygon(&b.mesh);

    let wall = b.wall();
    let inner_patch = wall.is_none() || patch.within_walls;

    let mut inset = Vec::with_capacity(shape.len());
    for (v0, v1) in shape.edge_ids() {
        let on_wall = wall.map_or(false, |w| w.borders_by(pid, v0, v1));
        let width = if on_wall {
            blocks::MAIN_STREET
        } else {
            let mut on_street = inner_patch
                && b.plaza
                    .map_or(false, |p| b.patch(p).shape.find_edge(v1, v0).is_some());
            if !on_street {
                for artery in &b.arteries {
                    if artery.contains(v0) && artery.contains(v1) {
                        on_street = true;
                        break;
                    }
                }
            }
            if on_street {
                blocks::MAIN_STREET
            } else if inner_patch {
                blocks::REGULAR_STREET
            } else {
                blocks::ALLEY
            }
        };
        inset.push(width / 2.0);
    }

    if poly.is_convex() {
        poly.shrink(&inset)
    } else {
        poly.buffer(&inset)
    }
}

struct PopulatedEdge {
    origin: DVec2,
    dir: DVec2,
    /// Farthest patch vertex from this edge, scaled by the edge's weight
    reach: f64,
}

/// Thin out buildings in patches open to the countryside
///
/// Buildings survive in proportion to how close they sit to a populated
/// edge (an artery, or a boundary with settled neighbors), modulated by a
/// per-vertex density interpolated at the building's center.
fn filter_outskirts(
    b: &CityBuilder,
    pid: PatchId,
    geometry: Vec<Polygon>,
    rng: &mut Rng,
) -> Vec<Polygon> {
    let patch = b.patch(pid);
    let shape = &patch.shape;
    let poly = shape.to_polygon(&b.mesh);

    let mut edges: Vec<PopulatedEdge> = Vec::new();
    let mut add_edge = |v1: VertexId, v2: VertexId, factor: f64| {
        let p1 = b.mesh.point(v1);
        let dir = b.mesh.point(v2) - p1;
        let reach = shape
            .ids()
            .iter()
            .map(|&v| {
                if v == v1 || v == v2 {
                    0.0
                } else {
                    distance_to_segment(p1, dir, b.mesh.point(v))
                }
            })
            .fold(0.0, f64::max)
            * factor;
        edges.push(PopulatedEdge {
            origin: p1,
            dir,
            reach,
        });
    };

    for (v0, v1) in shape.edge_ids() {
        let on_road = b
            .arteries
            .iter()
            .any(|a| a.contains(v0) && a.contains(v1));
        if on_road {
            add_edge(v0, v1, 1.0);
        } else if let Some(neighbor) = b.get_neighbour(pid, v0) {
            if b.patch(neighbor).within_city {
                let factor = if b.is_enclosed(neighbor) { 1.0 } else { 0.4 };
                add_edge(v0, v1, factor);
            }
        }
    }
    drop(add_edge);

    // Per-vertex density: gates radiate activity, fully urban junctions a
    // random amount, countryside none
    let density: Vec<f64> = shape
        .ids()
        .iter()
        .map(|&v| {
            if b.gates.contains(&v) {
                1.0
            } else {
                let all_city = b
                    .patches_by_vertex(v)
                    .iter()
                    .all(|&p| b.patch(p).within_city);
                if all_city {
                    2.0 * rng.float()
                } else {
                    0.0
                }
            }
        })
        .collect();

    geometry
        .into_iter()
        .filter(|building| {
            let mut min_dist: f64 = 1.0;
            for edge in &edges {
                for v in building.vertices() {
                    let d = distance_to_segment(edge.origin, edge.dir, *v);
                    let dist = if edge.reach > 0.0 {
                        d / edge.reach
                    } else {
                        f64::INFINITY
                    };
                    if dist < min_dist {
                        min_dist = dist;
                    }
                }
            }

            let weights = poly.interpolate(building.center());
            let density_here: f64 = density
                .iter()
                .zip(&weights)
                .map(|(d, w)| d * w)
                .sum();
            if density_here > 0.0 {
                min_dist /= density_here;
            }

            rng.fuzzy(1.0) > min_dist
        })
        .collect()
}

fn market_geometry(b: &CityBuilder, pid: PatchId, rng: &mut Rng) -> Vec<Polygon> {
    let poly = b.patch(pid).shape.to_polygon(&b.mesh);

    let statue = rng.bool(0.6);
    let offset = statue || rng.bool(0.3);

    let edge = if statue || offset {
        Some(poly.edge(poly.longest_edge()))
    } else {
        None
    };

    let mut object = if statue {
        let w = 1.0 + rng.float();
        let h = 1.0 + rng.float();
        let mut rect = Polygon::rect(w, h);
        if let Some((v0, v1)) = edge {
            rect.rotate((v1.y - v0.y).atan2(v1.x - v0.x));
        }
        rect
    } else {
        Polygon::circle(1.0 + rng.float())
    };

    match (offset, edge) {
        (true, Some((v0, v1))) => {
            let gravity = v0.lerp(v1, 0.5);
            let t = 0.2 + rng.float() * 0.4;
            object.offset(poly.centroid().lerp(gravity, t));
        }
        _ => object.offset(poly.centroid()),
    }

    vec![object]
}

fn castle_geometry(b: &CityBuilder, pid: PatchId, rng: &mut Rng) -> Vec<Polygon> {
    let block = b
        .patch(pid)
        .shape
        .to_polygon(&b.mesh)
        .shrink_eq(blocks::MAIN_STREET * 2.0);
    blocks::ortho_building(&block, block.area().sqrt() * 4.0, 0.6, rng)
}

fn cathedral_geometry(b: &CityBuilder, pid: PatchId, rng: &mut Rng) -> Vec<Polygon> {
    let block = city_block(b, pid);
    if rng.bool(0.4) {
        blocks::ring(&block, 2.0 + rng.float() * 4.0)
    } else {
        blocks::ortho_building(&block, 50.0, 0.8, rng)
    }
}

fn park_geometry(b: &CityBuilder, pid: PatchId) -> Vec<Polygon> {
    let block = city_block(b, pid);
    if block.compactness() >= 0.7 {
        blocks::radial(&block, None, blocks::ALLEY)
    } else {
        blocks::semi_radial(&block, blocks::ALLEY)
    }
}

fn farm_geometry(b: &CityBuilder, pid: PatchId, rng: &mut Rng) -> Vec<Polygon> {
    let poly = b.patch(pid).shape.to_polygon(&b.mesh);
    let mut housing = Polygon::rect(4.0, 4.0);
    if poly.is_empty() {
        return vec![housing];
    }

    let index = (rng.float() * poly.len() as f64) as usize % poly.len();
    let anchor = poly.vertices()[index];
    let position = anchor.lerp(poly.centroid(), 0.3 + rng.float() * 0.4);

    housing.rotate(rng.float() * std::f64::consts::PI);
    housing.offset(position);

    blocks::ortho_building(&housing, 8.0, 0.5, rng)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_mix() {
        let template = ward_template();
        assert_eq!(template.len(), 36);
        let count = |k: WardKind| template.iter().filter(|&&w| w == k).count();
        assert_eq!(count(WardKind::Craftsmen), 21);
        assert_eq!(count(WardKind::Slum), 5);
        assert_eq!(count(WardKind::Merchant), 2);
        assert_eq!(count(WardKind::Market), 2);
        assert_eq!(count(WardKind::Patriciate), 2);
        assert_eq!(count(WardKind::Cathedral), 1);
        assert_eq!(count(WardKind::Administration), 1);
        assert_eq!(count(WardKind::Military), 1);
        assert_eq!(count(WardKind::Park), 1);
        assert_eq!(count(WardKind::Gate), 0);
    }

    #[test]
    fn test_rated_kinds() {
        assert!(WardKind::Slum.has_rating());
        assert!(WardKind::Military.has_rating());
        assert!(!WardKind::Craftsmen.has_rating());
        assert!(!WardKind::Park.has_rating());
        assert!(!WardKind::Gate.has_rating());
    }

    #[test]
    fn test_params_drawn_for_common_family_only() {
        let mut rng = Rng::new(1);
        assert!(AlleyParams::draw(WardKind::Craftsmen, &mut rng).is_some());
        assert!(AlleyParams::draw(WardKind::Military, &mut rng).is_none());
        assert!(AlleyParams::draw(WardKind::Market, &mut rng).is_none());
        assert!(AlleyParams::draw(WardKind::Farm, &mut rng).is_none());
    }

    #[test]
    fn test_param_ranges() {
        let mut rng = Rng::new(7);
        for _ in 0..100 {
            let p = AlleyParams::draw(WardKind::Craftsmen, &mut rng).unwrap();
            assert!(p.min_sq >= 10.0 && p.min_sq < 90.0);
            assert!(p.grid_chaos >= 0.5 && p.grid_chaos < 0.7);
        }
    }

    #[test]
    fn test_ward_names() {
        assert_eq!(WardKind::Craftsmen.name(), "Craftsmen");
        assert_eq!(WardKind::Common.name(), "Common");
    }
}

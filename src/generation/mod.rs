//! Core city generation pipeline
//!
//! Six stages, each consuming the invariants of the previous one:
//! Voronoi patches, junction optimization, walls and gates, street
//! topology, ward placement, and per-ward building geometry. A failed
//! stage aborts the attempt; the driver reseeds the stream from itself
//! and rebuilds from scratch, so the same configuration still yields the
//! same city.

pub(crate) mod blocks;
pub(crate) mod graph;
pub(crate) mod mesh;
pub(crate) mod patch;
pub(crate) mod topology;
pub(crate) mod voronoi;
pub(crate) mod wall;
pub(crate) mod wards;

use std::collections::HashMap;

use glam::DVec2;

use crate::config::CityConfig;
use crate::error::{CityError, Result};
use crate::model::{Model, Patch, Ward, Wall};
use crate::rng::Rng;
#[cfg(feature = "spatial-index")]
use crate::spatial::SpatialIndex;

use mesh::{Contour, Mesh, VertexId};
use patch::{PatchId, PatchPlan};
use topology::Topology;
use voronoi::Voronoi;
use wall::CurtainWall;
use wards::{WardKind, WardPlan};

/// Junction optimization threshold: no patch edge shorter than this
const JUNCTION_THRESHOLD: f64 = 8.0;

/// Build attempts before giving up
const MAX_ATTEMPTS: u32 = 10;

/// Generate a city model from a configuration
pub(crate) fn generate(config: &CityConfig) -> Result<Model> {
    let mut rng = Rng::new(config.seed);

    // The three feature coins are always drawn so that pinning one leaves
    // the rest of the stream unchanged
    let drawn_plaza = rng.bool(0.5);
    let drawn_citadel = rng.bool(0.5);
    let drawn_walls = rng.bool(0.5);
    let plaza_needed = config.plaza.unwrap_or(drawn_plaza);
    let citadel_needed = config.citadel.unwrap_or(drawn_citadel);
    let walls_needed = config.walls.unwrap_or(drawn_walls);

    for _ in 0..MAX_ATTEMPTS {
        match CityBuilder::build(
            config.n_patches,
            plaza_needed,
            citadel_needed,
            walls_needed,
            &mut rng,
        ) {
            Ok(builder) => return Ok(builder.publish(config.seed)),
            Err(
                CityError::BadWalledArea
                | CityError::UnableToBuildStreet
                | CityError::BadCitadelShape
                | CityError::DegeneratePatch,
            ) => {
                // Reseed from the stream itself: deterministic retries
                let next_seed = rng.int(1, 2_147_483_647);
                rng.reset(next_seed);
            }
            Err(other) => return Err(other),
        }
    }

    Err(CityError::GenerationFailed {
        attempts: MAX_ATTEMPTS,
    })
}

/// City model under construction
///
/// Patches live in a pool and are referenced by stable [`PatchId`]s; the
/// `patches` list holds the active ones in creation order. Splitting and
/// pruning edit the list, never the pool, so references held by earlier
/// stages stay valid.
pub(crate) struct CityBuilder {
    pub n_patches: usize,
    pub plaza_needed: bool,
    pub citadel_needed: bool,
    pub walls_needed: bool,

    pub mesh: Mesh,
    pool: Vec<PatchPlan>,
    pub patches: Vec<PatchId>,
    pub inner: Vec<PatchId>,

    pub plaza: Option<PatchId>,
    pub citadel: Option<PatchId>,
    /// Mesh vertex of the innermost patch closest to the origin
    pub center: Option<VertexId>,

    pub border: Option<CurtainWall>,
    pub gates: Vec<VertexId>,
    pub topology: Option<Topology>,

    pub streets: Vec<Contour>,
    pub roads: Vec<Contour>,
    pub arteries: Vec<Contour>,

    pub city_radius: f64,
}

impl CityBuilder {
    /// Fresh builder with no patches (stages and tests fill it in)
    pub(crate) fn empty(n_patches: usize, mesh: Mesh) -> CityBuilder {
        CityBuilder {
            n_patches,
            plaza_needed: false,
            citadel_needed: false,
            walls_needed: false,
            mesh,
            pool: Vec::new(),
            patches: Vec::new(),
            inner: Vec::new(),
            plaza: None,
            citadel: None,
            center: None,
            border: None,
            gates: Vec::new(),
            topology: None,
            streets: Vec::new(),
            roads: Vec::new(),
            arteries: Vec::new(),
            city_radius: 0.0,
        }
    }

    /// Run all six stages
    fn build(
        n_patches: usize,
        plaza_needed: bool,
        citadel_needed: bool,
        walls_needed: bool,
        rng: &mut Rng,
    ) -> Result<CityBuilder> {
        let mut builder = CityBuilder::empty(n_patches, Mesh::new());
        builder.plaza_needed = plaza_needed;
        builder.citadel_needed = citadel_needed;
        builder.walls_needed = walls_needed;

        builder.build_patches(rng);
        builder.optimize_junctions()?;
        builder.build_walls(rng)?;
        builder.build_streets()?;
        builder.create_wards(rng);
        builder.build_geometry(rng);
        Ok(builder)
    }

    // ------------------------------------------------------------------
    // Patch pool

    pub(crate) fn patch(&self, pid: PatchId) -> &PatchPlan {
        &self.pool[pid.0]
    }

    pub(crate) fn pool_mut(&mut self, pid: PatchId) -> &mut PatchPlan {
        &mut self.pool[pid.0]
    }

    fn add_patch(&mut self, plan: PatchPlan) -> PatchId {
        let pid = PatchId(self.pool.len());
        self.pool.push(plan);
        pid
    }

    /// Add a patch to the pool and the active list
    pub(crate) fn add_active(&mut self, plan: PatchPlan) -> PatchId {
        let pid = self.add_patch(plan);
        self.patches.push(pid);
        pid
    }

    /// Replace an active patch with its two halves, in place
    pub(crate) fn split_patch(&mut self, outer: PatchId, h0: PatchPlan, h1: PatchPlan) {
        let id0 = self.add_patch(h0);
        let id1 = self.add_patch(h1);
        match self.patches.iter().position(|&p| p == outer) {
            Some(pos) => {
                self.patches[pos] = id0;
                self.patches.insert(pos + 1, id1);
            }
            None => {
                self.patches.push(id0);
                self.patches.push(id1);
            }
        }
    }

    /// Active patches whose shape contains the vertex
    pub(crate) fn patches_by_vertex(&self, v: VertexId) -> Vec<PatchId> {
        self.patches
            .iter()
            .copied()
            .filter(|&p| self.patch(p).shape.contains(v))
            .collect()
    }

    /// The neighbor across the edge starting at `v`
    pub(crate) fn get_neighbour(&self, pid: PatchId, v: VertexId) -> Option<PatchId> {
        let next = self.patch(pid).shape.next_of(v)?;
        self.patches
            .iter()
            .copied()
            .find(|&p| p != pid && self.patch(p).shape.find_edge(next, v).is_some())
    }

    /// All active patches sharing an edge with this one
    pub(crate) fn get_neighbours(&self, pid: PatchId) -> Vec<PatchId> {
        let shape = &self.patch(pid).shape;
        self.patches
            .iter()
            .copied()
            .filter(|&p| p != pid && self.patch(p).shape.borders(shape))
            .collect()
    }

    /// A patch is enclosed when walled in or surrounded by city
    pub(crate) fn is_enclosed(&self, pid: PatchId) -> bool {
        let patch = self.patch(pid);
        if !patch.within_city {
            return false;
        }
        if patch.within_walls {
            return true;
        }
        self.get_neighbours(pid)
            .iter()
            .all(|&p| self.patch(p).within_city)
    }

    /// The physical wall, when one was requested
    pub(crate) fn wall(&self) -> Option<&CurtainWall> {
        if self.walls_needed {
            self.border.as_ref()
        } else {
            None
        }
    }

    /// Coordinates of the city center vertex
    pub(crate) fn center_point(&self) -> DVec2 {
        self.center.map(|c| self.mesh.point(c)).unwrap_or(DVec2::ZERO)
    }

    // ------------------------------------------------------------------
    // Stage 1: Voronoi patches

    /// Seed points on a loose spiral, tessellate, relax the core, then
    /// carve patches from the innermost regions outward
    fn build_patches(&mut self, rng: &mut Rng) {
        let start_angle = rng.float() * std::f64::consts::TAU;
        let seed_count = self.n_patches * 8;

        let mut points = Vec::with_capacity(seed_count);
        for i in 0..seed_count {
            let a = start_angle + (i as f64).sqrt() * 5.0;
            let r = if i == 0 {
                0.0
            } else {
                10.0 + i as f64 * (2.0 + rng.float())
            };
            points.push(DVec2::new(a.cos() * r, a.sin() * r));
        }

        let mut voronoi = Voronoi::build(&points);
        for _ in 0..3 {
            let citadel_seed = self.n_patches.min(voronoi.points.len() - 1);
            let to_relax = [0, 1, 2, citadel_seed];
            voronoi = voronoi.relax(&to_relax);
        }

        let mut regions = voronoi.partitioning();
        regions.sort_by(|a, b| {
            voronoi.points[a.seed]
                .length()
                .total_cmp(&voronoi.points[b.seed].length())
        });

        let mut interned: HashMap<usize, VertexId> = HashMap::new();
        for (count, region) in regions.iter().enumerate() {
            let plan = PatchPlan::from_region(region, &voronoi, &mut self.mesh, &mut interned);
            let pid = self.add_active(plan);

            if count == 0 {
                self.center = self.patch(pid).shape.min_by(&self.mesh, |p| p.length());
                if self.plaza_needed {
                    self.plaza = Some(pid);
                }
            } else if count == self.n_patches && self.citadel_needed {
                self.citadel = Some(pid);
                self.pool_mut(pid).within_city = true;
            }

            if count < self.n_patches {
                self.pool_mut(pid).within_city = true;
                self.pool_mut(pid).within_walls = self.walls_needed;
                self.inner.push(pid);
            }
        }
    }

    // ------------------------------------------------------------------
    // Stage 2: junction optimization

    /// Merge vertex pairs closer than the junction threshold
    ///
    /// The surviving vertex moves to the midpoint; every patch holding the
    /// dropped vertex is rewired to the survivor, so the mesh stays
    /// identity-consistent.
    fn optimize_junctions(&mut self) -> Result<()> {
        let mut to_optimize = self.inner.clone();
        if let Some(citadel) = self.citadel {
            to_optimize.push(citadel);
        }

        let mut to_clean: Vec<PatchId> = Vec::new();
        for &wid in &to_optimize {
            let mut index = 0;
            loop {
                let len = self.patch(wid).shape.len();
                if index >= len {
                    break;
                }
                let v0 = self.patch(wid).shape.id(index);
                let v1 = self.patch(wid).shape.id((index + 1) % len);

                let merge = v0 != v1
                    && self.mesh.point(v0).distance(self.mesh.point(v1)) < JUNCTION_THRESHOLD;
                if merge {
                    for other in self.patches_by_vertex(v1) {
                        if other != wid {
                            self.pool[other.0].shape.replace_first(v1, v0);
                            to_clean.push(other);
                        }
                    }
                    let mid = (self.mesh.point(v0) + self.mesh.point(v1)) / 2.0;
                    self.mesh.set_point(v0, mid);
                    self.pool[wid.0].shape.remove_id(v1);
                } else {
                    index += 1;
                }
            }
        }

        for wid in to_clean {
            self.pool[wid.0].shape.dedup_ids();
        }

        for &pid in &self.patches {
            if self.patch(pid).shape.len() < 3 {
                return Err(CityError::DegeneratePatch);
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Stage 3: walls, gates, citadel

    fn build_walls(&mut self, rng: &mut Rng) -> Result<()> {
        let reserved: Vec<VertexId> = self
            .citadel
            .map(|c| self.patch(c).shape.ids().to_vec())
            .unwrap_or_default();

        let real = self.walls_needed;
        let inner = self.inner.clone();
        let mut border = CurtainWall::build(self, rng, real, inner, reserved)?;
        if real {
            border.build_towers();
        }

        let radius = border.radius(&self.mesh);
        self.gates = border.gates.clone();
        self.border = Some(border);

        // Drop countryside too far out to matter
        let center_pt = self.center_point();
        let pool = &self.pool;
        let mesh = &self.mesh;
        self.patches
            .retain(|&pid| pool[pid.0].shape.distance(mesh, center_pt) < radius * 3.0);

        if let Some(citadel) = self.citadel {
            let reserved: Vec<VertexId> = self
                .patch(citadel)
                .shape
                .ids()
                .iter()
                .copied()
                .filter(|&v| {
                    self.patches_by_vertex(v)
                        .iter()
                        .any(|&p| !self.patch(p).within_city)
                })
                .collect();

            let mut castle_wall = CurtainWall::build(self, rng, true, vec![citadel], reserved)?;
            castle_wall.build_towers();
            let castle_gates = castle_wall.gates.clone();
            self.pool[citadel.0].ward = Some(WardPlan::castle(castle_wall));

            if self.patch(citadel).shape.to_polygon(&self.mesh).compactness() < 0.75 {
                return Err(CityError::BadCitadelShape);
            }
            self.gates.extend(castle_gates);
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // Stage 4: topology and streets

    fn build_streets(&mut self) -> Result<()> {
        let topology = Topology::build(self);
        let border_gates: Vec<VertexId> = self
            .border
            .as_ref()
            .map(|b| b.gates.clone())
            .unwrap_or_default();

        for gate in self.gates.clone() {
            let gate_pt = self.mesh.point(gate);

            // Streets lead to the plaza vertex nearest the gate, or to the
            // city center vertex
            let end = match self.plaza {
                Some(plaza) => self
                    .patch(plaza)
                    .shape
                    .min_by(&self.mesh, |p| p.distance(gate_pt)),
                None => self.center,
            };
            let end = end.ok_or(CityError::UnableToBuildStreet)?;

            let street = topology
                .path(gate, end, &topology.outer)
                .ok_or(CityError::UnableToBuildStreet)?;
            self.streets.push(Contour::new(street));

            // Wall gates also grow an approach road from the countryside
            if border_gates.contains(&gate) {
                let target = gate_pt.normalize_or_zero() * 1000.0;
                if let Some(start) = topology.closest_vertex(&self.mesh, target) {
                    if let Some(road) = topology.path(start, gate, &topology.inner) {
                        self.roads.push(Contour::new(road));
                    }
                }
            }
        }

        self.tidy_up_roads();

        for i in 0..self.arteries.len() {
            let artery = &self.arteries[i];
            if artery.len() < 3 {
                continue;
            }
            let smoothed = artery.to_polygon(&self.mesh).smooth_vertex_eq(3.0);
            for j in 1..artery.len() - 1 {
                let id = self.arteries[i].id(j);
                self.mesh.set_point(id, smoothed.vertices()[j]);
            }
        }

        self.topology = Some(topology);
        Ok(())
    }

    /// Deduplicate street segments and merge them into maximal arteries
    fn tidy_up_roads(&mut self) {
        let plaza_shape = self.plaza.map(|p| self.patch(p).shape.clone());

        let mut segments: Vec<(VertexId, VertexId)> = Vec::new();
        let mut cut_into_segments = |route: &Contour| {
            if route.len() < 2 {
                return;
            }
            let mut v0 = route.id(0);
            for i in 1..route.len() {
                let v1 = route.id(i);
                // Plaza perimeter is already open space, not a street
                if let Some(plaza) = &plaza_shape {
                    if plaza.contains(v0) && plaza.contains(v1) {
                        v0 = v1;
                        continue;
                    }
                }
                if !segments.contains(&(v0, v1)) {
                    segments.push((v0, v1));
                }
                v0 = v1;
            }
        };

        for street in &self.streets {
            cut_into_segments(street);
        }
        for road in &self.roads {
            cut_into_segments(road);
        }
        drop(cut_into_segments);

        self.arteries = Vec::new();
        while let Some((a, b)) = segments.pop() {
            let mut attached = false;
            for artery in &mut self.arteries {
                if artery.first() == Some(b) {
                    artery.insert(0, a);
                    attached = true;
                    break;
                } else if artery.last() == Some(a) {
                    artery.push(b);
                    attached = true;
                    break;
                }
            }
            if !attached {
                self.arteries.push(Contour::new(vec![a, b]));
            }
        }
    }

    // ------------------------------------------------------------------
    // Stage 5: ward placement

    fn create_wards(&mut self, rng: &mut Rng) {
        let mut unassigned = self.inner.clone();

        if let Some(plaza) = self.plaza {
            self.pool[plaza.0].ward = Some(WardPlan::new(WardKind::Market, rng));
            unassigned.retain(|&p| p != plaza);
        }

        let border_gates: Vec<VertexId> = self
            .border
            .as_ref()
            .map(|b| b.gates.clone())
            .unwrap_or_default();

        // Gate wards spring up just inside the gates
        for &gate in &border_gates {
            for pid in self.patches_by_vertex(gate) {
                let patch = self.patch(pid);
                if patch.within_city && patch.ward.is_none() {
                    let chance = if self.walls_needed { 0.5 } else { 0.2 };
                    if rng.bool(chance) {
                        self.pool[pid.0].ward = Some(WardPlan::new(WardKind::Gate, rng));
                        unassigned.retain(|&p| p != pid);
                    }
                }
            }
        }

        // Mildly shuffled template: a few neighbor swaps only
        let mut template = wards::ward_template();
        for _ in 0..template.len() / 10 {
            let index = rng.int(0, template.len() as i64 - 1) as usize;
            if index < template.len() - 1 {
                template.swap(index, index + 1);
            }
        }

        while !unassigned.is_empty() {
            let kind = if template.is_empty() {
                WardKind::Slum
            } else {
                template.remove(0)
            };

            let best = if kind.has_rating() {
                let mut best = unassigned[0];
                let mut best_val = f64::INFINITY;
                for &pid in &unassigned {
                    let val = if self.patch(pid).ward.is_some() {
                        f64::INFINITY
                    } else {
                        kind.rate(self, pid)
                    };
                    if val < best_val {
                        best_val = val;
                        best = pid;
                    }
                }
                best
            } else {
                unassigned[rng.index(unassigned.len())]
            };

            self.pool[best.0].ward = Some(WardPlan::new(kind, rng));
            unassigned.retain(|&p| p != best);
        }

        // Outskirts: most wall gates pull their countryside side into the
        // city
        if self.walls_needed {
            for &gate in &border_gates {
                if !rng.bool(1.0 / (self.n_patches as f64 - 5.0)) {
                    for pid in self.patches_by_vertex(gate) {
                        if self.patch(pid).ward.is_none() {
                            self.pool[pid.0].within_city = true;
                            self.pool[pid.0].ward = Some(WardPlan::new(WardKind::Gate, rng));
                        }
                    }
                }
            }
        }

        // Countryside wards and the city radius
        let mut radius: f64 = 0.0;
        for pid in self.patches.clone() {
            if self.patch(pid).within_city {
                for &v in self.patch(pid).shape.ids() {
                    radius = radius.max(self.mesh.point(v).length());
                }
            } else if self.patch(pid).ward.is_none() {
                let kind = if rng.bool(0.2)
                    && self.patch(pid).shape.to_polygon(&self.mesh).compactness() >= 0.7
                {
                    WardKind::Farm
                } else {
                    WardKind::Common
                };
                self.pool[pid.0].ward = Some(WardPlan::new(kind, rng));
            }
        }
        self.city_radius = radius;
    }

    // ------------------------------------------------------------------
    // Stage 6: building geometry

    fn build_geometry(&mut self, rng: &mut Rng) {
        for pid in self.patches.clone() {
            let Some(plan) = &self.pool[pid.0].ward else {
                continue;
            };
            let kind = plan.kind;
            let params = plan.params;
            let geometry = wards::build_geometry(self, pid, kind, params, rng);
            if let Some(ward) = &mut self.pool[pid.0].ward {
                ward.geometry = geometry;
            }
        }
    }

    // ------------------------------------------------------------------
    // Publishing

    /// Resolve the mesh into the read-only public model
    fn publish(self, seed: i64) -> Model {
        let resolve_wall = |wall: &CurtainWall| Wall {
            shape: wall.shape.to_polygon(&self.mesh),
            gates: wall.gates.iter().map(|&g| self.mesh.point(g)).collect(),
            towers: wall.towers.iter().map(|&t| self.mesh.point(t)).collect(),
            segments: wall.segments.clone(),
        };

        let patches: Vec<Patch> = self
            .patches
            .iter()
            .map(|&pid| {
                let plan = &self.pool[pid.0];
                let ward = match &plan.ward {
                    Some(w) => Ward::new(w.kind, w.geometry.clone()),
                    None => Ward::new(WardKind::Common, Vec::new()),
                };
                Patch::new(
                    plan.shape.to_polygon(&self.mesh),
                    ward,
                    plan.within_city,
                    plan.within_walls,
                )
            })
            .collect();

        let position_of = |pid: Option<PatchId>| {
            pid.and_then(|p| self.patches.iter().position(|&q| q == p))
        };

        let border = match &self.border {
            Some(b) => resolve_wall(b),
            None => Wall::default(),
        };
        let citadel_wall = self
            .citadel
            .and_then(|c| self.pool[c.0].ward.as_ref())
            .and_then(|w| w.wall.as_ref())
            .map(resolve_wall);

        #[cfg(feature = "spatial-index")]
        let spatial_index = {
            let centers: Vec<DVec2> = patches.iter().map(|p| p.shape().center()).collect();
            SpatialIndex::new(&centers)
        };

        Model {
            seed,
            n_patches: self.n_patches,
            plaza: position_of(self.plaza),
            citadel: position_of(self.citadel),
            center: self.center_point(),
            city_radius: self.city_radius,
            gates: self.gates.iter().map(|&g| self.mesh.point(g)).collect(),
            streets: self
                .streets
                .iter()
                .map(|s| s.to_polygon(&self.mesh))
                .collect(),
            roads: self.roads.iter().map(|r| r.to_polygon(&self.mesh)).collect(),
            arteries: self
                .arteries
                .iter()
                .map(|a| a.to_polygon(&self.mesh))
                .collect(),
            border,
            wall_present: self.walls_needed,
            citadel_wall,
            patches,
            #[cfg(feature = "spatial-index")]
            spatial_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two quads sharing a short edge; the left one is inner
    fn junction_builder() -> (CityBuilder, PatchId, PatchId, Vec<VertexId>) {
        let mut m = Mesh::new();
        let a = m.alloc(DVec2::new(0.0, 0.0));
        let b = m.alloc(DVec2::new(20.0, 0.0));
        let c = m.alloc(DVec2::new(20.0, 6.0));
        let d = m.alloc(DVec2::new(0.0, 10.0));
        let e = m.alloc(DVec2::new(40.0, 0.0));
        let f = m.alloc(DVec2::new(40.0, 6.0));

        let mut builder = CityBuilder::empty(1, m);
        let left = builder.add_active(PatchPlan::new(Contour::new(vec![a, b, c, d])));
        let right = builder.add_active(PatchPlan::new(Contour::new(vec![b, e, f, c])));
        builder.pool_mut(left).within_city = true;
        builder.inner.push(left);
        (builder, left, right, vec![a, b, c, d, e, f])
    }

    #[test]
    fn test_junction_merge_rewires_all_patches() {
        let (mut builder, left, right, v) = junction_builder();
        builder.optimize_junctions().unwrap();

        // The short edge b -> c collapsed into b at the midpoint
        assert_eq!(builder.patch(left).shape.len(), 3);
        assert_eq!(builder.patch(right).shape.len(), 3);
        assert!(!builder.patch(left).shape.contains(v[2]));
        assert!(!builder.patch(right).shape.contains(v[2]));
        assert!(builder.patch(right).shape.contains(v[1]));
        assert_eq!(builder.mesh.point(v[1]), DVec2::new(20.0, 3.0));
    }

    #[test]
    fn test_degenerate_patch_detected() {
        let mut m = Mesh::new();
        let a = m.alloc(DVec2::new(0.0, 0.0));
        let b = m.alloc(DVec2::new(6.0, 0.0));
        let c = m.alloc(DVec2::new(3.0, 5.0));
        let mut builder = CityBuilder::empty(1, m);
        let t = builder.add_active(PatchPlan::new(Contour::new(vec![a, b, c])));
        builder.inner.push(t);

        assert_eq!(
            builder.optimize_junctions(),
            Err(CityError::DegeneratePatch)
        );
    }

    #[test]
    fn test_split_patch_replaces_in_order() {
        let (mut builder, left, right, v) = junction_builder();
        let h0 = PatchPlan::new(Contour::new(vec![v[1], v[4], v[5]]));
        let h1 = PatchPlan::new(Contour::new(vec![v[1], v[5], v[2]]));
        builder.split_patch(right, h0, h1);

        assert_eq!(builder.patches.len(), 3);
        assert_eq!(builder.patches[0], left);
        assert!(!builder.patches.contains(&right));
    }

    #[test]
    fn test_neighbour_queries() {
        let (builder, left, right, v) = junction_builder();
        assert_eq!(builder.get_neighbours(left), vec![right]);
        // Neighbor across the edge starting at c (c -> d is outer, b -> c shared)
        assert_eq!(builder.get_neighbour(left, v[1]), Some(right));
        assert_eq!(builder.get_neighbour(left, v[3]), None);
    }

    #[test]
    fn test_is_enclosed() {
        let (mut builder, left, _right, _) = junction_builder();
        // Bordered by countryside: open
        assert!(!builder.is_enclosed(left));
        // Walled: enclosed regardless of neighbors
        builder.pool_mut(left).within_walls = true;
        assert!(builder.is_enclosed(left));
    }
}

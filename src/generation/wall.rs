//! Curtain walls: city border, gates and towers
//!
//! A curtain wall wraps a set of patches. The city border is always built
//! (it defines the outskirts boundary and carries the gates even for open
//! cities); only when walls are requested does it become a physical wall
//! with towers. The citadel gets its own single-patch wall.

use glam::DVec2;

use crate::error::{CityError, Result};
use crate::generation::mesh::{Contour, Mesh, VertexId};
use crate::generation::patch::{PatchId, PatchPlan};
use crate::generation::CityBuilder;
use crate::rng::Rng;

/// Wall polygon with gates, towers and per-edge wall flags
#[derive(Debug, Clone)]
pub struct CurtainWall {
    /// True for a physical wall (towers, gate splitting, gate smoothing)
    pub real: bool,
    /// Patches enclosed by this wall
    pub patches: Vec<PatchId>,
    /// Wall polygon over shared mesh vertices
    pub shape: Contour,
    /// `segments[i]` is true when the edge starting at `shape[i]` carries
    /// a physical wall; false between adjacent gates and where the city
    /// border runs along the citadel
    pub segments: Vec<bool>,
    /// Gate vertices, drawn from the wall polygon itself
    pub gates: Vec<VertexId>,
    /// Tower vertices flanking the gates (real walls only)
    pub towers: Vec<VertexId>,
}

impl CurtainWall {
    /// Build a wall around `patch_ids`, choosing gates and splitting the
    /// countryside behind them
    ///
    /// `reserved` vertices are pinned: they are neither smoothed nor
    /// eligible as gates (the citadel keeps its geometry where it meets
    /// the border).
    pub fn build(
        builder: &mut CityBuilder,
        rng: &mut Rng,
        real: bool,
        patch_ids: Vec<PatchId>,
        reserved: Vec<VertexId>,
    ) -> Result<CurtainWall> {
        let shape = if patch_ids.len() == 1 {
            builder.patch(patch_ids[0]).shape.clone()
        } else {
            let shape = find_circumference(builder, &patch_ids);

            // Relax the border toward a rounder outline; reserved vertices
            // keep their place. New positions are computed from the
            // original coordinates before any write goes through.
            let factor = (40.0 / patch_ids.len() as f64).min(1.0);
            let moved: Vec<(VertexId, DVec2)> = shape
                .ids()
                .iter()
                .filter(|id| !reserved.contains(id))
                .map(|&id| (id, shape.smooth_vertex(&builder.mesh, id, factor)))
                .collect();
            for (id, p) in moved {
                builder.mesh.set_point(id, p);
            }
            shape
        };

        let segments = vec![true; shape.len()];
        let mut wall = CurtainWall {
            real,
            patches: patch_ids,
            shape,
            segments,
            gates: Vec::new(),
            towers: Vec::new(),
        };
        wall.build_gates(builder, rng, &reserved)?;
        wall.mark_inactive_segments(&reserved);
        Ok(wall)
    }

    /// Choose gates among multi-patch junction vertices
    ///
    /// Draws a candidate, retires it together with its two neighbors
    /// (wrapping at the list ends), and keeps going while at least three
    /// candidates remain. For real walls the single countryside patch
    /// behind a fresh gate is split along the chord to its most outward
    /// vertex, so that a road can pass on both sides of the gate ward.
    fn build_gates(
        &mut self,
        builder: &mut CityBuilder,
        rng: &mut Rng,
        reserved: &[VertexId],
    ) -> Result<()> {
        let mut entrances: Vec<VertexId> = if self.patches.len() > 1 {
            self.shape
                .ids()
                .iter()
                .copied()
                .filter(|v| {
                    !reserved.contains(v)
                        && self
                            .patches
                            .iter()
                            .filter(|&&p| builder.patch(p).shape.contains(*v))
                            .count()
                            > 1
                })
                .collect()
        } else {
            self.shape
                .ids()
                .iter()
                .copied()
                .filter(|v| !reserved.contains(v))
                .collect()
        };

        if entrances.is_empty() {
            return Err(CityError::BadWalledArea);
        }

        loop {
            let index = rng.index(entrances.len());
            let gate = entrances[index];
            self.gates.push(gate);

            if self.real {
                self.split_behind_gate(builder, gate, reserved);
            }

            // Retire the candidate and its neighbors; the list ends wrap
            // onto the opposite end
            if index == 0 {
                entrances.drain(..2.min(entrances.len()));
                entrances.pop();
            } else if index == entrances.len() - 1 {
                entrances.drain(index - 1..);
                if !entrances.is_empty() {
                    entrances.remove(0);
                }
            } else {
                entrances.drain(index - 1..index + 2);
            }

            if entrances.len() < 3 {
                break;
            }
        }

        if self.gates.is_empty() {
            return Err(CityError::BadWalledArea);
        }

        if self.real {
            // Ease each gate into the wall line
            for i in 0..self.gates.len() {
                let gate = self.gates[i];
                if self.shape.contains(gate) {
                    let p = self.shape.smooth_vertex(&builder.mesh, gate, 1.0);
                    builder.mesh.set_point(gate, p);
                }
            }
        }

        Ok(())
    }

    /// Split the single outer patch behind a gate along the chord from the
    /// gate to its most outward vertex
    fn split_behind_gate(&self, builder: &mut CityBuilder, gate: VertexId, reserved: &[VertexId]) {
        let outer: Vec<PatchId> = builder
            .patches_by_vertex(gate)
            .into_iter()
            .filter(|p| !self.patches.contains(p))
            .collect();
        if outer.len() != 1 {
            return;
        }
        let outer_id = outer[0];
        let outer_shape = builder.patch(outer_id).shape.clone();
        if outer_shape.len() <= 3 {
            return;
        }

        let (next, prev) = match (self.shape.next_of(gate), self.shape.prev_of(gate)) {
            (Some(n), Some(p)) => (n, p),
            _ => return,
        };
        let wall_dir = builder.mesh.point(next) - builder.mesh.point(prev);
        let out = DVec2::new(wall_dir.y, -wall_dir.x);
        let gate_pt = builder.mesh.point(gate);

        let farthest = outer_shape.max_by_id(|v| {
            if self.shape.contains(v) || reserved.contains(&v) {
                f64::NEG_INFINITY
            } else {
                let dir = builder.mesh.point(v) - gate_pt;
                let len = dir.length();
                if len > 0.0 {
                    dir.dot(out) / len
                } else {
                    f64::NEG_INFINITY
                }
            }
        });

        if let Some(farthest) = farthest {
            if farthest != gate {
                if let Some((h0, h1)) = outer_shape.split(gate, farthest) {
                    builder.split_patch(outer_id, PatchPlan::new(h0), PatchPlan::new(h1));
                }
            }
        }
    }

    /// No physical wall between adjacent gates, nor where the city border
    /// runs along the citadel (the citadel carries its own wall there)
    fn mark_inactive_segments(&mut self, reserved: &[VertexId]) {
        let n = self.shape.len();
        for i in 0..n {
            let v0 = self.shape.id(i);
            let v1 = self.shape.id((i + 1) % n);
            let between_gates = self.gates.contains(&v0) && self.gates.contains(&v1);
            let citadel_interface =
                self.patches.len() > 1 && reserved.contains(&v0) && reserved.contains(&v1);
            if between_gates || citadel_interface {
                self.segments[i] = false;
            }
        }
    }

    /// Place towers at every non-gate vertex with an active wall segment
    pub fn build_towers(&mut self) {
        self.towers.clear();
        if !self.real {
            return;
        }
        let n = self.shape.len();
        for i in 0..n {
            let v = self.shape.id(i);
            if !self.gates.contains(&v) && (self.segments[(i + n - 1) % n] || self.segments[i]) {
                self.towers.push(v);
            }
        }
    }

    /// Largest vertex distance from the origin
    pub fn radius(&self, mesh: &Mesh) -> f64 {
        self.shape
            .ids()
            .iter()
            .map(|&v| mesh.point(v).length())
            .fold(0.0, f64::max)
    }

    /// True if the wall carries a physical segment along the edge `v0 -> v1`
    /// of the given patch
    ///
    /// Member patches traverse the wall in the same direction as the wall
    /// polygon; outside patches see the edge reversed.
    pub fn borders_by(&self, pid: PatchId, v0: VertexId, v1: VertexId) -> bool {
        let index = if self.patches.contains(&pid) {
            self.shape.find_edge(v0, v1)
        } else {
            self.shape.find_edge(v1, v0)
        };
        matches!(index, Some(i) if self.segments[i])
    }

    /// True if any active wall segment coincides with an edge of the patch
    pub fn borders(&self, pid: PatchId, patch_shape: &Contour) -> bool {
        let member = self.patches.contains(&pid);
        let n = self.shape.len();
        for i in 0..n {
            if !self.segments[i] {
                continue;
            }
            let v0 = self.shape.id(i);
            let v1 = self.shape.id((i + 1) % n);
            let found = if member {
                patch_shape.find_edge(v0, v1)
            } else {
                patch_shape.find_edge(v1, v0)
            };
            if found.is_some() {
                return true;
            }
        }
        false
    }
}

/// Outer boundary of a patch set
///
/// An edge is external when no patch in the set contains it reversed;
/// external edges are then chained into the border cycle. Vertex identity
/// is preserved: the border holds the same ids as the patches it wraps.
pub fn find_circumference(builder: &CityBuilder, patch_ids: &[PatchId]) -> Contour {
    if patch_ids.is_empty() {
        return Contour::default();
    }
    if patch_ids.len() == 1 {
        return builder.patch(patch_ids[0]).shape.clone();
    }

    let mut starts: Vec<VertexId> = Vec::new();
    let mut ends: Vec<VertexId> = Vec::new();

    for &pid in patch_ids {
        for (a, b) in builder.patch(pid).shape.edge_ids() {
            let external = patch_ids.iter().all(|&other| {
                other == pid || builder.patch(other).shape.find_edge(b, a).is_none()
            });
            if external {
                starts.push(a);
                ends.push(b);
            }
        }
    }

    if starts.is_empty() {
        return Contour::default();
    }

    // Chain the cycle: each edge's end indexes the next edge's start
    let mut ids = Vec::with_capacity(starts.len());
    let mut index = 0;
    for _ in 0..starts.len() {
        ids.push(starts[index]);
        match starts.iter().position(|&s| s == ends[index]) {
            Some(next) if next != 0 => index = next,
            _ => break,
        }
    }
    Contour::new(ids)
}

//! In-progress city patch
//!
//! During generation a patch is a contour over the shared mesh plus the
//! slots the later stages fill in. The resolved, public patch type lives
//! in [`crate::model`].

use crate::generation::mesh::{Contour, Mesh, VertexId};
use crate::generation::voronoi::{Region, Voronoi};
use crate::generation::wards::WardPlan;

/// Stable patch handle into the builder's patch pool
///
/// Handles survive splitting and pruning; the builder keeps a separate
/// ordered list of the currently active patches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatchId(pub usize);

/// One city region under construction
#[derive(Debug, Clone)]
pub struct PatchPlan {
    /// Boundary over shared mesh vertices, counter-clockwise
    pub shape: Contour,
    /// Assigned ward, if any
    pub ward: Option<WardPlan>,
    /// True for the N seed patches plus converted outskirts
    pub within_city: bool,
    /// True when the patch sits inside the curtain wall
    pub within_walls: bool,
}

impl PatchPlan {
    pub fn new(shape: Contour) -> Self {
        PatchPlan {
            shape,
            ward: None,
            within_city: false,
            within_walls: false,
        }
    }

    /// Create a patch from a Voronoi region, interning each triangle
    /// circumcenter exactly once
    ///
    /// Adjacent regions share triangles, so interning by triangle index is
    /// what gives neighboring patches identity-equal vertices.
    pub fn from_region(
        region: &Region,
        voronoi: &Voronoi,
        mesh: &mut Mesh,
        interned: &mut std::collections::HashMap<usize, VertexId>,
    ) -> Self {
        let ids = region
            .triangles
            .iter()
            .map(|&tri| {
                *interned
                    .entry(tri)
                    .or_insert_with(|| mesh.alloc(voronoi.triangle_center(tri)))
            })
            .collect();
        PatchPlan::new(Contour::new(ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec2;

    #[test]
    fn test_from_region_shares_vertices_between_neighbors() {
        // Two interior seeds surrounded by a ring produce two regions
        // sharing a Voronoi edge, hence two interned vertex ids
        let mut pts: Vec<DVec2> = (0..10)
            .map(|i| {
                let a = i as f64 / 10.0 * std::f64::consts::TAU;
                DVec2::new(30.0 * a.cos(), 30.0 * a.sin())
            })
            .collect();
        pts.push(DVec2::new(-4.0, 0.0));
        pts.push(DVec2::new(4.0, 0.0));

        let voronoi = Voronoi::build(&pts);
        let regions = voronoi.partitioning();
        assert!(regions.len() >= 2, "expected two bounded regions");

        let mut mesh = Mesh::new();
        let mut interned = std::collections::HashMap::new();
        let patches: Vec<PatchPlan> = regions
            .iter()
            .map(|r| PatchPlan::from_region(r, &voronoi, &mut mesh, &mut interned))
            .collect();

        let shared: Vec<_> = patches[0]
            .shape
            .ids()
            .iter()
            .filter(|id| patches[1].shape.contains(**id))
            .collect();
        assert!(
            shared.len() >= 2,
            "neighboring patches share at least one edge (two ids), got {}",
            shared.len()
        );
        assert!(patches[0].shape.borders(&patches[1].shape));
    }
}

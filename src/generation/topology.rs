//! Routing graph over patch vertices
//!
//! One graph node per unique mesh vertex; consecutive patch vertices are
//! linked with their Euclidean distance. Wall and citadel vertices are
//! blocked (no links) except for gates, so streets thread through gates
//! instead of across fortifications. Border vertices join neither the
//! inner nor the outer set, which is what lets a gate serve as endpoint
//! for both streets (inner search) and roads (outer search).

use std::collections::HashMap;

use glam::DVec2;

use crate::generation::graph::{Graph, NodeId};
use crate::generation::mesh::{Mesh, VertexId};
use crate::generation::CityBuilder;

/// Pathfinding topology for one city
#[derive(Debug, Clone, Default)]
pub struct Topology {
    pub graph: Graph,
    pt2node: HashMap<VertexId, NodeId>,
    /// Vertex per node, indexed by node id
    node2pt: Vec<VertexId>,
    /// Nodes seen from city patches (streets must avoid `outer`)
    pub inner: Vec<NodeId>,
    /// Nodes seen from countryside patches (roads must avoid `inner`)
    pub outer: Vec<NodeId>,
}

impl Topology {
    /// Build the routing graph from the current patch mesh
    pub fn build(builder: &CityBuilder) -> Topology {
        let mut topology = Topology::default();

        let border_shape = match &builder.border {
            Some(border) => border.shape.clone(),
            None => return topology,
        };

        // Fortified vertices produce no links; gates stay passable
        let mut blocked: Vec<VertexId> = Vec::new();
        if let Some(citadel) = builder.citadel {
            blocked.extend_from_slice(builder.patch(citadel).shape.ids());
        }
        if let Some(wall) = builder.wall() {
            blocked.extend_from_slice(wall.shape.ids());
        }
        blocked.retain(|v| !builder.gates.contains(v));

        for &pid in &builder.patches {
            let patch = builder.patch(pid);
            let shape = &patch.shape;
            if shape.is_empty() {
                continue;
            }
            let within_city = patch.within_city;

            let mut v1 = shape.id(shape.len() - 1);
            let mut n1 = topology.node_for(v1, &blocked);

            for i in 0..shape.len() {
                let v0 = v1;
                let n0 = n1;
                v1 = shape.id(i);
                n1 = topology.node_for(v1, &blocked);

                if let Some(n0) = n0 {
                    if !border_shape.contains(v0) {
                        topology.classify(n0, within_city);
                    }
                }
                if let Some(n1) = n1 {
                    if !border_shape.contains(v1) {
                        topology.classify(n1, within_city);
                    }
                }

                if let (Some(n0), Some(n1)) = (n0, n1) {
                    let weight = builder.mesh.point(v0).distance(builder.mesh.point(v1));
                    topology.graph.link(n0, n1, weight);
                }
            }
        }

        topology
    }

    /// Get or create the node for a vertex; blocked vertices yield no node
    fn node_for(&mut self, v: VertexId, blocked: &[VertexId]) -> Option<NodeId> {
        if !self.pt2node.contains_key(&v) {
            let node = self.graph.add();
            self.pt2node.insert(v, node);
            self.node2pt.push(v);
        }
        if blocked.contains(&v) {
            None
        } else {
            self.pt2node.get(&v).copied()
        }
    }

    fn classify(&mut self, node: NodeId, within_city: bool) {
        let set = if within_city {
            &mut self.inner
        } else {
            &mut self.outer
        };
        if !set.contains(&node) {
            set.push(node);
        }
    }

    /// Cheapest vertex path between two mesh vertices
    ///
    /// Returns `None` when either endpoint has no node or no route exists.
    pub fn path(
        &self,
        from: VertexId,
        to: VertexId,
        exclude: &[NodeId],
    ) -> Option<Vec<VertexId>> {
        let start = *self.pt2node.get(&from)?;
        let goal = *self.pt2node.get(&to)?;
        let nodes = self.graph.path(start, goal, exclude)?;
        Some(nodes.into_iter().map(|n| self.node2pt[n.0]).collect())
    }

    /// Topology vertex closest to a target position (node creation order
    /// breaks ties)
    pub fn closest_vertex(&self, mesh: &Mesh, target: DVec2) -> Option<VertexId> {
        let mut best = None;
        let mut best_d = f64::INFINITY;
        for &v in &self.node2pt {
            let d = mesh.point(v).distance(target);
            if d < best_d {
                best_d = d;
                best = Some(v);
            }
        }
        best
    }
}

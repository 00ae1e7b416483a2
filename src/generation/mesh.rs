//! Shared-vertex mesh: vertex arena and identity polygons
//!
//! Patches, walls, gates and streets all refer to the same planar mesh.
//! Every later stage depends on neighboring structures observing each
//! other's vertex mutations (junction merges, wall smoothing, artery
//! smoothing), so vertices live in a single arena and everything else
//! holds [`VertexId`] handles. Writing through `set_point` is the arena
//! equivalent of mutating a pointer-shared vertex: every holder of the id
//! sees the move. Two contours share an edge if and only if they hold the
//! same two ids, which is what "identity equality" means here.

use glam::DVec2;

use crate::geom::Polygon;

/// Handle into the vertex arena
///
/// Equality of ids is vertex identity, independent of coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub u32);

/// Arena of mesh vertices
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    points: Vec<DVec2>,
}

impl Mesh {
    pub fn new() -> Self {
        Mesh::default()
    }

    /// Allocate a new vertex and return its handle
    pub fn alloc(&mut self, p: DVec2) -> VertexId {
        let id = VertexId(self.points.len() as u32);
        self.points.push(p);
        id
    }

    /// Coordinates of a vertex
    #[inline]
    pub fn point(&self, id: VertexId) -> DVec2 {
        self.points[id.0 as usize]
    }

    /// Move a vertex; the move is visible to every structure holding the id
    #[inline]
    pub fn set_point(&mut self, id: VertexId, p: DVec2) {
        self.points[id.0 as usize] = p;
    }

    /// Number of allocated vertices
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// A polygon (or open polyline) over arena vertices
///
/// Closed uses wrap from the last id back to the first; open routes
/// (streets, arteries) use the same storage but iterate segments without
/// wrapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contour {
    ids: Vec<VertexId>,
}

impl Contour {
    pub fn new(ids: Vec<VertexId>) -> Self {
        Contour { ids }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[inline]
    pub fn ids(&self) -> &[VertexId] {
        &self.ids
    }

    #[inline]
    pub fn id(&self, i: usize) -> VertexId {
        self.ids[i]
    }

    #[inline]
    pub fn first(&self) -> Option<VertexId> {
        self.ids.first().copied()
    }

    #[inline]
    pub fn last(&self) -> Option<VertexId> {
        self.ids.last().copied()
    }

    pub fn push(&mut self, id: VertexId) {
        self.ids.push(id);
    }

    pub fn insert(&mut self, index: usize, id: VertexId) {
        self.ids.insert(index, id);
    }

    /// Remove the first occurrence of an id
    pub fn remove_id(&mut self, id: VertexId) {
        if let Some(i) = self.index_of(id) {
            self.ids.remove(i);
        }
    }

    /// Replace the first occurrence of `from` with `to`
    pub fn replace_first(&mut self, from: VertexId, to: VertexId) -> bool {
        match self.ids.iter().position(|&v| v == from) {
            Some(i) => {
                self.ids[i] = to;
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn contains(&self, id: VertexId) -> bool {
        self.ids.contains(&id)
    }

    pub fn index_of(&self, id: VertexId) -> Option<usize> {
        self.ids.iter().position(|&v| v == id)
    }

    /// Id following `id` in cyclic order
    pub fn next_of(&self, id: VertexId) -> Option<VertexId> {
        let i = self.index_of(id)?;
        Some(self.ids[(i + 1) % self.ids.len()])
    }

    /// Id preceding `id` in cyclic order
    pub fn prev_of(&self, id: VertexId) -> Option<VertexId> {
        let i = self.index_of(id)?;
        let n = self.ids.len();
        Some(self.ids[(i + n - 1) % n])
    }

    /// Index of the directed edge `a -> b`, if present
    pub fn find_edge(&self, a: VertexId, b: VertexId) -> Option<usize> {
        let i = self.index_of(a)?;
        if self.ids[(i + 1) % self.ids.len()] == b {
            Some(i)
        } else {
            None
        }
    }

    /// Iterate over directed edges, wrapping at the end
    pub fn edge_ids(&self) -> impl Iterator<Item = (VertexId, VertexId)> + '_ {
        let n = self.ids.len();
        (0..n).map(move |i| (self.ids[i], self.ids[(i + 1) % n]))
    }

    /// True if the two contours share a directed or reversed edge
    pub fn borders(&self, other: &Contour) -> bool {
        let n = self.ids.len();
        let m = other.ids.len();
        if m == 0 {
            return false;
        }
        for (i, &v) in self.ids.iter().enumerate() {
            if let Some(j) = other.index_of(v) {
                let next = self.ids[(i + 1) % n];
                if other.ids[(j + 1) % m] == next || other.ids[(j + m - 1) % m] == next {
                    return true;
                }
            }
        }
        false
    }

    /// Split along the chord between two existing vertices
    ///
    /// Both halves keep the chord endpoints, preserving identity sharing
    /// across the new edge. Returns `None` if either id is absent.
    pub fn split(&self, a: VertexId, b: VertexId) -> Option<(Contour, Contour)> {
        let i1 = self.index_of(a)?;
        let i2 = self.index_of(b)?;
        let (i1, i2) = if i1 <= i2 { (i1, i2) } else { (i2, i1) };
        let first = Contour::new(self.ids[i1..=i2].to_vec());
        let mut rest = self.ids[i2..].to_vec();
        rest.extend_from_slice(&self.ids[..=i1]);
        Some((first, Contour::new(rest)))
    }

    /// Resolve into a value polygon
    pub fn to_polygon(&self, mesh: &Mesh) -> Polygon {
        Polygon::new(self.ids.iter().map(|&id| mesh.point(id)).collect())
    }

    /// Smoothed position for one vertex: `(prev + f*v + next) / (2 + f)`
    pub fn smooth_vertex(&self, mesh: &Mesh, id: VertexId, f: f64) -> DVec2 {
        match (self.prev_of(id), self.next_of(id)) {
            (Some(p), Some(n)) => {
                (mesh.point(p) + mesh.point(id) * f + mesh.point(n)) / (2.0 + f)
            }
            _ => mesh.point(id),
        }
    }

    /// Vertex minimizing a function of its coordinates
    pub fn min_by<F: FnMut(DVec2) -> f64>(&self, mesh: &Mesh, mut f: F) -> Option<VertexId> {
        let mut best = None;
        let mut best_val = f64::INFINITY;
        for &id in &self.ids {
            let val = f(mesh.point(id));
            if best.is_none() || val < best_val {
                best = Some(id);
                best_val = val;
            }
        }
        best
    }

    /// Vertex maximizing a function of its id (first of equals)
    pub fn max_by_id<F: FnMut(VertexId) -> f64>(&self, mut f: F) -> Option<VertexId> {
        let mut best = None;
        let mut best_val = f64::NEG_INFINITY;
        for &id in &self.ids {
            let val = f(id);
            if best.is_none() || val > best_val {
                best = Some(id);
                best_val = val;
            }
        }
        best
    }

    /// Minimal distance from any vertex to a point
    pub fn distance(&self, mesh: &Mesh, p: DVec2) -> f64 {
        self.ids
            .iter()
            .map(|&id| mesh.point(id).distance(p))
            .fold(f64::INFINITY, f64::min)
    }

    /// Drop duplicate ids, keeping the first occurrence of each
    pub fn dedup_ids(&mut self) {
        let mut seen = Vec::with_capacity(self.ids.len());
        self.ids.retain(|id| {
            if seen.contains(id) {
                false
            } else {
                seen.push(*id);
                true
            }
        });
    }
}

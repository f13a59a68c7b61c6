//! Progressive-mesh working representation.
//!
//! The simplification engine does not mutate the half-edge kernel. It runs on
//! this lightweight parallel view instead: plain vertex records carrying
//! adjacency id lists plus collapse bookkeeping (cost and target), and triangle
//! records carrying a cached normal. The two views share only vertex identity
//! and position data, so a retained [`HalfEdgeMesh`] stays exact while the
//! progressive copy is destructively reduced.

use nalgebra::{Point3, Vector3};

use crate::error::{MeshError, Result};
use crate::mesh::{FaceId, HalfEdgeMesh, VertexId};

/// Cross products shorter than this mark a zero-area triangle.
const DEGENERATE_AREA_EPS: f64 = 1e-12;

/// Unit normal of a triangle, or zero if degenerate.
fn triangle_normal(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>) -> Vector3<f64> {
    let n = (p1 - p0).cross(&(p2 - p0));
    let len = n.norm();
    if len < DEGENERATE_AREA_EPS {
        Vector3::zeros()
    } else {
        n / len
    }
}

/// A vertex in the progressive mesh.
///
/// Collapse bookkeeping invariant: whenever `cost` is finite, `target` is a
/// member of `neighbors`; a vertex with no neighbors is uncollapsible and
/// carries infinite cost.
#[derive(Debug, Clone)]
pub struct PmVertex {
    /// The 3D position of this vertex.
    pub position: Point3<f64>,
    neighbors: Vec<VertexId>,
    faces: Vec<FaceId>,
    cost: f64,
    target: VertexId,
}

impl PmVertex {
    /// Create a new vertex with empty adjacency and infinite collapse cost.
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            neighbors: Vec::new(),
            faces: Vec::new(),
            cost: f64::INFINITY,
            target: VertexId::invalid(),
        }
    }

    /// The ids of adjacent vertices.
    #[inline]
    pub fn neighbors(&self) -> &[VertexId] {
        &self.neighbors
    }

    /// The ids of incident faces.
    #[inline]
    pub fn faces(&self) -> &[FaceId] {
        &self.faces
    }

    /// Append an adjacent vertex. No dedup is performed; callers guarantee the
    /// id is not already present.
    #[inline]
    pub fn add_neighbor(&mut self, v: VertexId) {
        self.neighbors.push(v);
    }

    /// Append an incident face. No dedup is performed; callers guarantee the
    /// id is not already present.
    #[inline]
    pub fn add_face(&mut self, f: FaceId) {
        self.faces.push(f);
    }

    /// The current collapse cost (infinite while unset or uncollapsible).
    #[inline]
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// The neighbor this vertex would merge into at minimum cost.
    #[inline]
    pub fn target(&self) -> VertexId {
        self.target
    }

    /// Record the minimum-cost collapse for this vertex.
    #[inline]
    pub fn set_collapse(&mut self, cost: f64, target: VertexId) {
        self.cost = cost;
        self.target = target;
    }

    /// Park this vertex as uncollapsible until its neighborhood is re-priced.
    #[inline]
    pub fn clear_collapse(&mut self) {
        self.cost = f64::INFINITY;
        self.target = VertexId::invalid();
    }

    /// Whether this vertex has no adjacent vertices left.
    #[inline]
    pub fn is_isolated(&self) -> bool {
        self.neighbors.is_empty()
    }

    fn remove_neighbor(&mut self, v: VertexId) {
        self.neighbors.retain(|&n| n != v);
    }

    fn remove_face(&mut self, f: FaceId) {
        self.faces.retain(|&x| x != f);
    }

    fn set_neighbors(&mut self, neighbors: Vec<VertexId>) {
        self.neighbors = neighbors;
    }
}

/// A triangle in the progressive mesh.
#[derive(Debug, Clone)]
pub struct PmFace {
    vertices: [VertexId; 3],
    normal: Vector3<f64>,
}

impl PmFace {
    /// The three vertex ids, in winding order.
    #[inline]
    pub fn vertices(&self) -> [VertexId; 3] {
        self.vertices
    }

    /// The cached face normal (zero for a degenerate triangle).
    #[inline]
    pub fn normal(&self) -> Vector3<f64> {
        self.normal
    }

    /// Whether this face references the given vertex.
    #[inline]
    pub fn has_vertex(&self, v: VertexId) -> bool {
        self.vertices.contains(&v)
    }

    fn replace_vertex(&mut self, from: VertexId, to: VertexId) {
        for v in &mut self.vertices {
            if *v == from {
                *v = to;
            }
        }
    }
}

/// The progressive-mesh model: a destructively reducible triangle soup with
/// per-vertex adjacency and collapse bookkeeping.
///
/// Records are never physically removed during a run; they are flagged dead,
/// so ids held elsewhere (heap entries, collapse logs) stay stable. Dead
/// records are dropped only at [`ProgressiveMesh::to_indexed`] compaction.
#[derive(Debug, Clone)]
pub struct ProgressiveMesh {
    vertices: Vec<PmVertex>,
    faces: Vec<PmFace>,
    vertex_alive: Vec<bool>,
    face_alive: Vec<bool>,
    live_vertices: usize,
    live_faces: usize,
}

impl ProgressiveMesh {
    /// Build a progressive mesh from an indexed triangle mesh.
    ///
    /// # Errors
    /// Returns [`MeshError::EmptyMesh`] for an empty triangle list,
    /// [`MeshError::InvalidVertexIndex`] for an out-of-range index, and
    /// [`MeshError::DegenerateFace`] for a triangle with repeated vertices.
    pub fn from_indexed(positions: &[Point3<f64>], triangles: &[[usize; 3]]) -> Result<Self> {
        if triangles.is_empty() {
            return Err(MeshError::EmptyMesh);
        }
        for (fi, tri) in triangles.iter().enumerate() {
            for &vi in tri {
                if vi >= positions.len() {
                    return Err(MeshError::InvalidVertexIndex { face: fi, vertex: vi });
                }
            }
            if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
                return Err(MeshError::DegenerateFace { face: fi });
            }
        }

        Ok(Self::assemble(positions, triangles))
    }

    /// Build a progressive mesh from a half-edge mesh, fan-triangulating any
    /// polygonal faces. The half-edge mesh is not modified, now or later.
    pub fn from_halfedge(mesh: &HalfEdgeMesh) -> Self {
        let positions: Vec<Point3<f64>> =
            mesh.vertex_ids().map(|v| *mesh.position(v)).collect();

        let mut triangles = Vec::new();
        for f in mesh.interior_face_ids() {
            let cycle: Vec<usize> = mesh.face_vertices(f).map(|v| v.index()).collect();
            for k in 1..cycle.len() - 1 {
                triangles.push([cycle[0], cycle[k], cycle[k + 1]]);
            }
        }

        // Kernel faces have distinct cycle vertices, so no validation needed.
        Self::assemble(&positions, &triangles)
    }

    fn assemble(positions: &[Point3<f64>], triangles: &[[usize; 3]]) -> Self {
        let mut vertices: Vec<PmVertex> =
            positions.iter().map(|&p| PmVertex::new(p)).collect();

        let mut faces = Vec::with_capacity(triangles.len());
        for (fi, tri) in triangles.iter().enumerate() {
            let ids = [
                VertexId::new(tri[0]),
                VertexId::new(tri[1]),
                VertexId::new(tri[2]),
            ];
            let normal = triangle_normal(
                &positions[tri[0]],
                &positions[tri[1]],
                &positions[tri[2]],
            );
            faces.push(PmFace {
                vertices: ids,
                normal,
            });

            let fid = FaceId::new(fi);
            for (k, &v) in tri.iter().enumerate() {
                vertices[v].add_face(fid);
                for offset in [1, 2] {
                    let u = VertexId::new(tri[(k + offset) % 3]);
                    if !vertices[v].neighbors.contains(&u) {
                        vertices[v].add_neighbor(u);
                    }
                }
            }
        }

        let live_vertices = vertices.len();
        let live_faces = faces.len();
        Self {
            vertex_alive: vec![true; vertices.len()],
            face_alive: vec![true; faces.len()],
            vertices,
            faces,
            live_vertices,
            live_faces,
        }
    }

    // ==================== Accessors ====================

    /// Total number of vertex records, dead ones included.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of live vertices.
    #[inline]
    pub fn num_live_vertices(&self) -> usize {
        self.live_vertices
    }

    /// Number of live faces.
    #[inline]
    pub fn num_live_faces(&self) -> usize {
        self.live_faces
    }

    /// Get a vertex by id.
    #[inline]
    pub fn vertex(&self, v: VertexId) -> &PmVertex {
        &self.vertices[v.index()]
    }

    /// Get a mutable vertex by id.
    #[inline]
    pub fn vertex_mut(&mut self, v: VertexId) -> &mut PmVertex {
        &mut self.vertices[v.index()]
    }

    /// Get a face by id.
    #[inline]
    pub fn face(&self, f: FaceId) -> &PmFace {
        &self.faces[f.index()]
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId) -> &Point3<f64> {
        &self.vertices[v.index()].position
    }

    /// Whether the given vertex is still live.
    #[inline]
    pub fn is_vertex_alive(&self, v: VertexId) -> bool {
        self.vertex_alive[v.index()]
    }

    /// Whether the given face is still live.
    #[inline]
    pub fn is_face_alive(&self, f: FaceId) -> bool {
        self.face_alive[f.index()]
    }

    /// Iterate over live vertex ids.
    pub fn live_vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        (0..self.vertices.len())
            .map(VertexId::new)
            .filter(|&v| self.is_vertex_alive(v))
    }

    // ==================== Mutation ====================

    /// Remove a face: flag it dead and detach it from its vertices' face
    /// lists.
    pub fn remove_face(&mut self, f: FaceId) {
        if !self.face_alive[f.index()] {
            return;
        }
        self.face_alive[f.index()] = false;
        self.live_faces -= 1;

        let vs = self.faces[f.index()].vertices;
        for v in vs {
            self.vertices[v.index()].remove_face(f);
        }
    }

    /// Remove a vertex: flag it dead and detach it from its neighbors'
    /// adjacency lists. Incident faces must already be removed or rewired.
    pub fn remove_vertex(&mut self, v: VertexId) {
        if !self.vertex_alive[v.index()] {
            return;
        }
        self.vertex_alive[v.index()] = false;
        self.live_vertices -= 1;

        let neighbors = std::mem::take(&mut self.vertices[v.index()].neighbors);
        for n in neighbors {
            self.vertices[n.index()].remove_neighbor(v);
        }
        self.vertices[v.index()].faces.clear();
        self.vertices[v.index()].clear_collapse();
    }

    /// Rewire a face from one vertex to another and refresh its cached
    /// normal. The face is appended to `to`'s face list.
    pub fn rewire_face(&mut self, f: FaceId, from: VertexId, to: VertexId) {
        self.faces[f.index()].replace_vertex(from, to);
        self.vertices[to.index()].add_face(f);
        self.renormal_face(f);
    }

    /// Recompute a face's cached normal from current vertex positions.
    pub fn renormal_face(&mut self, f: FaceId) {
        let [a, b, c] = self.faces[f.index()].vertices;
        self.faces[f.index()].normal = triangle_normal(
            &self.vertices[a.index()].position,
            &self.vertices[b.index()].position,
            &self.vertices[c.index()].position,
        );
    }

    /// Whether a face has collapsed to fewer than 3 distinct vertices or to
    /// zero area.
    pub fn face_is_degenerate(&self, f: FaceId) -> bool {
        let [a, b, c] = self.faces[f.index()].vertices;
        if a == b || b == c || a == c {
            return true;
        }
        let n = (self.position(b) - self.position(a))
            .cross(&(self.position(c) - self.position(a)));
        n.norm() < DEGENERATE_AREA_EPS
    }

    /// Normal this face would have if `from` moved to the given position.
    pub fn face_normal_if_moved(
        &self,
        f: FaceId,
        from: VertexId,
        new_position: &Point3<f64>,
    ) -> Vector3<f64> {
        let [a, b, c] = self.faces[f.index()].vertices;
        let pick = |v: VertexId| {
            if v == from {
                *new_position
            } else {
                self.vertices[v.index()].position
            }
        };
        triangle_normal(&pick(a), &pick(b), &pick(c))
    }

    /// Rebuild a vertex's adjacency list from its live incident faces.
    pub fn rebuild_neighbors(&mut self, v: VertexId) {
        let mut neighbors: Vec<VertexId> = Vec::new();
        for &f in self.vertices[v.index()].faces.iter() {
            for u in self.faces[f.index()].vertices {
                if u != v && !neighbors.contains(&u) {
                    neighbors.push(u);
                }
            }
        }
        self.vertices[v.index()].set_neighbors(neighbors);
    }

    // ==================== Output ====================

    /// Compact the live vertices and faces into an indexed triangle mesh.
    pub fn to_indexed(&self) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let mut vertex_map: Vec<usize> = vec![usize::MAX; self.vertices.len()];
        let mut positions = Vec::with_capacity(self.live_vertices);

        for (i, v) in self.vertices.iter().enumerate() {
            if self.vertex_alive[i] {
                vertex_map[i] = positions.len();
                positions.push(v.position);
            }
        }

        let triangles: Vec<[usize; 3]> = self
            .faces
            .iter()
            .enumerate()
            .filter(|(fi, _)| self.face_alive[*fi])
            .map(|(_, f)| {
                let [a, b, c] = f.vertices;
                [
                    vertex_map[a.index()],
                    vertex_map[b.index()],
                    vertex_map[c.index()],
                ]
            })
            .collect();

        (positions, triangles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_polygons;

    fn two_triangles() -> ProgressiveMesh {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
        ];
        let triangles = vec![[0, 1, 2], [1, 0, 3]];
        ProgressiveMesh::from_indexed(&positions, &triangles).unwrap()
    }

    #[test]
    fn test_adjacency_from_indexed() {
        let pm = two_triangles();

        assert_eq!(pm.num_live_vertices(), 4);
        assert_eq!(pm.num_live_faces(), 2);

        let v0 = pm.vertex(VertexId::new(0));
        assert_eq!(v0.neighbors().len(), 3);
        assert_eq!(v0.faces().len(), 2);
        assert!(v0.cost().is_infinite());
        assert!(!v0.target().is_valid());

        let v2 = pm.vertex(VertexId::new(2));
        assert_eq!(v2.neighbors().len(), 2);
        assert_eq!(v2.faces().len(), 1);
    }

    #[test]
    fn test_degenerate_triangle_rejected() {
        let positions = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
        let result = ProgressiveMesh::from_indexed(&positions, &[[0, 1, 0]]);
        assert!(matches!(result, Err(MeshError::DegenerateFace { face: 0 })));
    }

    #[test]
    fn test_remove_face_detaches() {
        let mut pm = two_triangles();
        pm.remove_face(FaceId::new(0));

        assert_eq!(pm.num_live_faces(), 1);
        assert!(!pm.is_face_alive(FaceId::new(0)));
        assert_eq!(pm.vertex(VertexId::new(2)).faces().len(), 0);
        assert_eq!(pm.vertex(VertexId::new(0)).faces().len(), 1);

        // Removing again is a no-op
        pm.remove_face(FaceId::new(0));
        assert_eq!(pm.num_live_faces(), 1);
    }

    #[test]
    fn test_remove_vertex_detaches() {
        let mut pm = two_triangles();
        pm.remove_face(FaceId::new(0));
        pm.remove_face(FaceId::new(1));
        pm.remove_vertex(VertexId::new(3));

        assert_eq!(pm.num_live_vertices(), 3);
        for i in [0, 1] {
            assert!(!pm
                .vertex(VertexId::new(i))
                .neighbors()
                .contains(&VertexId::new(3)));
        }
    }

    #[test]
    fn test_rewire_and_degeneracy() {
        let mut pm = two_triangles();

        // Rewiring face 1 from vertex 3 to vertex 2 gives [1, 0, 2]: still a
        // real triangle, but wound opposite to face 0
        pm.rewire_face(FaceId::new(1), VertexId::new(3), VertexId::new(2));
        assert!(!pm.face_is_degenerate(FaceId::new(1)));
        let n0 = pm.face(FaceId::new(0)).normal();
        let n1 = pm.face(FaceId::new(1)).normal();
        assert!((n0.dot(&n1) + 1.0).abs() < 1e-12);

        // Rewiring face 0 from vertex 2 to vertex 1 leaves [0, 1, 1]
        pm.rewire_face(FaceId::new(0), VertexId::new(2), VertexId::new(1));
        assert!(pm.face_is_degenerate(FaceId::new(0)));
    }

    #[test]
    fn test_from_halfedge_fan_triangulates() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let faces = vec![vec![0, 1, 2, 3]];
        let mesh = build_from_polygons(&positions, &faces).unwrap();

        let pm = ProgressiveMesh::from_halfedge(&mesh);
        assert_eq!(pm.num_live_vertices(), 4);
        assert_eq!(pm.num_live_faces(), 2);
    }

    #[test]
    fn test_to_indexed_compacts() {
        let mut pm = two_triangles();
        pm.remove_face(FaceId::new(1));
        pm.remove_vertex(VertexId::new(3));

        let (positions, triangles) = pm.to_indexed();
        assert_eq!(positions.len(), 3);
        assert_eq!(triangles, vec![[0, 1, 2]]);
    }
}

//! Half-edge mesh data structure.
//!
//! This module provides a half-edge (doubly-connected edge list) representation
//! for polygonal meshes. This structure enables O(1) adjacency queries and is
//! the foundation for the geometry queries and the simplification pipeline.
//!
//! # Structure
//!
//! - Each edge is split into two **half-edges** pointing in opposite directions
//! - Each half-edge knows its **twin** (opposite half-edge), **next**/**prev**
//!   (around the face), **origin** vertex, undirected **edge**, and incident
//!   **face**
//! - Each vertex stores one outgoing half-edge
//! - Each edge stores one representative half-edge
//! - Each face stores one half-edge on its cycle
//!
//! # Boundary Handling
//!
//! Open mesh regions are closed off with sentinel **boundary faces**: one face
//! per boundary loop, flagged [`Face::is_boundary`]. Every half-edge therefore
//! has a valid face and every vertex rotate cycle (`twin.next`) closes, even at
//! mesh edges. Boundary faces take no part in geometry queries.
//!
//! # Invariants
//!
//! Construction (see [`build_from_polygons`](super::build_from_polygons))
//! guarantees `twin(twin(h)) == h` and `prev(next(h)) == h` for every
//! half-edge, that walking `next` returns to the start after `face_degree`
//! steps, and that walking `twin.next` returns after `vertex_degree` steps.
//! Traversal queries assume these hold and do not re-check them; only
//! [`HalfEdgeMesh::is_valid`] re-verifies the structure, for diagnostics.

use nalgebra::{Point3, Vector2, Vector3};

use super::index::{EdgeId, FaceId, HalfEdgeId, VertexId};

/// A vertex in the half-edge mesh.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// The 3D position of this vertex.
    pub position: Point3<f64>,

    /// One outgoing half-edge from this vertex.
    /// For boundary vertices, this is guaranteed to be a boundary half-edge.
    pub halfedge: HalfEdgeId,
}

impl Vertex {
    /// Create a new vertex at the given position.
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            halfedge: HalfEdgeId::invalid(),
        }
    }

    /// Create an uninitialized vertex, marked with the NaN-position sentinel.
    pub fn uninitialized() -> Self {
        Self::new(Point3::new(f64::NAN, f64::NAN, f64::NAN))
    }

    /// Check whether this vertex has been assigned a finite position.
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.position.coords.iter().all(|c| c.is_finite())
    }
}

/// A half-edge in the mesh.
#[derive(Debug, Clone)]
pub struct HalfEdge {
    /// The vertex this half-edge originates from.
    pub origin: VertexId,

    /// The opposite half-edge (pointing in the reverse direction).
    pub twin: HalfEdgeId,

    /// The next half-edge around the face (in winding order).
    pub next: HalfEdgeId,

    /// The previous half-edge around the face.
    pub prev: HalfEdgeId,

    /// The undirected edge this half-edge belongs to.
    pub edge: EdgeId,

    /// The face this half-edge belongs to. Always valid after construction;
    /// boundary half-edges point at a boundary face.
    pub face: FaceId,

    /// Per-corner texture coordinate at the origin vertex of this half-edge.
    pub uv: Vector2<f64>,

    /// Per-corner shading normal at the origin vertex of this half-edge.
    pub normal: Vector3<f64>,
}

impl HalfEdge {
    /// Create a new unlinked half-edge.
    pub fn new() -> Self {
        Self {
            origin: VertexId::invalid(),
            twin: HalfEdgeId::invalid(),
            next: HalfEdgeId::invalid(),
            prev: HalfEdgeId::invalid(),
            edge: EdgeId::invalid(),
            face: FaceId::invalid(),
            uv: Vector2::zeros(),
            normal: Vector3::zeros(),
        }
    }
}

impl Default for HalfEdge {
    fn default() -> Self {
        Self::new()
    }
}

/// An undirected edge in the mesh.
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    /// One of the two half-edges of this edge.
    pub halfedge: HalfEdgeId,
}

impl Edge {
    /// Create a new edge with the given representative half-edge.
    pub fn new(halfedge: HalfEdgeId) -> Self {
        Self { halfedge }
    }
}

/// A face in the half-edge mesh.
#[derive(Debug, Clone, Copy)]
pub struct Face {
    /// One half-edge on the cycle of this face.
    pub halfedge: HalfEdgeId,

    /// Whether this is a sentinel face closing an open boundary loop.
    pub is_boundary: bool,
}

impl Face {
    /// Create a new interior face with the given half-edge.
    pub fn interior(halfedge: HalfEdgeId) -> Self {
        Self {
            halfedge,
            is_boundary: false,
        }
    }

    /// Create a new boundary (sentinel) face with the given half-edge.
    pub fn boundary(halfedge: HalfEdgeId) -> Self {
        Self {
            halfedge,
            is_boundary: true,
        }
    }
}

/// A half-edge mesh data structure for polygonal meshes.
///
/// All vertex, half-edge, edge, and face records live in `Vec` arenas owned by
/// the mesh; every cross-reference between them is a stable integer id into one
/// of those arenas, never a pointer. The topology is cyclically linked, so ids
/// are the only way the references can survive mutation without dangling.
#[derive(Debug, Clone, Default)]
pub struct HalfEdgeMesh {
    /// All vertices in the mesh.
    pub(crate) vertices: Vec<Vertex>,

    /// All half-edges in the mesh.
    pub(crate) halfedges: Vec<HalfEdge>,

    /// All undirected edges in the mesh.
    pub(crate) edges: Vec<Edge>,

    /// All faces in the mesh, interior first, then one per boundary loop.
    pub(crate) faces: Vec<Face>,
}

impl HalfEdgeMesh {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(num_vertices: usize, num_faces: usize) -> Self {
        // Each triangle has 3 half-edges; interior edges are shared, boundary
        // edges gain a synthesized opposite. 4F is a safe upper estimate.
        let num_halfedges = num_faces * 4;

        Self {
            vertices: Vec::with_capacity(num_vertices),
            halfedges: Vec::with_capacity(num_halfedges),
            edges: Vec::with_capacity(num_halfedges / 2),
            faces: Vec::with_capacity(num_faces),
        }
    }

    // ==================== Accessors ====================

    /// Get the number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of half-edges (boundary half-edges included).
    #[inline]
    pub fn num_halfedges(&self) -> usize {
        self.halfedges.len()
    }

    /// Get the number of undirected edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Get the number of interior faces. O(F).
    pub fn num_faces(&self) -> usize {
        self.faces.iter().filter(|f| !f.is_boundary).count()
    }

    /// Get the number of boundary loops (sentinel faces). O(F).
    pub fn num_boundary_loops(&self) -> usize {
        self.faces.iter().filter(|f| f.is_boundary).count()
    }

    /// Get a vertex by id.
    #[inline]
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.index()]
    }

    /// Get a mutable vertex by id.
    #[inline]
    pub fn vertex_mut(&mut self, id: VertexId) -> &mut Vertex {
        &mut self.vertices[id.index()]
    }

    /// Get a half-edge by id.
    #[inline]
    pub fn halfedge(&self, id: HalfEdgeId) -> &HalfEdge {
        &self.halfedges[id.index()]
    }

    /// Get a mutable half-edge by id.
    #[inline]
    pub fn halfedge_mut(&mut self, id: HalfEdgeId) -> &mut HalfEdge {
        &mut self.halfedges[id.index()]
    }

    /// Get an edge by id.
    #[inline]
    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.index()]
    }

    /// Get a face by id.
    #[inline]
    pub fn face(&self, id: FaceId) -> &Face {
        &self.faces[id.index()]
    }

    /// Get a mutable face by id.
    #[inline]
    pub fn face_mut(&mut self, id: FaceId) -> &mut Face {
        &mut self.faces[id.index()]
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId) -> &Point3<f64> {
        &self.vertex(v).position
    }

    /// Set the position of a vertex.
    #[inline]
    pub fn set_position(&mut self, v: VertexId, pos: Point3<f64>) {
        self.vertex_mut(v).position = pos;
    }

    // ==================== Topology Queries ====================

    /// Get the twin (opposite) half-edge.
    #[inline]
    pub fn twin(&self, he: HalfEdgeId) -> HalfEdgeId {
        self.halfedge(he).twin
    }

    /// Get the next half-edge around the face.
    #[inline]
    pub fn next(&self, he: HalfEdgeId) -> HalfEdgeId {
        self.halfedge(he).next
    }

    /// Get the previous half-edge around the face.
    #[inline]
    pub fn prev(&self, he: HalfEdgeId) -> HalfEdgeId {
        self.halfedge(he).prev
    }

    /// Get the origin vertex of a half-edge.
    #[inline]
    pub fn origin(&self, he: HalfEdgeId) -> VertexId {
        self.halfedge(he).origin
    }

    /// Get the destination vertex of a half-edge.
    #[inline]
    pub fn dest(&self, he: HalfEdgeId) -> VertexId {
        self.origin(self.twin(he))
    }

    /// Get the undirected edge of a half-edge.
    #[inline]
    pub fn edge_of(&self, he: HalfEdgeId) -> EdgeId {
        self.halfedge(he).edge
    }

    /// Get the face of a half-edge.
    #[inline]
    pub fn face_of(&self, he: HalfEdgeId) -> FaceId {
        self.halfedge(he).face
    }

    /// Check if a half-edge lies on a boundary face.
    #[inline]
    pub fn is_boundary_halfedge(&self, he: HalfEdgeId) -> bool {
        self.face(self.face_of(he)).is_boundary
    }

    /// Check if an edge is on the mesh boundary.
    ///
    /// An edge is on the boundary iff either incident face is a boundary face.
    #[inline]
    pub fn is_boundary_edge(&self, e: EdgeId) -> bool {
        let he = self.edge(e).halfedge;
        self.is_boundary_halfedge(he) || self.is_boundary_halfedge(self.twin(he))
    }

    /// Check if a vertex is on the mesh boundary.
    ///
    /// Walks the rotate cycle (`twin.next`) looking for a boundary face;
    /// O(degree). Isolated vertices count as boundary.
    pub fn is_boundary_vertex(&self, v: VertexId) -> bool {
        let start = self.vertex(v).halfedge;
        if !start.is_valid() {
            return true;
        }

        let mut he = start;
        loop {
            if self.is_boundary_halfedge(he) {
                return true;
            }
            he = self.next(self.twin(he));
            if he == start {
                break;
            }
        }
        false
    }

    /// Get the degree of a face: the number of half-edges in its `next` cycle.
    pub fn face_degree(&self, f: FaceId) -> usize {
        self.face_halfedges(f).count()
    }

    /// Get the degree (valence) of a vertex: the number of half-edges in its
    /// rotate cycle. Boundary half-edges are counted.
    pub fn vertex_degree(&self, v: VertexId) -> usize {
        self.vertex_halfedges(v).count()
    }

    // ==================== Iteration ====================

    /// Iterate over all vertex ids.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        (0..self.vertices.len()).map(VertexId::new)
    }

    /// Iterate over all half-edge ids.
    pub fn halfedge_ids(&self) -> impl Iterator<Item = HalfEdgeId> + '_ {
        (0..self.halfedges.len()).map(HalfEdgeId::new)
    }

    /// Iterate over all edge ids.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        (0..self.edges.len()).map(EdgeId::new)
    }

    /// Iterate over all face ids, boundary faces included.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        (0..self.faces.len()).map(FaceId::new)
    }

    /// Iterate over interior face ids only.
    pub fn interior_face_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.face_ids().filter(|&f| !self.face(f).is_boundary)
    }

    /// Iterate over half-edges around a vertex (outgoing half-edges).
    pub fn vertex_halfedges(&self, v: VertexId) -> VertexHalfEdgeIter<'_> {
        VertexHalfEdgeIter::new(self, v)
    }

    /// Iterate over vertices adjacent to a vertex.
    pub fn vertex_neighbors(&self, v: VertexId) -> impl Iterator<Item = VertexId> + '_ {
        self.vertex_halfedges(v).map(|he| self.dest(he))
    }

    /// Iterate over interior faces adjacent to a vertex.
    pub fn vertex_faces(&self, v: VertexId) -> impl Iterator<Item = FaceId> + '_ {
        self.vertex_halfedges(v)
            .map(|he| self.face_of(he))
            .filter(|&f| !self.face(f).is_boundary)
    }

    /// Iterate over half-edges around a face.
    pub fn face_halfedges(&self, f: FaceId) -> FaceHalfEdgeIter<'_> {
        FaceHalfEdgeIter::new(self, f)
    }

    /// Iterate over vertices of a face, in winding order.
    pub fn face_vertices(&self, f: FaceId) -> impl Iterator<Item = VertexId> + '_ {
        self.face_halfedges(f).map(|he| self.origin(he))
    }

    // ==================== Construction ====================

    /// Add a new vertex and return its id.
    pub fn add_vertex(&mut self, position: Point3<f64>) -> VertexId {
        let id = VertexId::new(self.vertices.len());
        self.vertices.push(Vertex::new(position));
        id
    }

    // ==================== Validation ====================

    /// Check if the mesh is valid: all cross-references consistent and all
    /// positions and corner attributes finite.
    ///
    /// This is the only query that re-checks the construction invariants; it is
    /// intended for external diagnostics, not hot paths.
    pub fn is_valid(&self) -> bool {
        for (vi, v) in self.vertices.iter().enumerate() {
            if !v.is_initialized() {
                return false;
            }
            if v.halfedge.is_valid() && self.halfedge(v.halfedge).origin != VertexId::new(vi) {
                return false;
            }
        }

        for (hi, he) in self.halfedges.iter().enumerate() {
            let heid = HalfEdgeId::new(hi);
            if !he.twin.is_valid() || !he.next.is_valid() || !he.prev.is_valid() {
                return false;
            }
            if !he.origin.is_valid() || !he.edge.is_valid() || !he.face.is_valid() {
                return false;
            }
            if self.halfedge(he.twin).twin != heid {
                return false;
            }
            if self.halfedge(he.next).prev != heid || self.halfedge(he.prev).next != heid {
                return false;
            }
            // Both sides of an edge must agree on the undirected owner.
            if self.halfedge(he.twin).edge != he.edge {
                return false;
            }
            if !he.uv.iter().all(|c| c.is_finite()) || !he.normal.iter().all(|c| c.is_finite()) {
                return false;
            }
        }

        for e in &self.edges {
            if !e.halfedge.is_valid() {
                return false;
            }
        }

        for (fi, f) in self.faces.iter().enumerate() {
            if !f.halfedge.is_valid() {
                return false;
            }
            if self.halfedge(f.halfedge).face != FaceId::new(fi) {
                return false;
            }
        }

        true
    }
}

/// Iterator over outgoing half-edges around a vertex (the rotate cycle).
pub struct VertexHalfEdgeIter<'a> {
    mesh: &'a HalfEdgeMesh,
    start: HalfEdgeId,
    current: HalfEdgeId,
    done: bool,
}

impl<'a> VertexHalfEdgeIter<'a> {
    fn new(mesh: &'a HalfEdgeMesh, v: VertexId) -> Self {
        let start = mesh.vertex(v).halfedge;
        Self {
            mesh,
            start,
            current: start,
            done: !start.is_valid(),
        }
    }
}

impl<'a> Iterator for VertexHalfEdgeIter<'a> {
    type Item = HalfEdgeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;

        // If he goes v -> w, then twin(he) goes w -> v, and next(twin(he))
        // is the next half-edge out of v.
        self.current = self.mesh.next(self.mesh.twin(self.current));

        if self.current == self.start {
            self.done = true;
        }

        Some(result)
    }
}

/// Iterator over half-edges around a face.
pub struct FaceHalfEdgeIter<'a> {
    mesh: &'a HalfEdgeMesh,
    start: HalfEdgeId,
    current: HalfEdgeId,
    done: bool,
}

impl<'a> FaceHalfEdgeIter<'a> {
    fn new(mesh: &'a HalfEdgeMesh, f: FaceId) -> Self {
        let start = mesh.face(f).halfedge;
        Self {
            mesh,
            start,
            current: start,
            done: !start.is_valid(),
        }
    }
}

impl<'a> Iterator for FaceHalfEdgeIter<'a> {
    type Item = HalfEdgeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;
        self.current = self.mesh.next(self.current);

        if self.current == self.start {
            self.done = true;
        }

        Some(result)
    }
}

//! Mesh construction utilities.
//!
//! This module builds half-edge meshes from an indexed representation: a
//! vertex position list plus per-face vertex-index lists in consistent winding
//! order. Faces may be polygons of any degree >= 3.
//!
//! Unpaired half-edges (edges used by exactly one face) are closed off with
//! synthesized boundary half-edges, linked into one boundary loop per open
//! region and owned by a sentinel boundary face, so the finished mesh always
//! satisfies the rotate-cycle and face-cycle invariants.
//!
//! All allocation loops run in face/half-edge index order, never in hash-map
//! iteration order, so element ids are deterministic for identical input.

use std::collections::HashMap;

use nalgebra::Point3;
use tracing::debug;

use super::halfedge::{Edge, Face, HalfEdge, HalfEdgeMesh};
use super::index::{EdgeId, FaceId, HalfEdgeId, VertexId};
use crate::error::{MeshError, Result};

/// Build a half-edge mesh from vertices and polygonal faces.
///
/// # Arguments
/// * `positions` - List of vertex positions
/// * `faces` - List of faces, each an ordered list of vertex indices
///   (degree >= 3, consistent winding)
///
/// # Errors
/// Returns a [`MeshError`] if the face list is empty, an index is out of
/// range, a face repeats a vertex, an edge is shared by more than two faces,
/// or the winding is inconsistent. A failed build leaves no partial mesh.
///
/// # Limitations
/// Vertex non-manifoldness is detected only where it involves the boundary
/// (two boundary loops meeting at a vertex). Two otherwise-closed fans
/// sharing a single vertex build without error; the shared vertex anchors one
/// fan arbitrarily, so its rotate cycle and [`HalfEdgeMesh::vertex_degree`]
/// cover only that fan, and [`HalfEdgeMesh::is_valid`] does not flag the
/// configuration either.
///
/// # Example
/// ```
/// use whittle::mesh::{build_from_polygons, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let positions = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let faces = vec![vec![0, 1, 2, 3]];
///
/// let mesh = build_from_polygons(&positions, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 4);
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn build_from_polygons(
    positions: &[Point3<f64>],
    faces: &[Vec<usize>],
) -> Result<HalfEdgeMesh> {
    let views: Vec<&[usize]> = faces.iter().map(|f| f.as_slice()).collect();
    build(positions, &views)
}

/// Build a half-edge mesh from vertices and triangle faces.
///
/// Convenience wrapper over [`build_from_polygons`] for the common
/// all-triangle case.
pub fn build_from_triangles(
    positions: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<HalfEdgeMesh> {
    let views: Vec<&[usize]> = faces.iter().map(|f| f.as_slice()).collect();
    build(positions, &views)
}

fn build(positions: &[Point3<f64>], faces: &[&[usize]]) -> Result<HalfEdgeMesh> {
    if faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    for (fi, face) in faces.iter().enumerate() {
        if face.len() < 3 {
            return Err(MeshError::DegenerateFace { face: fi });
        }
        for (k, &vi) in face.iter().enumerate() {
            if vi >= positions.len() {
                return Err(MeshError::InvalidVertexIndex { face: fi, vertex: vi });
            }
            // Repeated vertex anywhere in the cycle makes the face degenerate.
            if face[k + 1..].contains(&vi) {
                return Err(MeshError::DegenerateFace { face: fi });
            }
        }
    }

    let mut mesh = HalfEdgeMesh::with_capacity(positions.len(), faces.len());
    let vertex_ids: Vec<VertexId> = positions.iter().map(|&p| mesh.add_vertex(p)).collect();

    // Map from directed edge (v0, v1) to its half-edge, and use count per
    // undirected edge for manifoldness checking.
    let mut directed: HashMap<(usize, usize), HalfEdgeId> = HashMap::new();
    let mut undirected_uses: HashMap<(usize, usize), u32> = HashMap::new();

    // First pass: create interior half-edges and faces, link face cycles.
    for (fi, face) in faces.iter().enumerate() {
        let degree = face.len();
        let base = mesh.num_halfedges();
        let face_id = FaceId::new(fi);
        mesh.faces.push(Face::interior(HalfEdgeId::new(base)));

        for k in 0..degree {
            let v0 = face[k];
            let v1 = face[(k + 1) % degree];

            let he = HalfEdgeId::new(base + k);
            let mut record = HalfEdge::new();
            record.origin = vertex_ids[v0];
            record.next = HalfEdgeId::new(base + (k + 1) % degree);
            record.prev = HalfEdgeId::new(base + (k + degree - 1) % degree);
            record.face = face_id;
            mesh.halfedges.push(record);

            // Anchor may be overwritten for shared vertices; fixed up later.
            mesh.vertex_mut(vertex_ids[v0]).halfedge = he;

            let key = if v0 < v1 { (v0, v1) } else { (v1, v0) };
            let uses = undirected_uses.entry(key).or_insert(0);
            *uses += 1;
            if *uses > 2 {
                return Err(MeshError::NonManifoldEdge { v0: key.0, v1: key.1 });
            }
            if directed.insert((v0, v1), he).is_some() {
                return Err(MeshError::InconsistentWinding { v0, v1 });
            }
        }
    }

    // Second pass: pair twins and allocate undirected edges; synthesize a
    // boundary half-edge for every unpaired interior half-edge.
    let interior_count = mesh.num_halfedges();
    for i in 0..interior_count {
        let he = HalfEdgeId::new(i);
        if mesh.halfedge(he).edge.is_valid() {
            continue;
        }

        let a = mesh.origin(he).index();
        let b = mesh.origin(mesh.next(he)).index();
        let eid = EdgeId::new(mesh.num_edges());
        mesh.edges.push(Edge::new(he));
        mesh.halfedge_mut(he).edge = eid;

        if let Some(&twin) = directed.get(&(b, a)) {
            mesh.halfedge_mut(he).twin = twin;
            mesh.halfedge_mut(twin).twin = he;
            mesh.halfedge_mut(twin).edge = eid;
        } else {
            let boundary_he = HalfEdgeId::new(mesh.num_halfedges());
            let mut record = HalfEdge::new();
            record.origin = vertex_ids[b];
            record.twin = he;
            record.edge = eid;
            mesh.halfedges.push(record);
            mesh.halfedge_mut(he).twin = boundary_he;
        }
    }

    // Third pass: link boundary half-edges into loops, one sentinel face each.
    link_boundary_loops(&mut mesh, interior_count)?;

    // Fourth pass: ensure boundary vertices point to boundary half-edges.
    fix_boundary_vertex_halfedges(&mut mesh);

    debug!(
        vertices = mesh.num_vertices(),
        faces = mesh.num_faces(),
        edges = mesh.num_edges(),
        boundary_loops = mesh.num_boundary_loops(),
        "built half-edge mesh"
    );

    Ok(mesh)
}

/// Link boundary half-edges into closed loops, each owned by a boundary face.
fn link_boundary_loops(mesh: &mut HalfEdgeMesh, interior_count: usize) -> Result<()> {
    let total = mesh.num_halfedges();

    // At a manifold boundary vertex exactly one boundary half-edge leaves it.
    let mut outgoing: HashMap<usize, HalfEdgeId> = HashMap::new();
    for i in interior_count..total {
        let he = HalfEdgeId::new(i);
        let origin = mesh.origin(he).index();
        if outgoing.insert(origin, he).is_some() {
            return Err(MeshError::NonManifold {
                details: format!("two boundary loops meet at vertex {origin}"),
            });
        }
    }

    for i in interior_count..total {
        let start = HalfEdgeId::new(i);
        if mesh.face_of(start).is_valid() {
            continue;
        }

        let face_id = FaceId::new(mesh.faces.len());
        mesh.faces.push(Face::boundary(start));

        let mut current = start;
        loop {
            mesh.halfedge_mut(current).face = face_id;

            // The boundary half-edge opposing interior a -> b runs b -> a, so
            // its destination is its twin's origin.
            let dest = mesh.origin(mesh.twin(current)).index();
            let next = *outgoing.get(&dest).ok_or_else(|| MeshError::NonManifold {
                details: format!("boundary loop cannot close at vertex {dest}"),
            })?;
            if mesh.prev(next).is_valid() {
                return Err(MeshError::NonManifold {
                    details: format!("boundary loop pinches at vertex {dest}"),
                });
            }

            mesh.halfedge_mut(current).next = next;
            mesh.halfedge_mut(next).prev = current;

            current = next;
            if current == start {
                break;
            }
        }
    }

    Ok(())
}

/// Ensure boundary vertices point to a boundary half-edge, so callers probing
/// the anchor see the boundary without a full rotate.
fn fix_boundary_vertex_halfedges(mesh: &mut HalfEdgeMesh) {
    for vi in 0..mesh.num_vertices() {
        let vid = VertexId::new(vi);
        let start = mesh.vertex(vid).halfedge;
        if !start.is_valid() {
            continue;
        }

        let mut he = start;
        loop {
            if mesh.is_boundary_halfedge(he) {
                mesh.vertex_mut(vid).halfedge = he;
                break;
            }
            he = mesh.next(mesh.twin(he));
            if he == start {
                break;
            }
        }
    }
}

/// Convert a half-edge mesh back to an indexed representation.
///
/// Returns (positions, faces); boundary faces are not emitted.
pub fn to_indexed(mesh: &HalfEdgeMesh) -> (Vec<Point3<f64>>, Vec<Vec<usize>>) {
    let positions: Vec<Point3<f64>> = mesh.vertex_ids().map(|v| *mesh.position(v)).collect();

    let faces: Vec<Vec<usize>> = mesh
        .interior_face_ids()
        .map(|f| mesh.face_vertices(f).map(|v| v.index()).collect())
        .collect();

    (positions, faces)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_triangle() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2]];
        (positions, faces)
    }

    fn two_triangles() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        // Two triangles sharing the edge (0, 1)
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [1, 0, 3]];
        (positions, faces)
    }

    fn tetrahedron() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        (positions, faces)
    }

    #[test]
    fn test_single_triangle() {
        let (positions, faces) = single_triangle();
        let mesh = build_from_triangles(&positions, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_faces(), 1);
        assert_eq!(mesh.num_edges(), 3);
        // 3 interior half-edges + 3 boundary half-edges
        assert_eq!(mesh.num_halfedges(), 6);
        // One boundary loop around the lone triangle
        assert_eq!(mesh.num_boundary_loops(), 1);
        assert!(mesh.is_valid());

        // A lone triangle has no interior elements at all
        for v in mesh.vertex_ids() {
            assert!(mesh.is_boundary_vertex(v));
        }
        for e in mesh.edge_ids() {
            assert!(mesh.is_boundary_edge(e));
        }
    }

    #[test]
    fn test_two_triangles() {
        let (positions, faces) = two_triangles();
        let mesh = build_from_triangles(&positions, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.num_edges(), 5);
        // 6 interior half-edges + 4 boundary half-edges
        assert_eq!(mesh.num_halfedges(), 10);
        assert!(mesh.is_valid());

        // The shared edge (0, 1) is interior, the rest are boundary
        let interior: Vec<_> = mesh
            .edge_ids()
            .filter(|&e| !mesh.is_boundary_edge(e))
            .collect();
        assert_eq!(interior.len(), 1);
    }

    #[test]
    fn test_closed_mesh_invariants() {
        let (positions, faces) = tetrahedron();
        let mesh = build_from_triangles(&positions, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 4);
        assert_eq!(mesh.num_edges(), 6);
        assert_eq!(mesh.num_halfedges(), 12);
        assert_eq!(mesh.num_boundary_loops(), 0);
        assert!(mesh.is_valid());

        for he in mesh.halfedge_ids() {
            assert_eq!(mesh.twin(mesh.twin(he)), he);
            assert_eq!(mesh.prev(mesh.next(he)), he);
        }

        for v in mesh.vertex_ids() {
            assert!(!mesh.is_boundary_vertex(v));
            assert_eq!(mesh.vertex_degree(v), 3);
        }
    }

    #[test]
    fn test_face_degree_matches_input() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(-1.0, 0.5, 0.0),
        ];
        let faces = vec![vec![0, 1, 2, 3], vec![0, 3, 4]];
        let mesh = build_from_polygons(&positions, &faces).unwrap();

        assert!(mesh.is_valid());
        for (fi, f) in mesh.interior_face_ids().enumerate() {
            assert_eq!(mesh.face_degree(f), faces[fi].len());
        }
    }

    #[test]
    fn test_rotate_cycle_closes() {
        let (positions, faces) = two_triangles();
        let mesh = build_from_triangles(&positions, &faces).unwrap();

        for v in mesh.vertex_ids() {
            let degree = mesh.vertex_degree(v);
            let mut he = mesh.vertex(v).halfedge;
            for _ in 0..degree {
                assert_eq!(mesh.origin(he), v);
                he = mesh.next(mesh.twin(he));
            }
            assert_eq!(he, mesh.vertex(v).halfedge);
        }
    }

    #[test]
    fn test_roundtrip() {
        let (positions, faces) = tetrahedron();
        let mesh = build_from_triangles(&positions, &faces).unwrap();

        let (out_positions, out_faces) = to_indexed(&mesh);

        assert_eq!(out_positions.len(), positions.len());
        assert_eq!(out_faces.len(), faces.len());
        for (p_in, p_out) in positions.iter().zip(out_positions.iter()) {
            assert!((p_in - p_out).norm() < 1e-12);
        }
        for (f_in, f_out) in faces.iter().zip(out_faces.iter()) {
            assert_eq!(f_out.len(), 3);
            // Same cycle, possibly rotated
            let offset = f_out.iter().position(|&v| v == f_in[0]).unwrap();
            for k in 0..3 {
                assert_eq!(f_out[(offset + k) % 3], f_in[k]);
            }
        }
    }

    #[test]
    fn test_empty_mesh_rejected() {
        let positions = vec![Point3::new(0.0, 0.0, 0.0)];
        let result = build_from_polygons(&positions, &[]);
        assert!(matches!(result, Err(MeshError::EmptyMesh)));
    }

    #[test]
    fn test_invalid_vertex_index() {
        let positions = vec![Point3::new(0.0, 0.0, 0.0)];
        let faces = vec![[0, 1, 2]];

        let result = build_from_triangles(&positions, &faces);
        assert!(matches!(
            result,
            Err(MeshError::InvalidVertexIndex { face: 0, vertex: 1 })
        ));
    }

    #[test]
    fn test_degenerate_face() {
        let (positions, _) = single_triangle();
        let faces = vec![[0, 0, 2]];

        let result = build_from_triangles(&positions, &faces);
        assert!(matches!(result, Err(MeshError::DegenerateFace { face: 0 })));
    }

    #[test]
    fn test_non_manifold_edge() {
        // Three triangles sharing the edge (0, 1)
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
            Point3::new(0.5, 0.0, 1.0),
        ];
        let faces = vec![[0, 1, 2], [1, 0, 3], [0, 1, 4]];

        let result = build_from_triangles(&positions, &faces);
        assert!(matches!(result, Err(MeshError::NonManifoldEdge { v0: 0, v1: 1 })));
    }

    #[test]
    fn test_inconsistent_winding() {
        // Second triangle traverses (0, 1) in the same direction as the first
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [0, 1, 3]];

        let result = build_from_triangles(&positions, &faces);
        assert!(matches!(
            result,
            Err(MeshError::InconsistentWinding { v0: 0, v1: 1 })
        ));
    }

    #[test]
    fn test_two_boundary_loops() {
        // Two triangles touching only at vertex 2 would pinch the boundary;
        // builds of such inputs must fail rather than loop forever.
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [2, 3, 4]];

        let result = build_from_triangles(&positions, &faces);
        assert!(matches!(result, Err(MeshError::NonManifold { .. })));
    }

    #[test]
    fn test_closed_fans_sharing_vertex_build() {
        // Two tetrahedra touching only at vertex 3: no boundary is involved,
        // so the pinch goes undetected and the build succeeds. The shared
        // vertex's rotate cycle covers just one of its two fans.
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
            Point3::new(0.0, 0.0, 2.0),
            Point3::new(1.0, 0.0, 2.0),
            Point3::new(0.5, 1.0, 2.0),
        ];
        let faces = vec![
            [0, 2, 1],
            [0, 1, 3],
            [1, 2, 3],
            [2, 0, 3],
            [4, 6, 5],
            [4, 5, 3],
            [5, 6, 3],
            [6, 4, 3],
        ];

        let mesh = build_from_triangles(&positions, &faces).unwrap();
        assert!(mesh.is_valid());
        assert_eq!(mesh.num_boundary_loops(), 0);
        assert_eq!(mesh.vertex_degree(VertexId::new(3)), 3);
    }

    #[test]
    fn test_boundary_vertex_anchor() {
        let (positions, faces) = two_triangles();
        let mesh = build_from_triangles(&positions, &faces).unwrap();

        for v in mesh.vertex_ids() {
            if mesh.is_boundary_vertex(v) {
                assert!(mesh.is_boundary_halfedge(mesh.vertex(v).halfedge));
            }
        }
    }
}

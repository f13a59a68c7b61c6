//! # Whittle
//!
//! A half-edge mesh kernel with progressive simplification.
//!
//! Whittle provides a boundary-aware half-edge data structure for constant
//! time adjacency queries, a set of geometric queries over it, and a greedy
//! edge-collapse engine that whittles a triangle mesh down toward a target
//! resolution, optionally emitting a level-of-detail sequence along the way.
//!
//! ## Features
//!
//! - **Half-edge data structure**: O(1) adjacency queries with type-safe indices
//! - **Explicit boundaries**: boundary loops carry sentinel faces, so every
//!   half-edge has a valid face and rotations never fall off the mesh
//! - **Geometric queries**: normals, areas, centroids, bounding boxes
//! - **Progressive simplification**: greedy edge collapse with pluggable cost
//!   policies and normal-flip rejection
//!
//! ## Quick Start
//!
//! ```
//! use whittle::prelude::*;
//! use nalgebra::Point3;
//!
//! // Define vertices and faces
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//!     Point3::new(0.5, 0.5, 1.0),
//! ];
//!
//! let faces = vec![
//!     [0, 2, 1],  // bottom
//!     [0, 1, 3],  // front
//!     [1, 2, 3],  // right
//!     [2, 0, 3],  // left
//! ];
//!
//! // Build the mesh
//! let mesh = build_from_triangles(&vertices, &faces).unwrap();
//! assert_eq!(mesh.num_vertices(), 4);
//! assert_eq!(mesh.num_faces(), 4);
//!
//! // Query mesh properties
//! for f in mesh.interior_face_ids() {
//!     let normal = mesh.face_normal(f);
//!     let area = mesh.face_area(f);
//!     println!("Face {:?}: normal={:?}, area={}", f, normal, area);
//! }
//! ```
//!
//! ## Mesh Traversal
//!
//! The half-edge structure enables efficient traversal of mesh elements:
//!
//! ```
//! use whittle::prelude::*;
//! use nalgebra::Point3;
//!
//! # let vertices = vec![
//! #     Point3::new(0.0, 0.0, 0.0),
//! #     Point3::new(1.0, 0.0, 0.0),
//! #     Point3::new(0.5, 1.0, 0.0),
//! # ];
//! # let faces = vec![[0, 1, 2]];
//! # let mesh = build_from_triangles(&vertices, &faces).unwrap();
//! // Iterate over neighbors of a vertex
//! let v = VertexId::new(0);
//! for neighbor in mesh.vertex_neighbors(v) {
//!     println!("Neighbor: {:?}", neighbor);
//! }
//!
//! // Iterate over interior faces around a vertex
//! for face in mesh.vertex_faces(v) {
//!     println!("Adjacent face: {:?}", face);
//! }
//! ```
//!
//! ## Simplification
//!
//! ```
//! use whittle::prelude::*;
//! use nalgebra::Point3;
//!
//! # let vertices = vec![
//! #     Point3::new(0.0, 0.0, 0.0),
//! #     Point3::new(1.0, 0.0, 0.0),
//! #     Point3::new(0.5, 1.0, 0.0),
//! #     Point3::new(0.5, 0.5, 1.0),
//! # ];
//! # let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
//! let options = SimplifyOptions::with_target_vertices(3);
//! let result = simplify(&vertices, &faces, EdgeCurvatureCost, &options).unwrap();
//! println!("{result}");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod mesh;
pub mod simplify;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use whittle::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{
        build_from_polygons, build_from_triangles, to_indexed, Edge, EdgeId, Face, FaceId,
        HalfEdge, HalfEdgeId, HalfEdgeMesh, Vertex, VertexId,
    };
    pub use crate::simplify::{
        simplify, CollapseCost, EdgeCurvatureCost, EdgeLengthCost, SimplifyOptions,
        SimplifyResult, Simplifier,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use nalgebra::Point3;

    #[test]
    fn test_tetrahedron() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];

        let faces = vec![
            [0, 2, 1], // bottom
            [0, 1, 3], // front
            [1, 2, 3], // right
            [2, 0, 3], // left
        ];

        let mesh = build_from_triangles(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 4);
        assert_eq!(mesh.num_halfedges(), 12);
        assert_eq!(mesh.num_boundary_loops(), 0);
        assert!(mesh.is_valid());

        // Closed mesh: no boundary vertices
        for v in mesh.vertex_ids() {
            assert!(!mesh.is_boundary_vertex(v), "vertex {:?} should not be on boundary", v);
        }
    }

    #[test]
    fn test_build_then_simplify() {
        let vertices = vec![
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, -1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, -1.0),
        ];
        let faces = vec![
            [0, 2, 4],
            [2, 1, 4],
            [1, 3, 4],
            [3, 0, 4],
            [2, 0, 5],
            [1, 2, 5],
            [3, 1, 5],
            [0, 3, 5],
        ];

        // Connectivity checks out before reduction
        let mesh = build_from_triangles(&vertices, &faces).unwrap();
        assert!(mesh.is_valid());

        let options = SimplifyOptions::with_target_vertices(4);
        let result = simplify(&vertices, &faces, EdgeCurvatureCost, &options).unwrap();
        assert!(result.final_vertices <= 6);

        // The reduced mesh must itself be a buildable manifold
        if !result.triangles.is_empty() {
            let reduced = build_from_triangles(&result.positions, &result.triangles).unwrap();
            assert!(reduced.is_valid());
        }
    }
}

//! Core mesh data structures.
//!
//! This module provides the half-edge mesh representation and related types
//! for representing and querying polygonal meshes.
//!
//! # Overview
//!
//! The primary type is [`HalfEdgeMesh`], which represents a polygonal mesh
//! using a half-edge (doubly-connected edge list) data structure. This
//! representation provides O(1) adjacency queries, making it efficient for
//! geometry processing.
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe index wrappers:
//! - [`VertexId`] - Identifies a vertex
//! - [`HalfEdgeId`] - Identifies a half-edge
//! - [`EdgeId`] - Identifies an undirected edge
//! - [`FaceId`] - Identifies a face (interior or boundary sentinel)
//!
//! # Construction
//!
//! Meshes are constructed from an indexed representation:
//!
//! ```
//! use whittle::mesh::build_from_triangles;
//! use nalgebra::Point3;
//!
//! let positions = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2]];
//!
//! let mesh = build_from_triangles(&positions, &faces).unwrap();
//! assert!(mesh.is_valid());
//! ```

mod builder;
mod geometry;
mod halfedge;
mod index;

pub use builder::{build_from_polygons, build_from_triangles, to_indexed};
pub use halfedge::{
    Edge, Face, FaceHalfEdgeIter, HalfEdge, HalfEdgeMesh, Vertex, VertexHalfEdgeIter,
};
pub use index::{EdgeId, FaceId, HalfEdgeId, VertexId};

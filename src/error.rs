//! Error types for whittle.
//!
//! This module defines all error types used throughout the library.
//!
//! Only structural problems detected while building a half-edge mesh are
//! reported as errors. Geometric degeneracies (zero-area faces, zero-length
//! edges) are absorbed by the queries as well-defined fallback values and never
//! abort processing of the rest of the mesh.

use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur while constructing a mesh.
#[derive(Error, Debug)]
pub enum MeshError {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A face has fewer than three vertices or repeats a vertex.
    #[error("face {face} is degenerate (fewer than 3 distinct vertices)")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// An undirected edge is shared by more than two oriented half-edges.
    #[error("edge ({v0}, {v1}) is shared by more than two faces")]
    NonManifoldEdge {
        /// First vertex of the edge.
        v0: usize,
        /// Second vertex of the edge.
        v1: usize,
    },

    /// Two faces traverse the same directed edge, so their windings disagree.
    #[error("inconsistent winding: directed edge ({v0}, {v1}) appears twice")]
    InconsistentWinding {
        /// Origin vertex of the directed edge.
        v0: usize,
        /// Destination vertex of the directed edge.
        v1: usize,
    },

    /// The mesh has non-manifold topology not covered by a more specific variant.
    #[error("mesh has non-manifold topology: {details}")]
    NonManifold {
        /// Description of the non-manifold condition.
        details: String,
    },
}

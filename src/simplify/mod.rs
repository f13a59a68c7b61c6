//! Mesh simplification by greedy edge collapse.
//!
//! This module reduces a triangle mesh toward a vertex- or face-count floor
//! by repeatedly merging the cheapest vertex into one of its neighbors. The
//! working representation is the [`ProgressiveMesh`] model, a flat
//! index-based structure tuned for destructive edits; candidate ordering is
//! driven by a pluggable [`CollapseCost`] policy, with
//! [`EdgeCurvatureCost`] as the default.
//!
//! The simplest entry point is [`simplify`]:
//!
//! ```
//! use whittle::simplify::{simplify, EdgeCurvatureCost, SimplifyOptions};
//! use nalgebra::Point3;
//!
//! let positions = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//!     Point3::new(0.5, 0.5, 1.0),
//! ];
//! let triangles = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
//!
//! let options = SimplifyOptions::with_target_vertices(3);
//! let result = simplify(&positions, &triangles, EdgeCurvatureCost, &options)?;
//! println!("{result}");
//! # Ok::<(), whittle::error::MeshError>(())
//! ```
//!
//! Callers needing finer control (external time budgets, inspection between
//! collapses) drive a [`Simplifier`] step by step instead.

mod collapse;
mod model;

pub use collapse::{
    simplify, CollapseCost, EdgeCurvatureCost, EdgeLengthCost, LodMesh, SimplifyOptions,
    SimplifyResult, SimplifyState, Simplifier,
};
pub use model::{PmFace, PmVertex, ProgressiveMesh};

//! Greedy edge-collapse simplification.
//!
//! The engine runs over the [`ProgressiveMesh`] model as a small state
//! machine: `Initialized` (costs assigned) -> `Collapsing` (one edge collapse
//! per step) -> `Stable` (target reached or nothing legal left).
//!
//! Each step extracts the globally cheapest vertex from a priority queue and
//! merges it into its recorded target. Stale queue entries are detected with
//! per-vertex version counters instead of queue removal. After a collapse only
//! the vertices adjacent to either endpoint are re-priced, which bounds
//! per-collapse work to the affected one-ring.
//!
//! A collapse that would flip a surviving face normal past the configured
//! tolerance, or pinch the surface, is rejected: the vertex is parked at
//! infinite cost until a neighborhood update re-prices it and the engine falls
//! through to the next candidate. Running out of candidates before the target
//! is reached is not an error; the caller gets whatever reduction was achieved
//! with [`SimplifyResult::complete`] cleared.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use nalgebra::Point3;
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::error::Result;
use crate::mesh::{FaceId, VertexId};

use super::model::ProgressiveMesh;

/// A pluggable collapse-cost policy.
///
/// The returned cost estimates the geometric error of merging `from` into its
/// neighbor `to`. Implementations must be non-negative, deterministic for
/// identical input, and need not handle an isolated `from` (the engine prices
/// those at infinity itself).
pub trait CollapseCost: Sync {
    /// Cost of collapsing `from` into the adjacent vertex `to`.
    fn cost(&self, mesh: &ProgressiveMesh, from: VertexId, to: VertexId) -> f64;
}

/// Edge length weighted by local curvature: the classic progressive-mesh
/// metric. Collapsing across a flat neighborhood is nearly free regardless of
/// edge length; collapsing over a crease is charged the full length.
///
/// For each face around `from`, the deviation from the faces shared with `to`
/// is `(1 - n_f . n_s) / 2`; the cost is the edge length times the largest
/// such deviation. Not monotone under local edits, so the globally cheapest
/// cost may decrease across a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeCurvatureCost;

impl CollapseCost for EdgeCurvatureCost {
    fn cost(&self, mesh: &ProgressiveMesh, from: VertexId, to: VertexId) -> f64 {
        let length = (mesh.position(to) - mesh.position(from)).norm();

        let from_faces = mesh.vertex(from).faces();
        if from_faces.is_empty() {
            // A faceless vertex slides for free.
            return 0.0;
        }

        let shared: Vec<FaceId> = from_faces
            .iter()
            .copied()
            .filter(|&f| mesh.face(f).has_vertex(to))
            .collect();
        if shared.is_empty() {
            // No face spans this edge; collapsing it would pinch the surface.
            return f64::INFINITY;
        }

        let mut curvature: f64 = 0.0;
        for &f in from_faces {
            let nf = mesh.face(f).normal();
            let mut deviation: f64 = 1.0;
            for &s in &shared {
                let d = (1.0 - nf.dot(&mesh.face(s).normal())) / 2.0;
                deviation = deviation.min(d);
            }
            curvature = curvature.max(deviation);
        }

        length * curvature
    }
}

/// Plain edge-length cost: the shortest edge collapses first, geometry
/// ignored. Useful as a cheap baseline policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeLengthCost;

impl CollapseCost for EdgeLengthCost {
    fn cost(&self, mesh: &ProgressiveMesh, from: VertexId, to: VertexId) -> f64 {
        (mesh.position(to) - mesh.position(from)).norm()
    }
}

/// Options for mesh simplification.
#[derive(Debug, Clone)]
pub struct SimplifyOptions {
    /// Stop when the live vertex count reaches this floor.
    pub target_vertices: Option<usize>,

    /// Stop when the live face count reaches this floor.
    pub target_faces: Option<usize>,

    /// Minimum allowed dot product between a surviving face's normal before
    /// and after a collapse; collapses below it are rejected. Default 0.0
    /// (reject anything past perpendicular).
    pub normal_flip_tolerance: f64,

    /// External iteration budget: stop after this many collapses even if no
    /// target was reached. The partially reduced result is still valid.
    pub max_collapses: Option<usize>,

    /// Vertex counts at which to snapshot an intermediate mesh, producing a
    /// level-of-detail sequence alongside the final mesh.
    pub lod_targets: Vec<usize>,
}

impl Default for SimplifyOptions {
    fn default() -> Self {
        Self {
            target_vertices: None,
            target_faces: None,
            normal_flip_tolerance: 0.0,
            max_collapses: None,
            lod_targets: Vec::new(),
        }
    }
}

impl SimplifyOptions {
    /// Create options targeting a vertex-count floor.
    pub fn with_target_vertices(target: usize) -> Self {
        Self {
            target_vertices: Some(target),
            ..Default::default()
        }
    }

    /// Create options targeting a face-count floor.
    pub fn with_target_faces(target: usize) -> Self {
        Self {
            target_faces: Some(target),
            ..Default::default()
        }
    }

    /// Set the normal-flip rejection tolerance.
    pub fn with_normal_flip_tolerance(mut self, tolerance: f64) -> Self {
        self.normal_flip_tolerance = tolerance;
        self
    }

    /// Set an iteration budget.
    pub fn with_max_collapses(mut self, max: usize) -> Self {
        self.max_collapses = Some(max);
        self
    }

    /// Request intermediate snapshots at the given vertex counts.
    pub fn with_lod_targets(mut self, targets: Vec<usize>) -> Self {
        self.lod_targets = targets;
        self
    }
}

/// Engine state. There are no other states: `Collapsing` is re-entered once
/// per collapse until a floor is reached or no finite-cost vertex remains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimplifyState {
    /// Costs assigned, no collapse performed yet.
    Initialized,
    /// At least one collapse performed, more may follow.
    Collapsing,
    /// No further collapse will be performed.
    Stable,
}

/// An intermediate level-of-detail snapshot.
#[derive(Debug, Clone)]
pub struct LodMesh {
    /// Live vertex count at the time of the snapshot.
    pub vertex_count: usize,
    /// Vertex positions.
    pub positions: Vec<Point3<f64>>,
    /// Triangles as vertex-index triples.
    pub triangles: Vec<[usize; 3]>,
}

/// Result of a simplification run.
#[derive(Debug, Clone)]
pub struct SimplifyResult {
    /// Vertex positions of the simplified mesh.
    pub positions: Vec<Point3<f64>>,
    /// Triangles of the simplified mesh.
    pub triangles: Vec<[usize; 3]>,
    /// The (removed, target) vertex pairs, in execution order.
    pub collapses: Vec<(VertexId, VertexId)>,
    /// Number of candidate collapses rejected.
    pub rejected: usize,
    /// Intermediate snapshots, in decreasing vertex-count order.
    pub lods: Vec<LodMesh>,
    /// Whether the requested reduction target was reached. Always true when
    /// no target was set.
    pub complete: bool,
    /// Vertex count before simplification.
    pub original_vertices: usize,
    /// Face count before simplification.
    pub original_faces: usize,
    /// Vertex count after simplification.
    pub final_vertices: usize,
    /// Face count after simplification.
    pub final_faces: usize,
}

impl std::fmt::Display for SimplifyResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "simplified {} -> {} vertices, {} -> {} faces ({} collapses, {} rejected{})",
            self.original_vertices,
            self.final_vertices,
            self.original_faces,
            self.final_faces,
            self.collapses.len(),
            self.rejected,
            if self.complete { "" } else { ", target not reached" },
        )
    }
}

/// A heap entry. Ordered so the binary max-heap pops the lowest cost first,
/// ties broken by the lowest vertex id for determinism.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    cost: f64,
    vertex: VertexId,
    version: u32,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

/// Snapshot the mesh for every pending floor the live vertex count has
/// reached, consuming those floors.
fn drain_lod_floors(mesh: &ProgressiveMesh, queue: &mut Vec<usize>, lods: &mut Vec<LodMesh>) {
    while queue
        .first()
        .is_some_and(|&floor| mesh.num_live_vertices() <= floor)
    {
        queue.remove(0);
        let (positions, triangles) = mesh.to_indexed();
        lods.push(LodMesh {
            vertex_count: mesh.num_live_vertices(),
            positions,
            triangles,
        });
    }
}

/// Cheapest collapse out of `v`, ties broken by lowest target id.
fn best_collapse<C: CollapseCost>(
    mesh: &ProgressiveMesh,
    policy: &C,
    v: VertexId,
) -> (f64, VertexId) {
    let mut best = f64::INFINITY;
    let mut target = VertexId::invalid();

    for &u in mesh.vertex(v).neighbors() {
        let c = policy.cost(mesh, v, u);
        if c < best || (c == best && c.is_finite() && u < target) {
            best = c;
            target = u;
        }
    }

    (best, target)
}

/// The greedy edge-collapse state machine.
///
/// Most callers use [`simplify`]; the driver is public so a caller imposing an
/// external time budget can [`step`](Simplifier::step) the machine itself and
/// stop mid-`Collapsing`, treating the current state as a valid partially
/// reduced result.
pub struct Simplifier<C: CollapseCost> {
    mesh: ProgressiveMesh,
    policy: C,
    state: SimplifyState,
    versions: Vec<u32>,
    heap: BinaryHeap<Candidate>,
    collapses: Vec<(VertexId, VertexId)>,
    rejected: usize,
}

impl<C: CollapseCost> Simplifier<C> {
    /// Create a simplifier over the given model. Costs are not assigned until
    /// [`assign_costs`](Simplifier::assign_costs) or the first run.
    pub fn new(mesh: ProgressiveMesh, policy: C) -> Self {
        let versions = vec![0; mesh.num_vertices()];
        Self {
            mesh,
            policy,
            state: SimplifyState::Initialized,
            versions,
            heap: BinaryHeap::new(),
            collapses: Vec::new(),
            rejected: 0,
        }
    }

    /// The current engine state.
    pub fn state(&self) -> SimplifyState {
        self.state
    }

    /// The current (partially reduced) model.
    pub fn mesh(&self) -> &ProgressiveMesh {
        &self.mesh
    }

    /// The (removed, target) pairs collapsed so far, in execution order.
    pub fn collapses(&self) -> &[(VertexId, VertexId)] {
        &self.collapses
    }

    /// Evaluate the collapse cost and target of every live vertex and fill
    /// the priority queue.
    ///
    /// Vertices are independent before any collapse commits, so this pass is
    /// parallel; everything after it is serial because each collapse
    /// invalidates the costs of its neighborhood.
    pub fn assign_costs(&mut self) {
        let priced: Vec<(VertexId, f64, VertexId)> = {
            let mesh = &self.mesh;
            let policy = &self.policy;
            (0..mesh.num_vertices())
                .into_par_iter()
                .map(VertexId::new)
                .filter(|&v| mesh.is_vertex_alive(v))
                .map(|v| {
                    let (cost, target) = best_collapse(mesh, policy, v);
                    (v, cost, target)
                })
                .collect()
        };

        for (v, cost, target) in priced {
            self.mesh.vertex_mut(v).set_collapse(cost, target);
            if cost.is_finite() {
                self.heap.push(Candidate {
                    cost,
                    vertex: v,
                    version: self.versions[v.index()],
                });
            }
        }
    }

    /// Perform one collapse. Returns the (removed, target) pair, or `None`
    /// once no legal collapse remains, which moves the engine to `Stable`.
    pub fn step(&mut self, options: &SimplifyOptions) -> Option<(VertexId, VertexId)> {
        while let Some(candidate) = self.heap.pop() {
            let u = candidate.vertex;
            if !self.mesh.is_vertex_alive(u) || candidate.version != self.versions[u.index()] {
                continue;
            }

            let v = self.mesh.vertex(u).target();
            if !v.is_valid() || !self.mesh.is_vertex_alive(v) {
                continue;
            }

            if !self.collapse_is_legal(u, v, options.normal_flip_tolerance) {
                trace!(vertex = u.index(), "collapse rejected");
                self.rejected += 1;
                self.mesh.vertex_mut(u).clear_collapse();
                self.versions[u.index()] += 1;
                continue;
            }

            self.state = SimplifyState::Collapsing;
            self.execute_collapse(u, v);
            self.collapses.push((u, v));
            trace!(removed = u.index(), target = v.index(), "collapsed edge");
            return Some((u, v));
        }

        self.state = SimplifyState::Stable;
        None
    }

    /// Run the machine to a floor (or exhaustion) and emit the result.
    pub fn run(mut self, options: &SimplifyOptions) -> SimplifyResult {
        let original_vertices = self.mesh.num_live_vertices();
        let original_faces = self.mesh.num_live_faces();

        if self.state == SimplifyState::Initialized && self.heap.is_empty() {
            self.assign_costs();
        }

        // Snapshot floors, largest first so they trigger in collapse order.
        // Floors at or above the starting count are satisfied before any
        // collapse, so drain once up front.
        let mut lod_queue = options.lod_targets.clone();
        lod_queue.sort_unstable_by(|a, b| b.cmp(a));
        lod_queue.dedup();
        let mut lods = Vec::new();
        drain_lod_floors(&self.mesh, &mut lod_queue, &mut lods);

        while !self.target_reached(options) {
            if let Some(max) = options.max_collapses {
                if self.collapses.len() >= max {
                    break;
                }
            }
            if self.step(options).is_none() {
                break;
            }
            drain_lod_floors(&self.mesh, &mut lod_queue, &mut lods);
        }
        self.state = SimplifyState::Stable;

        let has_target = options.target_vertices.is_some() || options.target_faces.is_some();
        let complete = !has_target || self.target_reached(options);

        let (positions, triangles) = self.mesh.to_indexed();
        let result = SimplifyResult {
            final_vertices: positions.len(),
            final_faces: triangles.len(),
            positions,
            triangles,
            collapses: self.collapses,
            rejected: self.rejected,
            lods,
            complete,
            original_vertices,
            original_faces,
        };
        debug!(%result, "simplification finished");
        result
    }

    fn target_reached(&self, options: &SimplifyOptions) -> bool {
        if let Some(floor) = options.target_vertices {
            if self.mesh.num_live_vertices() <= floor {
                return true;
            }
        }
        if let Some(floor) = options.target_faces {
            if self.mesh.num_live_faces() <= floor {
                return true;
            }
        }
        false
    }

    fn collapse_is_legal(&self, u: VertexId, v: VertexId, tolerance: f64) -> bool {
        let u_faces = self.mesh.vertex(u).faces();

        // Merging across an edge no face spans pinches the surface, unless
        // the vertex has no faces at all.
        let spans_edge = u_faces.iter().any(|&f| self.mesh.face(f).has_vertex(v));
        if !spans_edge && !u_faces.is_empty() {
            return false;
        }

        // Surviving faces must not flip past the tolerance when u moves to v.
        let new_position = *self.mesh.position(v);
        for &f in u_faces {
            if self.mesh.face(f).has_vertex(v) {
                continue;
            }
            let old_normal = self.mesh.face(f).normal();
            let new_normal = self.mesh.face_normal_if_moved(f, u, &new_position);
            if old_normal.norm() > 0.0
                && new_normal.norm() > 0.0
                && old_normal.dot(&new_normal) < tolerance
            {
                return false;
            }
        }

        true
    }

    fn execute_collapse(&mut self, u: VertexId, v: VertexId) {
        // Everything whose local topology changes: both one-rings.
        let mut affected: Vec<VertexId> = self
            .mesh
            .vertex(u)
            .neighbors()
            .iter()
            .chain(self.mesh.vertex(v).neighbors())
            .copied()
            .filter(|&n| n != u)
            .collect();
        affected.push(v);
        affected.sort_unstable();
        affected.dedup();

        // Faces spanning the collapsed edge degenerate to an edge.
        let doomed: Vec<FaceId> = self
            .mesh
            .vertex(u)
            .faces()
            .iter()
            .copied()
            .filter(|&f| self.mesh.face(f).has_vertex(v))
            .collect();
        for f in doomed {
            self.mesh.remove_face(f);
        }

        // Remaining faces of u are rewired to v; any left without 3 distinct
        // vertices or with zero area is pruned.
        let remaining: Vec<FaceId> = self.mesh.vertex(u).faces().to_vec();
        for f in remaining {
            self.mesh.rewire_face(f, u, v);
            if self.mesh.face_is_degenerate(f) {
                self.mesh.remove_face(f);
            }
        }

        self.mesh.remove_vertex(u);

        for &n in &affected {
            self.mesh.rebuild_neighbors(n);
        }

        // Re-price the affected one-ring; all other costs are untouched.
        for &n in &affected {
            let (cost, target) = best_collapse(&self.mesh, &self.policy, n);
            self.mesh.vertex_mut(n).set_collapse(cost, target);
            self.versions[n.index()] += 1;
            if cost.is_finite() {
                self.heap.push(Candidate {
                    cost,
                    vertex: n,
                    version: self.versions[n.index()],
                });
            }
        }
    }
}

/// Simplify an indexed triangle mesh with the given cost policy.
///
/// # Errors
/// Fails only if the input indexed mesh is malformed; never because the
/// reduction target could not be reached (see [`SimplifyResult::complete`]).
///
/// # Example
/// ```
/// use whittle::simplify::{simplify, EdgeCurvatureCost, SimplifyOptions};
/// use nalgebra::Point3;
///
/// let positions = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
///     Point3::new(0.5, 0.5, 1.0),
/// ];
/// let triangles = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
///
/// let options = SimplifyOptions::with_target_vertices(3);
/// let result = simplify(&positions, &triangles, EdgeCurvatureCost, &options).unwrap();
/// assert!(result.final_vertices <= positions.len());
/// ```
pub fn simplify<C: CollapseCost>(
    positions: &[Point3<f64>],
    triangles: &[[usize; 3]],
    policy: C,
    options: &SimplifyOptions,
) -> Result<SimplifyResult> {
    let mesh = ProgressiveMesh::from_indexed(positions, triangles)?;
    Ok(Simplifier::new(mesh, policy).run(options))
}

//! Geometric queries over the half-edge mesh.
//!
//! All queries here are pure functions of the mesh's current state: nothing is
//! mutated and nothing is cached, so results are recomputed on every call.
//! Callers that need hot-path performance cache externally.
//!
//! Numeric conventions: normals are computed in object space; a degenerate
//! (zero-area) face yields the zero vector rather than an error, and callers
//! must treat a zero normal as "undefined, skip". Centroids are the unweighted
//! arithmetic mean of the cycle's vertices, not area-weighted.

use nalgebra::{Point3, Vector3};

use super::halfedge::HalfEdgeMesh;
use super::index::{EdgeId, FaceId, VertexId};

/// Normals shorter than this are treated as degenerate and zeroed.
const DEGENERATE_NORMAL_EPS: f64 = 1e-12;

impl HalfEdgeMesh {
    /// Compute the centroid of a face: the unweighted mean of its cycle's
    /// vertex positions.
    pub fn face_centroid(&self, f: FaceId) -> Point3<f64> {
        let mut sum = Vector3::zeros();
        let mut count = 0usize;
        for v in self.face_vertices(f) {
            sum += self.position(v).coords;
            count += 1;
        }
        Point3::from(sum / count as f64)
    }

    /// Compute the unit normal of a face by Newell's method: the sum of
    /// successive edge cross products around the cycle, normalized.
    ///
    /// A degenerate (zero-area) face yields the zero vector, not an error.
    pub fn face_normal(&self, f: FaceId) -> Vector3<f64> {
        let mut n = Vector3::zeros();
        for he in self.face_halfedges(f) {
            let p = self.position(self.origin(he));
            let q = self.position(self.dest(he));
            n += p.coords.cross(&q.coords);
        }

        let len = n.norm();
        if len < DEGENERATE_NORMAL_EPS {
            Vector3::zeros()
        } else {
            n / len
        }
    }

    /// Compute the area of a face by triangle-fan decomposition from the
    /// cycle's first vertex: the sum of 1/2 |(vi - v0) x (vi+1 - v0)|.
    pub fn face_area(&self, f: FaceId) -> f64 {
        let positions: Vec<Point3<f64>> = self
            .face_vertices(f)
            .map(|v| *self.position(v))
            .collect();

        let p0 = positions[0];
        let mut area = 0.0;
        for window in positions[1..].windows(2) {
            let e1 = window[0] - p0;
            let e2 = window[1] - p0;
            area += 0.5 * e1.cross(&e2).norm();
        }
        area
    }

    /// Compute the length of an edge: the Euclidean distance between its two
    /// endpoint positions.
    pub fn edge_length(&self, e: EdgeId) -> f64 {
        let he = self.edge(e).halfedge;
        let p0 = self.position(self.origin(he));
        let p1 = self.position(self.dest(he));
        (p1 - p0).norm()
    }

    /// Compute the midpoint of an edge.
    pub fn edge_midpoint(&self, e: EdgeId) -> Point3<f64> {
        let he = self.edge(e).halfedge;
        let p0 = self.position(self.origin(he));
        let p1 = self.position(self.dest(he));
        Point3::from((p0.coords + p1.coords) * 0.5)
    }

    /// Compute the area-weighted normal at a vertex, averaged over its
    /// incident interior faces. Zero if every incident face is degenerate.
    pub fn vertex_normal(&self, v: VertexId) -> Vector3<f64> {
        let mut n = Vector3::zeros();
        for f in self.vertex_faces(v) {
            // Unnormalized Newell vector: twice the face area times the unit
            // normal, so summing is area weighting.
            for he in self.face_halfedges(f) {
                let p = self.position(self.origin(he));
                let q = self.position(self.dest(he));
                n += p.coords.cross(&q.coords);
            }
        }

        let len = n.norm();
        if len < DEGENERATE_NORMAL_EPS {
            Vector3::zeros()
        } else {
            n / len
        }
    }

    /// Compute the total surface area over all interior faces.
    pub fn surface_area(&self) -> f64 {
        self.interior_face_ids().map(|f| self.face_area(f)).sum()
    }

    /// Compute the axis-aligned bounding box of the mesh.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.vertices.first()?;
        let mut min = first.position;
        let mut max = first.position;

        for v in &self.vertices {
            for i in 0..3 {
                min[i] = min[i].min(v.position[i]);
                max[i] = max[i].max(v.position[i]);
            }
        }

        Some((min, max))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    use crate::mesh::{build_from_polygons, build_from_triangles, EdgeId, FaceId, VertexId};

    fn unit_cube() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        ];
        let faces = vec![
            [0, 2, 1],
            [0, 3, 2],
            [4, 5, 6],
            [4, 6, 7],
            [0, 1, 5],
            [0, 5, 4],
            [2, 3, 7],
            [2, 7, 6],
            [1, 2, 6],
            [1, 6, 5],
            [3, 0, 4],
            [3, 4, 7],
        ];
        (positions, faces)
    }

    #[test]
    fn test_face_centroid_is_mean() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(0.0, 3.0, 0.0),
        ];
        let mesh = build_from_triangles(&positions, &[[0, 1, 2]]).unwrap();

        let c = mesh.face_centroid(FaceId::new(0));
        assert_relative_eq!(c.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(c.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(c.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_face_normal_ccw() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh = build_from_triangles(&positions, &[[0, 1, 2]]).unwrap();

        let n = mesh.face_normal(FaceId::new(0));
        assert_relative_eq!(n.z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_face_normal_is_zero() {
        // Collinear vertices: zero area, zero normal, no panic
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let mesh = build_from_triangles(&positions, &[[0, 1, 2]]).unwrap();

        let n = mesh.face_normal(FaceId::new(0));
        assert_eq!(n.norm(), 0.0);
        assert_relative_eq!(mesh.face_area(FaceId::new(0)), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_polygon_area_fan() {
        // Unit square as a single quad face
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let faces = vec![vec![0, 1, 2, 3]];
        let mesh = build_from_polygons(&positions, &faces).unwrap();

        assert_relative_eq!(mesh.face_area(FaceId::new(0)), 1.0, epsilon = 1e-12);
        let n = mesh.face_normal(FaceId::new(0));
        assert_relative_eq!(n.z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cube_surface_area() {
        let (positions, faces) = unit_cube();
        let mesh = build_from_triangles(&positions, &faces).unwrap();

        assert!(mesh.is_valid());
        assert_eq!(mesh.num_boundary_loops(), 0);
        assert_relative_eq!(mesh.surface_area(), 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_edge_length_and_midpoint() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ];
        let mesh = build_from_triangles(&positions, &[[0, 1, 2]]).unwrap();

        // Edge ids follow half-edge creation order: (0,1), (1,2), (2,0)
        assert_relative_eq!(mesh.edge_length(EdgeId::new(0)), 2.0, epsilon = 1e-12);
        let mid = mesh.edge_midpoint(EdgeId::new(0));
        assert_relative_eq!(mid.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(mid.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_vertex_normal_on_flat_patch() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(-1.0, -1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [0, 3, 1]];
        let mesh = build_from_triangles(&positions, &faces).unwrap();

        let n = mesh.vertex_normal(VertexId::new(0));
        assert_relative_eq!(n.z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_bounding_box() {
        let (positions, faces) = unit_cube();
        let mesh = build_from_triangles(&positions, &faces).unwrap();

        let (min, max) = mesh.bounding_box().unwrap();
        assert_eq!(min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(max, Point3::new(1.0, 1.0, 1.0));
    }
}

//! Benchmarks for mesh construction, traversal, and simplification.

use criterion::{criterion_group, criterion_main, Criterion};
use nalgebra::Point3;
use whittle::prelude::*;

fn grid(n: usize) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    let mut faces = Vec::with_capacity(n * n * 2);

    // Grid vertices with a gentle height field so simplification has
    // curvature to work against
    for j in 0..=n {
        for i in 0..=n {
            let x = i as f64;
            let y = j as f64;
            vertices.push(Point3::new(x, y, (x * 0.7).sin() * (y * 0.7).cos()));
        }
    }

    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + (n + 1);
            let v11 = v01 + 1;

            faces.push([v00, v10, v11]);
            faces.push([v00, v11, v01]);
        }
    }

    (vertices, faces)
}

fn bench_mesh_construction(c: &mut Criterion) {
    let (vertices, faces) = grid(10);

    c.bench_function("build_grid_10x10", |b| {
        b.iter(|| build_from_triangles(&vertices, &faces).unwrap());
    });
}

fn bench_mesh_traversal(c: &mut Criterion) {
    let (vertices, faces) = grid(50);
    let mesh = build_from_triangles(&vertices, &faces).unwrap();

    c.bench_function("vertex_neighbors_all", |b| {
        b.iter(|| {
            let mut count = 0;
            for v in mesh.vertex_ids() {
                count += mesh.vertex_neighbors(v).count();
            }
            count
        });
    });

    c.bench_function("face_normals_all", |b| {
        b.iter(|| {
            let mut sum = nalgebra::Vector3::zeros();
            for f in mesh.interior_face_ids() {
                sum += mesh.face_normal(f);
            }
            sum
        });
    });
}

fn bench_simplify(c: &mut Criterion) {
    let (vertices, faces) = grid(30);
    let target = vertices.len() / 4;

    c.bench_function("simplify_grid_30x30_quarter", |b| {
        let options = SimplifyOptions::with_target_vertices(target);
        b.iter(|| simplify(&vertices, &faces, EdgeCurvatureCost, &options).unwrap());
    });
}

criterion_group!(
    benches,
    bench_mesh_construction,
    bench_mesh_traversal,
    bench_simplify
);
criterion_main!(benches);

// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh representation and utilities

use super::BoundingBox;
use ahash::{AHashMap, AHashSet};
use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Vertex with position and normal
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point3<f64>,
    pub normal: Vector3<f64>,
}

impl Vertex {
    pub fn new(position: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self { position, normal }
    }

    pub fn transform(&mut self, matrix: &Matrix4<f64>, normal_matrix: &Matrix4<f64>) {
        self.position = matrix.transform_point(&self.position);
        let normal = normal_matrix.transform_vector(&self.normal);
        if normal.norm() > f64::EPSILON {
            self.normal = normal.normalize();
        }
    }

    /// Linear interpolation between two vertices (used when splitting polygons)
    pub fn interpolate(&self, other: &Vertex, t: f64) -> Vertex {
        let position = self.position + (other.position - self.position) * t;
        let normal = self.normal + (other.normal - self.normal) * t;
        Vertex::new(position, normal)
    }
}

/// Triangle defined by three vertex indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangle {
    pub indices: [usize; 3],
}

impl Triangle {
    pub fn new(indices: [usize; 3]) -> Self {
        Self { indices }
    }

    pub fn is_degenerate(&self) -> bool {
        let [a, b, c] = self.indices;
        a == b || b == c || a == c
    }
}

/// Triangular mesh
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            triangles: Vec::with_capacity(triangle_count),
        }
    }

    /// Add a vertex and return its index
    pub fn add_vertex(&mut self, vertex: Vertex) -> usize {
        let index = self.vertices.len();
        self.vertices.push(vertex);
        index
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Transform all vertices by an affine matrix.
    ///
    /// A transform with a negative determinant (a mirror) flips the winding
    /// so faces keep pointing outward.
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        let normal_matrix = matrix
            .try_inverse()
            .map(|m| m.transpose())
            .unwrap_or(*matrix);
        for vertex in &mut self.vertices {
            vertex.transform(matrix, &normal_matrix);
        }
        if matrix.fixed_view::<3, 3>(0, 0).clone_owned().determinant() < 0.0 {
            self.flip_winding();
        }
    }

    /// Reverse every triangle's winding and negate vertex normals
    pub fn flip_winding(&mut self) {
        for triangle in &mut self.triangles {
            triangle.indices.swap(1, 2);
        }
        for vertex in &mut self.vertices {
            vertex.normal = -vertex.normal;
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_vertices(&self.vertices)
    }

    /// Enclosed volume by the divergence theorem. Only meaningful for closed,
    /// consistently wound meshes.
    pub fn volume(&self) -> f64 {
        self.triangles
            .iter()
            .map(|t| {
                let a = self.vertices[t.indices[0]].position.coords;
                let b = self.vertices[t.indices[1]].position.coords;
                let c = self.vertices[t.indices[2]].position.coords;
                a.dot(&b.cross(&c)) / 6.0
            })
            .sum()
    }

    /// Merge with another mesh (simple union without CSG)
    pub fn merge(&mut self, other: &Mesh) {
        let offset = self.vertices.len();
        self.vertices.extend_from_slice(&other.vertices);

        for triangle in &other.triangles {
            self.triangles.push(Triangle::new([
                triangle.indices[0] + offset,
                triangle.indices[1] + offset,
                triangle.indices[2] + offset,
            ]));
        }
    }

    /// Weld vertices that fall into the same `epsilon`-sized grid cell.
    /// Returns the number of vertices removed.
    pub fn weld_vertices(&mut self, epsilon: f64) -> usize {
        if self.vertices.is_empty() || epsilon <= 0.0 {
            return 0;
        }

        let original_count = self.vertices.len();
        let mut cells: AHashMap<(i64, i64, i64), usize> = AHashMap::with_capacity(original_count);
        let mut new_vertices: Vec<Vertex> = Vec::with_capacity(original_count);
        let mut remap = vec![0usize; original_count];

        for (i, vertex) in self.vertices.iter().enumerate() {
            let p = vertex.position;
            let key = (
                (p.x / epsilon).round() as i64,
                (p.y / epsilon).round() as i64,
                (p.z / epsilon).round() as i64,
            );
            remap[i] = *cells.entry(key).or_insert_with(|| {
                new_vertices.push(*vertex);
                new_vertices.len() - 1
            });
        }

        for triangle in &mut self.triangles {
            for index in &mut triangle.indices {
                *index = remap[*index];
            }
        }
        self.vertices = new_vertices;

        original_count - self.vertices.len()
    }

    /// Remove triangles that share an index or have (near) zero area.
    /// Returns the number of triangles removed.
    pub fn remove_degenerate_triangles(&mut self, min_area: f64) -> usize {
        let original_count = self.triangles.len();
        let vertices = &self.vertices;
        self.triangles.retain(|t| {
            if t.is_degenerate() || t.indices.iter().any(|&i| i >= vertices.len()) {
                return false;
            }
            let a = vertices[t.indices[0]].position;
            let b = vertices[t.indices[1]].position;
            let c = vertices[t.indices[2]].position;
            (b - a).cross(&(c - a)).norm() * 0.5 > min_area
        });
        original_count - self.triangles.len()
    }

    /// Remove triangles repeating the same vertex cycle (any rotation).
    /// Returns the number of triangles removed.
    pub fn remove_duplicate_triangles(&mut self) -> usize {
        let original_count = self.triangles.len();
        let mut seen: AHashSet<[usize; 3]> = AHashSet::with_capacity(original_count);
        self.triangles.retain(|t| {
            // Rotate so the smallest index leads; winding is preserved.
            let [a, b, c] = t.indices;
            let key = if a <= b && a <= c {
                [a, b, c]
            } else if b <= a && b <= c {
                [b, c, a]
            } else {
                [c, a, b]
            };
            seen.insert(key)
        });
        original_count - self.triangles.len()
    }

    /// Remove vertices not referenced by any triangle.
    /// Returns the number of vertices removed.
    pub fn remove_orphaned_vertices(&mut self) -> usize {
        let mut used = vec![false; self.vertices.len()];
        for triangle in &self.triangles {
            for &index in &triangle.indices {
                used[index] = true;
            }
        }

        let mut remap = vec![0usize; self.vertices.len()];
        let mut new_vertices = Vec::with_capacity(self.vertices.len());
        for (old, &keep) in used.iter().enumerate() {
            if keep {
                remap[old] = new_vertices.len();
                new_vertices.push(self.vertices[old]);
            }
        }

        for triangle in &mut self.triangles {
            for index in &mut triangle.indices {
                *index = remap[*index];
            }
        }

        let removed = self.vertices.len() - new_vertices.len();
        self.vertices = new_vertices;
        removed
    }

    /// Recompute vertex normals as the area-weighted average of face normals
    pub fn recompute_normals(&mut self) {
        if self.vertices.is_empty() || self.triangles.is_empty() {
            return;
        }

        let mut sums: Vec<Vector3<f64>> = vec![Vector3::zeros(); self.vertices.len()];
        for triangle in &self.triangles {
            let a = self.vertices[triangle.indices[0]].position;
            let b = self.vertices[triangle.indices[1]].position;
            let c = self.vertices[triangle.indices[2]].position;
            // Cross product length is twice the area, so this is area weighted.
            let face = (b - a).cross(&(c - a));
            if face.norm() > 1e-12 {
                for &index in &triangle.indices {
                    sums[index] += face;
                }
            }
        }

        for (vertex, sum) in self.vertices.iter_mut().zip(sums) {
            vertex.normal = if sum.norm() > 1e-12 {
                sum.normalize()
            } else {
                Vector3::z()
            };
        }
    }
}

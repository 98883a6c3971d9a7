// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! BSP-tree constructive solid geometry.
//!
//! Meshes are converted to convex polygons, partitioned into a BSP tree and
//! clipped against each other. Each node keeps the polygons coplanar with
//! its splitting plane; split fragments inherit the parent polygon's plane
//! so thin slivers never need their plane recomputed.

use super::{Mesh, Triangle, Vertex};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Distance under which a point counts as lying on a plane
pub const EPSILON: f64 = 1e-5;

const STACK_RED_ZONE: usize = 64 * 1024;
const STACK_GROW_BYTES: usize = 4 * 1024 * 1024;

/// Boolean operation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BooleanOp {
    Union,
    Difference,
    Intersection,
}

impl fmt::Display for BooleanOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BooleanOp::Union => "union",
            BooleanOp::Difference => "difference",
            BooleanOp::Intersection => "intersection",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy)]
struct Plane {
    normal: Vector3<f64>,
    w: f64,
}

impl Plane {
    fn from_points(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> Option<Self> {
        let cross = (b - a).cross(&(c - a));
        let length = cross.norm();
        if length < 1e-12 {
            return None;
        }
        let normal = cross / length;
        Some(Self {
            normal,
            w: normal.dot(&a.coords),
        })
    }

    fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    fn distance(&self, point: &Point3<f64>) -> f64 {
        self.normal.dot(&point.coords) - self.w
    }
}

#[derive(Debug, Clone)]
struct Polygon {
    vertices: Vec<Vertex>,
    plane: Plane,
}

impl Polygon {
    fn flip(&mut self) {
        self.vertices.reverse();
        for vertex in &mut self.vertices {
            vertex.normal = -vertex.normal;
        }
        self.plane.flip();
    }
}

const COPLANAR: u8 = 0;
const FRONT: u8 = 1;
const BACK: u8 = 2;
const SPANNING: u8 = 3;

/// Where the pieces of a split polygon go
struct Buckets<'a> {
    coplanar_front: &'a mut Vec<Polygon>,
    coplanar_back: &'a mut Vec<Polygon>,
    front: &'a mut Vec<Polygon>,
    back: &'a mut Vec<Polygon>,
}

fn split_polygon(plane: &Plane, polygon: Polygon, out: &mut Buckets<'_>) {
    let mut polygon_type = COPLANAR;
    let types: Vec<u8> = polygon
        .vertices
        .iter()
        .map(|v| {
            let t = plane.distance(&v.position);
            let kind = if t < -EPSILON {
                BACK
            } else if t > EPSILON {
                FRONT
            } else {
                COPLANAR
            };
            polygon_type |= kind;
            kind
        })
        .collect();

    match polygon_type {
        COPLANAR => {
            if plane.normal.dot(&polygon.plane.normal) > 0.0 {
                out.coplanar_front.push(polygon);
            } else {
                out.coplanar_back.push(polygon);
            }
        }
        FRONT => out.front.push(polygon),
        BACK => out.back.push(polygon),
        _ => {
            let count = polygon.vertices.len();
            let mut front = Vec::with_capacity(count + 1);
            let mut back = Vec::with_capacity(count + 1);
            for i in 0..count {
                let j = (i + 1) % count;
                let (ti, tj) = (types[i], types[j]);
                let (vi, vj) = (&polygon.vertices[i], &polygon.vertices[j]);
                if ti != BACK {
                    front.push(*vi);
                }
                if ti != FRONT {
                    back.push(*vi);
                }
                if (ti | tj) == SPANNING {
                    let t = (plane.w - plane.normal.dot(&vi.position.coords))
                        / plane.normal.dot(&(vj.position - vi.position));
                    let v = vi.interpolate(vj, t);
                    front.push(v);
                    back.push(v);
                }
            }
            if front.len() >= 3 {
                out.front.push(Polygon {
                    vertices: front,
                    plane: polygon.plane,
                });
            }
            if back.len() >= 3 {
                out.back.push(Polygon {
                    vertices: back,
                    plane: polygon.plane,
                });
            }
        }
    }
}

#[derive(Debug, Default)]
struct Node {
    plane: Option<Plane>,
    front: Option<Box<Node>>,
    back: Option<Box<Node>>,
    polygons: Vec<Polygon>,
}

impl Node {
    fn new(polygons: Vec<Polygon>) -> Self {
        let mut node = Node::default();
        node.build(polygons);
        node
    }

    fn invert(&mut self) {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_BYTES, || {
            for polygon in &mut self.polygons {
                polygon.flip();
            }
            if let Some(plane) = &mut self.plane {
                plane.flip();
            }
            if let Some(front) = &mut self.front {
                front.invert();
            }
            if let Some(back) = &mut self.back {
                back.invert();
            }
            std::mem::swap(&mut self.front, &mut self.back);
        })
    }

    /// Remove the parts of `polygons` inside this tree's solid
    fn clip_polygons(&self, polygons: Vec<Polygon>) -> Vec<Polygon> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_BYTES, || {
            let Some(plane) = &self.plane else {
                return polygons;
            };
            let mut front = Vec::new();
            let mut back = Vec::new();
            for polygon in polygons {
                let mut coplanar_front = Vec::new();
                let mut coplanar_back = Vec::new();
                split_polygon(
                    plane,
                    polygon,
                    &mut Buckets {
                        coplanar_front: &mut coplanar_front,
                        coplanar_back: &mut coplanar_back,
                        front: &mut front,
                        back: &mut back,
                    },
                );
                front.append(&mut coplanar_front);
                back.append(&mut coplanar_back);
            }
            let mut front = match &self.front {
                Some(node) => node.clip_polygons(front),
                None => front,
            };
            let back = match &self.back {
                Some(node) => node.clip_polygons(back),
                None => Vec::new(),
            };
            front.extend(back);
            front
        })
    }

    /// Remove every polygon of this tree that lies inside `other`
    fn clip_to(&mut self, other: &Node) {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_BYTES, || {
            let polygons = std::mem::take(&mut self.polygons);
            self.polygons = other.clip_polygons(polygons);
            if let Some(front) = &mut self.front {
                front.clip_to(other);
            }
            if let Some(back) = &mut self.back {
                back.clip_to(other);
            }
        })
    }

    fn all_polygons(&self) -> Vec<Polygon> {
        let mut out = Vec::new();
        self.collect_polygons(&mut out);
        out
    }

    fn collect_polygons(&self, out: &mut Vec<Polygon>) {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_BYTES, || {
            out.extend(self.polygons.iter().cloned());
            if let Some(front) = &self.front {
                front.collect_polygons(out);
            }
            if let Some(back) = &self.back {
                back.collect_polygons(out);
            }
        })
    }

    fn build(&mut self, polygons: Vec<Polygon>) {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_BYTES, || {
            let Some(first) = polygons.first() else {
                return;
            };
            let plane = *self.plane.get_or_insert(first.plane);
            let mut front = Vec::new();
            let mut back = Vec::new();
            let mut coplanar = Vec::new();
            for polygon in polygons {
                let mut coplanar_back = Vec::new();
                split_polygon(
                    &plane,
                    polygon,
                    &mut Buckets {
                        coplanar_front: &mut coplanar,
                        coplanar_back: &mut coplanar_back,
                        front: &mut front,
                        back: &mut back,
                    },
                );
                coplanar.append(&mut coplanar_back);
            }
            self.polygons.extend(coplanar);
            if !front.is_empty() {
                self.front.get_or_insert_with(Box::default).build(front);
            }
            if !back.is_empty() {
                self.back.get_or_insert_with(Box::default).build(back);
            }
        })
    }
}

fn mesh_to_polygons(mesh: &Mesh) -> Vec<Polygon> {
    mesh.triangles
        .iter()
        .filter_map(|triangle| {
            let [a, b, c] = triangle.indices.map(|i| mesh.vertices[i]);
            let plane = Plane::from_points(&a.position, &b.position, &c.position)?;
            Some(Polygon {
                vertices: vec![a, b, c],
                plane,
            })
        })
        .collect()
}

fn polygons_to_mesh(polygons: Vec<Polygon>) -> Mesh {
    let mut mesh = Mesh::with_capacity(polygons.len() * 4, polygons.len() * 2);
    for polygon in polygons {
        let base = mesh.vertex_count();
        for vertex in &polygon.vertices {
            mesh.add_vertex(Vertex::new(vertex.position, polygon.plane.normal));
        }
        for i in 1..polygon.vertices.len() - 1 {
            mesh.add_triangle(Triangle::new([base, base + i, base + i + 1]));
        }
    }
    mesh
}

/// Combine two closed meshes
pub fn boolean(a: &Mesh, b: &Mesh, op: BooleanOp) -> Mesh {
    let mut a = Node::new(mesh_to_polygons(a));
    let mut b = Node::new(mesh_to_polygons(b));

    match op {
        BooleanOp::Union => {
            a.clip_to(&b);
            b.clip_to(&a);
            b.invert();
            b.clip_to(&a);
            b.invert();
            a.build(b.all_polygons());
        }
        BooleanOp::Difference => {
            a.invert();
            a.clip_to(&b);
            b.clip_to(&a);
            b.invert();
            b.clip_to(&a);
            b.invert();
            a.build(b.all_polygons());
            a.invert();
        }
        BooleanOp::Intersection => {
            a.invert();
            b.clip_to(&a);
            b.invert();
            a.clip_to(&b);
            b.clip_to(&a);
            a.build(b.all_polygons());
            a.invert();
        }
    }

    polygons_to_mesh(a.all_polygons())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use approx::assert_relative_eq;
    use nalgebra::Matrix4;

    fn cube_at(size: f64, offset: Vector3<f64>) -> Mesh {
        let mut mesh = Primitive::cube(Vector3::repeat(size)).to_mesh();
        mesh.transform(&Matrix4::new_translation(&offset));
        mesh
    }

    #[test]
    fn test_difference_of_overlapping_cubes() {
        let a = cube_at(10.0, Vector3::zeros());
        let b = cube_at(10.0, Vector3::new(5.0, 0.0, 0.0));
        let result = boolean(&a, &b, BooleanOp::Difference);
        assert_relative_eq!(result.volume(), 500.0, epsilon = 1e-6);
        let bbox = result.bounding_box();
        assert_relative_eq!(bbox.max.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(bbox.min.x, -5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_union_of_overlapping_cubes() {
        let a = cube_at(10.0, Vector3::zeros());
        let b = cube_at(10.0, Vector3::new(5.0, 0.0, 0.0));
        let result = boolean(&a, &b, BooleanOp::Union);
        assert_relative_eq!(result.volume(), 1500.0, epsilon = 1e-6);
    }

    #[test]
    fn test_intersection_of_overlapping_cubes() {
        let a = cube_at(10.0, Vector3::zeros());
        let b = cube_at(10.0, Vector3::new(5.0, 5.0, 0.0));
        let result = boolean(&a, &b, BooleanOp::Intersection);
        assert_relative_eq!(result.volume(), 250.0, epsilon = 1e-6);
    }

    #[test]
    fn test_disjoint_difference_keeps_target() {
        let a = cube_at(4.0, Vector3::zeros());
        let b = cube_at(4.0, Vector3::new(50.0, 0.0, 0.0));
        let result = boolean(&a, &b, BooleanOp::Difference);
        assert_relative_eq!(result.volume(), 64.0, epsilon = 1e-9);
    }

    #[test]
    fn test_bore_through_cube() {
        let a = cube_at(10.0, Vector3::zeros());
        let drill = Primitive::cylinder(1.0, 20.0, 32).to_mesh();
        let result = boolean(&a, &drill, BooleanOp::Difference);
        let removed = 1000.0 - result.volume();
        let bore = drill.volume() / 2.0;
        assert_relative_eq!(removed, bore, max_relative = 1e-6);
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometric primitives generator
//!
//! Every primitive is centred on the origin. Cylinders and cones run along
//! +Z with `radius1` at the bottom cap and `radius2` at the top cap.

use super::{Mesh, Triangle, Vertex};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const MIN_SEGMENTS: u32 = 3;

/// Geometric primitives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Primitive {
    Cube {
        size: Vector3<f64>,
    },
    Cylinder {
        radius: f64,
        depth: f64,
        segments: u32,
    },
    Cone {
        radius1: f64,
        radius2: f64,
        depth: f64,
        segments: u32,
    },
    Sphere {
        radius: f64,
        segments: u32,
        rings: u32,
    },
    Torus {
        major_radius: f64,
        minor_radius: f64,
        major_segments: u32,
        minor_segments: u32,
    },
}

impl Primitive {
    pub fn cube(size: Vector3<f64>) -> Self {
        Self::Cube { size }
    }

    pub fn cylinder(radius: f64, depth: f64, segments: u32) -> Self {
        Self::Cylinder {
            radius,
            depth,
            segments: segments.max(MIN_SEGMENTS),
        }
    }

    pub fn cone(radius1: f64, radius2: f64, depth: f64, segments: u32) -> Self {
        Self::Cone {
            radius1,
            radius2,
            depth,
            segments: segments.max(MIN_SEGMENTS),
        }
    }

    pub fn sphere(radius: f64, segments: u32, rings: u32) -> Self {
        Self::Sphere {
            radius,
            segments: segments.max(MIN_SEGMENTS),
            rings: rings.max(2),
        }
    }

    pub fn torus(major_radius: f64, minor_radius: f64, major_segments: u32, minor_segments: u32) -> Self {
        Self::Torus {
            major_radius,
            minor_radius,
            major_segments: major_segments.max(MIN_SEGMENTS),
            minor_segments: minor_segments.max(MIN_SEGMENTS),
        }
    }

    /// Short label used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Cube { .. } => "cube",
            Self::Cylinder { .. } => "cylinder",
            Self::Cone { .. } => "cone",
            Self::Sphere { .. } => "sphere",
            Self::Torus { .. } => "torus",
        }
    }

    /// Every size parameter must be finite and positive (a cone may have one zero radius)
    pub fn is_valid(&self) -> bool {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        match self {
            Self::Cube { size } => size.iter().all(|&v| positive(v)),
            Self::Cylinder { radius, depth, .. } => positive(*radius) && positive(*depth),
            Self::Cone {
                radius1,
                radius2,
                depth,
                ..
            } => {
                positive(*depth)
                    && radius1.is_finite()
                    && radius2.is_finite()
                    && *radius1 >= 0.0
                    && *radius2 >= 0.0
                    && (*radius1 > 0.0 || *radius2 > 0.0)
            }
            Self::Sphere { radius, .. } => positive(*radius),
            Self::Torus {
                major_radius,
                minor_radius,
                ..
            } => positive(*major_radius) && positive(*minor_radius) && minor_radius < major_radius,
        }
    }

    pub fn to_mesh(&self) -> Mesh {
        match self {
            Self::Cube { size } => generate_cube_mesh(*size),
            Self::Cylinder {
                radius,
                depth,
                segments,
            } => generate_cone_mesh(*radius, *radius, *depth, *segments),
            Self::Cone {
                radius1,
                radius2,
                depth,
                segments,
            } => generate_cone_mesh(*radius1, *radius2, *depth, *segments),
            Self::Sphere {
                radius,
                segments,
                rings,
            } => generate_sphere_mesh(*radius, *segments, *rings),
            Self::Torus {
                major_radius,
                minor_radius,
                major_segments,
                minor_segments,
            } => generate_torus_mesh(*major_radius, *minor_radius, *major_segments, *minor_segments),
        }
    }
}

fn generate_cube_mesh(size: Vector3<f64>) -> Mesh {
    let mut mesh = Mesh::with_capacity(24, 12);
    let h = size / 2.0;

    // Each face: outward normal and its four corners counter-clockwise seen from outside
    let faces = [
        (
            Vector3::x(),
            [[h.x, -h.y, -h.z], [h.x, h.y, -h.z], [h.x, h.y, h.z], [h.x, -h.y, h.z]],
        ),
        (
            -Vector3::x(),
            [[-h.x, h.y, -h.z], [-h.x, -h.y, -h.z], [-h.x, -h.y, h.z], [-h.x, h.y, h.z]],
        ),
        (
            Vector3::y(),
            [[h.x, h.y, -h.z], [-h.x, h.y, -h.z], [-h.x, h.y, h.z], [h.x, h.y, h.z]],
        ),
        (
            -Vector3::y(),
            [[-h.x, -h.y, -h.z], [h.x, -h.y, -h.z], [h.x, -h.y, h.z], [-h.x, -h.y, h.z]],
        ),
        (
            Vector3::z(),
            [[-h.x, -h.y, h.z], [h.x, -h.y, h.z], [h.x, h.y, h.z], [-h.x, h.y, h.z]],
        ),
        (
            -Vector3::z(),
            [[-h.x, h.y, -h.z], [h.x, h.y, -h.z], [h.x, -h.y, -h.z], [-h.x, -h.y, -h.z]],
        ),
    ];

    for (normal, corners) in faces {
        let base = mesh.vertex_count();
        for [x, y, z] in corners {
            mesh.add_vertex(Vertex::new(Point3::new(x, y, z), normal));
        }
        mesh.add_triangle(Triangle::new([base, base + 1, base + 2]));
        mesh.add_triangle(Triangle::new([base, base + 2, base + 3]));
    }

    mesh
}

fn generate_cone_mesh(radius1: f64, radius2: f64, depth: f64, segments: u32) -> Mesh {
    let segments = segments as usize;
    let mut mesh = Mesh::with_capacity(segments * 2 + 2, segments * 4);
    let half = depth / 2.0;
    let slope = (radius1 - radius2) / depth;

    let ring = |mesh: &mut Mesh, radius: f64, z: f64| -> Vec<usize> {
        (0..segments)
            .map(|i| {
                let angle = 2.0 * PI * i as f64 / segments as f64;
                let (sin, cos) = angle.sin_cos();
                let normal = Vector3::new(cos, sin, slope).normalize();
                mesh.add_vertex(Vertex::new(Point3::new(radius * cos, radius * sin, z), normal))
            })
            .collect()
    };

    let bottom_apex = radius1 <= f64::EPSILON;
    let top_apex = radius2 <= f64::EPSILON;

    let bottom = if bottom_apex {
        vec![mesh.add_vertex(Vertex::new(Point3::new(0.0, 0.0, -half), -Vector3::z())); segments]
    } else {
        ring(&mut mesh, radius1, -half)
    };
    let top = if top_apex {
        vec![mesh.add_vertex(Vertex::new(Point3::new(0.0, 0.0, half), Vector3::z())); segments]
    } else {
        ring(&mut mesh, radius2, half)
    };

    for i in 0..segments {
        let j = (i + 1) % segments;
        if !bottom_apex {
            mesh.add_triangle(Triangle::new([bottom[i], bottom[j], top[j]]));
        }
        if !top_apex {
            mesh.add_triangle(Triangle::new([bottom[i], top[j], top[i]]));
        }
    }

    if !bottom_apex {
        let center = mesh.add_vertex(Vertex::new(Point3::new(0.0, 0.0, -half), -Vector3::z()));
        for i in 0..segments {
            let j = (i + 1) % segments;
            mesh.add_triangle(Triangle::new([center, bottom[j], bottom[i]]));
        }
    }
    if !top_apex {
        let center = mesh.add_vertex(Vertex::new(Point3::new(0.0, 0.0, half), Vector3::z()));
        for i in 0..segments {
            let j = (i + 1) % segments;
            mesh.add_triangle(Triangle::new([center, top[i], top[j]]));
        }
    }

    mesh
}

fn generate_sphere_mesh(radius: f64, segments: u32, rings: u32) -> Mesh {
    let segments = segments as usize;
    let rings = rings as usize;
    let mut mesh = Mesh::new();

    let north = mesh.add_vertex(Vertex::new(Point3::new(0.0, 0.0, radius), Vector3::z()));
    let mut latitudes: Vec<Vec<usize>> = Vec::with_capacity(rings - 1);
    for r in 1..rings {
        let phi = PI * r as f64 / rings as f64;
        let (sin_phi, cos_phi) = phi.sin_cos();
        let row = (0..segments)
            .map(|s| {
                let theta = 2.0 * PI * s as f64 / segments as f64;
                let (sin_theta, cos_theta) = theta.sin_cos();
                let normal = Vector3::new(sin_phi * cos_theta, sin_phi * sin_theta, cos_phi);
                mesh.add_vertex(Vertex::new(Point3::from(normal * radius), normal))
            })
            .collect();
        latitudes.push(row);
    }
    let south = mesh.add_vertex(Vertex::new(Point3::new(0.0, 0.0, -radius), -Vector3::z()));

    for s in 0..segments {
        let t = (s + 1) % segments;
        mesh.add_triangle(Triangle::new([north, latitudes[0][s], latitudes[0][t]]));

        for pair in latitudes.windows(2) {
            let (upper, lower) = (&pair[0], &pair[1]);
            mesh.add_triangle(Triangle::new([upper[s], lower[s], lower[t]]));
            mesh.add_triangle(Triangle::new([upper[s], lower[t], upper[t]]));
        }

        let last = &latitudes[latitudes.len() - 1];
        mesh.add_triangle(Triangle::new([last[s], south, last[t]]));
    }

    mesh
}

fn generate_torus_mesh(major: f64, minor: f64, major_segments: u32, minor_segments: u32) -> Mesh {
    let (nu, nv) = (major_segments as usize, minor_segments as usize);
    let mut mesh = Mesh::with_capacity(nu * nv, nu * nv * 2);

    for i in 0..nu {
        let u = 2.0 * PI * i as f64 / nu as f64;
        let (sin_u, cos_u) = u.sin_cos();
        for j in 0..nv {
            let v = 2.0 * PI * j as f64 / nv as f64;
            let (sin_v, cos_v) = v.sin_cos();
            let normal = Vector3::new(cos_v * cos_u, cos_v * sin_u, sin_v);
            let ring = major + minor * cos_v;
            let position = Point3::new(ring * cos_u, ring * sin_u, minor * sin_v);
            mesh.add_vertex(Vertex::new(position, normal));
        }
    }

    let index = |i: usize, j: usize| (i % nu) * nv + (j % nv);
    for i in 0..nu {
        for j in 0..nv {
            let (a, b, c, d) = (index(i, j), index(i + 1, j), index(i + 1, j + 1), index(i, j + 1));
            mesh.add_triangle(Triangle::new([a, b, c]));
            mesh.add_triangle(Triangle::new([a, c, d]));
        }
    }

    mesh
}

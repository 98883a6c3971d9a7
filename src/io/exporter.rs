// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! STL export and import through `stl_io`

use crate::error::{ArmorError, Result};
use crate::geometry::{Mesh, Triangle, Vertex};
use nalgebra::{Point3, Vector3};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

/// Write `mesh` as a binary STL file, creating parent directories
pub fn export_stl(mesh: &Mesh, path: &Path) -> Result<()> {
    use stl_io::{Normal, Triangle as StlTriangle, Vertex as StlVertex};

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ArmorError::io(parent, e))?;
    }

    let to_f32 = |p: &Point3<f64>| [p.x as f32, p.y as f32, p.z as f32];
    let triangles: Vec<StlTriangle> = mesh
        .triangles
        .iter()
        .map(|tri| {
            let [a, b, c] = tri.indices.map(|i| mesh.vertices[i].position);
            let face = (b - a).cross(&(c - a));
            let normal = if face.norm() > 0.0 { face.normalize() } else { Vector3::zeros() };

            StlTriangle {
                normal: Normal::new([normal.x as f32, normal.y as f32, normal.z as f32]),
                vertices: [
                    StlVertex::new(to_f32(&a)),
                    StlVertex::new(to_f32(&b)),
                    StlVertex::new(to_f32(&c)),
                ],
            }
        })
        .collect();

    let file = File::create(path).map_err(|e| ArmorError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    stl_io::write_stl(&mut writer, triangles.iter()).map_err(|e| ArmorError::io(path, e))?;

    Ok(())
}

/// Read an STL file (binary or ASCII) into a welded mesh
pub fn import_stl(path: &Path) -> Result<Mesh> {
    let mut file = File::open(path).map_err(|e| ArmorError::io(path, e))?;
    let stl = stl_io::read_stl(&mut file).map_err(|e| ArmorError::io(path, e))?;

    let mut mesh = Mesh::with_capacity(stl.vertices.len(), stl.faces.len());
    for v in &stl.vertices {
        let position = Point3::new(f64::from(v[0]), f64::from(v[1]), f64::from(v[2]));
        mesh.add_vertex(Vertex::new(position, Vector3::z()));
    }
    for face in &stl.faces {
        mesh.add_triangle(Triangle::new(face.vertices));
    }
    mesh.recompute_normals();

    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use approx::assert_relative_eq;
    use tempfile::TempDir;

    #[test]
    fn test_export_then_import_cube() -> anyhow::Result<()> {
        let mesh = Primitive::cube(Vector3::new(10.0, 20.0, 30.0)).to_mesh();
        let dir = TempDir::new()?;
        let path = dir.path().join("nested").join("cube.stl");

        export_stl(&mesh, &path)?;
        assert!(path.exists());

        let loaded = import_stl(&path)?;
        assert_eq!(loaded.triangle_count(), 12);
        assert_relative_eq!(loaded.volume(), 6000.0, max_relative = 1e-5);
        Ok(())
    }
}

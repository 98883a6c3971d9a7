// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! In-process mesh backend

use super::{MeshBackend, MeshHandle, MeshId};
use crate::config::DetailLevel;
use crate::error::{ArmorError, Result};
use crate::geometry::{csg, BooleanOp, BoundingBox, Mesh, Primitive, Transform};
use crate::io::{export_stl, import_stl};
use ahash::AHashMap;
use nalgebra::Point3;
use std::path::Path;
use tracing::debug;

const MIN_TRIANGLE_AREA: f64 = 1e-9;

#[derive(Debug, Clone)]
struct SceneObject {
    name: String,
    mesh: Mesh,
}

/// Session of named triangle meshes evaluated with BSP CSG
#[derive(Debug, Default)]
pub struct Scene {
    objects: AHashMap<MeshId, SceneObject>,
    next_id: u64,
}

impl Scene {
    /// Empty session; unlike host-backed backends this cannot fail to start
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an existing mesh under `name`
    pub fn insert_mesh(&mut self, mesh: Mesh, name: &str) -> MeshHandle {
        let id = MeshId(self.next_id);
        self.next_id += 1;
        self.objects.insert(
            id,
            SceneObject {
                name: name.to_owned(),
                mesh,
            },
        );
        MeshHandle::new(id)
    }

    /// Load an STL file as a new mesh object
    pub fn import_stl(&mut self, path: &Path, name: &str) -> Result<MeshHandle> {
        let mesh = import_stl(path)?;
        debug!(path = %path.display(), triangles = mesh.triangle_count(), "imported STL");
        Ok(self.insert_mesh(mesh, name))
    }

    /// Raw geometry behind a handle
    pub fn mesh(&self, handle: &MeshHandle) -> Result<&Mesh> {
        Ok(&self.object(handle.id())?.mesh)
    }

    fn object(&self, id: MeshId) -> Result<&SceneObject> {
        self.objects
            .get(&id)
            .ok_or(ArmorError::ConsumedHandle { id: id.0 })
    }

    fn object_mut(&mut self, id: MeshId) -> Result<&mut SceneObject> {
        self.objects
            .get_mut(&id)
            .ok_or(ArmorError::ConsumedHandle { id: id.0 })
    }

    fn take(&mut self, handle: MeshHandle) -> Result<SceneObject> {
        let id = handle.id();
        self.objects
            .remove(&id)
            .ok_or(ArmorError::ConsumedHandle { id: id.0 })
    }
}

impl MeshBackend for Scene {
    fn create_primitive(&mut self, primitive: &Primitive, name: &str) -> Result<MeshHandle> {
        if !primitive.is_valid() {
            return Err(ArmorError::InvalidInput(format!(
                "degenerate {} for '{}': {:?}",
                primitive.kind(),
                name,
                primitive
            )));
        }
        Ok(self.insert_mesh(primitive.to_mesh(), name))
    }

    fn boolean(&mut self, op: BooleanOp, target: MeshHandle, tool: MeshHandle) -> Result<MeshHandle> {
        let id = target.id();
        if id == tool.id() {
            return Err(ArmorError::Boolean {
                op,
                reason: format!("mesh {} used as its own tool", id),
            });
        }
        // Check both before consuming either.
        self.object(tool.id())?;
        let mut object = self.take(target)?;
        let tool = self.take(tool)?;

        let before = object.mesh.triangle_count();
        if tool.mesh.is_empty() {
            if op == BooleanOp::Intersection {
                object.mesh = Mesh::new();
            }
        } else {
            object.mesh = csg::boolean(&object.mesh, &tool.mesh, op);
        }
        debug!(
            %op,
            target = %object.name,
            tool = %tool.name,
            before,
            after = object.mesh.triangle_count(),
            "boolean"
        );

        self.objects.insert(id, object);
        Ok(MeshHandle::new(id))
    }

    fn transform(&mut self, mesh: MeshHandle, transform: &Transform) -> Result<MeshHandle> {
        let matrix = transform.to_matrix();
        self.object_mut(mesh.id())?.mesh.transform(&matrix);
        Ok(mesh)
    }

    fn duplicate(&mut self, mesh: &MeshHandle, name: &str) -> Result<MeshHandle> {
        let copy = self.object(mesh.id())?.mesh.clone();
        Ok(self.insert_mesh(copy, name))
    }

    fn bounding_box(&self, mesh: &MeshHandle) -> Result<BoundingBox> {
        let bbox = self.object(mesh.id())?.mesh.bounding_box();
        if bbox.is_empty() {
            return Ok(BoundingBox::new(Point3::origin(), Point3::origin()));
        }
        Ok(bbox)
    }

    fn name(&self, mesh: &MeshHandle) -> Result<String> {
        Ok(self.object(mesh.id())?.name.clone())
    }

    fn rename(&mut self, mesh: &MeshHandle, name: &str) -> Result<()> {
        self.object_mut(mesh.id())?.name = name.to_owned();
        Ok(())
    }

    fn finish_surface(&mut self, mesh: MeshHandle, detail: DetailLevel) -> Result<MeshHandle> {
        let Some(tolerance) = detail.weld_tolerance() else {
            return Ok(mesh);
        };
        let object = self.object_mut(mesh.id())?;
        let surface = &mut object.mesh;
        let welded = surface.weld_vertices(tolerance);
        let degenerate = surface.remove_degenerate_triangles(MIN_TRIANGLE_AREA);
        let duplicates = surface.remove_duplicate_triangles();
        surface.remove_orphaned_vertices();
        surface.recompute_normals();
        debug!(
            name = %object.name,
            welded,
            degenerate,
            duplicates,
            "finished surface"
        );
        Ok(mesh)
    }

    fn export(&self, mesh: &MeshHandle, path: &Path) -> Result<()> {
        export_stl(&self.object(mesh.id())?.mesh, path)
    }

    fn remove(&mut self, mesh: MeshHandle) -> Result<()> {
        self.take(mesh).map(|_| ())
    }

    fn clear(&mut self) {
        self.objects.clear();
    }

    fn mesh_count(&self) -> usize {
        self.objects.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Axis;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn test_boolean_keeps_target_identity() -> Result<()> {
        let mut scene = Scene::new();
        let a = scene.create_primitive(&Primitive::cube(Vector3::repeat(10.0)), "plate")?;
        let target_id = a.id();
        let b = scene.create_primitive(&Primitive::cube(Vector3::repeat(4.0)), "cutter")?;

        let result = scene.difference(a, b)?;
        assert_eq!(result.id(), target_id);
        assert_eq!(scene.name(&result)?, "plate");
        assert_eq!(scene.mesh_count(), 1);
        assert_relative_eq!(scene.mesh(&result)?.volume(), 1000.0 - 64.0, epsilon = 1e-6);
        Ok(())
    }

    #[test]
    fn test_stale_handle_is_reported() -> Result<()> {
        let mut scene = Scene::new();
        let a = scene.create_primitive(&Primitive::cube(Vector3::repeat(1.0)), "a")?;
        let stale = a.placeholder();
        scene.remove(a)?;
        assert!(matches!(scene.bounding_box(&stale), Err(ArmorError::ConsumedHandle { .. })));
        Ok(())
    }

    #[test]
    fn test_transforms_apply_in_world_space() -> Result<()> {
        let mut scene = Scene::new();
        let a = scene.create_primitive(&Primitive::cylinder(1.0, 10.0, 16), "rod")?;
        let a = scene.transform(a, &Transform::rotate_degrees(0.0, 90.0, 0.0))?;
        let a = scene.transform(a, &Transform::translate(5.0, 0.0, 0.0))?;
        let bbox = scene.bounding_box(&a)?;
        assert_relative_eq!(bbox.min.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(bbox.max.x, 10.0, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn test_mirror_creates_outward_copy() -> Result<()> {
        let mut scene = Scene::new();
        let a = scene.create_primitive(&Primitive::cube(Vector3::repeat(2.0)), "left")?;
        let a = scene.transform(a, &Transform::translate(3.0, 0.0, 0.0))?;
        let b = scene.mirror(&a, Axis::X, "right")?;
        assert_relative_eq!(scene.bounding_box(&b)?.max.x, -2.0, epsilon = 1e-12);
        assert!(scene.mesh(&b)?.volume() > 0.0);
        assert_eq!(scene.mesh_count(), 2);
        Ok(())
    }

    #[test]
    fn test_degenerate_primitive_rejected() {
        let mut scene = Scene::new();
        let result = scene.create_primitive(&Primitive::cylinder(0.0, 1.0, 8), "bad");
        assert!(matches!(result, Err(ArmorError::InvalidInput(_))));
    }
}

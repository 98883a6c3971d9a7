// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh backend adapter.
//!
//! Generators never touch vertex data. They drive a [`MeshBackend`] session
//! through opaque [`MeshHandle`]s: create primitives, combine them with
//! booleans, transform them in world space and query bounding boxes.
//! Consuming operations take handles by value, so a handle cannot be reused
//! once a boolean has swallowed it.

mod scene;

pub use scene::Scene;

use crate::config::DetailLevel;
use crate::error::Result;
use crate::geometry::{Axis, BooleanOp, BoundingBox, Primitive, Transform};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Backend-assigned identifier of a mesh object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeshId(pub u64);

impl fmt::Display for MeshId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Owning reference to a mesh held by a backend session.
///
/// Not `Clone`: ownership moves into consuming operations.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "dropping a handle leaks the mesh in the backend session"]
pub struct MeshHandle {
    id: MeshId,
}

impl MeshHandle {
    /// Wrap a backend id. Intended for [`MeshBackend`] implementations.
    pub fn new(id: MeshId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> MeshId {
        self.id
    }

    /// Second handle to the same id, parked while the real one is moved out
    pub(crate) fn placeholder(&self) -> MeshHandle {
        MeshHandle { id: self.id }
    }
}

/// Primitive creation, CSG and queries over a session of named meshes.
pub trait MeshBackend {
    /// Create a primitive centred on the origin
    fn create_primitive(&mut self, primitive: &Primitive, name: &str) -> Result<MeshHandle>;

    /// Apply `op` to `target` with `tool`. Both handles are consumed; the
    /// result keeps the target's id and name.
    fn boolean(&mut self, op: BooleanOp, target: MeshHandle, tool: MeshHandle) -> Result<MeshHandle>;

    /// Apply a world-space transform immediately
    fn transform(&mut self, mesh: MeshHandle, transform: &Transform) -> Result<MeshHandle>;

    fn duplicate(&mut self, mesh: &MeshHandle, name: &str) -> Result<MeshHandle>;

    fn bounding_box(&self, mesh: &MeshHandle) -> Result<BoundingBox>;

    fn name(&self, mesh: &MeshHandle) -> Result<String>;

    fn rename(&mut self, mesh: &MeshHandle, name: &str) -> Result<()>;

    /// Clean the surface for printing; stronger at higher detail levels
    fn finish_surface(&mut self, mesh: MeshHandle, detail: DetailLevel) -> Result<MeshHandle>;

    /// Write the mesh as an STL file
    fn export(&self, mesh: &MeshHandle, path: &Path) -> Result<()>;

    fn remove(&mut self, mesh: MeshHandle) -> Result<()>;

    /// Drop every mesh in the session
    fn clear(&mut self);

    fn mesh_count(&self) -> usize;

    fn dimensions(&self, mesh: &MeshHandle) -> Result<Vector3<f64>> {
        Ok(self.bounding_box(mesh)?.size())
    }

    /// Mirrored copy of `mesh` across the plane orthogonal to `axis`
    fn mirror(&mut self, mesh: &MeshHandle, axis: Axis, name: &str) -> Result<MeshHandle> {
        let copy = self.duplicate(mesh, name)?;
        self.transform(copy, &Transform::mirror(axis))
    }

    fn union(&mut self, target: MeshHandle, tool: MeshHandle) -> Result<MeshHandle> {
        self.boolean(BooleanOp::Union, target, tool)
    }

    fn difference(&mut self, target: MeshHandle, tool: MeshHandle) -> Result<MeshHandle> {
        self.boolean(BooleanOp::Difference, target, tool)
    }

    fn intersection(&mut self, target: MeshHandle, tool: MeshHandle) -> Result<MeshHandle> {
        self.boolean(BooleanOp::Intersection, target, tool)
    }
}

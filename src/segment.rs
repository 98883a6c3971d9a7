// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Printable segments and ordered segment collections

use crate::backend::{MeshBackend, MeshHandle};
use crate::connectors::{Connector, ConnectorKind};
use crate::error::{ArmorError, Result};
use crate::geometry::Axis;
use ahash::AHashSet;

/// Side token for the generated half of a paired piece
pub const LEFT: &str = "left";
/// Side token for the mirrored half
pub const RIGHT: &str = "right";

/// A named mesh with the connector geometry applied to it
#[derive(Debug)]
pub struct Segment {
    name: String,
    mesh: MeshHandle,
    connectors: Vec<Connector>,
    depth: usize,
}

impl Segment {
    pub fn new(name: impl Into<String>, mesh: MeshHandle) -> Self {
        Self {
            name: name.into(),
            mesh,
            connectors: Vec::new(),
            depth: 0,
        }
    }

    pub(crate) fn from_parts(name: String, mesh: MeshHandle, connectors: Vec<Connector>, depth: usize) -> Self {
        Self {
            name,
            mesh,
            connectors,
            depth,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mesh(&self) -> &MeshHandle {
        &self.mesh
    }

    pub fn connectors(&self) -> &[Connector] {
        &self.connectors
    }

    /// Split-lineage depth; 0 for segments straight from piece assembly
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn connectors_of(&self, kind: ConnectorKind) -> impl Iterator<Item = &Connector> {
        self.connectors.iter().filter(move |c| c.kind == kind)
    }

    pub(crate) fn connectors_mut(&mut self) -> &mut [Connector] {
        &mut self.connectors
    }

    pub fn record(&mut self, connector: Connector) {
        self.connectors.push(connector);
    }

    /// Run a consuming backend operation on this segment's mesh
    pub fn update_mesh<F>(&mut self, op: F) -> Result<()>
    where
        F: FnOnce(MeshHandle) -> Result<MeshHandle>,
    {
        let parked = self.mesh.placeholder();
        let mesh = std::mem::replace(&mut self.mesh, parked);
        self.mesh = op(mesh)?;
        Ok(())
    }

    /// Rename the segment and its backend object together
    pub fn rename(&mut self, backend: &mut dyn MeshBackend, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        backend.rename(&self.mesh, &name)?;
        self.name = name;
        Ok(())
    }

    pub fn into_mesh(self) -> MeshHandle {
        self.mesh
    }

    pub fn into_parts(self) -> (String, MeshHandle, Vec<Connector>, usize) {
        (self.name, self.mesh, self.connectors, self.depth)
    }
}

/// Map a left-side name to its right-side twin, token by token
pub fn mirror_name(name: &str) -> String {
    name.split('_')
        .map(|token| match token {
            LEFT => RIGHT,
            RIGHT => LEFT,
            other => other,
        })
        .collect::<Vec<_>>()
        .join("_")
}

/// Insertion-ordered collection of uniquely named segments
#[derive(Debug, Default)]
pub struct SegmentSet {
    segments: Vec<Segment>,
    names: AHashSet<String>,
}

impl SegmentSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, segment: Segment) -> Result<()> {
        if !self.names.insert(segment.name.clone()) {
            return Err(ArmorError::DuplicateSegment { name: segment.name });
        }
        self.segments.push(segment);
        Ok(())
    }

    pub fn extend(&mut self, segments: impl IntoIterator<Item = Segment>) -> Result<()> {
        for segment in segments {
            self.insert(segment)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.segments.iter().map(|s| s.name()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Segment> {
        self.segments.iter_mut().find(|s| s.name == name)
    }

    /// Mirrored copies of every segment, renamed `_left` -> `_right`
    pub fn mirrored(&self, backend: &mut dyn MeshBackend, axis: Axis) -> Result<SegmentSet> {
        let mut out = SegmentSet::new();
        for segment in &self.segments {
            let name = mirror_name(&segment.name);
            let mesh = backend.mirror(&segment.mesh, axis, &name)?;
            let connectors = segment
                .connectors
                .iter()
                .map(|c| c.mirrored(axis))
                .collect();
            out.insert(Segment::from_parts(name, mesh, connectors, segment.depth))?;
        }
        Ok(out)
    }

    /// Release every mesh back to the backend
    pub fn discard(self, backend: &mut dyn MeshBackend) -> Result<()> {
        for segment in self.segments {
            backend.remove(segment.mesh)?;
        }
        Ok(())
    }
}

impl IntoIterator for SegmentSet {
    type Item = Segment;
    type IntoIter = std::vec::IntoIter<Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.into_iter()
    }
}

impl<'a> IntoIterator for &'a SegmentSet {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Scene;
    use crate::geometry::Primitive;
    use nalgebra::Vector3;

    #[test]
    fn test_mirror_name_swaps_side_token_only() {
        assert_eq!(mirror_name("cuisse_thigh_left_sec1_sec2"), "cuisse_thigh_right_sec1_sec2");
        assert_eq!(mirror_name("gauntlet_index_proximal_left"), "gauntlet_index_proximal_right");
        assert_eq!(mirror_name("leftover_plate"), "leftover_plate");
    }

    #[test]
    fn test_duplicate_names_rejected() -> Result<()> {
        let mut scene = Scene::new();
        let cube = Primitive::cube(Vector3::repeat(1.0));
        let mut set = SegmentSet::new();
        set.insert(Segment::new("a", scene.create_primitive(&cube, "a")?))?;
        let err = set
            .insert(Segment::new("a", scene.create_primitive(&cube, "a")?))
            .unwrap_err();
        assert!(matches!(err, ArmorError::DuplicateSegment { name } if name == "a"));
        Ok(())
    }

    #[test]
    fn test_update_mesh_threads_consuming_ops() -> Result<()> {
        let mut scene = Scene::new();
        let mesh = scene.create_primitive(&Primitive::cube(Vector3::repeat(2.0)), "plate")?;
        let mut segment = Segment::new("plate", mesh);
        segment.update_mesh(|m| scene.transform(m, &crate::geometry::Transform::translate(5.0, 0.0, 0.0)))?;
        assert_eq!(scene.bounding_box(segment.mesh())?.min.x, 4.0);
        Ok(())
    }
}

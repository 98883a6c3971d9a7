// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Strap mounts.
//!
//! Each mount is placed at a point in the middle of a plate wall and
//! oriented by the wall's outward normal. Feature geometry is laid out in
//! a local frame whose +Y is that normal, +X runs across the strap and +Z
//! along it.

use crate::backend::{MeshBackend, MeshHandle};
use crate::dimensions::{Measurements, PieceKind};
use crate::error::{ArmorError, Result};
use crate::geometry::{rotation_aligning, Primitive, Transform};
use nalgebra::{Point3, Rotation3, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

const HOLE_SEGMENTS: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MountKind {
    /// Through-slot for a strap buckle
    Buckle,
    /// Shallow recess for a hook-and-loop pad
    Velcro,
    /// Round hole for a press stud
    Snap,
    /// Row of lacing eyelets
    Lace,
    /// T-slot for a sliding clip
    Clip,
    /// Groove with a tab behind it, for overlapping plates
    Interlock,
}

/// Strap feature sizes in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrapDimensions {
    pub slot_width: f64,
    pub slot_height: f64,
    pub slot_depth: f64,
    pub hole_diameter: f64,
    pub hole_count: u32,
    pub interlock_depth: f64,
    pub interlock_width: f64,
}

impl Default for StrapDimensions {
    fn default() -> Self {
        Self {
            slot_width: 25.0,
            slot_height: 4.0,
            slot_depth: 8.0,
            hole_diameter: 5.0,
            hole_count: 4,
            interlock_depth: 10.0,
            interlock_width: 20.0,
        }
    }
}

/// One mount on a plate wall
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrapMount {
    pub kind: MountKind,
    pub position: Point3<f64>,
    /// Outward wall normal
    pub normal: Vector3<f64>,
    pub dims: StrapDimensions,
}

impl StrapMount {
    pub fn new(kind: MountKind, position: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self {
            kind,
            position,
            normal,
            dims: StrapDimensions::default(),
        }
    }

    pub fn with_dims(mut self, dims: StrapDimensions) -> Self {
        self.dims = dims;
        self
    }

    fn frame(&self) -> Result<Frame> {
        let norm = self.normal.norm();
        if !norm.is_finite() || norm < 1e-9 {
            return Err(ArmorError::InvalidInput(format!(
                "strap mount normal must be non-zero, got {:?}",
                self.normal
            )));
        }
        Ok(Frame {
            origin: self.position,
            rotation: rotation_aligning(&Vector3::y(), &(self.normal / norm)),
        })
    }

    /// Cut (and for interlocks, grow) the mount's features on `mesh`
    pub fn apply(&self, backend: &mut dyn MeshBackend, mesh: MeshHandle) -> Result<MeshHandle> {
        let frame = self.frame()?;
        let d = &self.dims;
        debug!(kind = ?self.kind, position = ?self.position, "adding strap mount");

        match self.kind {
            MountKind::Buckle => {
                let slot = frame.block(backend, "buckle_slot", Vector3::new(d.slot_width, d.slot_depth * 2.0, d.slot_height), Vector3::zeros())?;
                backend.difference(mesh, slot)
            }
            MountKind::Velcro => {
                // recess from mid-wall outwards
                let pad = frame.block(
                    backend,
                    "velcro_pad",
                    Vector3::new(d.slot_width, d.slot_depth, d.slot_width),
                    Vector3::new(0.0, d.slot_depth / 2.0, 0.0),
                )?;
                backend.difference(mesh, pad)
            }
            MountKind::Snap => {
                let hole = frame.bore(backend, "snap_hole", 6.0, d.slot_depth, Vector3::zeros())?;
                backend.difference(mesh, hole)
            }
            MountKind::Lace => {
                let mut mesh = mesh;
                let count = d.hole_count.max(1);
                let spacing = d.slot_width / count as f64;
                for i in 0..count {
                    let x = (i as f64 - (count - 1) as f64 / 2.0) * spacing;
                    let hole = frame.bore(
                        backend,
                        "lace_hole",
                        d.hole_diameter / 2.0,
                        d.slot_depth * 2.0,
                        Vector3::new(x, 0.0, 0.0),
                    )?;
                    mesh = backend.difference(mesh, hole)?;
                }
                Ok(mesh)
            }
            MountKind::Clip => {
                let stem = frame.block(backend, "clip_slot", Vector3::new(8.0, d.slot_depth, 25.0), Vector3::zeros())?;
                let bar = frame.block(
                    backend,
                    "clip_slot_bar",
                    Vector3::new(20.0, d.slot_depth, 8.0),
                    Vector3::new(0.0, 0.0, 10.0),
                )?;
                let mesh = backend.difference(mesh, stem)?;
                backend.difference(mesh, bar)
            }
            MountKind::Interlock => {
                let groove = frame.block(
                    backend,
                    "interlock_groove",
                    Vector3::new(d.interlock_width, d.interlock_depth, d.slot_height * 2.0),
                    Vector3::zeros(),
                )?;
                let tab = frame.block(
                    backend,
                    "interlock_tab",
                    Vector3::new(d.interlock_width * 0.9, d.interlock_depth * 0.8, d.slot_height),
                    Vector3::new(0.0, -d.interlock_depth, 0.0),
                )?;
                let mesh = backend.difference(mesh, groove)?;
                backend.union(mesh, tab)
            }
        }
    }
}

/// Local mount frame
struct Frame {
    origin: Point3<f64>,
    rotation: Rotation3<f64>,
}

impl Frame {
    fn place(&self, backend: &mut dyn MeshBackend, mesh: MeshHandle, offset: Vector3<f64>) -> Result<MeshHandle> {
        let mesh = backend.transform(mesh, &Transform::Matrix(self.rotation.to_homogeneous()))?;
        let target = self.origin + self.rotation * offset;
        backend.transform(mesh, &Transform::Translate(target.coords))
    }

    fn block(&self, backend: &mut dyn MeshBackend, name: &str, size: Vector3<f64>, offset: Vector3<f64>) -> Result<MeshHandle> {
        let cube = backend.create_primitive(&Primitive::cube(size), name)?;
        self.place(backend, cube, offset)
    }

    /// Cylinder along the local normal
    fn bore(&self, backend: &mut dyn MeshBackend, name: &str, radius: f64, depth: f64, offset: Vector3<f64>) -> Result<MeshHandle> {
        let cylinder = backend.create_primitive(&Primitive::cylinder(radius, depth, HOLE_SEGMENTS), name)?;
        let cylinder = backend.transform(cylinder, &Transform::rotate_degrees(-90.0, 0.0, 0.0))?;
        self.place(backend, cylinder, offset)
    }
}

/// Ordered set of mounts for one piece
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrapSystem {
    pub mounts: Vec<StrapMount>,
}

impl StrapSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, mount: StrapMount) -> &mut Self {
        self.mounts.push(mount);
        self
    }

    /// Mount and its X-mirror
    pub fn add_pair(&mut self, kind: MountKind, position: Point3<f64>, normal: Vector3<f64>) -> &mut Self {
        let twin = Point3::new(-position.x, position.y, position.z);
        let twin_normal = Vector3::new(-normal.x, normal.y, normal.z);
        self.add(StrapMount::new(kind, position, normal));
        self.add(StrapMount::new(kind, twin, twin_normal))
    }

    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }

    pub fn apply(&self, backend: &mut dyn MeshBackend, mut mesh: MeshHandle) -> Result<MeshHandle> {
        for mount in &self.mounts {
            mesh = mount.apply(backend, mesh)?;
        }
        Ok(mesh)
    }
}

/// Mid-wall point on an ellipse of semi-axes `a` (X) and `b` (Y) at parametric angle `theta`,
/// with its outward normal
fn ellipse_mount(a: f64, b: f64, theta: f64, z: f64) -> (Point3<f64>, Vector3<f64>) {
    let (s, c) = theta.sin_cos();
    let normal = Vector3::new(c / a, s / b, 0.0).normalize();
    (Point3::new(a * c, b * s, z), normal)
}

/// Inner radius of a limb shell at height `y` along a shell of length `length`
fn limb_radius(upper: f64, lower: f64, length: f64, y: f64) -> f64 {
    let t = (y + length / 2.0) / length;
    lower + (upper - lower) * t
}

/// Standard mount layout for `kind`, in the coordinates of the piece's primary segment
pub fn standard_strap_system(kind: PieceKind, m: &Measurements<'_>) -> Result<StrapSystem> {
    let t = m.thickness;
    let mut system = StrapSystem::new();

    match kind {
        PieceKind::Helmet => {
            let w = m.get("inner_width")?;
            let l = m.get("inner_length")?;
            let h = m.get("inner_height")?;
            // jaw, front half
            let y = -l * 0.25;
            let z = -h * 0.15;
            let rx = (w / 2.0 + t / 2.0) * (1.0 - (y / (l / 2.0 + t / 2.0)).powi(2) - (z / (h / 2.0 + t / 2.0)).powi(2)).max(0.0).sqrt();
            system.add_pair(MountKind::Buckle, Point3::new(rx, y, z), Vector3::x());
        }
        PieceKind::Chest => {
            let w = m.get("width")?;
            let h = m.get("height")?;
            let d = m.get("depth")?;
            let a = 0.35 * w + t / 2.0;
            let b = d / 2.0 + t / 2.0;
            for z in [h * 0.1, h * 0.3] {
                let (p, n) = ellipse_mount(a, b, -70f64.to_radians(), z);
                system.add_pair(MountKind::Buckle, p, n);
            }
            let (p, n) = ellipse_mount(a, b, -50f64.to_radians(), h / 2.0 - 20.0);
            system.add_pair(MountKind::Interlock, p, n);
        }
        PieceKind::Pauldron => {
            let w = m.get("width")?;
            let h = m.get("height")?;
            let d = m.get("depth")?;
            let z = h * 0.15;
            let f = (1.0 - (z / (h + t / 2.0)).powi(2)).sqrt();
            system.add(StrapMount::new(
                MountKind::Buckle,
                Point3::new(-(w / 2.0 + t / 2.0) * f, 0.0, z),
                -Vector3::x(),
            ));
            let z = h / 3.0;
            let f = (1.0 - (z / (h + t / 2.0)).powi(2)).sqrt();
            system.add(StrapMount::new(
                MountKind::Interlock,
                Point3::new(0.0, (d / 2.0 + t / 2.0) * f, z),
                Vector3::y(),
            ));
        }
        PieceKind::Gauntlet => {
            let hl = m.get("hand_length")?;
            let hw = m.get("hand_width")?;
            let wc = m.get("wrist_circumference")?;
            let dims = StrapDimensions {
                slot_width: wc / 4.0,
                ..StrapDimensions::default()
            };
            system.add(
                StrapMount::new(
                    MountKind::Velcro,
                    Point3::new(0.0, -hl * 0.1, -(0.2 * hw + t / 2.0)),
                    -Vector3::z(),
                )
                .with_dims(dims),
            );
        }
        PieceKind::Vambrace | PieceKind::Greave => {
            let length = m.get("length")?;
            let upper = m.get("upper_circumference")? / (2.0 * PI);
            let lower = m.get("lower_circumference")? / (2.0 * PI);
            for y in [-length * 0.25, length * 0.25] {
                let r = limb_radius(upper, lower, length, y) + t / 2.0;
                system.add_pair(MountKind::Buckle, Point3::new(r, y, 0.0), Vector3::x());
            }
        }
        PieceKind::Cuisse => {
            let length = m.get("length")?;
            let upper = m.get("upper_circumference")? / (2.0 * PI);
            let lower = m.get("lower_circumference")? / (2.0 * PI);
            let y = length * 0.3;
            let r = limb_radius(upper, lower, length, y) + t / 2.0;
            system.add_pair(MountKind::Buckle, Point3::new(r, y, 0.0), Vector3::x());
            let y = length / 2.0 - 20.0;
            let r = limb_radius(upper, lower, length, y) + t / 2.0;
            system.add(StrapMount::new(MountKind::Clip, Point3::new(0.0, y, r), Vector3::z()));
        }
        PieceKind::Sabaton => {
            let sl = m.get("length")?;
            let sw = m.get("width")?;
            system.add_pair(
                MountKind::Buckle,
                Point3::new(sw / 2.0 + t / 2.0, -sl * 0.3, 0.0),
                Vector3::x(),
            );
            let top = 0.25 * sw + t / 2.0;
            let dims = StrapDimensions {
                hole_count: 6,
                slot_width: sw * 0.5,
                ..StrapDimensions::default()
            };
            system.add(StrapMount::new(MountKind::Lace, Point3::new(0.0, sl * 0.2, top), Vector3::z()).with_dims(dims));
        }
    }

    Ok(system)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Scene;
    use crate::dimensions::DimensionTable;
    use approx::assert_relative_eq;

    #[test]
    fn test_paired_mounts_mirror_across_x() {
        let mut system = StrapSystem::new();
        system.add_pair(MountKind::Buckle, Point3::new(40.0, 5.0, -3.0), Vector3::x());
        assert_eq!(system.len(), 2);
        assert_eq!(system.mounts[1].position, Point3::new(-40.0, 5.0, -3.0));
        assert_eq!(system.mounts[1].normal, -Vector3::x());
    }

    #[test]
    fn test_every_piece_has_a_layout() -> Result<()> {
        let table = DimensionTable::standard();
        for kind in PieceKind::ALL {
            let system = standard_strap_system(kind, &table.measurements(kind)?)?;
            assert!(!system.is_empty(), "{} has no mounts", kind);
        }
        Ok(())
    }

    #[test]
    fn test_buckle_slot_removes_material() -> Result<()> {
        let mut scene = Scene::new();
        let plate = scene.create_primitive(&Primitive::cube(Vector3::new(4.0, 60.0, 60.0)), "plate")?;
        let before = scene.mesh(&plate)?.volume();
        let mount = StrapMount::new(MountKind::Buckle, Point3::origin(), Vector3::x());
        let plate = mount.apply(&mut scene, plate)?;
        let removed = before - scene.mesh(&plate)?.volume();
        // 25 x 4 slot through a 4 mm wall
        assert_relative_eq!(removed, 25.0 * 4.0 * 4.0, epsilon = 1e-6);
        Ok(())
    }

    #[test]
    fn test_zero_normal_rejected() {
        let mut scene = Scene::new();
        let plate = scene
            .create_primitive(&Primitive::cube(Vector3::repeat(10.0)), "plate")
            .unwrap();
        let mount = StrapMount::new(MountKind::Snap, Point3::origin(), Vector3::zeros());
        assert!(matches!(mount.apply(&mut scene, plate), Err(ArmorError::InvalidInput(_))));
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Shape helpers shared by the piece generators

use crate::backend::{MeshBackend, MeshHandle};
use crate::config::DetailLevel;
use crate::error::Result;
use crate::geometry::{Axis, Primitive, Transform};
use nalgebra::{Point3, Vector3};

/// Full-detail resolution of round primitives
pub const ROUND_SEGMENTS: u32 = 48;

/// Margin added to inner cutters so open ends cut cleanly
const OVERCUT: f64 = 1.0;

/// Rotate (degrees, XYZ) then move the origin to `center`
pub fn place(
    backend: &mut dyn MeshBackend,
    mesh: MeshHandle,
    rotation: Vector3<f64>,
    center: Point3<f64>,
) -> Result<MeshHandle> {
    let mesh = if rotation == Vector3::zeros() {
        mesh
    } else {
        backend.transform(mesh, &Transform::Rotate(rotation))?
    };
    if center == Point3::origin() {
        Ok(mesh)
    } else {
        backend.transform(mesh, &Transform::Translate(center.coords))
    }
}

pub fn block(backend: &mut dyn MeshBackend, name: &str, size: Vector3<f64>, center: Point3<f64>) -> Result<MeshHandle> {
    let cube = backend.create_primitive(&Primitive::cube(size), name)?;
    place(backend, cube, Vector3::zeros(), center)
}

pub fn rotated_block(
    backend: &mut dyn MeshBackend,
    name: &str,
    size: Vector3<f64>,
    rotation: Vector3<f64>,
    center: Point3<f64>,
) -> Result<MeshHandle> {
    let cube = backend.create_primitive(&Primitive::cube(size), name)?;
    place(backend, cube, rotation, center)
}

/// Cylinder along `axis`
pub fn cylinder_along(
    backend: &mut dyn MeshBackend,
    name: &str,
    radius: f64,
    depth: f64,
    axis: Axis,
    detail: DetailLevel,
    center: Point3<f64>,
) -> Result<MeshHandle> {
    let cylinder = backend.create_primitive(&Primitive::cylinder(radius, depth, detail.segments(ROUND_SEGMENTS)), name)?;
    place(backend, cylinder, axis_rotation(axis), center)
}

/// Ellipsoid with semi-axes `radii`
pub fn ellipsoid(
    backend: &mut dyn MeshBackend,
    name: &str,
    radii: Vector3<f64>,
    detail: DetailLevel,
    center: Point3<f64>,
) -> Result<MeshHandle> {
    let segments = detail.segments(ROUND_SEGMENTS);
    let sphere = backend.create_primitive(&Primitive::sphere(1.0, segments, segments / 2), name)?;
    let sphere = backend.transform(sphere, &Transform::Scale(radii))?;
    place(backend, sphere, Vector3::zeros(), center)
}

/// Hollow ellipsoid; `radii` are the inner semi-axes
pub fn ellipsoid_shell(
    backend: &mut dyn MeshBackend,
    name: &str,
    radii: Vector3<f64>,
    thickness: f64,
    detail: DetailLevel,
) -> Result<MeshHandle> {
    let outer = ellipsoid(backend, name, radii.add_scalar(thickness), detail, Point3::origin())?;
    let inner = ellipsoid(backend, "shell_cavity", radii, detail, Point3::origin())?;
    backend.difference(outer, inner)
}

/// Truncated conical shell along Y, `upper` radius at +Y, open at both ends.
/// Radii are inner radii.
pub fn limb_shell(
    backend: &mut dyn MeshBackend,
    name: &str,
    upper: f64,
    lower: f64,
    length: f64,
    thickness: f64,
    detail: DetailLevel,
) -> Result<MeshHandle> {
    let segments = detail.segments(ROUND_SEGMENTS);
    let outer = backend.create_primitive(
        &Primitive::cone(upper + thickness, lower + thickness, length, segments),
        name,
    )?;
    let slope = (upper - lower) / length;
    let inner = backend.create_primitive(
        &Primitive::cone(upper + slope * OVERCUT, (lower - slope * OVERCUT).max(0.0), length + 2.0 * OVERCUT, segments),
        "shell_cavity",
    )?;
    let shell = backend.difference(outer, inner)?;
    backend.transform(shell, &Transform::rotate_degrees(90.0, 0.0, 0.0))
}

/// Elliptic tube along Z, open at both ends; `a` and `b` are inner semi-axes
pub fn elliptic_tube(
    backend: &mut dyn MeshBackend,
    name: &str,
    a: f64,
    b: f64,
    height: f64,
    thickness: f64,
    detail: DetailLevel,
) -> Result<MeshHandle> {
    let segments = detail.segments(ROUND_SEGMENTS);
    let outer = backend.create_primitive(&Primitive::cylinder(1.0, 1.0, segments), name)?;
    let outer = backend.transform(outer, &Transform::scale(a + thickness, b + thickness, height))?;
    let inner = backend.create_primitive(&Primitive::cylinder(1.0, 1.0, segments), "tube_cavity")?;
    let inner = backend.transform(inner, &Transform::scale(a, b, height + 2.0 * OVERCUT))?;
    backend.difference(outer, inner)
}

/// Rectangular tube along Y; `width` and `height` are the inner opening
pub fn box_tube(
    backend: &mut dyn MeshBackend,
    name: &str,
    width: f64,
    height: f64,
    length: f64,
    thickness: f64,
    center: Point3<f64>,
) -> Result<MeshHandle> {
    let outer = block(
        backend,
        name,
        Vector3::new(width + 2.0 * thickness, length, height + 2.0 * thickness),
        center,
    )?;
    let inner = block(
        backend,
        "tube_cavity",
        Vector3::new(width, length + 2.0 * OVERCUT, height),
        center,
    )?;
    backend.difference(outer, inner)
}

/// Discard everything on one side of the plane `axis = value`
pub fn trim(backend: &mut dyn MeshBackend, mesh: MeshHandle, axis: Axis, value: f64, keep_above: bool) -> Result<MeshHandle> {
    let bbox = backend.bounding_box(&mesh)?;
    let i = axis.index();
    let mut center = bbox.center();
    let edge = (bbox.largest_dimension() + (value - center[i]).abs()) * 2.5 + 1.0;
    center[i] = if keep_above { value - edge / 2.0 } else { value + edge / 2.0 };
    let cutter = block(backend, "trim_cutter", Vector3::repeat(edge), center)?;
    backend.difference(mesh, cutter)
}

pub fn keep_above(backend: &mut dyn MeshBackend, mesh: MeshHandle, axis: Axis, value: f64) -> Result<MeshHandle> {
    trim(backend, mesh, axis, value, true)
}

pub fn keep_below(backend: &mut dyn MeshBackend, mesh: MeshHandle, axis: Axis, value: f64) -> Result<MeshHandle> {
    trim(backend, mesh, axis, value, false)
}

/// Keep the slab `low <= axis <= high`
pub fn keep_between(backend: &mut dyn MeshBackend, mesh: MeshHandle, axis: Axis, low: f64, high: f64) -> Result<MeshHandle> {
    let mesh = keep_above(backend, mesh, axis, low)?;
    keep_below(backend, mesh, axis, high)
}

/// Euler rotation (degrees) laying a +Z primitive along `axis`
pub fn axis_rotation(axis: Axis) -> Vector3<f64> {
    match axis {
        Axis::X => Vector3::new(0.0, 90.0, 0.0),
        Axis::Y => Vector3::new(90.0, 0.0, 0.0),
        Axis::Z => Vector3::zeros(),
    }
}

/// Point on a circle of `radius` in the XZ plane, `degrees` measured from +Z towards +X
pub fn ring_point_xz(radius: f64, degrees: f64, y: f64) -> Point3<f64> {
    let (s, c) = degrees.to_radians().sin_cos();
    Point3::new(radius * s, y, radius * c)
}

/// Point on an XY ellipse at parametric angle `degrees` from +X
pub fn ellipse_point_xy(a: f64, b: f64, degrees: f64, z: f64) -> Point3<f64> {
    let (s, c) = degrees.to_radians().sin_cos();
    Point3::new(a * c, b * s, z)
}

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Scene;
    use approx::assert_relative_eq;

    #[test]
    fn test_limb_shell_runs_along_y_with_upper_end_at_positive_y() -> Result<()> {
        let mut scene = Scene::new();
        let shell = limb_shell(&mut scene, "shell", 40.0, 20.0, 100.0, 4.0, DetailLevel::Minimal)?;
        let bbox = scene.bounding_box(&shell)?;
        assert_relative_eq!(bbox.size().y, 100.0, epsilon = 1e-6);
        assert_relative_eq!(bbox.max.x, 44.0, epsilon = 1e-6);

        let top = keep_above(&mut scene, shell, Axis::Y, 40.0)?;
        let top_bbox = scene.bounding_box(&top)?;
        assert!(top_bbox.max.x > 40.0);
        Ok(())
    }

    #[test]
    fn test_keep_between_clips_slab() -> Result<()> {
        let mut scene = Scene::new();
        let cube = block(&mut scene, "c", Vector3::repeat(100.0), Point3::origin())?;
        let slab = keep_between(&mut scene, cube, Axis::Z, -10.0, 30.0)?;
        let bbox = scene.bounding_box(&slab)?;
        assert_relative_eq!(bbox.min.z, -10.0, epsilon = 1e-6);
        assert_relative_eq!(bbox.max.z, 30.0, epsilon = 1e-6);
        Ok(())
    }

    #[test]
    fn test_ring_point_measures_from_z() {
        let p = ring_point_xz(10.0, 90.0, 3.0);
        assert_relative_eq!(p, Point3::new(10.0, 3.0, 0.0), epsilon = 1e-12);
    }
}

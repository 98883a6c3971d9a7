// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Affine transforms and world axes

use nalgebra::{Matrix4, Rotation3, Unit, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three world axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Fixed priority order, also used to break oversize ties
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn unit(self) -> Vector3<f64> {
        match self {
            Axis::X => Vector3::x(),
            Axis::Y => Vector3::y(),
            Axis::Z => Vector3::z(),
        }
    }

    /// The two remaining axes, in priority order
    pub fn others(self) -> (Axis, Axis) {
        match self {
            Axis::X => (Axis::Y, Axis::Z),
            Axis::Y => (Axis::X, Axis::Z),
            Axis::Z => (Axis::X, Axis::Y),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        };
        f.write_str(name)
    }
}

/// Shortest rotation carrying `from` onto `to`; a half turn when they are opposed
pub fn rotation_aligning(from: &Vector3<f64>, to: &Vector3<f64>) -> Rotation3<f64> {
    Rotation3::rotation_between(from, to).unwrap_or_else(|| {
        let mut axis = from.cross(&Vector3::x());
        if axis.norm() < 1e-9 {
            axis = from.cross(&Vector3::y());
        }
        Rotation3::from_axis_angle(&Unit::new_normalize(axis), std::f64::consts::PI)
    })
}

/// World-space transform, applied immediately to vertex data about the origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    Translate(Vector3<f64>),
    /// Euler angles in degrees, applied X then Y then Z
    Rotate(Vector3<f64>),
    Scale(Vector3<f64>),
    Matrix(Matrix4<f64>),
}

impl Transform {
    pub fn translate(x: f64, y: f64, z: f64) -> Self {
        Self::Translate(Vector3::new(x, y, z))
    }

    pub fn rotate_degrees(x: f64, y: f64, z: f64) -> Self {
        Self::Rotate(Vector3::new(x, y, z))
    }

    pub fn scale(x: f64, y: f64, z: f64) -> Self {
        Self::Scale(Vector3::new(x, y, z))
    }

    /// Rotation carrying +Z onto `direction`
    pub fn align_z_to(direction: &Vector3<f64>) -> Self {
        Self::Matrix(rotation_aligning(&Vector3::z(), direction).to_homogeneous())
    }

    /// Reflection across the plane orthogonal to `axis`
    pub fn mirror(axis: Axis) -> Self {
        let mut factors = Vector3::repeat(1.0);
        factors[axis.index()] = -1.0;
        Self::Scale(factors)
    }

    pub fn to_matrix(&self) -> Matrix4<f64> {
        match self {
            Self::Translate(offset) => Matrix4::new_translation(offset),
            Self::Rotate(degrees) => {
                let r = degrees.map(f64::to_radians);
                Rotation3::from_euler_angles(r.x, r.y, r.z).to_homogeneous()
            }
            Self::Scale(factors) => Matrix4::new_nonuniform_scaling(factors),
            Self::Matrix(matrix) => *matrix,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    #[test]
    fn test_rotate_about_y_maps_z_onto_x() {
        let m = Transform::rotate_degrees(0.0, 90.0, 0.0).to_matrix();
        let v = m.transform_vector(&Vector3::z());
        assert_relative_eq!(v, Vector3::x(), epsilon = 1e-12);
    }

    #[test]
    fn test_rotate_about_x_maps_z_onto_y_axis() {
        let m = Transform::rotate_degrees(90.0, 0.0, 0.0).to_matrix();
        let v = m.transform_vector(&Vector3::z());
        assert_relative_eq!(v.y.abs(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_align_handles_antiparallel() {
        let m = Transform::align_z_to(&-Vector3::z()).to_matrix();
        let v = m.transform_vector(&Vector3::z());
        assert_relative_eq!(v, -Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_aligning_opposed_vectors() {
        let r = rotation_aligning(&Vector3::y(), &-Vector3::y());
        assert_relative_eq!(r * Vector3::y(), -Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn test_mirror_negates_axis() {
        let p = Transform::mirror(Axis::X)
            .to_matrix()
            .transform_point(&Point3::new(3.0, 2.0, 1.0));
        assert_eq!(p, Point3::new(-3.0, 2.0, 1.0));
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Assembly features: alignment pins and elastic-cord channels.
//!
//! A pin is a hole cut into one segment and a slightly thinner post grown
//! from its mate at the same location, so the two only fit one way. Cord
//! channels are straight bores threaded through serial segments such as
//! finger phalanges.

use crate::backend::{MeshBackend, MeshHandle};
use crate::error::{ArmorError, Result};
use crate::geometry::{Axis, Primitive, Transform};
use crate::segment::{mirror_name, Segment};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const PIN_DIAMETER: f64 = 2.0;
pub const PIN_DEPTH: f64 = 3.0;
pub const PIN_HEIGHT: f64 = 3.0;
pub const PIN_CLEARANCE: f64 = 0.1;
pub const CORD_DIAMETER: f64 = 2.0;

const PIN_SEGMENTS: u32 = 24;
const CORD_SEGMENTS: u32 = 16;
const AXIS_TOLERANCE: f64 = 1e-9;
const PAIR_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorKind {
    Hole,
    Post,
    CordChannel,
}

impl ConnectorKind {
    /// Kind of the matching feature on the mate
    pub fn counterpart(self) -> Option<ConnectorKind> {
        match self {
            ConnectorKind::Hole => Some(ConnectorKind::Post),
            ConnectorKind::Post => Some(ConnectorKind::Hole),
            ConnectorKind::CordChannel => None,
        }
    }
}

/// Record of connector geometry applied to a segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub kind: ConnectorKind,
    pub location: Point3<f64>,
    pub direction: Vector3<f64>,
    pub diameter: f64,
    /// Segment carrying the matching feature
    pub mate: Option<String>,
}

impl Connector {
    /// True when `other` is the other half of the same pin
    pub fn pairs_with(&self, other: &Connector) -> bool {
        self.kind.counterpart() == Some(other.kind)
            && (self.location - other.location).norm() < PAIR_TOLERANCE
            && (self.direction.normalize() + other.direction.normalize()).norm() < PAIR_TOLERANCE
    }

    /// X-mirror (or any axis) of this record, with the mate renamed to its twin
    pub fn mirrored(&self, axis: Axis) -> Connector {
        let i = axis.index();
        let mut location = self.location;
        let mut direction = self.direction;
        location[i] = -location[i];
        direction[i] = -direction[i];
        Connector {
            kind: self.kind,
            location,
            direction,
            diameter: self.diameter,
            mate: self.mate.as_deref().map(mirror_name),
        }
    }
}

/// Rotation (degrees) that lays the +Z pin cylinder along a cardinal direction.
///
/// Off-axis directions keep the default orientation.
fn pin_rotation(direction: &Vector3<f64>) -> Option<Vector3<f64>> {
    let d = direction.normalize();
    if (d.x.abs() - 1.0).abs() < AXIS_TOLERANCE {
        Some(Vector3::new(0.0, 90.0, 0.0))
    } else if (d.y.abs() - 1.0).abs() < AXIS_TOLERANCE {
        Some(Vector3::new(90.0, 0.0, 0.0))
    } else if (d.z.abs() - 1.0).abs() < AXIS_TOLERANCE {
        None
    } else {
        warn!(
            direction = ?direction,
            "pin direction is not a cardinal axis; using the default +Z orientation"
        );
        None
    }
}

fn validate_direction(direction: &Vector3<f64>) -> Result<()> {
    if !direction.iter().all(|v| v.is_finite()) || direction.norm() < AXIS_TOLERANCE {
        return Err(ArmorError::InvalidInput(format!(
            "connector direction must be a non-zero vector, got {:?}",
            direction
        )));
    }
    Ok(())
}

/// Pin cylinder centred at `location`, oriented along `direction`
fn pin_cylinder(
    backend: &mut dyn MeshBackend,
    name: &str,
    location: &Point3<f64>,
    direction: &Vector3<f64>,
    radius: f64,
    length: f64,
) -> Result<MeshHandle> {
    validate_direction(direction)?;
    let mut cylinder = backend.create_primitive(&Primitive::cylinder(radius, length, PIN_SEGMENTS), name)?;
    if let Some(degrees) = pin_rotation(direction) {
        cylinder = backend.transform(cylinder, &Transform::Rotate(degrees))?;
    }
    backend.transform(cylinder, &Transform::Translate(location.coords))
}

/// Cut a pin hole of length `2 x depth` centred at `location`
pub fn create_alignment_pin_hole(
    backend: &mut dyn MeshBackend,
    mesh: MeshHandle,
    location: &Point3<f64>,
    direction: &Vector3<f64>,
    diameter: f64,
    depth: f64,
) -> Result<MeshHandle> {
    if diameter <= 0.0 || depth <= 0.0 {
        return Err(ArmorError::InvalidInput(format!(
            "pin hole needs positive diameter and depth, got {} and {}",
            diameter, depth
        )));
    }
    let cutter = pin_cylinder(backend, "pin_hole", location, direction, diameter / 2.0, depth * 2.0)?;
    backend.difference(mesh, cutter)
}

/// Grow a post of diameter `diameter - 2 x clearance` centred at `location`
pub fn create_alignment_pin_post(
    backend: &mut dyn MeshBackend,
    mesh: MeshHandle,
    location: &Point3<f64>,
    direction: &Vector3<f64>,
    diameter: f64,
    height: f64,
    clearance: f64,
) -> Result<MeshHandle> {
    let radius = diameter / 2.0 - clearance;
    if radius <= 0.0 || height <= 0.0 {
        return Err(ArmorError::InvalidInput(format!(
            "pin post needs clearance below its radius and a positive height, got d={} c={} h={}",
            diameter, clearance, height
        )));
    }
    let post = pin_cylinder(backend, "pin_post", location, direction, radius, height)?;
    backend.union(mesh, post)
}

/// Bore a straight channel from `start` to `end`, overshooting by one diameter
pub fn create_cord_channel(
    backend: &mut dyn MeshBackend,
    mesh: MeshHandle,
    start: &Point3<f64>,
    end: &Point3<f64>,
    diameter: f64,
) -> Result<MeshHandle> {
    let span = end - start;
    let length = span.norm();
    if length < AXIS_TOLERANCE || diameter <= 0.0 {
        return Err(ArmorError::InvalidInput(format!(
            "cord channel needs distinct endpoints and a positive diameter, got {:?} -> {:?}",
            start, end
        )));
    }
    let mut bore = backend.create_primitive(
        &Primitive::cylinder(diameter / 2.0, length + diameter, CORD_SEGMENTS),
        "cord_channel",
    )?;
    bore = backend.transform(bore, &Transform::align_z_to(&(span / length)))?;
    let midpoint = nalgebra::center(start, end);
    bore = backend.transform(bore, &Transform::Translate(midpoint.coords))?;
    backend.difference(mesh, bore)
}

/// Pin joining two segments across a seam
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentPin {
    pub location: Point3<f64>,
    /// Direction recorded on the hole; the post records the opposite
    pub direction: Vector3<f64>,
    pub diameter: f64,
    pub depth: f64,
    pub height: f64,
    pub clearance: f64,
}

impl AlignmentPin {
    pub fn new(location: Point3<f64>, direction: Vector3<f64>) -> Self {
        Self {
            location,
            direction,
            diameter: PIN_DIAMETER,
            depth: PIN_DEPTH,
            height: PIN_HEIGHT,
            clearance: PIN_CLEARANCE,
        }
    }

    pub fn post_diameter(&self) -> f64 {
        self.diameter - 2.0 * self.clearance
    }

    /// Cut the hole into `hole_side`, grow the post on `post_side` and record both
    pub fn join(&self, backend: &mut dyn MeshBackend, hole_side: &mut Segment, post_side: &mut Segment) -> Result<()> {
        let post_direction = -self.direction;

        hole_side.update_mesh(|mesh| {
            create_alignment_pin_hole(backend, mesh, &self.location, &self.direction, self.diameter, self.depth)
        })?;
        post_side.update_mesh(|mesh| {
            create_alignment_pin_post(
                backend,
                mesh,
                &self.location,
                &post_direction,
                self.diameter,
                self.height,
                self.clearance,
            )
        })?;

        hole_side.record(Connector {
            kind: ConnectorKind::Hole,
            location: self.location,
            direction: self.direction,
            diameter: self.diameter,
            mate: Some(post_side.name().to_string()),
        });
        post_side.record(Connector {
            kind: ConnectorKind::Post,
            location: self.location,
            direction: post_direction,
            diameter: self.post_diameter(),
            mate: Some(hole_side.name().to_string()),
        });
        Ok(())
    }
}

/// Cord channel line shared by a chain of serial segments
#[derive(Debug, Clone, PartialEq)]
pub struct CordChannel {
    pub start: Point3<f64>,
    pub end: Point3<f64>,
    pub diameter: f64,
}

impl CordChannel {
    pub fn new(start: Point3<f64>, end: Point3<f64>) -> Self {
        Self {
            start,
            end,
            diameter: CORD_DIAMETER,
        }
    }

    pub fn direction(&self) -> Vector3<f64> {
        (self.end - self.start).normalize()
    }

    /// Bore the channel through `segment` and record it
    pub fn bore(&self, backend: &mut dyn MeshBackend, segment: &mut Segment) -> Result<()> {
        segment.update_mesh(|mesh| create_cord_channel(backend, mesh, &self.start, &self.end, self.diameter))?;
        segment.record(Connector {
            kind: ConnectorKind::CordChannel,
            location: nalgebra::center(&self.start, &self.end),
            direction: self.direction(),
            diameter: self.diameter,
            mate: None,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cardinal_rotations() {
        assert_eq!(pin_rotation(&Vector3::x()), Some(Vector3::new(0.0, 90.0, 0.0)));
        assert_eq!(pin_rotation(&-Vector3::y()), Some(Vector3::new(90.0, 0.0, 0.0)));
        assert_eq!(pin_rotation(&Vector3::z()), None);
        assert_eq!(pin_rotation(&Vector3::new(1.0, 1.0, 0.0)), None);
    }

    #[test]
    fn test_post_diameter_matches_clearance() {
        let pin = AlignmentPin::new(Point3::origin(), Vector3::z());
        assert_relative_eq!(pin.post_diameter(), PIN_DIAMETER - 2.0 * PIN_CLEARANCE);
    }

    #[test]
    fn test_mirrored_record_negates_x() {
        let connector = Connector {
            kind: ConnectorKind::Hole,
            location: Point3::new(12.0, -3.0, 4.0),
            direction: Vector3::new(1.0, 0.0, 0.0),
            diameter: 2.0,
            mate: Some("cuisse_knee_left".to_string()),
        };
        let mirrored = connector.mirrored(Axis::X);
        assert_eq!(mirrored.location, Point3::new(-12.0, -3.0, 4.0));
        assert_eq!(mirrored.direction, Vector3::new(-1.0, 0.0, 0.0));
        assert_eq!(mirrored.mate.as_deref(), Some("cuisse_knee_right"));
    }

    #[test]
    fn test_hole_pairs_only_with_opposed_post_at_same_point() {
        let pin = AlignmentPin::new(Point3::new(4.0, 0.0, 2.25), -Vector3::z());
        let hole = Connector {
            kind: ConnectorKind::Hole,
            location: pin.location,
            direction: pin.direction,
            diameter: pin.diameter,
            mate: None,
        };
        let post = Connector {
            kind: ConnectorKind::Post,
            direction: Vector3::z(),
            diameter: pin.post_diameter(),
            ..hole.clone()
        };
        assert!(hole.pairs_with(&post));
        assert!(post.pairs_with(&hole));
        assert!(!hole.pairs_with(&hole));

        let shifted = Connector {
            location: Point3::new(-4.0, 0.0, 2.25),
            ..post.clone()
        };
        assert!(!hole.pairs_with(&shifted));
        let parallel = Connector {
            direction: -Vector3::z(),
            ..post
        };
        assert!(!hole.pairs_with(&parallel));
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Build-plate splitter.
//!
//! A segment whose bounding box exceeds the printer's build volume is
//! bisected at the midpoint of its most oversized axis. The lower half
//! (`_sec1`) receives two pin holes and the upper half (`_sec2`) the
//! matching posts, then both halves are split again until every leaf fits
//! or the depth cap is reached.
//!
//! Each post stands `PIN_HEIGHT / 2` proud of its cut face, so a `_sec2`
//! half is that much longer than the midpoint alone suggests. A half that
//! fits the plate exactly on paper can therefore take one more split.
//!
//! Connector records name their mate segment. Once the mate itself is
//! split, [`relink_mates`] points the record at the leaf that now carries
//! the other half of the pin.

use crate::backend::{MeshBackend, MeshHandle};
use crate::config::BuildPlate;
use crate::connectors::AlignmentPin;
use crate::error::Result;
use crate::geometry::{Axis, BoundingBox, Primitive, Transform};
use crate::segment::Segment;
use nalgebra::{Point3, Vector3};
use tracing::{debug, warn};

/// Deepest split lineage; segments at this depth are emitted as they are
pub const MAX_SPLIT_DEPTH: usize = 5;
/// Offset of each pin from the cut centre, as a fraction of the extent
pub const PIN_SPREAD: f64 = 0.15;
/// Cutter edge relative to the segment's largest dimension
pub const CUTTER_SCALE: f64 = 2.5;

/// Axis with the largest positive oversize, X before Y before Z on ties
pub fn select_split_axis(extents: &Vector3<f64>, plate: &BuildPlate) -> Option<Axis> {
    let mut best: Option<(Axis, f64)> = None;
    for axis in Axis::ALL {
        let oversize = extents[axis.index()] - plate.bound(axis);
        if oversize > 0.0 && best.map_or(true, |(_, b)| oversize > b) {
            best = Some((axis, oversize));
        }
    }
    best.map(|(axis, _)| axis)
}

/// Split `mesh` into plate-sized pieces named after `base_name`
pub fn split_object_for_plate(
    backend: &mut dyn MeshBackend,
    mesh: MeshHandle,
    plate: &BuildPlate,
    base_name: &str,
) -> Result<Vec<Segment>> {
    split_segment_for_plate(backend, Segment::new(base_name, mesh), plate)
}

/// Split `segment`; its existing connector records follow their side of each cut
pub fn split_segment_for_plate(
    backend: &mut dyn MeshBackend,
    segment: Segment,
    plate: &BuildPlate,
) -> Result<Vec<Segment>> {
    let mut leaves = Vec::new();
    split_recursive(backend, segment, plate, &mut leaves)?;
    relink_mates(&mut leaves);
    Ok(leaves)
}

/// Re-point mates that name a split parent at the leaf holding the counterpart.
///
/// Candidates are the mate itself or its `_sec` descendants; a leaf matches
/// when it carries a record that [`Connector::pairs_with`] this one. Mates
/// with no candidate in `segments` are left alone.
///
/// [`Connector::pairs_with`]: crate::connectors::Connector::pairs_with
pub fn relink_mates(segments: &mut [Segment]) {
    let mut relinks = Vec::new();
    for (i, segment) in segments.iter().enumerate() {
        for (j, connector) in segment.connectors().iter().enumerate() {
            let (Some(mate), Some(opposite)) = (connector.mate.as_deref(), connector.kind.counterpart()) else {
                continue;
            };
            let lineage = format!("{}_sec", mate);
            let holder = segments.iter().enumerate().find(|(k, other)| {
                *k != i
                    && (other.name() == mate || other.name().starts_with(&lineage))
                    && other.connectors_of(opposite).any(|c| c.pairs_with(connector))
            });
            if let Some((_, other)) = holder {
                if other.name() != mate {
                    relinks.push((i, j, other.name().to_string()));
                }
            }
        }
    }

    for (i, j, name) in relinks {
        let segment = &mut segments[i];
        debug!(segment = segment.name(), mate = %name, "relinking connector mate");
        segment.connectors_mut()[j].mate = Some(name);
    }
}

fn split_recursive(
    backend: &mut dyn MeshBackend,
    segment: Segment,
    plate: &BuildPlate,
    leaves: &mut Vec<Segment>,
) -> Result<()> {
    let bbox = backend.bounding_box(segment.mesh())?;
    let Some(axis) = select_split_axis(&bbox.size(), plate) else {
        leaves.push(segment);
        return Ok(());
    };

    if segment.depth() >= MAX_SPLIT_DEPTH {
        warn!(
            segment = segment.name(),
            depth = segment.depth(),
            extents = ?bbox.size(),
            plate = %plate,
            "segment still exceeds the build plate at the depth cap"
        );
        leaves.push(segment);
        return Ok(());
    }

    let (lower, upper) = bisect(backend, segment, &bbox, axis)?;
    split_recursive(backend, lower, plate, leaves)?;
    split_recursive(backend, upper, plate, leaves)
}

/// Cube that covers everything on one side of `mid` along `axis`
fn half_space_cutter(
    backend: &mut dyn MeshBackend,
    bbox: &BoundingBox,
    axis: Axis,
    mid: f64,
    above: bool,
) -> Result<MeshHandle> {
    let edge = bbox.largest_dimension() * CUTTER_SCALE;
    let cutter = backend.create_primitive(&Primitive::cube(Vector3::repeat(edge)), "plate_cutter")?;
    let mut center = bbox.center();
    center[axis.index()] = if above { mid + edge / 2.0 } else { mid - edge / 2.0 };
    backend.transform(cutter, &Transform::Translate(center.coords))
}

fn bisect(
    backend: &mut dyn MeshBackend,
    segment: Segment,
    bbox: &BoundingBox,
    axis: Axis,
) -> Result<(Segment, Segment)> {
    let i = axis.index();
    let center = bbox.center();
    let size = bbox.size();
    let mid = center[i];

    let (name, mesh, connectors, depth) = segment.into_parts();
    let lower_name = format!("{}_sec1", name);
    let upper_name = format!("{}_sec2", name);
    debug!(segment = %name, %axis, mid, depth, "splitting for build plate");

    let lower_mesh = backend.duplicate(&mesh, &lower_name)?;
    let upper_mesh = backend.duplicate(&mesh, &upper_name)?;
    backend.remove(mesh)?;

    let above = half_space_cutter(backend, bbox, axis, mid, true)?;
    let lower_mesh = backend.difference(lower_mesh, above)?;
    let below = half_space_cutter(backend, bbox, axis, mid, false)?;
    let upper_mesh = backend.difference(upper_mesh, below)?;

    let (lower_records, upper_records): (Vec<_>, Vec<_>) =
        connectors.into_iter().partition(|c| c.location[i] <= mid);
    let mut lower = Segment::from_parts(lower_name, lower_mesh, lower_records, depth + 1);
    let mut upper = Segment::from_parts(upper_name, upper_mesh, upper_records, depth + 1);

    let (a, b) = axis.others();
    for s in [-1.0, 1.0] {
        let mut location: Point3<f64> = center;
        location[i] = mid;
        location[a.index()] += s * PIN_SPREAD * size[a.index()];
        location[b.index()] += s * PIN_SPREAD * size[b.index()];
        AlignmentPin::new(location, axis.unit()).join(backend, &mut lower, &mut upper)?;
    }

    Ok((lower, upper))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_selection_prefers_largest_oversize() {
        let plate = BuildPlate::cube(256.0);
        assert_eq!(select_split_axis(&Vector3::new(300.0, 400.0, 100.0), &plate), Some(Axis::Y));
        assert_eq!(select_split_axis(&Vector3::new(100.0, 100.0, 100.0), &plate), None);
    }

    #[test]
    fn test_axis_ties_resolve_in_fixed_order() {
        let plate = BuildPlate::cube(100.0);
        assert_eq!(select_split_axis(&Vector3::new(150.0, 150.0, 150.0), &plate), Some(Axis::X));
        assert_eq!(select_split_axis(&Vector3::new(50.0, 150.0, 150.0), &plate), Some(Axis::Y));
    }

    #[test]
    fn test_exact_fit_is_not_oversize() {
        let plate = BuildPlate::new(200.0, 100.0, 50.0);
        assert_eq!(select_split_axis(&Vector3::new(200.0, 100.0, 50.0), &plate), None);
    }
}

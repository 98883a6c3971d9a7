// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Segment assembly per armor piece.
//!
//! Each generator builds a [`PiecePlan`]: the piece's parts, in output
//! order, plus the joints between them. The plan turns into either a
//! [`SegmentSet`] with connector geometry applied, or a single unioned
//! mesh when segmented output is off. Paired pieces are always built as
//! the left-hand side; the pipeline mirrors them.

mod chest;
mod gauntlet;
mod helmet;
mod limbs;
mod pauldron;
mod sabaton;
pub mod shapes;

pub use chest::ChestGenerator;
pub use gauntlet::GauntletGenerator;
pub use helmet::HelmetGenerator;
pub use limbs::{CuisseGenerator, GreaveGenerator, VambraceGenerator};
pub use pauldron::PauldronGenerator;
pub use sabaton::SabatonGenerator;

use crate::backend::{MeshBackend, MeshHandle};
use crate::config::DetailLevel;
use crate::connectors::{AlignmentPin, CordChannel};
use crate::dimensions::{Measurements, PieceKind};
use crate::error::{ArmorError, Result};
use crate::geometry::Axis;
use crate::segment::{Segment, SegmentSet, LEFT};
use crate::straps::standard_strap_system;
use nalgebra::{Point3, Vector3};
use tracing::debug;

/// Gap between adjacent stacked plates (mm)
pub const PLATE_GAP: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symmetry {
    Single,
    /// Built once as the left side, mirrored across `axis`
    Paired { axis: Axis },
}

impl Symmetry {
    /// Side token appended to generated names
    pub fn side(self) -> Option<&'static str> {
        match self {
            Symmetry::Single => None,
            Symmetry::Paired { .. } => Some(LEFT),
        }
    }

    pub fn mirror_axis(self) -> Option<Axis> {
        match self {
            Symmetry::Single => None,
            Symmetry::Paired { axis } => Some(axis),
        }
    }
}

/// Everything a generator needs for one piece
pub struct PieceContext<'a> {
    pub backend: &'a mut dyn MeshBackend,
    pub measurements: Measurements<'a>,
    pub detail: DetailLevel,
    pub include_straps: bool,
}

impl PieceContext<'_> {
    pub fn thickness(&self) -> f64 {
        self.measurements.thickness
    }

    pub fn get(&self, key: &str) -> Result<f64> {
        self.measurements.get(key)
    }
}

/// A named part of a piece before it becomes a segment
#[derive(Debug)]
pub struct Part {
    pub name: String,
    pub mesh: MeshHandle,
}

#[derive(Debug, Clone)]
pub enum Joint {
    /// Pin with the hole cut into part `hole` and the post grown on part `post`
    Pin { hole: usize, post: usize, pin: AlignmentPin },
    /// Cord channel bored through every part in `chain`
    Cord { chain: Vec<usize>, channel: CordChannel },
}

/// Parts and joints of one piece, in output order.
///
/// Part 0 is the primary part; strap mounts go there.
#[derive(Debug)]
pub struct PiecePlan {
    kind: PieceKind,
    parts: Vec<Part>,
    joints: Vec<Joint>,
}

impl PiecePlan {
    pub fn new(kind: PieceKind) -> Self {
        Self {
            kind,
            parts: Vec::new(),
            joints: Vec::new(),
        }
    }

    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    /// Add a part and return its index
    pub fn add_part(&mut self, name: impl Into<String>, mesh: MeshHandle) -> usize {
        self.parts.push(Part {
            name: name.into(),
            mesh,
        });
        self.parts.len() - 1
    }

    pub fn pin(&mut self, hole: usize, post: usize, location: Point3<f64>, direction: Vector3<f64>) {
        self.joints.push(Joint::Pin {
            hole,
            post,
            pin: AlignmentPin::new(location, direction),
        });
    }

    pub fn cord(&mut self, chain: Vec<usize>, start: Point3<f64>, end: Point3<f64>) {
        self.joints.push(Joint::Cord {
            chain,
            channel: CordChannel::new(start, end),
        });
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    /// Run a consuming operation on one part's mesh
    pub fn update_part<F>(&mut self, index: usize, op: F) -> Result<()>
    where
        F: FnOnce(MeshHandle) -> Result<MeshHandle>,
    {
        let kind = self.kind;
        let part = self
            .parts
            .get_mut(index)
            .ok_or_else(|| ArmorError::InvalidInput(format!("{} has no part {}", kind, index)))?;
        let parked = part.mesh.placeholder();
        let mesh = std::mem::replace(&mut part.mesh, parked);
        part.mesh = op(mesh)?;
        Ok(())
    }

    fn segment_name(&self, part: &str, side: Option<&str>) -> String {
        match side {
            Some(side) => format!("{}_{}_{}", self.kind, part, side),
            None => format!("{}_{}", self.kind, part),
        }
    }

    /// Name the parts, apply every joint and collect the segments
    pub fn into_segments(self, backend: &mut dyn MeshBackend, side: Option<&str>) -> Result<SegmentSet> {
        let mut segments = Vec::with_capacity(self.parts.len());
        for part in &self.parts {
            let name = self.segment_name(&part.name, side);
            backend.rename(&part.mesh, &name)?;
            segments.push(name);
        }
        let mut segments: Vec<Segment> = segments
            .into_iter()
            .zip(self.parts)
            .map(|(name, part)| Segment::new(name, part.mesh))
            .collect();

        for joint in &self.joints {
            match joint {
                Joint::Pin { hole, post, pin } => {
                    let (hole_side, post_side) = pair_mut(&mut segments, *hole, *post)?;
                    debug!(hole = hole_side.name(), post = post_side.name(), "joining parts");
                    pin.join(backend, hole_side, post_side)?;
                }
                Joint::Cord { chain, channel } => {
                    for &index in chain {
                        let segment = segments.get_mut(index).ok_or_else(|| {
                            ArmorError::InvalidInput(format!("cord channel names missing part {}", index))
                        })?;
                        channel.bore(backend, segment)?;
                    }
                }
            }
        }

        let mut set = SegmentSet::new();
        set.extend(segments)?;
        Ok(set)
    }

    /// Union every part into one mesh named `name`; joints are dropped
    pub fn into_monolithic(self, backend: &mut dyn MeshBackend, name: &str) -> Result<MeshHandle> {
        let mut parts = self.parts.into_iter();
        let first = parts
            .next()
            .ok_or_else(|| ArmorError::InvalidInput(format!("{} produced no parts", self.kind)))?;
        let mut mesh = first.mesh;
        for part in parts {
            mesh = backend.union(mesh, part.mesh)?;
        }
        backend.rename(&mesh, name)?;
        Ok(mesh)
    }
}

fn pair_mut(segments: &mut [Segment], a: usize, b: usize) -> Result<(&mut Segment, &mut Segment)> {
    let len = segments.len();
    if a == b || a >= len || b >= len {
        return Err(ArmorError::InvalidInput(format!(
            "pin must join two distinct parts, got {} and {} of {}",
            a, b, len
        )));
    }
    if a < b {
        let (low, high) = segments.split_at_mut(b);
        Ok((&mut low[a], &mut high[0]))
    } else {
        let (low, high) = segments.split_at_mut(a);
        Ok((&mut high[0], &mut low[b]))
    }
}

/// Output name of a piece built as one mesh
pub fn piece_name(kind: PieceKind, symmetry: Symmetry) -> String {
    match symmetry.side() {
        Some(side) => format!("{}_{}", kind, side),
        None => kind.to_string(),
    }
}

/// Procedural generator for one armor piece
pub trait PieceGenerator {
    fn kind(&self) -> PieceKind;

    fn symmetry(&self) -> Symmetry {
        Symmetry::Single
    }

    /// Build the parts and joints
    fn plan(&self, ctx: &mut PieceContext<'_>) -> Result<PiecePlan>;

    /// Articulated segments with connector geometry
    fn generate_segments(&self, ctx: &mut PieceContext<'_>) -> Result<SegmentSet> {
        let mut plan = self.plan(ctx)?;
        apply_straps(ctx, &mut plan)?;
        plan.into_segments(ctx.backend, self.symmetry().side())
    }

    /// The whole piece as one mesh, without connectors
    fn generate_monolithic(&self, ctx: &mut PieceContext<'_>) -> Result<MeshHandle> {
        let mut plan = self.plan(ctx)?;
        apply_straps(ctx, &mut plan)?;
        plan.into_monolithic(ctx.backend, &piece_name(self.kind(), self.symmetry()))
    }
}

/// Add the piece's standard strap mounts to its primary part
pub fn apply_straps(ctx: &mut PieceContext<'_>, plan: &mut PiecePlan) -> Result<()> {
    if !ctx.include_straps {
        return Ok(());
    }
    let system = standard_strap_system(plan.kind(), &ctx.measurements)?;
    let backend = &mut *ctx.backend;
    plan.update_part(0, |mesh| system.apply(backend, mesh))
}

pub fn generator_for(kind: PieceKind) -> Box<dyn PieceGenerator> {
    match kind {
        PieceKind::Helmet => Box::new(HelmetGenerator),
        PieceKind::Chest => Box::new(ChestGenerator),
        PieceKind::Pauldron => Box::new(PauldronGenerator),
        PieceKind::Gauntlet => Box::new(GauntletGenerator),
        PieceKind::Vambrace => Box::new(VambraceGenerator),
        PieceKind::Cuisse => Box::new(CuisseGenerator),
        PieceKind::Greave => Box::new(GreaveGenerator),
        PieceKind::Sabaton => Box::new(SabatonGenerator),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Scene;
    use crate::connectors::ConnectorKind;
    use crate::geometry::Primitive;

    fn cube(scene: &mut Scene, z: f64) -> MeshHandle {
        let mesh = scene
            .create_primitive(&Primitive::cube(Vector3::repeat(10.0)), "part")
            .unwrap();
        scene
            .transform(mesh, &crate::geometry::Transform::translate(0.0, 0.0, z))
            .unwrap()
    }

    #[test]
    fn test_plan_names_and_pins_parts() -> Result<()> {
        let mut scene = Scene::new();
        let mut plan = PiecePlan::new(PieceKind::Vambrace);
        let upper = plan.add_part("forearm", cube(&mut scene, 0.0));
        let lower = plan.add_part("elbow", cube(&mut scene, 10.5));
        plan.pin(lower, upper, Point3::new(0.0, 0.0, 5.25), -Vector3::z());

        let set = plan.into_segments(&mut scene, Some(LEFT))?;
        assert_eq!(set.names(), vec!["vambrace_forearm_left", "vambrace_elbow_left"]);
        let elbow = set.get("vambrace_elbow_left").unwrap();
        assert_eq!(elbow.connectors_of(ConnectorKind::Hole).count(), 1);
        assert_eq!(
            elbow.connectors()[0].mate.as_deref(),
            Some("vambrace_forearm_left")
        );
        assert_eq!(scene.name(set.iter().next().unwrap().mesh())?, "vambrace_forearm_left");
        Ok(())
    }

    #[test]
    fn test_pin_on_same_part_rejected() {
        let mut scene = Scene::new();
        let mut plan = PiecePlan::new(PieceKind::Helmet);
        let only = plan.add_part("front", cube(&mut scene, 0.0));
        plan.pin(only, only, Point3::origin(), Vector3::z());
        assert!(matches!(
            plan.into_segments(&mut scene, None),
            Err(ArmorError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_monolithic_unions_parts() -> Result<()> {
        let mut scene = Scene::new();
        let mut plan = PiecePlan::new(PieceKind::Greave);
        plan.add_part("shin", cube(&mut scene, 0.0));
        plan.add_part("calf", cube(&mut scene, 5.0));
        let mesh = plan.into_monolithic(&mut scene, "greave_left")?;
        assert_eq!(scene.mesh_count(), 1);
        assert_eq!(scene.bounding_box(&mesh)?.size().z, 15.0);
        Ok(())
    }

    #[test]
    fn test_paired_pieces_are_built_left() {
        for kind in PieceKind::ALL {
            let generator = generator_for(kind);
            assert_eq!(generator.kind(), kind);
            let paired = !matches!(kind, PieceKind::Helmet | PieceKind::Chest);
            assert_eq!(generator.symmetry().side().is_some(), paired);
        }
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Gauntlet: hand shell, wrist cuff, knuckle plate, four three-phalanx
//! fingers and a two-segment thumb.
//!
//! The hand points along +Y with the back of the hand at +Z. Phalanges
//! are short box tubes strung on an elastic cord that runs through their
//! top walls.

use super::shapes;
use super::{PieceContext, PieceGenerator, PiecePlan, Symmetry, PLATE_GAP};
use crate::backend::{MeshBackend, MeshHandle};
use crate::dimensions::PieceKind;
use crate::error::Result;
use crate::geometry::Axis;
use nalgebra::{Point3, Vector3};

const FINGERS: [(&str, f64); 4] = [("index", 0.9), ("middle", 1.0), ("ring", 0.95), ("pinky", 0.8)];
const PHALANGES: [&str; 3] = ["proximal", "middle", "distal"];
const THUMB: [&str; 2] = ["proximal", "distal"];
/// Thumb splay from the hand axis, towards -X (degrees)
const THUMB_SPLAY: f64 = 35.0;
/// Each phalanx is this much narrower than the one before it
const TAPER: f64 = 0.1;

pub struct GauntletGenerator;

/// Cross-section of a finger segment, before taper
#[derive(Debug, Clone, Copy)]
struct Phalanx {
    width: f64,
    half_height: f64,
    thickness: f64,
}

impl Phalanx {
    fn scale(&self, index: usize) -> f64 {
        1.0 - TAPER * index as f64
    }

    fn build(&self, backend: &mut dyn MeshBackend, name: &str, index: usize, length: f64) -> Result<MeshHandle> {
        let s = self.scale(index);
        shapes::box_tube(
            backend,
            name,
            self.width * s,
            2.0 * self.half_height * s,
            length,
            self.thickness,
            Point3::origin(),
        )
    }

    /// Height of a cord line inside the top wall of every phalanx in a chain of `count`
    fn cord_height(&self, count: usize) -> f64 {
        let lowest_top = self.half_height * self.scale(count - 1) + self.thickness;
        (self.half_height + lowest_top) / 2.0
    }
}

impl PieceGenerator for GauntletGenerator {
    fn kind(&self) -> PieceKind {
        PieceKind::Gauntlet
    }

    fn symmetry(&self) -> Symmetry {
        Symmetry::Paired { axis: Axis::X }
    }

    fn plan(&self, ctx: &mut PieceContext<'_>) -> Result<PiecePlan> {
        let hand_length = ctx.get("hand_length")?;
        let hand_width = ctx.get("hand_width")?;
        let t = ctx.thickness();
        let backend = &mut *ctx.backend;
        let mut plan = PiecePlan::new(PieceKind::Gauntlet);

        let opening = 0.4 * hand_width;
        let palm_length = 0.5 * hand_length;
        let hand = shapes::box_tube(backend, "hand", hand_width, opening, palm_length, t, Point3::origin())?;
        let hand = plan.add_part("hand", hand);

        let cuff_length = 0.2 * hand_length;
        let wrist = -palm_length / 2.0;
        let cuff = shapes::box_tube(
            backend,
            "wrist_cuff",
            hand_width,
            opening,
            cuff_length,
            t,
            Point3::new(0.0, wrist - PLATE_GAP - cuff_length / 2.0, 0.0),
        )?;
        let cuff = plan.add_part("wrist_cuff", cuff);
        let side_wall = hand_width / 2.0 + t / 2.0;
        for side in [-1.0, 1.0] {
            plan.pin(
                hand,
                cuff,
                Point3::new(side * side_wall, wrist - PLATE_GAP / 2.0, 0.0),
                -Vector3::y(),
            );
        }

        let top = opening / 2.0 + t;
        let knuckle_y = 0.15 * hand_length;
        let knuckle_height = 3.0 * t;
        let knuckle = shapes::block(
            backend,
            "knuckle",
            Vector3::new(hand_width + 2.0 * t, 0.3 * hand_width, knuckle_height),
            Point3::new(0.0, knuckle_y, top + PLATE_GAP + knuckle_height / 2.0),
        )?;
        let knuckle = plan.add_part("knuckle", knuckle);
        for side in [-1.0, 1.0] {
            plan.pin(
                hand,
                knuckle,
                Point3::new(side * 0.3 * hand_width, knuckle_y, top + PLATE_GAP / 2.0),
                Vector3::z(),
            );
        }

        let finger_width = hand_width / 5.0;
        let phalanx = Phalanx {
            width: 0.6 * finger_width,
            half_height: 0.36 * finger_width,
            thickness: t,
        };
        let knuckles = palm_length / 2.0 + PLATE_GAP;
        for (i, (finger, reach)) in FINGERS.iter().enumerate() {
            let x = (i as f64 - 1.5) * finger_width * 1.1;
            let length = 0.45 * hand_length * reach / PHALANGES.len() as f64;
            let cord_z = phalanx.cord_height(PHALANGES.len());
            let mut chain = Vec::with_capacity(PHALANGES.len());
            let mut y = knuckles;
            for (j, bone) in PHALANGES.iter().enumerate() {
                let name = format!("{}_{}", finger, bone);
                let segment = phalanx.build(backend, &name, j, length)?;
                let segment = shapes::place(backend, segment, Vector3::zeros(), Point3::new(x, y + length / 2.0, 0.0))?;
                chain.push(plan.add_part(name, segment));
                y += length + PLATE_GAP;
            }
            let end = y - PLATE_GAP;
            plan.cord(chain, Point3::new(x, knuckles, cord_z), Point3::new(x, end, cord_z));
        }

        let thumb_length = 0.2 * hand_length;
        let (sin, cos) = THUMB_SPLAY.to_radians().sin_cos();
        let direction = Vector3::new(-sin, cos, 0.0);
        let base = Point3::new(-(hand_width / 2.0 + t + 15.0), -0.05 * hand_length, 0.0);
        let lift = Vector3::new(0.0, 0.0, phalanx.cord_height(THUMB.len()));
        let mut chain = Vec::with_capacity(THUMB.len());
        let mut along = 0.0;
        for (j, bone) in THUMB.iter().enumerate() {
            let name = format!("thumb_{}", bone);
            let segment = phalanx.build(backend, &name, j, thumb_length)?;
            let center = base + direction * (along + thumb_length / 2.0);
            let segment = shapes::place(backend, segment, Vector3::new(0.0, 0.0, THUMB_SPLAY), center)?;
            chain.push(plan.add_part(name, segment));
            along += thumb_length + PLATE_GAP;
        }
        let reach = along - PLATE_GAP;
        plan.cord(chain, base + lift, base + direction * reach + lift);

        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Scene;
    use crate::config::DetailLevel;
    use crate::dimensions::DimensionTable;
    use crate::pieces::Joint;

    #[test]
    fn test_gauntlet_has_seventeen_parts() -> Result<()> {
        let table = DimensionTable::standard();
        let mut scene = Scene::new();
        let mut ctx = PieceContext {
            backend: &mut scene,
            measurements: table.measurements(PieceKind::Gauntlet)?,
            detail: DetailLevel::Minimal,
            include_straps: false,
        };
        let plan = GauntletGenerator.plan(&mut ctx)?;
        assert_eq!(plan.parts().len(), 17);
        assert_eq!(plan.parts()[0].name, "hand");
        assert!(plan.parts().iter().any(|p| p.name == "pinky_distal"));
        assert!(plan.parts().iter().any(|p| p.name == "thumb_distal"));

        let cords: Vec<usize> = plan
            .joints()
            .iter()
            .filter_map(|joint| match joint {
                Joint::Cord { chain, .. } => Some(chain.len()),
                Joint::Pin { .. } => None,
            })
            .collect();
        assert_eq!(cords, vec![3, 3, 3, 3, 2]);
        Ok(())
    }

    #[test]
    fn test_cord_line_stays_inside_every_top_wall() {
        let phalanx = Phalanx {
            width: 22.0,
            half_height: 8.0,
            thickness: 4.0,
        };
        let z = phalanx.cord_height(3);
        for j in 0..3 {
            let inner = phalanx.half_height * phalanx.scale(j);
            assert!(z - 1.0 > inner && z + 1.0 < inner + phalanx.thickness);
        }
    }
}

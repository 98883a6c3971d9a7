// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Chest: breastplate over three stacked ab plates, plus a backplate.
//!
//! The torso is an elliptic tube along Z, front at -Y. The breastplate
//! covers the upper front half; the ab plates tile the lower front half
//! at a fixed pitch, each one gap shorter than the pitch.

use super::shapes;
use super::{PieceContext, PieceGenerator, PiecePlan, PLATE_GAP};
use crate::config::DetailLevel;
use crate::dimensions::PieceKind;
use crate::error::Result;
use crate::geometry::Axis;
use nalgebra::{Point3, Vector3};

const AB_PLATES: usize = 3;
/// Pins sit this far either side of the front centreline (degrees)
const SEAM_PIN_ANGLE: f64 = 30.0;

pub struct ChestGenerator;

impl PieceGenerator for ChestGenerator {
    fn kind(&self) -> PieceKind {
        PieceKind::Chest
    }

    fn plan(&self, ctx: &mut PieceContext<'_>) -> Result<PiecePlan> {
        let width = ctx.get("width")?;
        let height = ctx.get("height")?;
        let depth = ctx.get("depth")?;
        let t = ctx.thickness();
        let detail = ctx.detail;
        let backend = &mut *ctx.backend;

        let a = 0.35 * width;
        let b = depth / 2.0;
        let top = height / 2.0;
        let pitch = height / 6.0;
        let torso = shapes::elliptic_tube(backend, "torso", a, b, height, t, detail)?;

        let mut plan = PiecePlan::new(PieceKind::Chest);

        let breast = backend.duplicate(&torso, "breastplate")?;
        let breast = shapes::keep_between(backend, breast, Axis::Z, 0.0, top)?;
        let mut breast = shapes::keep_below(backend, breast, Axis::Y, -PLATE_GAP / 2.0)?;
        let sternum = shapes::block(
            backend,
            "sternum",
            Vector3::new(8.0, 8.0, top * 0.9),
            Point3::new(0.0, -(b + t), top / 2.0),
        )?;
        breast = backend.union(breast, sternum)?;
        if detail >= DetailLevel::Standard {
            for side in [-1.0, 1.0] {
                let x = side * a * 0.4;
                let wall = (b + t) * (1.0 - (x / (a + t)).powi(2)).sqrt();
                let pec = shapes::ellipsoid(
                    backend,
                    "pectoral",
                    Vector3::new(a * 0.33, 8.0, top * 0.35),
                    detail,
                    Point3::new(x, -(wall + t), top * 0.6),
                )?;
                breast = backend.union(breast, pec)?;
            }
            breast = shapes::keep_below(backend, breast, Axis::Y, -PLATE_GAP / 2.0)?;
        }
        let mut upper = plan.add_part("breastplate", breast);

        let mid_a = a + t / 2.0;
        let mid_b = b + t / 2.0;
        for i in 1..=AB_PLATES {
            let plate_top = -((i - 1) as f64) * pitch - PLATE_GAP;
            let plate_bottom = -(i as f64) * pitch;
            let plate = backend.duplicate(&torso, &format!("ab_plate_{}", i))?;
            let plate = shapes::keep_between(backend, plate, Axis::Z, plate_bottom, plate_top)?;
            let plate = shapes::keep_below(backend, plate, Axis::Y, -PLATE_GAP / 2.0)?;
            let lower = plan.add_part(format!("ab_plate_{}", i), plate);

            let seam = plate_top + PLATE_GAP / 2.0;
            for angle in [-90.0 - SEAM_PIN_ANGLE, -90.0 + SEAM_PIN_ANGLE] {
                plan.pin(upper, lower, shapes::ellipse_point_xy(mid_a, mid_b, angle, seam), -Vector3::z());
            }
            upper = lower;
        }

        let back = backend.duplicate(&torso, "backplate")?;
        let back = shapes::keep_above(backend, back, Axis::Y, PLATE_GAP / 2.0)?;
        let spine = shapes::block(
            backend,
            "spine",
            Vector3::new(8.0, 8.0, height * 0.9),
            Point3::new(0.0, b + t, 0.0),
        )?;
        let back = backend.union(back, spine)?;
        plan.add_part("backplate", back);

        backend.remove(torso)?;
        Ok(plan)
    }
}

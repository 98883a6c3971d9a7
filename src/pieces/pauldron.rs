// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Pauldron: shoulder dome with three lames and an arm guard hanging below

use super::shapes;
use super::{PieceContext, PieceGenerator, PiecePlan, Symmetry, PLATE_GAP};
use crate::dimensions::PieceKind;
use crate::error::Result;
use crate::geometry::{Axis, Transform};
use nalgebra::Vector3;

const LAMES: usize = 3;
/// Lame height relative to the dome height
const LAME_HEIGHT: f64 = 0.25;
/// Arm guard height relative to a lame
const GUARD_SCALE: f64 = 1.6;
/// Parametric angles of the seam pins on the outer (-X) side
const SEAM_PIN_ANGLES: [f64; 2] = [150.0, 210.0];

pub struct PauldronGenerator;

impl PieceGenerator for PauldronGenerator {
    fn kind(&self) -> PieceKind {
        PieceKind::Pauldron
    }

    fn symmetry(&self) -> Symmetry {
        Symmetry::Paired { axis: Axis::X }
    }

    fn plan(&self, ctx: &mut PieceContext<'_>) -> Result<PiecePlan> {
        let width = ctx.get("width")?;
        let height = ctx.get("height")?;
        let depth = ctx.get("depth")?;
        let t = ctx.thickness();
        let detail = ctx.detail;
        let backend = &mut *ctx.backend;

        let a = width / 2.0;
        let b = depth / 2.0;
        let mut plan = PiecePlan::new(PieceKind::Pauldron);

        let dome = shapes::ellipsoid_shell(backend, "dome", Vector3::new(a, b, height), t, detail)?;
        let dome = shapes::keep_above(backend, dome, Axis::Z, 0.0)?;
        let mut upper = plan.add_part("dome", dome);

        let lame_height = height * LAME_HEIGHT;
        let mut top = -PLATE_GAP;
        let bands = (1..=LAMES)
            .map(|i| (format!("lame_{}", i), lame_height))
            .chain(std::iter::once(("arm_guard".to_string(), lame_height * GUARD_SCALE)));

        for (name, band_height) in bands {
            let band = shapes::elliptic_tube(backend, &name, a, b, band_height, t, detail)?;
            let band = backend.transform(band, &Transform::translate(0.0, 0.0, top - band_height / 2.0))?;
            let band = shapes::keep_below(backend, band, Axis::X, 0.0)?;
            let lower = plan.add_part(name, band);

            let seam = top + PLATE_GAP / 2.0;
            for angle in SEAM_PIN_ANGLES {
                plan.pin(
                    upper,
                    lower,
                    shapes::ellipse_point_xy(a + t / 2.0, b + t / 2.0, angle, seam),
                    -Vector3::z(),
                );
            }
            upper = lower;
            top -= band_height + PLATE_GAP;
        }

        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Scene;
    use crate::config::DetailLevel;
    use crate::dimensions::DimensionTable;

    #[test]
    fn test_bands_stack_below_the_dome() -> Result<()> {
        let table = DimensionTable::standard();
        let mut scene = Scene::new();
        let mut ctx = PieceContext {
            backend: &mut scene,
            measurements: table.measurements(PieceKind::Pauldron)?,
            detail: DetailLevel::Minimal,
            include_straps: false,
        };
        let plan = PauldronGenerator.plan(&mut ctx)?;
        let names: Vec<_> = plan.parts().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["dome", "lame_1", "lame_2", "lame_3", "arm_guard"]);
        assert_eq!(plan.joints().len(), 8);

        let mut previous_bottom = f64::INFINITY;
        for part in plan.parts() {
            let bbox = ctx.backend.bounding_box(&part.mesh)?;
            assert!(bbox.max.z <= previous_bottom - PLATE_GAP + 1e-6);
            previous_bottom = bbox.min.z;
        }
        Ok(())
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Helmet: an ellipsoidal shell split at the coronal plane

use super::shapes;
use super::{PieceContext, PieceGenerator, PiecePlan, PLATE_GAP};
use crate::backend::{MeshBackend, MeshHandle};
use crate::config::DetailLevel;
use crate::dimensions::PieceKind;
use crate::error::Result;
use crate::geometry::Axis;
use crate::straps::standard_strap_system;
use nalgebra::{Point3, Vector3};

pub struct HelmetGenerator;

#[derive(Debug, Clone, Copy)]
struct HelmetDims {
    width: f64,
    length: f64,
    height: f64,
    visor_width: f64,
    visor_height: f64,
    thickness: f64,
}

impl HelmetDims {
    fn from_context(ctx: &PieceContext<'_>) -> Result<Self> {
        Ok(Self {
            width: ctx.get("inner_width")?,
            length: ctx.get("inner_length")?,
            height: ctx.get("inner_height")?,
            visor_width: ctx.get("visor_width")?,
            visor_height: ctx.get("visor_height")?,
            thickness: ctx.thickness(),
        })
    }
}

/// Whole shell with visor, crest and breathing holes
fn build_shell(backend: &mut dyn MeshBackend, dims: &HelmetDims, detail: DetailLevel) -> Result<MeshHandle> {
    let t = dims.thickness;
    let radii = Vector3::new(dims.width / 2.0, dims.length / 2.0, dims.height / 2.0);
    let shell = shapes::ellipsoid_shell(backend, "helmet", radii, t, detail)?;
    // open at the neck
    let mut shell = shapes::keep_above(backend, shell, Axis::Z, -dims.height * 0.25)?;

    // visor slit through the front wall only
    let front = -(dims.length / 2.0 + t + 5.0);
    let back = -dims.length * 0.25;
    let visor = shapes::block(
        backend,
        "visor",
        Vector3::new(dims.visor_width, back - front, dims.visor_height),
        Point3::new(0.0, (front + back) / 2.0, dims.height * 0.05),
    )?;
    shell = backend.difference(shell, visor)?;

    if detail >= DetailLevel::Basic {
        let crest = shapes::block(
            backend,
            "crest",
            Vector3::new(6.0, dims.length * 0.7, 12.0),
            Point3::new(0.0, 0.0, dims.height / 2.0 + t - 2.0),
        )?;
        shell = backend.union(shell, crest)?;
    }

    if detail >= DetailLevel::Standard {
        for i in 0..6 {
            let x = (i as f64 - 2.5) * 10.0;
            let hole = shapes::cylinder_along(
                backend,
                "breath",
                2.0,
                30.0,
                Axis::Y,
                detail,
                Point3::new(x, -dims.length / 2.0, -dims.height * 0.12),
            )?;
            shell = backend.difference(shell, hole)?;
        }
    }
    Ok(shell)
}

impl PieceGenerator for HelmetGenerator {
    fn kind(&self) -> PieceKind {
        PieceKind::Helmet
    }

    fn plan(&self, ctx: &mut PieceContext<'_>) -> Result<PiecePlan> {
        let dims = HelmetDims::from_context(ctx)?;
        let backend = &mut *ctx.backend;
        let shell = build_shell(backend, &dims, ctx.detail)?;

        let front = backend.duplicate(&shell, "front")?;
        let front = shapes::keep_below(backend, front, Axis::Y, -PLATE_GAP / 2.0)?;
        let back = backend.duplicate(&shell, "back")?;
        let back = shapes::keep_above(backend, back, Axis::Y, PLATE_GAP / 2.0)?;
        backend.remove(shell)?;

        let mut plan = PiecePlan::new(PieceKind::Helmet);
        let front = plan.add_part("front", front);
        let back = plan.add_part("back", back);
        let ring = dims.width / 2.0 + dims.thickness / 2.0;
        for side in [-1.0, 1.0] {
            plan.pin(front, back, Point3::new(side * ring, 0.0, 0.0), Vector3::y());
        }
        Ok(plan)
    }

    /// The shell in one piece rather than the two halves welded back together
    fn generate_monolithic(&self, ctx: &mut PieceContext<'_>) -> Result<MeshHandle> {
        let dims = HelmetDims::from_context(ctx)?;
        let mut shell = build_shell(ctx.backend, &dims, ctx.detail)?;
        if ctx.include_straps {
            let straps = standard_strap_system(PieceKind::Helmet, &ctx.measurements)?;
            shell = straps.apply(ctx.backend, shell)?;
        }
        ctx.backend.rename(&shell, PieceKind::Helmet.as_str())?;
        Ok(shell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Scene;
    use crate::dimensions::DimensionTable;

    #[test]
    fn test_halves_leave_a_gap_at_the_seam() -> Result<()> {
        let table = DimensionTable::standard();
        let mut scene = Scene::new();
        let mut ctx = PieceContext {
            backend: &mut scene,
            measurements: table.measurements(PieceKind::Helmet)?,
            detail: DetailLevel::Minimal,
            include_straps: false,
        };
        let plan = HelmetGenerator.plan(&mut ctx)?;
        let front = ctx.backend.bounding_box(&plan.parts()[0].mesh)?;
        let back = ctx.backend.bounding_box(&plan.parts()[1].mesh)?;
        assert!(front.max.y <= -PLATE_GAP / 2.0 + 1e-6);
        assert!(back.min.y >= PLATE_GAP / 2.0 - 1e-6);
        assert_eq!(ctx.backend.mesh_count(), 2);
        Ok(())
    }

    #[test]
    fn test_monolithic_shell_is_one_mesh() -> Result<()> {
        let table = DimensionTable::standard();
        let mut scene = Scene::new();
        let mut ctx = PieceContext {
            backend: &mut scene,
            measurements: table.measurements(PieceKind::Helmet)?,
            detail: DetailLevel::Minimal,
            include_straps: true,
        };
        let shell = HelmetGenerator.generate_monolithic(&mut ctx)?;
        assert_eq!(ctx.backend.name(&shell)?, "helmet");
        assert_eq!(ctx.backend.mesh_count(), 1);
        Ok(())
    }
}

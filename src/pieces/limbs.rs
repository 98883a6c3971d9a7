// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Limb shells: vambrace, cuisse and greave.
//!
//! All three are truncated conical shells along Y with the proximal end
//! at +Y, plus one articulated plate: the elbow cop, the knee cop, or the
//! calf plate.

use super::shapes::{self, lerp};
use super::{PieceContext, PieceGenerator, PiecePlan, Symmetry, PLATE_GAP};
use crate::backend::{MeshBackend, MeshHandle};
use crate::config::DetailLevel;
use crate::dimensions::PieceKind;
use crate::error::Result;
use crate::geometry::{Axis, Primitive, Transform};
use nalgebra::{Point3, Vector3};
use std::f64::consts::PI;

/// Angular offset of the two joint pins from the cop's centreline (degrees)
const JOINT_PIN_ANGLE: f64 = 40.0;

/// Inner radii of a limb shell, derived from circumferences
#[derive(Debug, Clone, Copy)]
struct LimbProfile {
    length: f64,
    upper: f64,
    lower: f64,
    thickness: f64,
}

impl LimbProfile {
    fn from_context(ctx: &PieceContext<'_>) -> Result<Self> {
        Ok(Self {
            length: ctx.get("length")?,
            upper: ctx.get("upper_circumference")? / (2.0 * PI),
            lower: ctx.get("lower_circumference")? / (2.0 * PI),
            thickness: ctx.thickness(),
        })
    }

    /// Inner radius at `y`
    fn radius_at(&self, y: f64) -> f64 {
        lerp(self.lower, self.upper, (y + self.length / 2.0) / self.length)
    }

    fn outer_radius_at(&self, y: f64) -> f64 {
        self.radius_at(y) + self.thickness
    }

    fn taper_degrees(&self) -> f64 {
        ((self.upper - self.lower) / self.length).atan().to_degrees()
    }

    fn shell(&self, backend: &mut dyn MeshBackend, name: &str, detail: DetailLevel) -> Result<MeshHandle> {
        shapes::limb_shell(backend, name, self.upper, self.lower, self.length, self.thickness, detail)
    }

    /// Ridge along the outer surface at angle `side` (+1 front, -1 back)
    fn ridge(&self, backend: &mut dyn MeshBackend, side: f64) -> Result<MeshHandle> {
        let mean = (self.upper + self.lower) / 2.0 + self.thickness;
        shapes::rotated_block(
            backend,
            "ridge",
            Vector3::new(6.0, self.length * 0.9, 6.0),
            Vector3::new(side * self.taper_degrees(), 0.0, 0.0),
            Point3::new(0.0, 0.0, side * mean),
        )
    }

    /// Decorative bands at a quarter length from either end
    fn bands(&self, backend: &mut dyn MeshBackend, mut mesh: MeshHandle, detail: DetailLevel) -> Result<MeshHandle> {
        let segments = detail.segments(shapes::ROUND_SEGMENTS);
        for y in [-self.length / 4.0, self.length / 4.0] {
            let torus = backend.create_primitive(
                &Primitive::torus(self.outer_radius_at(y), 1.5, segments, 8),
                "band",
            )?;
            let torus = shapes::place(backend, torus, Vector3::new(90.0, 0.0, 0.0), Point3::new(0.0, y, 0.0))?;
            mesh = backend.union(mesh, torus)?;
        }
        Ok(mesh)
    }
}

/// Collar tube with a hemispherical cop, on the `toward` side of `y_start`
struct JointCop {
    radius: f64,
    thickness: f64,
    y_start: f64,
    length: f64,
    /// +1 grows towards +Y, -1 towards -Y
    toward: f64,
    /// Z side the cop is kept on: +1 front, -1 back
    face: f64,
}

impl JointCop {
    fn build(&self, backend: &mut dyn MeshBackend, name: &str, detail: DetailLevel) -> Result<MeshHandle> {
        let center_y = self.y_start + self.toward * self.length / 2.0;
        let collar = shapes::limb_shell(backend, name, self.radius, self.radius, self.length, self.thickness, detail)?;
        let collar = backend.transform(collar, &Transform::translate(0.0, center_y, 0.0))?;

        let cop = shapes::ellipsoid_shell(backend, "cop", Vector3::repeat(self.radius + 2.0), self.thickness, detail)?;
        let cop = backend.transform(cop, &Transform::translate(0.0, center_y, 0.0))?;
        let cop = if self.face > 0.0 {
            shapes::keep_above(backend, cop, Axis::Z, self.radius * 0.3)?
        } else {
            shapes::keep_below(backend, cop, Axis::Z, -self.radius * 0.3)?
        };
        let cop = if self.toward > 0.0 {
            shapes::keep_above(backend, cop, Axis::Y, self.y_start)?
        } else {
            shapes::keep_below(backend, cop, Axis::Y, self.y_start)?
        };
        backend.union(collar, cop)
    }
}

/// Forearm shell with an articulated elbow cop
pub struct VambraceGenerator;

impl PieceGenerator for VambraceGenerator {
    fn kind(&self) -> PieceKind {
        PieceKind::Vambrace
    }

    fn symmetry(&self) -> Symmetry {
        Symmetry::Paired { axis: Axis::X }
    }

    fn plan(&self, ctx: &mut PieceContext<'_>) -> Result<PiecePlan> {
        let limb = LimbProfile::from_context(ctx)?;
        let detail = ctx.detail;
        let backend = &mut *ctx.backend;
        let mut plan = PiecePlan::new(PieceKind::Vambrace);

        let mut forearm = limb.shell(backend, "forearm", detail)?;
        if detail >= DetailLevel::Basic {
            let ridge = limb.ridge(backend, 1.0)?;
            forearm = backend.union(forearm, ridge)?;
        }
        if detail >= DetailLevel::Standard {
            forearm = limb.bands(backend, forearm, detail)?;
        }
        let forearm = plan.add_part("forearm", forearm);

        let top = limb.length / 2.0;
        let elbow = JointCop {
            radius: limb.upper,
            thickness: limb.thickness,
            y_start: top + PLATE_GAP,
            length: limb.length * 0.1,
            toward: 1.0,
            face: -1.0,
        }
        .build(backend, "elbow", detail)?;
        let elbow = plan.add_part("elbow", elbow);

        let seam = top + PLATE_GAP / 2.0;
        let ring = limb.upper + limb.thickness / 2.0;
        for angle in [180.0 - JOINT_PIN_ANGLE, 180.0 + JOINT_PIN_ANGLE] {
            plan.pin(forearm, elbow, shapes::ring_point_xz(ring, angle, seam), Vector3::y());
        }
        Ok(plan)
    }
}

/// Thigh shell with an articulated knee cop
pub struct CuisseGenerator;

impl PieceGenerator for CuisseGenerator {
    fn kind(&self) -> PieceKind {
        PieceKind::Cuisse
    }

    fn symmetry(&self) -> Symmetry {
        Symmetry::Paired { axis: Axis::X }
    }

    fn plan(&self, ctx: &mut PieceContext<'_>) -> Result<PiecePlan> {
        let limb = LimbProfile::from_context(ctx)?;
        let detail = ctx.detail;
        let backend = &mut *ctx.backend;
        let mut plan = PiecePlan::new(PieceKind::Cuisse);

        let mut thigh = limb.shell(backend, "thigh", detail)?;
        if detail >= DetailLevel::Basic {
            let ridge = limb.ridge(backend, 1.0)?;
            thigh = backend.union(thigh, ridge)?;
        }
        if detail >= DetailLevel::Standard {
            thigh = limb.bands(backend, thigh, detail)?;
        }
        let thigh = plan.add_part("thigh", thigh);

        let bottom = -limb.length / 2.0;
        let collar_length = limb.length * 0.08;
        let mut knee = JointCop {
            radius: limb.lower,
            thickness: limb.thickness,
            y_start: bottom - PLATE_GAP,
            length: collar_length,
            toward: -1.0,
            face: 1.0,
        }
        .build(backend, "knee", detail)?;
        if detail >= DetailLevel::Basic {
            let spike = backend.create_primitive(
                &Primitive::cone(8.0, 0.0, 15.0, detail.segments(shapes::ROUND_SEGMENTS)),
                "knee_point",
            )?;
            let reach = limb.lower + 2.0 + limb.thickness + 7.5 - 1.0;
            let spike = backend.transform(
                spike,
                &Transform::translate(0.0, bottom - PLATE_GAP - collar_length / 2.0, reach),
            )?;
            knee = backend.union(knee, spike)?;
        }
        let knee = plan.add_part("knee", knee);

        let seam = bottom - PLATE_GAP / 2.0;
        let ring = limb.lower + limb.thickness / 2.0;
        for angle in [-JOINT_PIN_ANGLE, JOINT_PIN_ANGLE] {
            plan.pin(thigh, knee, shapes::ring_point_xz(ring, angle, seam), -Vector3::y());
        }
        Ok(plan)
    }
}

/// Shin shell with a calf plate over its upper back
pub struct GreaveGenerator;

impl PieceGenerator for GreaveGenerator {
    fn kind(&self) -> PieceKind {
        PieceKind::Greave
    }

    fn symmetry(&self) -> Symmetry {
        Symmetry::Paired { axis: Axis::X }
    }

    fn plan(&self, ctx: &mut PieceContext<'_>) -> Result<PiecePlan> {
        let limb = LimbProfile::from_context(ctx)?;
        let detail = ctx.detail;
        let backend = &mut *ctx.backend;
        let mut plan = PiecePlan::new(PieceKind::Greave);

        let mut shin = limb.shell(backend, "shin", detail)?;
        if detail >= DetailLevel::Basic {
            let ridge = limb.ridge(backend, 1.0)?;
            shin = backend.union(shin, ridge)?;
        }
        let shin = plan.add_part("shin", shin);

        // calf plate spans the upper 60% of the shin
        let calf_low = -limb.length * 0.1;
        let calf_high = limb.length / 2.0;
        let calf_length = calf_high - calf_low;
        let calf_center = (calf_low + calf_high) / 2.0;
        let calf = shapes::limb_shell(
            backend,
            "calf",
            limb.outer_radius_at(calf_high) + PLATE_GAP,
            limb.outer_radius_at(calf_low) + PLATE_GAP,
            calf_length,
            limb.thickness,
            detail,
        )?;
        let calf = backend.transform(calf, &Transform::translate(0.0, calf_center, 0.0))?;
        let calf = shapes::keep_below(backend, calf, Axis::Z, 0.0)?;
        let calf = plan.add_part("calf", calf);

        let seam_radius = limb.outer_radius_at(calf_center) + PLATE_GAP / 2.0;
        for side in [-1.0, 1.0] {
            let x = side * 0.3 * seam_radius;
            let z = -(seam_radius * seam_radius - x * x).sqrt();
            plan.pin(shin, calf, Point3::new(x, calf_center, z), -Vector3::z());
        }
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Scene;
    use crate::dimensions::DimensionTable;
    use approx::assert_relative_eq;

    #[test]
    fn test_profile_radius_interpolates_along_y() -> Result<()> {
        let table = DimensionTable::standard();
        let mut scene = Scene::new();
        let ctx = PieceContext {
            backend: &mut scene,
            measurements: table.measurements(PieceKind::Cuisse)?,
            detail: DetailLevel::Minimal,
            include_straps: false,
        };
        let limb = LimbProfile::from_context(&ctx)?;
        assert_relative_eq!(limb.radius_at(limb.length / 2.0), 600.0 / (2.0 * PI), epsilon = 1e-9);
        assert_relative_eq!(limb.radius_at(-limb.length / 2.0), 420.0 / (2.0 * PI), epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn test_knee_sits_below_thigh_across_the_gap() -> Result<()> {
        let table = DimensionTable::standard();
        let mut scene = Scene::new();
        let mut ctx = PieceContext {
            backend: &mut scene,
            measurements: table.measurements(PieceKind::Cuisse)?,
            detail: DetailLevel::Minimal,
            include_straps: false,
        };
        let plan = CuisseGenerator.plan(&mut ctx)?;
        let thigh = ctx.backend.bounding_box(&plan.parts()[0].mesh)?;
        let knee = ctx.backend.bounding_box(&plan.parts()[1].mesh)?;
        assert!(knee.max.y <= thigh.min.y - PLATE_GAP + 1e-6);
        assert_eq!(plan.joints().len(), 2);
        Ok(())
    }
}

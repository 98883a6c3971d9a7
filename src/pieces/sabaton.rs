// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Sabaton: foot shell with an ankle tube and three articulated toe plates

use super::shapes;
use super::{PieceContext, PieceGenerator, PiecePlan, Symmetry, PLATE_GAP};
use crate::backend::{MeshBackend, MeshHandle};
use crate::dimensions::PieceKind;
use crate::error::Result;
use crate::geometry::{Axis, Transform};
use nalgebra::{Point3, Vector3};
use std::f64::consts::PI;

const TOES: usize = 3;
/// Cord enters the foot this far behind its front edge
const CORD_LEAD_IN: f64 = 20.0;

pub struct SabatonGenerator;

/// Toe plate with its top flush at `top`; `opening.y` is the plate length
fn toe(
    backend: &mut dyn MeshBackend,
    name: &str,
    opening: Vector3<f64>,
    thickness: f64,
    top: f64,
    y_start: f64,
    closed: bool,
) -> Result<MeshHandle> {
    let length = opening.y;
    let center_z = top - thickness - opening.z / 2.0;
    let outer = shapes::block(
        backend,
        name,
        Vector3::new(opening.x + 2.0 * thickness, length, opening.z + 2.0 * thickness),
        Point3::new(0.0, y_start + length / 2.0, center_z),
    )?;
    let (cavity_length, cavity_y) = if closed {
        (length + 1.0 - thickness, y_start - 1.0 + (length + 1.0 - thickness) / 2.0)
    } else {
        (length + 2.0, y_start + length / 2.0)
    };
    let cavity = shapes::block(
        backend,
        "toe_cavity",
        Vector3::new(opening.x, cavity_length, opening.z),
        Point3::new(0.0, cavity_y, center_z),
    )?;
    backend.difference(outer, cavity)
}

impl PieceGenerator for SabatonGenerator {
    fn kind(&self) -> PieceKind {
        PieceKind::Sabaton
    }

    fn symmetry(&self) -> Symmetry {
        Symmetry::Paired { axis: Axis::X }
    }

    fn plan(&self, ctx: &mut PieceContext<'_>) -> Result<PiecePlan> {
        let length = ctx.get("length")?;
        let width = ctx.get("width")?;
        let ankle_radius = ctx.get("ankle_circumference")? / (2.0 * PI);
        let t = ctx.thickness();
        let detail = ctx.detail;
        let backend = &mut *ctx.backend;
        let mut plan = PiecePlan::new(PieceKind::Sabaton);

        let foot_length = 0.7 * length;
        let opening = 0.5 * width;
        let top = opening / 2.0 + t;
        let ankle_y = -0.2 * length;

        let foot = shapes::box_tube(backend, "foot", width, opening, foot_length, t, Point3::origin())?;
        let ankle_hole = shapes::cylinder_along(
            backend,
            "ankle_opening",
            ankle_radius,
            opening + 4.0 * t,
            Axis::Z,
            detail,
            Point3::new(0.0, ankle_y, top),
        )?;
        let foot = backend.difference(foot, ankle_hole)?;
        let foot = plan.add_part("foot", foot);

        let ankle_height = 0.35 * length;
        let ankle = shapes::elliptic_tube(backend, "ankle", ankle_radius, ankle_radius, ankle_height, t, detail)?;
        let ankle = backend.transform(
            ankle,
            &Transform::translate(0.0, ankle_y, top + PLATE_GAP + ankle_height / 2.0),
        )?;
        let ankle = plan.add_part("ankle", ankle);
        let ring = ankle_radius + t / 2.0;
        for side in [-1.0, 1.0] {
            plan.pin(foot, ankle, Point3::new(side * ring, ankle_y, top + PLATE_GAP / 2.0), Vector3::z());
        }

        let front = foot_length / 2.0;
        let pitch = (length - foot_length) / TOES as f64;
        let mut chain = vec![foot];
        let mut y = front + PLATE_GAP;
        let mut end = y;
        for i in 0..TOES {
            let taper = 1.0 - 0.1 * (i + 1) as f64;
            let cavity = Vector3::new(width * taper, pitch - PLATE_GAP, opening * (1.0 - 0.15 * (i + 1) as f64));
            let name = format!("toe_{}", i + 1);
            let plate = toe(backend, &name, cavity, t, top, y, i + 1 == TOES)?;
            chain.push(plan.add_part(name, plate));
            end = y + cavity.y;
            y += pitch;
        }

        let cord_z = top - t / 2.0;
        plan.cord(
            chain,
            Point3::new(0.0, front - CORD_LEAD_IN, cord_z),
            Point3::new(0.0, end - t, cord_z),
        );
        Ok(plan)
    }
}

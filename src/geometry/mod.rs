// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - mesh representation and operations

mod bbox;
pub mod csg;
mod mesh;
mod primitives;
mod transform;

pub use bbox::BoundingBox;
pub use csg::BooleanOp;
pub use mesh::{Mesh, Triangle, Vertex};
pub use primitives::Primitive;
pub use transform::{rotation_aligning, Axis, Transform};

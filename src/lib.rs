// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Shardplate armor kernel
//!
//! Procedural, 3D-printable armor built with CSG. Each piece is generated
//! from a dimension table, decomposed into articulated segments joined by
//! alignment pins and elastic-cord channels, and recursively re-split until
//! every segment fits the printer's build plate.

pub mod backend;
pub mod cli;
pub mod config;
pub mod connectors;
pub mod dimensions;
pub mod error;
pub mod geometry;
pub mod io;
pub mod pieces;
pub mod pipeline;
pub mod segment;
pub mod splitter;
pub mod straps;

pub use backend::{MeshBackend, MeshHandle, MeshId, Scene};
pub use config::{BuildPlate, DetailLevel, GenerationConfig};
pub use connectors::{AlignmentPin, Connector, ConnectorKind, CordChannel};
pub use dimensions::{DimensionTable, PieceDimensions, PieceKind};
pub use error::{ArmorError, Result};
pub use geometry::{Axis, BoundingBox, Mesh, Primitive, Transform};
pub use pieces::{generator_for, PieceGenerator, PLATE_GAP};
pub use pipeline::{generate_piece, generate_suit, PieceOptions, PieceReport};
pub use segment::{Segment, SegmentSet};
pub use splitter::{relink_mates, split_object_for_plate, split_segment_for_plate, MAX_SPLIT_DEPTH};

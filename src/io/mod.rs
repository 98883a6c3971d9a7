// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! I/O module - STL files and segment manifests

mod exporter;
pub mod manifest;

pub use exporter::{export_stl, import_stl};
pub use manifest::{file_checksum, PieceManifest, SegmentEntry, MANIFEST_FILE};

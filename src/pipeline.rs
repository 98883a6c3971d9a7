// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Shared generation pipeline.
//!
//! For each piece: build the segments (or the monolithic mesh), re-split
//! anything that does not fit the build plate, finish the surfaces, mirror
//! paired pieces and export one STL per segment with a manifest.

use crate::backend::MeshBackend;
use crate::config::{BuildPlate, DetailLevel, GenerationConfig};
use crate::dimensions::{DimensionTable, PieceKind};
use crate::error::Result;
use crate::geometry::Axis;
use crate::io::{file_checksum, PieceManifest, SegmentEntry};
use crate::pieces::{generator_for, piece_name, PieceContext, PieceGenerator};
use crate::segment::{Segment, SegmentSet};
use crate::splitter::{relink_mates, split_segment_for_plate};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Per-piece switches taken from the run configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PieceOptions {
    pub build_plate: BuildPlate,
    pub auto_split: bool,
    pub detail: DetailLevel,
    pub segmented: bool,
    pub include_straps: bool,
}

impl Default for PieceOptions {
    fn default() -> Self {
        Self::from(&GenerationConfig::default())
    }
}

impl From<&GenerationConfig> for PieceOptions {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            build_plate: config.build_plate,
            auto_split: config.auto_split,
            detail: config.detail_level,
            segmented: config.segmented,
            include_straps: config.include_straps,
        }
    }
}

/// Generate one piece, ready for export.
///
/// Dimensions and the build plate are validated before any geometry is
/// created. Paired pieces come back with the left side first, followed by
/// its mirror.
pub fn generate_piece(
    backend: &mut dyn MeshBackend,
    generator: &dyn PieceGenerator,
    table: &DimensionTable,
    options: &PieceOptions,
) -> Result<SegmentSet> {
    let kind = generator.kind();
    let measurements = table.measurements(kind)?;
    options.build_plate.validate()?;
    info!(piece = %kind, detail = %options.detail, segmented = options.segmented, "generating piece");

    let symmetry = generator.symmetry();
    let mut ctx = PieceContext {
        backend: &mut *backend,
        measurements,
        detail: options.detail,
        include_straps: options.include_straps,
    };
    let set = if options.segmented {
        generator.generate_segments(&mut ctx)?
    } else {
        let mesh = generator.generate_monolithic(&mut ctx)?;
        let mut set = SegmentSet::new();
        set.insert(Segment::new(piece_name(kind, symmetry), mesh))?;
        set
    };

    let set = if options.auto_split {
        split_segments(backend, set, &options.build_plate)?
    } else {
        set
    };
    let mut set = finish_segment_set(backend, set, options.detail)?;

    if let Some(axis) = symmetry.mirror_axis() {
        mirror_into(backend, &mut set, axis)?;
    }
    debug!(piece = %kind, segments = set.len(), "piece ready");
    Ok(set)
}

/// Split every segment for the plate, keeping each one's leaves in place.
///
/// Pins between parts are re-mated to whichever leaves ended up holding them.
pub fn split_segments(backend: &mut dyn MeshBackend, set: SegmentSet, plate: &BuildPlate) -> Result<SegmentSet> {
    let mut leaves = Vec::with_capacity(set.len());
    for segment in set {
        leaves.extend(split_segment_for_plate(backend, segment, plate)?);
    }
    relink_mates(&mut leaves);
    let mut out = SegmentSet::new();
    out.extend(leaves)?;
    Ok(out)
}

/// Surface finishing on every leaf
pub fn finish_segment_set(backend: &mut dyn MeshBackend, set: SegmentSet, detail: DetailLevel) -> Result<SegmentSet> {
    let mut out = SegmentSet::new();
    for mut segment in set {
        segment.update_mesh(|mesh| backend.finish_surface(mesh, detail))?;
        out.insert(segment)?;
    }
    Ok(out)
}

/// Append the mirror image of every segment in `set`
pub fn mirror_into(backend: &mut dyn MeshBackend, set: &mut SegmentSet, axis: Axis) -> Result<()> {
    let mirrored = set.mirrored(backend, axis)?;
    set.extend(mirrored)
}

/// Segments that still exceed the plate
pub fn oversized_segments<'a>(
    backend: &dyn MeshBackend,
    set: &'a SegmentSet,
    plate: &BuildPlate,
) -> Result<Vec<&'a Segment>> {
    let mut oversized = Vec::new();
    for segment in set {
        if !plate.fits(&backend.dimensions(segment.mesh())?) {
            oversized.push(segment);
        }
    }
    Ok(oversized)
}

/// Write `<segment>.stl` for every segment and a manifest into `dir`
pub fn export_segment_set(
    backend: &dyn MeshBackend,
    set: &SegmentSet,
    dir: &Path,
    piece: &str,
    options: &PieceOptions,
) -> Result<PieceManifest> {
    let mut manifest = PieceManifest::new(piece, options.build_plate, options.detail);
    for segment in set {
        let file = format!("{}.stl", segment.name());
        let path = dir.join(&file);
        backend.export(segment.mesh(), &path)?;
        manifest.push(SegmentEntry {
            name: segment.name().to_string(),
            file,
            bounding_box: backend.bounding_box(segment.mesh())?,
            depth: segment.depth(),
            sha256: file_checksum(&path)?,
            connectors: segment.connectors().to_vec(),
        });
    }
    manifest.write(dir)?;
    Ok(manifest)
}

/// Outcome of one exported piece
#[derive(Debug, Clone)]
pub struct PieceReport {
    pub kind: PieceKind,
    pub segments: usize,
    /// Leaves left larger than the plate at the depth cap
    pub oversized: Vec<String>,
    pub directory: PathBuf,
    pub elapsed: Duration,
}

/// Generate and export every configured piece into `config.output_dir/<piece>`.
///
/// The scene is cleared before each piece; `on_piece` is called as each
/// one finishes.
pub fn generate_suit(
    backend: &mut dyn MeshBackend,
    config: &GenerationConfig,
    table: &DimensionTable,
    mut on_piece: impl FnMut(&PieceReport),
) -> Result<Vec<PieceReport>> {
    config.validate()?;
    table.validate()?;
    let options = PieceOptions::from(config);
    let mut reports = Vec::with_capacity(config.pieces.len());

    for &kind in &config.pieces {
        let start = Instant::now();
        backend.clear();
        let generator = generator_for(kind);
        let set = generate_piece(backend, generator.as_ref(), table, &options)?;

        let directory = config.output_dir.join(kind.as_str());
        export_segment_set(backend, &set, &directory, kind.as_str(), &options)?;
        let oversized = oversized_segments(backend, &set, &options.build_plate)?
            .into_iter()
            .map(|segment| segment.name().to_string())
            .collect();

        let report = PieceReport {
            kind,
            segments: set.len(),
            oversized,
            directory,
            elapsed: start.elapsed(),
        };
        set.discard(backend)?;
        info!(piece = %kind, segments = report.segments, elapsed = ?report.elapsed, "piece exported");
        on_piece(&report);
        reports.push(report);
    }

    backend.clear();
    Ok(reports)
}

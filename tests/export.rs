// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! STL and manifest output

use anyhow::Result;
use nalgebra::Vector3;
use shardplate::io::{file_checksum, PieceManifest, MANIFEST_FILE};
use shardplate::pipeline::export_segment_set;
use shardplate::{
    generate_suit, split_object_for_plate, BuildPlate, DetailLevel, DimensionTable, GenerationConfig, MeshBackend,
    PieceKind, PieceOptions, Primitive, Scene, SegmentSet,
};
use tempfile::TempDir;

#[test]
fn test_split_object_exports_one_stl_per_leaf() -> Result<()> {
    let dir = TempDir::new()?;
    let mut scene = Scene::new();
    let plate = BuildPlate::cube(256.0);
    let mesh = scene.create_primitive(&Primitive::cube(Vector3::new(300.0, 200.0, 100.0)), "slab")?;
    let mut set = SegmentSet::new();
    set.extend(split_object_for_plate(&mut scene, mesh, &plate, "slab")?)?;

    let options = PieceOptions {
        build_plate: plate,
        ..PieceOptions::default()
    };
    let manifest = export_segment_set(&scene, &set, dir.path(), "slab", &options)?;
    assert_eq!(manifest.segments.len(), 2);

    for entry in &manifest.segments {
        let path = dir.path().join(&entry.file);
        assert!(path.exists(), "{} missing", entry.file);
        assert!(std::fs::metadata(&path)?.len() > 84);
        assert_eq!(entry.sha256, file_checksum(&path)?);
        assert_eq!(entry.connectors.len(), 2);
    }

    let read = PieceManifest::read(&dir.path().join(MANIFEST_FILE))?;
    assert_eq!(read.piece, "slab");
    assert_eq!(read.build_plate, plate);
    assert_eq!(read.segments, manifest.segments);
    Ok(())
}

#[test]
fn test_exported_leaf_reimports_with_same_extents() -> Result<()> {
    let dir = TempDir::new()?;
    let mut scene = Scene::new();
    let mesh = scene.create_primitive(&Primitive::cube(Vector3::new(40.0, 30.0, 20.0)), "brick")?;
    let mut set = SegmentSet::new();
    set.extend(split_object_for_plate(&mut scene, mesh, &BuildPlate::cube(100.0), "brick")?)?;
    let manifest = export_segment_set(&scene, &set, dir.path(), "brick", &PieceOptions::default())?;

    let path = dir.path().join(&manifest.segments[0].file);
    let imported = scene.import_stl(&path, "reimported")?;
    let size = scene.dimensions(&imported)?;
    assert!((size - Vector3::new(40.0, 30.0, 20.0)).norm() < 1e-4);
    Ok(())
}

#[test]
fn test_suit_writes_a_directory_per_piece() -> Result<()> {
    let dir = TempDir::new()?;
    let config = GenerationConfig {
        output_dir: dir.path().to_path_buf(),
        pieces: vec![PieceKind::Vambrace, PieceKind::Sabaton],
        detail_level: DetailLevel::Minimal,
        include_straps: false,
        ..GenerationConfig::default()
    };
    let mut scene = Scene::new();
    let mut seen = Vec::new();
    let reports = generate_suit(&mut scene, &config, &DimensionTable::standard(), |report| {
        seen.push(report.kind)
    })?;

    assert_eq!(seen, vec![PieceKind::Vambrace, PieceKind::Sabaton]);
    assert_eq!(scene.mesh_count(), 0);
    for report in &reports {
        assert!(report.oversized.is_empty());
        let manifest = PieceManifest::read(&report.directory.join(MANIFEST_FILE))?;
        assert_eq!(manifest.segments.len(), report.segments);
        assert_eq!(manifest.detail_level, DetailLevel::Minimal);
        for entry in &manifest.segments {
            assert!(report.directory.join(&entry.file).exists());
        }
    }
    assert!(dir.path().join("sabaton").join("sabaton_toe_3_right.stl").exists());
    Ok(())
}

// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Per-piece segment manifest (`manifest.json`)

use crate::config::{BuildPlate, DetailLevel};
use crate::connectors::Connector;
use crate::error::{ArmorError, Result};
use crate::geometry::BoundingBox;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "manifest.json";

/// One exported segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentEntry {
    pub name: String,
    /// STL file name, relative to the manifest
    pub file: String,
    pub bounding_box: BoundingBox,
    /// Split-lineage depth
    pub depth: usize,
    /// SHA-256 of the STL file
    pub sha256: String,
    pub connectors: Vec<Connector>,
}

/// Segments of one piece in insertion order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieceManifest {
    pub piece: String,
    pub generated_at: String,
    pub build_plate: BuildPlate,
    pub detail_level: DetailLevel,
    pub segments: Vec<SegmentEntry>,
}

impl PieceManifest {
    pub fn new(piece: impl Into<String>, build_plate: BuildPlate, detail_level: DetailLevel) -> Self {
        Self {
            piece: piece.into(),
            generated_at: Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            build_plate,
            detail_level,
            segments: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: SegmentEntry) {
        self.segments.push(entry);
    }

    /// Write `manifest.json` into `dir`
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir).map_err(|e| ArmorError::io(dir, e))?;
        let path = dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json).map_err(|e| ArmorError::io(&path, e))?;
        Ok(path)
    }

    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| ArmorError::io(path, e))?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Hex SHA-256 of a file's contents
pub fn file_checksum(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| ArmorError::io(path, e))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

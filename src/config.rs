// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Generation configuration system

use crate::dimensions::PieceKind;
use crate::error::ArmorError;
use crate::geometry::Axis;
use anyhow::{Context, Result};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default config file looked up by [`GenerationConfig::load`]
pub const CONFIG_FILE: &str = "shardplate.toml";

/// Printer build volume in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuildPlate {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl BuildPlate {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn cube(edge: f64) -> Self {
        Self::new(edge, edge, edge)
    }

    pub fn bound(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn as_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Whether an extent fits on the plate along every axis
    pub fn fits(&self, extents: &Vector3<f64>) -> bool {
        Axis::ALL
            .iter()
            .all(|&axis| extents[axis.index()] <= self.bound(axis))
    }

    pub fn validate(&self) -> crate::Result<()> {
        for axis in Axis::ALL {
            let bound = self.bound(axis);
            if !bound.is_finite() || bound <= 0.0 {
                return Err(ArmorError::InvalidConfig(format!(
                    "build plate {} bound must be positive, got {}",
                    axis, bound
                )));
            }
        }
        Ok(())
    }
}

impl Default for BuildPlate {
    fn default() -> Self {
        Self::cube(256.0)
    }
}

impl fmt::Display for BuildPlate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.x, self.y, self.z)
    }
}

impl FromStr for BuildPlate {
    type Err = ArmorError;

    /// Parse `XxYxZ`, e.g. `256x256x256`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(['x', 'X']).collect();
        let bad = || ArmorError::InvalidConfig(format!("build plate must look like 256x256x256, got '{}'", s));
        if parts.len() != 3 {
            return Err(bad());
        }
        let mut values = [0.0; 3];
        for (value, part) in values.iter_mut().zip(&parts) {
            *value = part.trim().parse::<f64>().map_err(|_| bad())?;
        }
        let plate = Self::new(values[0], values[1], values[2]);
        plate.validate()?;
        Ok(plate)
    }
}

/// Surface detail, 0 (minimal) to 3 (high)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DetailLevel {
    Minimal,
    Basic,
    #[default]
    Standard,
    High,
}

impl DetailLevel {
    pub fn level(self) -> u8 {
        self as u8
    }

    /// Curve resolution for a primitive that uses `full` segments at high detail
    pub fn segments(self, full: u32) -> u32 {
        let scaled = match self {
            DetailLevel::Minimal => full / 4,
            DetailLevel::Basic => full / 2,
            DetailLevel::Standard => full * 3 / 4,
            DetailLevel::High => full,
        };
        scaled.max(8)
    }

    /// Vertex weld tolerance for surface finishing; none at minimal detail
    pub fn weld_tolerance(self) -> Option<f64> {
        match self {
            DetailLevel::Minimal => None,
            DetailLevel::Basic => Some(1e-3),
            DetailLevel::Standard | DetailLevel::High => Some(1e-4),
        }
    }
}

impl TryFrom<u8> for DetailLevel {
    type Error = ArmorError;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(DetailLevel::Minimal),
            1 => Ok(DetailLevel::Basic),
            2 => Ok(DetailLevel::Standard),
            3 => Ok(DetailLevel::High),
            other => Err(ArmorError::InvalidConfig(format!(
                "detail_level must be 0-3, got {}",
                other
            ))),
        }
    }
}

impl From<DetailLevel> for u8 {
    fn from(level: DetailLevel) -> Self {
        level.level()
    }
}

impl fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level())
    }
}

/// Run configuration for a suit generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Suit name, used in reports
    pub name: String,
    /// Root directory; each piece gets its own subdirectory
    pub output_dir: PathBuf,
    /// Pieces to generate, in order
    pub pieces: Vec<PieceKind>,
    /// Re-split segments that do not fit on the build plate
    pub auto_split: bool,
    pub detail_level: DetailLevel,
    /// Emit articulated segments instead of one mesh per piece
    pub segmented: bool,
    pub include_straps: bool,
    /// Dimension table file (JSON or TOML); the standard table when unset
    pub dimensions: Option<PathBuf>,
    pub build_plate: BuildPlate,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            name: "shardplate".to_string(),
            output_dir: PathBuf::from("output"),
            pieces: PieceKind::ALL.to_vec(),
            auto_split: true,
            detail_level: DetailLevel::default(),
            segmented: true,
            include_straps: true,
            dimensions: None,
            build_plate: BuildPlate::default(),
        }
    }
}

impl GenerationConfig {
    /// Load configuration from a TOML or JSON file (by extension)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: GenerationConfig = if is_json(path) {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        };
        Ok(config)
    }

    /// Load `shardplate.toml` when present, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = if Path::new(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `SHARDPLATE_*` overrides from `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(output_dir) = lookup("SHARDPLATE_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(output_dir);
        }

        if let Some(detail) = lookup("SHARDPLATE_DETAIL") {
            let level: u8 = detail
                .parse()
                .with_context(|| format!("SHARDPLATE_DETAIL is not a number: {:?}", detail))?;
            self.detail_level = DetailLevel::try_from(level)?;
        }

        if let Some(auto_split) = lookup("SHARDPLATE_AUTO_SPLIT") {
            self.auto_split = auto_split
                .parse::<bool>()
                .with_context(|| format!("SHARDPLATE_AUTO_SPLIT must be true or false: {:?}", auto_split))?;
        }

        if let Some(plate) = lookup("SHARDPLATE_PLATE") {
            self.build_plate = plate.parse()?;
        }

        Ok(())
    }

    /// Save configuration to a TOML or JSON file (by extension)
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_json(path) {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        } else {
            toml::to_string_pretty(self).context("Failed to serialize config")?
        };
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;
        Ok(())
    }

    pub fn validate(&self) -> crate::Result<()> {
        self.build_plate.validate()?;
        if self.pieces.is_empty() {
            return Err(ArmorError::InvalidConfig("no pieces selected".to_string()));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(ArmorError::InvalidConfig("output_dir is empty".to_string()));
        }
        Ok(())
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_toml_round_trip() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("suit.toml");
        let mut config = GenerationConfig::default();
        config.pieces = vec![PieceKind::Helmet, PieceKind::Cuisse];
        config.detail_level = DetailLevel::Basic;
        config.build_plate = BuildPlate::new(220.0, 220.0, 250.0);

        config.save(&path)?;
        let loaded = GenerationConfig::from_file(&path)?;
        assert_eq!(loaded, config);
        Ok(())
    }

    #[test]
    fn test_json_is_chosen_by_extension() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("suit.json");
        std::fs::write(&path, r#"{ "auto_split": false, "detail_level": 1 }"#)?;
        let loaded = GenerationConfig::from_file(&path)?;
        assert!(!loaded.auto_split);
        assert_eq!(loaded.detail_level, DetailLevel::Basic);
        assert_eq!(loaded.build_plate, BuildPlate::default());
        Ok(())
    }

    #[test]
    fn test_detail_above_three_rejected() {
        let parsed: std::result::Result<GenerationConfig, _> = toml::from_str("detail_level = 4");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_non_positive_plate_rejected() {
        let mut config = GenerationConfig::default();
        config.build_plate.y = 0.0;
        assert!(matches!(config.validate(), Err(ArmorError::InvalidConfig(_))));
        assert!("256x-1x256".parse::<BuildPlate>().is_err());
    }

    #[test]
    fn test_environment_overrides() -> Result<()> {
        let mut config = GenerationConfig::default();
        config.apply_overrides(|key| match key {
            "SHARDPLATE_DETAIL" => Some("0".to_string()),
            "SHARDPLATE_PLATE" => Some("180x180x180".to_string()),
            "SHARDPLATE_AUTO_SPLIT" => Some("false".to_string()),
            _ => None,
        })?;
        assert_eq!(config.detail_level, DetailLevel::Minimal);
        assert_eq!(config.build_plate, BuildPlate::cube(180.0));
        assert!(!config.auto_split);
        Ok(())
    }

    #[test]
    fn test_malformed_environment_override_rejected() {
        let mut config = GenerationConfig::default();
        let result = config.apply_overrides(|key| match key {
            "SHARDPLATE_AUTO_SPLIT" => Some("yes".to_string()),
            _ => None,
        });
        assert!(result.is_err());
        assert!(config.auto_split);

        let result = config.apply_overrides(|key| match key {
            "SHARDPLATE_DETAIL" => Some("high".to_string()),
            _ => None,
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_detail_segments_never_below_eight() {
        assert_eq!(DetailLevel::Minimal.segments(16), 8);
        assert_eq!(DetailLevel::High.segments(48), 48);
    }
}

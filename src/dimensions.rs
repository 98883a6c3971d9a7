// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Per-piece dimension tables (millimetres)

use crate::error::{ArmorError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Armor piece kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PieceKind {
    Helmet,
    Chest,
    Pauldron,
    Gauntlet,
    Vambrace,
    Cuisse,
    Greave,
    Sabaton,
}

impl PieceKind {
    pub const ALL: [PieceKind; 8] = [
        PieceKind::Helmet,
        PieceKind::Chest,
        PieceKind::Pauldron,
        PieceKind::Gauntlet,
        PieceKind::Vambrace,
        PieceKind::Cuisse,
        PieceKind::Greave,
        PieceKind::Sabaton,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PieceKind::Helmet => "helmet",
            PieceKind::Chest => "chest",
            PieceKind::Pauldron => "pauldron",
            PieceKind::Gauntlet => "gauntlet",
            PieceKind::Vambrace => "vambrace",
            PieceKind::Cuisse => "cuisse",
            PieceKind::Greave => "greave",
            PieceKind::Sabaton => "sabaton",
        }
    }

    /// Keys a dimension table must provide for this piece
    pub fn required_dimensions(self) -> &'static [&'static str] {
        match self {
            PieceKind::Helmet => &["inner_width", "inner_length", "inner_height", "visor_width", "visor_height"],
            PieceKind::Chest => &["width", "height", "depth"],
            PieceKind::Pauldron => &["width", "height", "depth"],
            PieceKind::Gauntlet => &["hand_length", "hand_width", "wrist_circumference"],
            PieceKind::Vambrace | PieceKind::Cuisse | PieceKind::Greave => {
                &["length", "upper_circumference", "lower_circumference"]
            }
            PieceKind::Sabaton => &["length", "width", "ankle_circumference"],
        }
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PieceKind {
    type Err = ArmorError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        let singular = wanted.strip_suffix('s').unwrap_or(wanted.as_str());
        PieceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted || kind.as_str() == singular)
            .ok_or_else(|| ArmorError::InvalidInput(format!("unknown armor piece '{}'", s)))
    }
}

/// Flat mapping of dimension names to millimetre values for one piece
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PieceDimensions(BTreeMap<String, f64>);

impl PieceDimensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: f64) -> Self {
        self.0.insert(key.to_string(), value);
        self
    }

    pub fn insert(&mut self, key: &str, value: f64) {
        self.0.insert(key.to_string(), value);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Raw lookup; `None` when the key is absent
    pub fn value(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }
}

/// Dimension lookup bound to one piece, for error reporting
#[derive(Debug, Clone, Copy)]
pub struct Measurements<'a> {
    pub kind: PieceKind,
    pub values: &'a PieceDimensions,
    /// Armor plate thickness
    pub thickness: f64,
}

impl Measurements<'_> {
    pub fn get(&self, key: &str) -> Result<f64> {
        self.values.value(key).ok_or_else(|| ArmorError::MissingDimension {
            piece: self.kind.to_string(),
            key: key.to_string(),
        })
    }
}

/// Dimension tables for every piece of a suit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionTable {
    /// Plate thickness shared by all pieces
    #[serde(default = "default_thickness")]
    pub plate_thickness: f64,
    pub pieces: BTreeMap<PieceKind, PieceDimensions>,
}

fn default_thickness() -> f64 {
    4.0
}

impl DimensionTable {
    /// Average adult, with 20 mm comfort clearance already included
    pub fn standard() -> Self {
        let mut pieces = BTreeMap::new();
        pieces.insert(
            PieceKind::Helmet,
            PieceDimensions::new()
                .with("inner_width", 180.0)
                .with("inner_length", 220.0)
                .with("inner_height", 260.0)
                .with("visor_width", 128.0)
                .with("visor_height", 15.0),
        );
        pieces.insert(
            PieceKind::Chest,
            PieceDimensions::new()
                .with("width", 520.0)
                .with("height", 520.0)
                .with("depth", 338.0),
        );
        pieces.insert(
            PieceKind::Pauldron,
            PieceDimensions::new()
                .with("width", 220.0)
                .with("height", 120.0)
                .with("depth", 180.0),
        );
        pieces.insert(
            PieceKind::Gauntlet,
            PieceDimensions::new()
                .with("hand_length", 210.0)
                .with("hand_width", 110.0)
                .with("wrist_circumference", 190.0),
        );
        pieces.insert(
            PieceKind::Vambrace,
            PieceDimensions::new()
                .with("length", 280.0)
                .with("upper_circumference", 300.0)
                .with("lower_circumference", 190.0),
        );
        pieces.insert(
            PieceKind::Cuisse,
            PieceDimensions::new()
                .with("length", 470.0)
                .with("upper_circumference", 600.0)
                .with("lower_circumference", 420.0),
        );
        pieces.insert(
            PieceKind::Greave,
            PieceDimensions::new()
                .with("length", 420.0)
                .with("upper_circumference", 420.0)
                .with("lower_circumference", 260.0),
        );
        pieces.insert(
            PieceKind::Sabaton,
            PieceDimensions::new()
                .with("length", 290.0)
                .with("width", 120.0)
                .with("ankle_circumference", 260.0),
        );
        Self {
            plate_thickness: default_thickness(),
            pieces,
        }
    }

    /// Load a table from JSON or TOML (by extension) and validate it
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dimension table: {:?}", path))?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let table: DimensionTable = if is_json {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse dimension table: {:?}", path))?
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse dimension table: {:?}", path))?
        };
        table
            .validate()
            .with_context(|| format!("Invalid dimension table: {:?}", path))?;
        Ok(table)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validated measurements for `kind`
    pub fn measurements(&self, kind: PieceKind) -> Result<Measurements<'_>> {
        let values = self.pieces.get(&kind).ok_or_else(|| ArmorError::MissingDimension {
            piece: kind.to_string(),
            key: "*".to_string(),
        })?;
        self.validate_piece(kind, values)?;
        Ok(Measurements {
            kind,
            values,
            thickness: self.plate_thickness,
        })
    }

    /// Check every table present: required keys exist, all values finite and positive
    pub fn validate(&self) -> Result<()> {
        if !self.plate_thickness.is_finite() || self.plate_thickness <= 0.0 {
            return Err(ArmorError::invalid_dimension(
                "suit",
                "plate_thickness",
                format!("must be positive, got {}", self.plate_thickness),
            ));
        }
        for (&kind, values) in &self.pieces {
            self.validate_piece(kind, values)?;
        }
        Ok(())
    }

    fn validate_piece(&self, kind: PieceKind, values: &PieceDimensions) -> Result<()> {
        for key in kind.required_dimensions() {
            if !values.contains(key) {
                return Err(ArmorError::MissingDimension {
                    piece: kind.to_string(),
                    key: key.to_string(),
                });
            }
        }
        for (key, value) in values.iter() {
            if !value.is_finite() || value <= 0.0 {
                return Err(ArmorError::invalid_dimension(
                    kind.as_str(),
                    key,
                    format!("must be a positive length, got {}", value),
                ));
            }
        }
        Ok(())
    }
}

impl Default for DimensionTable {
    fn default() -> Self {
        Self::standard()
    }
}

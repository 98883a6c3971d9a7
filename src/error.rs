// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error taxonomy for armor generation

use crate::geometry::BooleanOp;
use std::path::PathBuf;
use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, ArmorError>;

/// Errors raised while generating, splitting or exporting armor
#[derive(Debug, Error)]
pub enum ArmorError {
    /// A host-backed [`MeshBackend`](crate::backend::MeshBackend) could not be
    /// initialised. The in-process [`Scene`](crate::backend::Scene) starts
    /// infallibly and never returns this.
    #[error("mesh backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A handle referred to a mesh the backend no longer holds.
    #[error("mesh {id} has been consumed or removed")]
    ConsumedHandle { id: u64 },

    /// The backend failed to evaluate a boolean.
    #[error("boolean {op} failed: {reason}")]
    Boolean { op: BooleanOp, reason: String },

    #[error("invalid dimension '{key}' for {piece}: {reason}")]
    InvalidDimensions {
        piece: String,
        key: String,
        reason: String,
    },

    #[error("missing dimension '{key}' for {piece}")]
    MissingDimension { piece: String, key: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Two segments of one piece would share an output name.
    #[error("segment '{name}' already exists")]
    DuplicateSegment { name: String },

    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ArmorError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_dimension(piece: impl Into<String>, key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            piece: piece.into(),
            key: key.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for ArmorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for ArmorError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for ArmorError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_unavailable_names_the_cause() {
        let err = ArmorError::BackendUnavailable("no modeling host on PATH".to_string());
        assert_eq!(err.to_string(), "mesh backend unavailable: no modeling host on PATH");
    }
}

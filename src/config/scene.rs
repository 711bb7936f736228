// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Visualization scene configuration

use super::loader::load_dict;
use crate::error::ConfigError;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Segments per full turn for the default and the fine mesh
pub const COARSE_SEGMENTS: u32 = 32;
pub const FINE_SEGMENTS: u32 = 100;

/// A clipping plane; geometry on the side the normal points to is removed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipPlane {
    pub origin: [f64; 3],
    pub normal: [f64; 3],
    #[serde(default)]
    pub close_cuts: bool,
}

impl ClipPlane {
    pub fn new(origin: [f64; 3], normal: [f64; 3]) -> Self {
        Self {
            origin,
            normal,
            close_cuts: false,
        }
    }

    /// True when the point survives the cut
    pub fn keeps(&self, point: &Point3<f64>) -> bool {
        let origin = Point3::from(self.origin);
        let normal = Vector3::from(self.normal);
        (point - origin).dot(&normal) <= 0.0
    }
}

/// Scene options for the geometry viewer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisScene {
    /// Tessellate curved solids with more segments
    pub fine_mesh: bool,
    /// Clipping planes applied before export
    pub clipper: Vec<ClipPlane>,
    /// Color overrides by logical volume name (RGBA, 0..1)
    pub colors: BTreeMap<String, [f32; 4]>,
    /// Viewer program launched on the exported scene
    pub viewer: Option<String>,
    /// Output path of the exported scene
    pub output: Option<PathBuf>,
}

impl VisScene {
    /// Load a scene file (YAML, JSON or TOML)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let value = load_dict(path)?;
        serde_json::from_value(value).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Apply environment variable overrides
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(viewer) = std::env::var("HADES_VIEWER") {
            if !viewer.trim().is_empty() {
                self.viewer = Some(viewer);
            }
        }
        self
    }

    /// Add the standard x = 0 cut
    pub fn add_default_clipper(&mut self) {
        self.clipper.push(ClipPlane::new([0.0, 0.0, 0.0], [1.0, 0.0, 0.0]));
    }

    pub fn segments(&self) -> u32 {
        if self.fine_mesh {
            FINE_SEGMENTS
        } else {
            COARSE_SEGMENTS
        }
    }

    /// True when the point survives every clipping plane
    pub fn keeps(&self, point: &Point3<f64>) -> bool {
        self.clipper.iter().all(|plane| plane.keeps(point))
    }
}

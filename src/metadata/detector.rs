// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Typed HPGe diode records

use crate::error::MetadataError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Value with optional uncertainty, as stored in the metadata
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measured {
    pub val: f64,
    #[serde(default)]
    pub unc: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Production {
    /// 76Ge fraction
    #[serde(default)]
    pub enrichment: Option<Measured>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Borehole {
    pub radius_in_mm: f64,
    pub depth_in_mm: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrooveRadius {
    pub outer: f64,
    pub inner: f64,
}

/// Annular groove on the bottom face around the p+ contact
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Groove {
    pub depth_in_mm: f64,
    pub radius_in_mm: GrooveRadius,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaperSpec {
    pub angle_in_deg: f64,
    pub height_in_mm: f64,
}

impl TaperSpec {
    /// Radial cut of the taper
    pub fn radial_cut(&self) -> f64 {
        self.height_in_mm * self.angle_in_deg.to_radians().tan()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Taper {
    #[serde(default)]
    pub top: Option<TaperSpec>,
    #[serde(default)]
    pub bottom: Option<TaperSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiodeGeometry {
    pub height_in_mm: f64,
    pub radius_in_mm: f64,
    #[serde(default)]
    pub borehole: Option<Borehole>,
    #[serde(default)]
    pub groove: Option<Groove>,
    #[serde(default)]
    pub taper: Taper,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WrapDimensions {
    pub outer_height_in_mm: f64,
    pub outer_radius_in_mm: f64,
    pub inner_radius_in_mm: f64,
    pub top_thickness_in_mm: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HolderDimensions {
    pub inner_radius_in_mm: f64,
    pub outer_radius_in_mm: f64,
    pub height_in_mm: f64,
    pub bottom_thickness_in_mm: f64,
}

/// How the diode is mounted in the HADES cryostat
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HadesMounting {
    pub wrap: WrapDimensions,
    pub holder: HolderDimensions,
}

impl HadesMounting {
    /// Default mounting for a diode without a HADES record
    pub fn derived(geometry: &DiodeGeometry) -> Self {
        let wrap = WrapDimensions {
            inner_radius_in_mm: geometry.radius_in_mm + 0.5,
            outer_radius_in_mm: geometry.radius_in_mm + 1.0,
            top_thickness_in_mm: 0.5,
            outer_height_in_mm: geometry.height_in_mm + 0.5,
        };
        let holder = HolderDimensions {
            inner_radius_in_mm: wrap.outer_radius_in_mm + 0.5,
            outer_radius_in_mm: wrap.outer_radius_in_mm + 3.5,
            bottom_thickness_in_mm: 2.0,
            height_in_mm: geometry.height_in_mm / 2.0 + 2.0,
        };
        Self { wrap, holder }
    }

    /// GDML constant overrides for component models
    pub fn replacements(&self) -> BTreeMap<String, f64> {
        let w = &self.wrap;
        let h = &self.holder;
        [
            ("wrap_outer_height_in_mm", w.outer_height_in_mm),
            ("wrap_outer_radius_in_mm", w.outer_radius_in_mm),
            ("wrap_inner_radius_in_mm", w.inner_radius_in_mm),
            ("wrap_top_thickness_in_mm", w.top_thickness_in_mm),
            ("holder_inner_radius_in_mm", h.inner_radius_in_mm),
            ("holder_outer_radius_in_mm", h.outer_radius_in_mm),
            ("holder_height_in_mm", h.height_in_mm),
            ("holder_bottom_thickness_in_mm", h.bottom_thickness_in_mm),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }
}

/// Diode record with the HADES mounting merged in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiodeMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub production: Production,
    pub geometry: DiodeGeometry,
    #[serde(default)]
    pub hades: Option<HadesMounting>,
}

impl DiodeMetadata {
    /// Type a raw record
    pub fn from_value(value: &Value, origin: &str) -> Result<Self, MetadataError> {
        serde_json::from_value(value.clone()).map_err(|e| MetadataError::Malformed {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }

    pub fn enrichment(&self) -> Option<f64> {
        self.production.enrichment.map(|e| e.val)
    }

    /// Mounting from the HADES record, or derived from the diode size
    pub fn mounting(&self) -> HadesMounting {
        self.hades
            .unwrap_or_else(|| HadesMounting::derived(&self.geometry))
    }
}

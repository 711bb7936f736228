// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Built-in public test data
//!
//! Diode records are synthesized from the first letter of the detector name
//! and all detectors share one bundled run table. Geometries built from
//! this data are for testing only and do not describe real detectors.

use super::detector::{
    Borehole, DiodeGeometry, DiodeMetadata, Groove, GrooveRadius, Measured, Production, Taper,
    TaperSpec,
};
use super::source_position::RunRecord;
use super::{parse_runs, MetadataSource};
use crate::config::{parse_dict, DocumentFormat, DEFAULT_CAMPAIGN};
use crate::error::MetadataError;
use serde_json::Value;

const PUBLIC_RUNS: &str = include_str!("public_runs.yaml");
const PUBLIC_ENRICHMENT: f64 = 0.88;

/// Public stand-in for the metadata tree
#[derive(Debug, Clone)]
pub struct PublicMetadata {
    runs: Value,
}

impl PublicMetadata {
    pub fn new() -> Result<Self, MetadataError> {
        let runs = parse_dict(PUBLIC_RUNS, DocumentFormat::Yaml).map_err(|message| {
            MetadataError::Malformed {
                path: "public_runs.yaml".into(),
                message,
            }
        })?;
        Ok(Self { runs })
    }

    /// Measurements available in the bundled run table
    pub fn measurements(&self) -> Vec<String> {
        self.runs
            .as_object()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }
}

fn groove(depth: f64, inner: f64, outer: f64) -> Option<Groove> {
    Some(Groove {
        depth_in_mm: depth,
        radius_in_mm: GrooveRadius { outer, inner },
    })
}

fn synthesize(hpge: &str) -> Option<DiodeMetadata> {
    let enriched = Production {
        enrichment: Some(Measured {
            val: PUBLIC_ENRICHMENT,
            unc: None,
        }),
    };
    let (kind, production, geometry) = match hpge.chars().next()? {
        'B' => (
            "bege",
            enriched,
            DiodeGeometry {
                height_in_mm: 30.0,
                radius_in_mm: 37.5,
                borehole: None,
                groove: groove(2.0, 7.5, 10.5),
                taper: Taper::default(),
            },
        ),
        'V' => (
            "icpc",
            enriched,
            DiodeGeometry {
                height_in_mm: 80.0,
                radius_in_mm: 40.0,
                borehole: Some(Borehole {
                    radius_in_mm: 5.0,
                    depth_in_mm: 50.0,
                }),
                groove: groove(2.0, 10.0, 13.0),
                taper: Taper {
                    top: Some(TaperSpec {
                        angle_in_deg: 45.0,
                        height_in_mm: 3.0,
                    }),
                    bottom: None,
                },
            },
        ),
        'P' => (
            "ppc",
            enriched,
            DiodeGeometry {
                height_in_mm: 50.0,
                radius_in_mm: 35.0,
                borehole: None,
                groove: groove(2.0, 2.5, 4.5),
                taper: Taper::default(),
            },
        ),
        'C' => (
            "coax",
            Production::default(),
            DiodeGeometry {
                height_in_mm: 70.0,
                radius_in_mm: 38.0,
                borehole: Some(Borehole {
                    radius_in_mm: 6.0,
                    depth_in_mm: 70.0,
                }),
                groove: None,
                taper: Taper::default(),
            },
        ),
        _ => return None,
    };

    Some(DiodeMetadata {
        name: hpge.to_string(),
        kind: kind.to_string(),
        production,
        geometry,
        hades: None,
    })
}

impl MetadataSource for PublicMetadata {
    fn describe(&self) -> String {
        "public test data".to_string()
    }

    fn is_public(&self) -> bool {
        true
    }

    fn diode(&self, hpge: &str) -> Result<DiodeMetadata, MetadataError> {
        synthesize(hpge).ok_or_else(|| MetadataError::DetectorNotFound(hpge.to_string()))
    }

    fn measurement_runs(
        &self,
        hpge: &str,
        campaign: &str,
        measurement: &str,
    ) -> Result<Vec<RunRecord>, MetadataError> {
        let not_found = || MetadataError::MeasurementNotFound {
            hpge: hpge.to_string(),
            campaign: campaign.to_string(),
            measurement: measurement.to_string(),
        };
        if campaign != DEFAULT_CAMPAIGN || synthesize(hpge).is_none() {
            return Err(not_found());
        }
        let node = self.runs.get(measurement).ok_or_else(not_found)?;
        parse_runs(node, measurement)
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Calibration source capsules and their placement

use super::dimensions::{
    CRYOSTAT_RADIUS, LATERAL_CLEARANCE, LATERAL_HOLDER_SIZE, SOURCE_HOLDER_TOP_PLATE_HEIGHT,
};
use crate::error::GeometryError;
use crate::geometry::Placement;
use nalgebra::Rotation3;
use std::f64::consts::FRAC_PI_2;

/// Encapsulation of one calibration source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapsuleSpec {
    pub source: &'static str,
    pub material: &'static str,
    pub radius: f64,
    pub height: f64,
    pub active_material: &'static str,
    pub active_radius: f64,
    pub active_height: f64,
}

/// Distance between the active region and the capsule face
const ACTIVE_DEPTH: f64 = 0.5;

const CAPSULES: [CapsuleSpec; 5] = [
    CapsuleSpec {
        source: "am_HS1",
        material: "G4_Al",
        radius: 12.5,
        height: 3.0,
        active_material: "G4_KAPTON",
        active_radius: 1.0,
        active_height: 0.2,
    },
    CapsuleSpec {
        source: "th_HS2",
        material: "G4_STAINLESS-STEEL",
        radius: 12.7,
        height: 3.2,
        active_material: "G4_SILICON_DIOXIDE",
        active_radius: 2.5,
        active_height: 0.5,
    },
    CapsuleSpec {
        source: "ba_HS4",
        material: "G4_PLEXIGLASS",
        radius: 12.5,
        height: 6.0,
        active_material: "G4_KAPTON",
        active_radius: 2.5,
        active_height: 1.0,
    },
    CapsuleSpec {
        source: "co_HS5",
        material: "G4_PLEXIGLASS",
        radius: 12.5,
        height: 6.0,
        active_material: "G4_KAPTON",
        active_radius: 2.5,
        active_height: 1.0,
    },
    CapsuleSpec {
        source: "am_HS6",
        material: "G4_Cu",
        radius: 10.0,
        height: 10.0,
        active_material: "G4_KAPTON",
        active_radius: 1.0,
        active_height: 0.5,
    },
];

impl CapsuleSpec {
    pub fn for_source(source: &str) -> Result<&'static CapsuleSpec, GeometryError> {
        CAPSULES
            .iter()
            .find(|c| c.source == source)
            .ok_or_else(|| GeometryError::UnknownSource(source.to_string()))
    }

    /// Active region center in the capsule frame; the active side faces -z
    pub fn active_z(&self) -> f64 {
        -self.height / 2.0 + ACTIVE_DEPTH + self.active_height / 2.0
    }
}

/// Where the source sits relative to the cryostat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceSide {
    Top,
    Lateral,
}

impl SourceSide {
    pub fn from_measurement(position: &str) -> Result<Self, GeometryError> {
        match position {
            "top" => Ok(SourceSide::Top),
            "lat" | "side" => Ok(SourceSide::Lateral),
            "bottom" => Err(GeometryError::InvalidParameter(
                "bottom source positions are not supported".into(),
            )),
            other => Err(GeometryError::InvalidParameter(format!(
                "unknown source position `{}`",
                other
            ))),
        }
    }
}

/// World placements of the capsule and its holder
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceLayout {
    pub side: SourceSide,
    pub capsule: Placement,
    pub holder: Placement,
}

/// Lay out a source from its detector-frame position.
///
/// Top sources hang `z` above the cryostat, on a plate whose top face is
/// at `z`. Lateral sources face the cryostat wall at `z` below its top,
/// `hypot(x, y)` further out than the standard clearance.
pub fn source_layout(
    spec: &CapsuleSpec,
    side: SourceSide,
    frame_position: [f64; 3],
    phi_in_deg: f64,
) -> Result<SourceLayout, GeometryError> {
    let [x, y, z] = frame_position;
    match side {
        SourceSide::Top => {
            if z < SOURCE_HOLDER_TOP_PLATE_HEIGHT {
                return Err(GeometryError::InvalidParameter(format!(
                    "top source at z = {} mm leaves no room for the {} mm holder plate",
                    z, SOURCE_HOLDER_TOP_PLATE_HEIGHT
                )));
            }
            Ok(SourceLayout {
                side,
                capsule: Placement::at(x, y, z + spec.height / 2.0),
                holder: Placement::at(0.0, 0.0, z - SOURCE_HOLDER_TOP_PLATE_HEIGHT / 2.0),
            })
        }
        SourceSide::Lateral => {
            let r = x.hypot(y);
            let alpha = if r > 0.0 {
                y.atan2(x)
            } else {
                -phi_in_deg.to_radians()
            };
            let (sin, cos) = alpha.sin_cos();

            let capsule_distance = CRYOSTAT_RADIUS + LATERAL_CLEARANCE + r + spec.height / 2.0;
            let holder_distance = capsule_distance + spec.height / 2.0 + LATERAL_HOLDER_SIZE[0] / 2.0;

            // capsule axis pointing radially, active face towards the cryostat
            let capsule = Placement::at(capsule_distance * cos, capsule_distance * sin, -z)
                .with_active_rotation(Rotation3::from_euler_angles(0.0, FRAC_PI_2, alpha));
            let holder = Placement::at(holder_distance * cos, holder_distance * sin, -z)
                .with_active_rotation(Rotation3::from_euler_angles(0.0, 0.0, alpha));
            Ok(SourceLayout {
                side,
                capsule,
                holder,
            })
        }
    }
}

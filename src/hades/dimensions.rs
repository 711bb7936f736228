// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Fixed dimensions of the HADES test stand, in mm
//!
//! World frame: z points up and the outer top face of the cryostat is at
//! z = 0. The cryostat axis is the z axis.

use crate::error::ConfigError;

pub const WORLD_SIZE: f64 = 10_000.0;

pub const CRYOSTAT_RADIUS: f64 = 65.0;
pub const CRYOSTAT_HEIGHT: f64 = 210.0;
pub const CRYOSTAT_WALL: f64 = 1.5;
pub const CRYOSTAT_TOP_THICKNESS: f64 = 1.5;
pub const CRYOSTAT_BOTTOM_THICKNESS: f64 = 3.0;
pub const CRYOSTAT_CENTER_Z: f64 = -CRYOSTAT_HEIGHT / 2.0;

pub const CAVITY_RADIUS: f64 = CRYOSTAT_RADIUS - CRYOSTAT_WALL;
pub const CAVITY_HEIGHT: f64 = CRYOSTAT_HEIGHT - CRYOSTAT_TOP_THICKNESS - CRYOSTAT_BOTTOM_THICKNESS;
pub const CAVITY_CENTER_Z: f64 = -CRYOSTAT_TOP_THICKNESS - CAVITY_HEIGHT / 2.0;

/// Gap between the inner top face of the cryostat and the wrap
pub const DETECTOR_TOP_GAP: f64 = 5.0;
/// Outer top face of the wrap
pub const WRAP_TOP_Z: f64 = -CRYOSTAT_TOP_THICKNESS - DETECTOR_TOP_GAP;

pub const BOTTOM_PLATE_RADIUS: f64 = 90.0;
pub const BOTTOM_PLATE_HEIGHT: f64 = 10.0;
pub const BOTTOM_PLATE_CENTER_Z: f64 = -CRYOSTAT_HEIGHT - BOTTOM_PLATE_HEIGHT / 2.0;

pub const SOURCE_HOLDER_TOP_PLATE_HEIGHT: f64 = 3.0;
pub const SOURCE_HOLDER_TOP_PLATE_RADIUS: f64 = 100.0;
/// Plexiglass bar behind laterally placed sources: radial, tangential, vertical
pub const LATERAL_HOLDER_SIZE: [f64; 3] = [5.0, 40.0, 60.0];
/// Distance between the cryostat wall and a lateral source at r = 0
pub const LATERAL_CLEARANCE: f64 = 2.0;

/// Lead castle of one of the two measurement tables
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CastleTable {
    pub number: u8,
    /// Outer box, full lengths
    pub outer: [f64; 3],
    /// Inner cavity, full lengths
    pub inner: [f64; 3],
    /// Lead thickness below the cavity
    pub base: f64,
    /// Copper plate lying on the cavity floor
    pub copper_plate: Option<[f64; 3]>,
}

pub const TABLE_1: CastleTable = CastleTable {
    number: 1,
    outer: [500.0, 500.0, 660.0],
    inner: [300.0, 300.0, 460.0],
    base: 100.0,
    copper_plate: None,
};

pub const TABLE_2: CastleTable = CastleTable {
    number: 2,
    outer: [520.0, 520.0, 670.0],
    inner: [320.0, 320.0, 470.0],
    base: 100.0,
    copper_plate: Some([300.0, 300.0, 10.0]),
};

impl CastleTable {
    /// Table wired to a FlashCam card interface; no interface means table 1
    pub fn from_card_interface(card_interface: Option<&str>) -> Result<&'static CastleTable, ConfigError> {
        match card_interface.map(str::trim) {
            None | Some("") | Some("efb1") => Ok(&TABLE_1),
            Some("efb2") => Ok(&TABLE_2),
            Some(other) => Err(ConfigError::InvalidField {
                field: "daq_settings",
                message: format!(
                    "unknown flashcam card interface `{}` (expected efb1 or efb2)",
                    other
                ),
            }),
        }
    }

    fn copper_height(&self) -> f64 {
        self.copper_plate.map(|p| p[2]).unwrap_or(0.0)
    }

    /// z of the cavity floor; the bottom plate (and copper plate) rest on it
    pub fn floor_z(&self) -> f64 {
        -(CRYOSTAT_HEIGHT + BOTTOM_PLATE_HEIGHT + self.copper_height())
    }

    pub fn center_z(&self) -> f64 {
        self.floor_z() + self.outer[2] / 2.0 - self.base
    }

    /// Cavity center relative to the castle center
    pub fn cavity_offset_z(&self) -> f64 {
        self.floor_z() + self.inner[2] / 2.0 - self.center_z()
    }

    /// World-frame bounds of the cavity as (min, max)
    pub fn cavity_bounds(&self) -> ([f64; 3], [f64; 3]) {
        let floor = self.floor_z();
        (
            [-self.inner[0] / 2.0, -self.inner[1] / 2.0, floor],
            [self.inner[0] / 2.0, self.inner[1] / 2.0, floor + self.inner[2]],
        )
    }

    pub fn copper_plate_center_z(&self) -> f64 {
        self.floor_z() + self.copper_height() / 2.0
    }
}

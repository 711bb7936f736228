// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI subsystem for hades-geom

pub mod reporter;
pub mod viewer;

pub use reporter::Reporter;
pub use viewer::{export_scene, ExportResult, Viewer, DEFAULT_SCENE_FILE};

use crate::geometry::Registry;

/// Logical volume holding the detector, whose daughters get profiled.
///
/// Falls back to the world when the detector is not part of the build.
pub fn profile_mother<'a>(registry: &'a Registry, hpge: &str) -> Option<&'a str> {
    registry
        .physical_volume(hpge)
        .map(|pv| pv.mother.as_str())
        .or_else(|| registry.world())
}

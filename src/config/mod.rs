// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Configuration loading: measurement records and visualization scenes

mod loader;
mod measurement;
mod record;
mod scene;

pub use loader::{load_dict, parse_dict, DocumentFormat};
pub use measurement::{parse_measurement, MeasurementInfo};
pub use record::{DaqSettings, GeometryConfig, RunId, SourcePosition, DEFAULT_CAMPAIGN};
pub use scene::{ClipPlane, VisScene, COARSE_SEGMENTS, FINE_SEGMENTS};

// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! HADES test stand: fixed dimensions, components and their assembly

pub mod assembly;
mod construct;
pub mod dimensions;
mod hpge;
mod source;
mod volumes;

pub use assembly::Assembly;
pub use construct::{build_registry, construct};
pub use dimensions::{CastleTable, TABLE_1, TABLE_2};
pub use hpge::{detector_profile, DetectorType};
pub use source::{source_layout, CapsuleSpec, SourceLayout, SourceSide};

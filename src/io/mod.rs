// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! I/O module - GDML reading and writing, viewer export and plots

pub mod expression;
mod export_gltf;
pub mod gdml;
mod plot;

pub use export_gltf::export as export_gltf;
pub use gdml::{
    parse_gdml, parse_gdml_with_replacements, read_gdml, read_gdml_with_replacements, write_gdml,
};
pub use plot::{plot_profiles, render_profiles};

// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! HADES geometry builder
//!
//! Builds the geometry of the HADES HPGe test stand from a measurement
//! configuration and detector metadata, and writes it as GDML for
//! Geant4-based simulations. Also provides overlap and sanity checks,
//! profile plots and viewer export.

pub mod cli;
pub mod config;
pub mod error;
pub mod geometry;
pub mod hades;
pub mod io;
pub mod metadata;
pub mod utils;

pub use config::{GeometryConfig, VisScene};
pub use error::{Error, Result};
pub use geometry::Registry;
pub use hades::{construct, Assembly};
pub use io::{read_gdml, write_gdml};
pub use metadata::{open_metadata, MetadataSource};

use std::path::Path;

/// Load a configuration file and build its geometry.
///
/// Metadata comes from `metadata_root`, `$HADES_METADATA` or, with
/// `public`, the bundled public data.
pub fn construct_from_file(
    config: impl AsRef<Path>,
    metadata_root: Option<&Path>,
    public: bool,
) -> Result<Registry> {
    let config = GeometryConfig::from_file(config)?;
    let source = open_metadata(metadata_root, public)?;
    construct(&config, source.as_ref())
}

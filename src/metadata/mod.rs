// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Detector and measurement metadata

pub mod detector;
mod hardware;
mod merge;
mod public;
mod resolve;
pub mod source_position;
mod textdb;

pub use detector::{DiodeMetadata, HadesMounting};
pub use hardware::HardwareMetadata;
pub use merge::{deep_merge, merge_configs};
pub use public::PublicMetadata;
pub use resolve::{resolve_setup, ResolvedSetup};
pub use source_position::{check_source_position, translate_to_detector_frame, RunRecord};
pub use textdb::TextDb;

use crate::config::{RunId, SourcePosition};
use crate::error::{ConfigError, MetadataError, Result};
use serde_json::Value;
use std::path::Path;

/// Environment variable naming the metadata root
pub const METADATA_ENV: &str = "HADES_METADATA";

/// Read access to detector and measurement records
pub trait MetadataSource {
    /// Human-readable origin, for log messages
    fn describe(&self) -> String;

    /// Diode record, with the HADES mounting merged in when available
    fn diode(&self, hpge: &str) -> std::result::Result<DiodeMetadata, MetadataError>;

    /// All runs of a measurement, sorted by run number
    fn measurement_runs(
        &self,
        hpge: &str,
        campaign: &str,
        measurement: &str,
    ) -> std::result::Result<Vec<RunRecord>, MetadataError>;

    fn is_public(&self) -> bool {
        false
    }
}

/// Pick the metadata source for a build.
///
/// `public` selects the bundled test data. Otherwise the tree at `root`,
/// or at `$HADES_METADATA`, is used; with neither the build is refused.
pub fn open_metadata(root: Option<&Path>, public: bool) -> Result<Box<dyn MetadataSource>> {
    if public {
        tracing::warn!("CONSTRUCTING GEOMETRY FROM PUBLIC DATA ONLY");
        return Ok(Box::new(PublicMetadata::new()?));
    }

    let root = match root {
        Some(root) => root.to_path_buf(),
        None => match std::env::var_os(METADATA_ENV) {
            Some(root) if !root.is_empty() => root.into(),
            _ => return Err(ConfigError::PublicGeometryNotRequested.into()),
        },
    };
    if !root.is_dir() {
        return Err(MetadataError::NotFound(root.display().to_string()).into());
    }

    let source = HardwareMetadata::new(root);
    tracing::info!("using {}", source.describe());
    Ok(Box::new(source))
}

/// Read the run records of one measurement node, keyed by run name
pub(crate) fn parse_runs(node: &Value, origin: &str) -> std::result::Result<Vec<RunRecord>, MetadataError> {
    let malformed = |message: String| MetadataError::Malformed {
        path: origin.to_string(),
        message,
    };
    let map = node
        .as_object()
        .ok_or_else(|| malformed("expected a mapping of runs".into()))?;

    let mut runs = Vec::with_capacity(map.len());
    for (key, record) in map {
        let Some(run) = RunId::parse(key) else {
            tracing::debug!(key = %key, origin, "skipping non-run entry");
            continue;
        };
        let position = record
            .get("source_position")
            .ok_or_else(|| malformed(format!("{} has no source_position", key)))?;
        let source_position: SourcePosition = serde_json::from_value(position.clone())
            .map_err(|e| malformed(format!("{}: {}", key, e)))?;
        runs.push(RunRecord {
            run,
            source_position,
        });
    }
    runs.sort_by_key(|r| r.run);
    Ok(runs)
}

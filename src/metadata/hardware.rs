// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Metadata read from a checked-out metadata tree

use super::detector::DiodeMetadata;
use super::merge::merge_configs;
use super::source_position::RunRecord;
use super::textdb::TextDb;
use super::{parse_runs, MetadataSource};
use crate::error::MetadataError;
use std::path::{Path, PathBuf};

/// Metadata tree with the `hardware/` layout
#[derive(Debug, Clone)]
pub struct HardwareMetadata {
    db: TextDb,
}

impl HardwareMetadata {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            db: TextDb::new(root),
        }
    }

    pub fn root(&self) -> &Path {
        self.db.root()
    }
}

impl MetadataSource for HardwareMetadata {
    fn describe(&self) -> String {
        format!("metadata tree at {}", self.db.root().display())
    }

    fn diode(&self, hpge: &str) -> Result<DiodeMetadata, MetadataError> {
        let raw = self
            .db
            .get(&["hardware", "detectors", "germanium", "diodes", hpge])
            .map_err(|e| match e {
                MetadataError::NotFound(_) => MetadataError::DetectorNotFound(hpge.to_string()),
                other => other,
            })?;

        let record = match self.db.get(&["hardware", "detectors", "hades", hpge]) {
            Ok(hades) => merge_configs(&raw, &hades),
            Err(MetadataError::NotFound(_)) => {
                tracing::debug!(hpge, "no HADES mounting record, deriving from diode size");
                raw
            }
            Err(e) => return Err(e),
        };

        DiodeMetadata::from_value(&record, hpge)
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
        let node = self
            .db
            .get(&["hardware", "config", hpge, campaign, measurement])
            .map_err(|e| match e {
                MetadataError::NotFound(_) => not_found(),
                other => other,
            })?;
        let runs = parse_runs(&node, &format!("{}/{}/{}", hpge, campaign, measurement))?;
        if runs.is_empty() {
            return Err(not_found());
        }
        Ok(runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunId;
    use std::fs;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let diodes = root.join("hardware/detectors/germanium/diodes");
        fs::create_dir_all(&diodes).unwrap();
        fs::write(
            diodes.join("B00032B.yaml"),
            "name: B00032B\ntype: bege\nproduction:\n  enrichment:\n    val: 0.88\ngeometry:\n  height_in_mm: 30\n  radius_in_mm: 37\n",
        )
        .unwrap();

        let hades = root.join("hardware/detectors/hades");
        fs::create_dir_all(&hades).unwrap();
        fs::write(
            hades.join("B00032B.yaml"),
            "wrap:\n  outer_height_in_mm: 31\n  outer_radius_in_mm: 38.5\n  inner_radius_in_mm: 37.5\n  top_thickness_in_mm: 1\nholder:\n  inner_radius_in_mm: 39\n  outer_radius_in_mm: 42\n  height_in_mm: 20\n  bottom_thickness_in_mm: 2\n",
        )
        .unwrap();

        let meas = root.join("hardware/config/B00032B/c1/th_HS2_top_dlt");
        fs::create_dir_all(&meas).unwrap();
        fs::write(
            meas.join("run0002.yaml"),
            "source_position:\n  phi_in_deg: 0\n  r_in_mm: 0\n  z_in_mm: 20\n",
        )
        .unwrap();
        fs::write(
            meas.join("run0001.yaml"),
            "source_position:\n  phi_in_deg: 0\n  r_in_mm: 0\n  z_in_mm: 3\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_diode_with_hades_record() {
        let dir = tree();
        let meta = HardwareMetadata::new(dir.path());
        let diode = meta.diode("B00032B").unwrap();
        assert_eq!(diode.kind, "bege");
        assert_eq!(diode.mounting().wrap.top_thickness_in_mm, 1.0);
        assert!(matches!(
            meta.diode("V99999A"),
            Err(MetadataError::DetectorNotFound(_))
        ));
    }

    #[test]
    fn test_runs_from_directory() {
        let dir = tree();
        let meta = HardwareMetadata::new(dir.path());
        let runs = meta.measurement_runs("B00032B", "c1", "th_HS2_top_dlt").unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].run, RunId(1));
        assert_eq!(runs[1].source_position.z_in_mm, 20.0);

        assert!(matches!(
            meta.measurement_runs("B00032B", "c2", "th_HS2_top_dlt"),
            Err(MetadataError::MeasurementNotFound { .. })
        ));
    }
}

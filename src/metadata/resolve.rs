// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Resolution of a configuration against the metadata

use super::detector::DiodeMetadata;
use super::source_position::{check_source_position, format_runs, translate_to_detector_frame};
use super::MetadataSource;
use crate::config::{GeometryConfig, MeasurementInfo, RunId, SourcePosition};
use crate::error::{MetadataError, Result};

/// Everything geometry construction needs to know about one measurement
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSetup {
    pub diode: DiodeMetadata,
    pub measurement: MeasurementInfo,
    pub run: RunId,
    /// Source position as recorded in the metadata
    pub position: SourcePosition,
    /// Source position in the detector frame, `[x, y, z]` in mm
    pub frame_position: [f64; 3],
}

/// Look up the run of a configuration and the diode it measured
pub fn resolve_setup(config: &GeometryConfig, source: &dyn MetadataSource) -> Result<ResolvedSetup> {
    let measurement = &config.measurement;
    let runs = source.measurement_runs(&config.hpge_name, &config.campaign, &measurement.name)?;

    let record = runs
        .iter()
        .find(|r| r.run == config.run)
        .ok_or_else(|| MetadataError::RunNotFound {
            run: config.run.to_string(),
            details: format_runs(&runs),
        })?;

    if let Some(requested) = &config.source_position {
        let context = format!("{}/{}/{}", config.hpge_name, config.campaign, measurement.name);
        let matched = check_source_position(&runs, requested, &context)?;
        if matched != config.run {
            return Err(MetadataError::PositionMismatch {
                phi: requested.phi_in_deg,
                r: requested.r_in_mm,
                z: requested.z_in_mm,
                matched: matched.to_string(),
                requested: config.run.to_string(),
            }
            .into());
        }
    }

    let frame_position = translate_to_detector_frame(&record.source_position, &measurement.source);
    let diode = source.diode(&config.hpge_name)?;

    tracing::info!(
        hpge = %config.hpge_name,
        run = %record.run,
        measurement = %measurement,
        position = %record.source_position,
        x = frame_position[0],
        y = frame_position[1],
        z = frame_position[2],
        "resolved measurement setup"
    );

    Ok(ResolvedSetup {
        diode,
        measurement: measurement.clone(),
        run: record.run,
        position: record.source_position,
        frame_position,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::metadata::PublicMetadata;

    fn config(measurement: &str, run: u32) -> GeometryConfig {
        GeometryConfig::new("V07302A", measurement, RunId(run)).unwrap()
    }

    #[test]
    fn test_resolve_public_run() {
        let meta = PublicMetadata::new().unwrap();
        let setup = resolve_setup(&config("am_HS1_top_dlt", 1), &meta).unwrap();
        assert_eq!(setup.run, RunId(1));
        assert_eq!(setup.frame_position, [20.0, 0.0, 3.0]);
        assert_eq!(setup.diode.kind, "icpc");
    }

    #[test]
    fn test_unknown_run_lists_available() {
        let meta = PublicMetadata::new().unwrap();
        let err = resolve_setup(&config("am_HS1_top_dlt", 9), &meta).unwrap_err();
        match err {
            Error::Metadata(MetadataError::RunNotFound { run, details }) => {
                assert_eq!(run, "run0009");
                assert!(details.contains("run0001: [0, 86, 3]"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_position_must_match_run() {
        let meta = PublicMetadata::new().unwrap();
        let ok = config("am_HS1_top_dlt", 2).with_source_position(SourcePosition::new(0.0, 76.0, 3.0));
        assert!(resolve_setup(&ok, &meta).is_ok());

        let mismatch =
            config("am_HS1_top_dlt", 1).with_source_position(SourcePosition::new(0.0, 76.0, 3.0));
        assert!(matches!(
            resolve_setup(&mismatch, &meta),
            Err(Error::Metadata(MetadataError::PositionMismatch { .. }))
        ));
    }

    #[test]
    fn test_unknown_measurement() {
        let meta = PublicMetadata::new().unwrap();
        assert!(matches!(
            resolve_setup(&config("cs_HS9_top_x", 1), &meta),
            Err(Error::Metadata(MetadataError::MeasurementNotFound { .. }))
        ));
    }
}

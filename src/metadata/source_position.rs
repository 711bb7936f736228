// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Source positions of measurement runs

use crate::config::{RunId, SourcePosition};
use crate::error::MetadataError;
use crate::utils::math::{approx_eq, round_to};
use serde::{Deserialize, Serialize};

/// Radial offset of the am_HS1 collimator between metadata and detector frame
pub const HS1_RADIAL_OFFSET_MM: f64 = 66.0;

const POSITION_EPSILON: f64 = 1e-9;

/// One run of a measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run: RunId,
    pub source_position: SourcePosition,
}

/// `runXXXX: [phi, r, z]`, one line per run
pub fn format_runs(runs: &[RunRecord]) -> String {
    runs.iter()
        .map(|r| format!("{}: {}", r.run, r.source_position))
        .collect::<Vec<_>>()
        .join("\n")
}

fn push_unique(values: &mut Vec<f64>, value: f64) {
    if !values.iter().any(|v| approx_eq(*v, value, POSITION_EPSILON)) {
        values.push(value);
    }
}

fn list(values: &[f64]) -> String {
    let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("[{}]", items.join(", "))
}

/// Find the run recorded at `requested`.
///
/// Coordinates are matched in the order phi, r, z; the error for the first
/// coordinate without a match lists the values available at that level.
/// `context` names the measurement, e.g. `V07302A/c1/am_HS1_top_dlt`.
pub fn check_source_position(
    runs: &[RunRecord],
    requested: &SourcePosition,
    context: &str,
) -> Result<RunId, MetadataError> {
    let details = format_runs(runs);
    let fail = |problem: String, available: String| {
        MetadataError::PositionNotFound(format!(
            "{} for the given measurement {}.\n{}\n\nFull list of available runs, runXXXX: [phi, r, z]\n{}",
            problem, context, available, details
        ))
    };

    let mut phi_available = Vec::new();
    for r in runs {
        push_unique(&mut phi_available, r.source_position.phi_in_deg);
    }
    let same_phi: Vec<&RunRecord> = runs
        .iter()
        .filter(|r| approx_eq(r.source_position.phi_in_deg, requested.phi_in_deg, POSITION_EPSILON))
        .collect();
    if same_phi.is_empty() {
        return Err(fail(
            format!("Provided phi position [{}] not found in the database", requested.phi_in_deg),
            format!("Available phi positions are: {}", list(&phi_available)),
        ));
    }

    let mut r_available = Vec::new();
    let mut z_available = Vec::new();
    for record in &same_phi {
        let pos = &record.source_position;
        if !approx_eq(pos.r_in_mm, requested.r_in_mm, POSITION_EPSILON) {
            push_unique(&mut r_available, pos.r_in_mm);
            continue;
        }
        if !approx_eq(pos.z_in_mm, requested.z_in_mm, POSITION_EPSILON) {
            push_unique(&mut z_available, pos.z_in_mm);
            continue;
        }
        return Ok(record.run);
    }

    if z_available.is_empty() {
        Err(fail(
            format!("Provided r position [{}] not found in the database", requested.r_in_mm),
            format!(
                "For the provided phi position [{}], the available r positions are: {}",
                requested.phi_in_deg,
                list(&r_available)
            ),
        ))
    } else {
        Err(fail(
            format!("Provided z position [{}] not found in the database", requested.z_in_mm),
            format!(
                "For the provided phi position [{}] and r position [{}], the available z positions are: {}",
                requested.phi_in_deg,
                requested.r_in_mm,
                list(&z_available)
            ),
        ))
    }
}

/// Convert a metadata source position into detector-frame `[x, y, z]`.
///
/// For the am_HS1 collimator the recorded radius includes a fixed offset;
/// removing it may cross the axis, which turns phi by 180 degrees. x and y
/// are rounded to 0.01 mm.
pub fn translate_to_detector_frame(position: &SourcePosition, source: &str) -> [f64; 3] {
    let mut phi = position.phi_in_deg;
    let mut r = position.r_in_mm;
    if source == "am_HS1" && r != 0.0 {
        r -= HS1_RADIAL_OFFSET_MM;
        if r < 0.0 {
            phi += 180.0;
            r = r.abs();
        }
    }
    let phi = phi.to_radians();
    [
        round_to(r * phi.cos(), 2),
        round_to(-r * phi.sin(), 2),
        position.z_in_mm,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runs() -> Vec<RunRecord> {
        [
            (1, 0.0, 86.0, 3.0),
            (2, 0.0, 86.0, 10.0),
            (3, 0.0, 40.0, 3.0),
            (4, 90.0, 0.0, 3.0),
        ]
        .into_iter()
        .map(|(run, phi, r, z)| RunRecord {
            run: RunId(run),
            source_position: SourcePosition::new(phi, r, z),
        })
        .collect()
    }

    #[test]
    fn test_exact_match() {
        let run = check_source_position(&runs(), &SourcePosition::new(0.0, 86.0, 10.0), "m").unwrap();
        assert_eq!(run, RunId(2));
    }

    #[test]
    fn test_unknown_phi_lists_alternatives() {
        let err = check_source_position(&runs(), &SourcePosition::new(45.0, 86.0, 3.0), "V/c1/m")
            .unwrap_err()
            .to_string();
        assert!(err.contains("phi position [45]"), "{}", err);
        assert!(err.contains("[0, 90]"), "{}", err);
        assert!(err.contains("run0004: [90, 0, 3]"), "{}", err);
        assert!(err.contains("V/c1/m"));
    }

    #[test]
    fn test_unknown_r_and_z() {
        let err = check_source_position(&runs(), &SourcePosition::new(0.0, 50.0, 3.0), "m")
            .unwrap_err()
            .to_string();
        assert!(err.contains("r position [50]"), "{}", err);
        assert!(err.contains("[86, 40]"), "{}", err);

        let err = check_source_position(&runs(), &SourcePosition::new(0.0, 86.0, 7.0), "m")
            .unwrap_err()
            .to_string();
        assert!(err.contains("z position [7]"), "{}", err);
        assert!(err.contains("[3, 10]"), "{}", err);
    }

    #[test]
    fn test_translate_plain_source() {
        let xyz = translate_to_detector_frame(&SourcePosition::new(90.0, 10.0, 5.0), "th_HS2");
        assert_eq!(xyz, [0.0, -10.0, 5.0]);
    }

    #[test]
    fn test_translate_hs1_offset() {
        let xyz = translate_to_detector_frame(&SourcePosition::new(0.0, 86.0, 3.0), "am_HS1");
        assert_eq!(xyz, [20.0, 0.0, 3.0]);

        // crossing the axis flips the direction
        let xyz = translate_to_detector_frame(&SourcePosition::new(0.0, 46.0, 3.0), "am_HS1");
        assert_eq!(xyz, [-20.0, 0.0, 3.0]);

        let xyz = translate_to_detector_frame(&SourcePosition::new(30.0, 0.0, 3.0), "am_HS1");
        assert_eq!(xyz, [0.0, 0.0, 3.0]);
    }
}

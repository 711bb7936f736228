// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Measurement name parsing
//!
//! Measurement names follow `<isotope>_<HSn>_<position>_<id>`, e.g.
//! `am_HS1_top_dlt`. The id part may itself contain underscores.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Components of a measurement name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementInfo {
    /// Full measurement name as found in the metadata tree
    pub name: String,
    /// Source identifier, e.g. `am_HS1`
    pub source: String,
    /// Source placement, e.g. `top` or `lat`
    pub position: String,
    /// Measurement id, e.g. `dlt`
    pub id: String,
}

impl fmt::Display for MeasurementInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Split a measurement name into source, position and id
pub fn parse_measurement(name: &str) -> Result<MeasurementInfo, ConfigError> {
    let parts: Vec<&str> = name.split('_').collect();
    if parts.len() < 3 || parts.iter().take(3).any(|p| p.is_empty()) {
        return Err(ConfigError::InvalidField {
            field: "measurement",
            message: format!(
                "`{}` does not follow <isotope>_<HSn>_<position>_<id>",
                name
            ),
        });
    }

    Ok(MeasurementInfo {
        name: name.to_string(),
        source: format!("{}_{}", parts[0], parts[1]),
        position: parts[2].to_string(),
        id: parts[3..].join("_"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_measurement_basic() {
        let out = parse_measurement("cs_HS2_bottom_foo").unwrap();
        assert_eq!(out.source, "cs_HS2");
        assert_eq!(out.position, "bottom");
        assert_eq!(out.id, "foo");

        let out = parse_measurement("am_HS1_top_dlt").unwrap();
        assert_eq!(out.source, "am_HS1");
        assert_eq!(out.position, "top");
        assert_eq!(out.id, "dlt");

        // no renaming of the source
        let out = parse_measurement("am_HS6_top_dlt").unwrap();
        assert_eq!(out.source, "am_HS6");
    }

    #[test]
    fn test_parse_measurement_long_id() {
        let out = parse_measurement("th_HS2_lat_psa_scan_2").unwrap();
        assert_eq!(out.id, "psa_scan_2");
        assert_eq!(out.to_string(), "th_HS2_lat_psa_scan_2");
    }

    #[test]
    fn test_parse_measurement_without_id() {
        let out = parse_measurement("co_HS5_top").unwrap();
        assert_eq!(out.id, "");
    }

    #[test]
    fn test_parse_measurement_rejects_short_names() {
        assert!(parse_measurement("am_HS1").is_err());
        assert!(parse_measurement("am__top").is_err());
        assert!(parse_measurement("").is_err());
    }
}

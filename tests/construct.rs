// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! End-to-end geometry construction from configuration files

use anyhow::Result;
use hades_geom::geometry::{check_overlaps, check_registry_sanity, DetectorKind, Shape};
use hades_geom::{construct_from_file, Error};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_config(dir: &TempDir, name: &str, content: &str) -> Result<PathBuf> {
    let path = dir.path().join(name);
    fs::write(&path, content)?;
    Ok(path)
}

#[test]
fn test_public_top_measurement() -> Result<()> {
    let dir = TempDir::new()?;
    let config = write_config(
        &dir,
        "config.yaml",
        "hpge_name: V07302A\nmeasurement: am_HS1_top_dlt\nrun: 1\n",
    )?;

    let reg = construct_from_file(&config, None, true)?;
    assert!(reg.physical_volume("V07302A").is_some());
    assert!(reg.physical_volume("Source").is_some());
    assert_eq!(reg.detectors().len(), 1);
    assert_eq!(reg.detectors()[0].kind, DetectorKind::Germanium);

    assert!(check_registry_sanity(&reg).is_ok());
    assert!(check_overlaps(&reg, 1e-3, 24)?.is_empty());
    Ok(())
}

#[test]
fn test_config_formats_build_the_same_geometry() -> Result<()> {
    let dir = TempDir::new()?;
    let yaml = write_config(
        &dir,
        "config.yaml",
        "hpge_name: B00000A\nmeasurement: th_HS2_lat_psa\nrun: run0001\n",
    )?;
    let json = write_config(
        &dir,
        "config.json",
        r#"{"hpge_name": "B00000A", "measurement": "th_HS2_lat_psa", "run": 1}"#,
    )?;
    let toml = write_config(
        &dir,
        "config.toml",
        "hpge_name = \"B00000A\"\nmeasurement = \"th_HS2_lat_psa\"\nrun = 1\n",
    )?;

    let names = |path: &PathBuf| -> Result<Vec<String>> {
        let reg = construct_from_file(path, None, true)?;
        Ok(reg.physical_volumes().iter().map(|pv| pv.name.clone()).collect())
    };
    let expected = names(&yaml)?;
    assert!(expected.contains(&"s_holder_pv".to_string()));
    assert_eq!(names(&json)?, expected);
    assert_eq!(names(&toml)?, expected);
    Ok(())
}

#[test]
fn test_reference_positions_on_second_table() -> Result<()> {
    let dir = TempDir::new()?;
    let cases = [
        ("am_HS1_top_dlt", 5, 0.0, 38.0),
        ("th_HS2_top_dlt", 3, 0.0, 38.0),
        ("ba_HS4_top_dlt", 2, 0.0, 38.0),
        ("co_HS5_top_dlt", 2, 0.0, 38.0),
        ("am_HS6_top_dlt", 2, 0.0, 38.0),
        ("am_HS1_lat_dlt", 3, 30.0, 60.0),
        ("th_HS2_lat_psa", 3, 30.0, 60.0),
    ];
    for (measurement, run, r, z) in cases {
        let config = write_config(
            &dir,
            &format!("{}.yaml", measurement),
            &format!(
                "hpge_name: V07302A
measurement: {measurement}
run: {run}
source_position:
  phi_in_deg: 0.0
  r_in_mm: {r}
  z_in_mm: {z}
daq_settings:
  flashcam:
    card_interface: efb2
"
            ),
        )?;

        let reg = construct_from_file(&config, None, true)?;
        assert!(reg.physical_volume("Copper_plate_PV").is_some(), "{}", measurement);
        assert!(reg.physical_volume("source_pv").is_some(), "{}", measurement);
        assert!(check_registry_sanity(&reg).is_ok(), "{}", measurement);
    }
    Ok(())
}

#[test]
fn test_missing_required_field_is_a_config_error() -> Result<()> {
    let dir = TempDir::new()?;
    for (name, content) in [
        ("no_hpge.yaml", "measurement: am_HS1_top_dlt\nrun: 1\n"),
        ("no_run.yaml", "hpge_name: V07302A\nmeasurement: am_HS1_top_dlt\n"),
        ("no_measurement.yaml", "hpge_name: V07302A\nrun: 1\n"),
    ] {
        let config = write_config(&dir, name, content)?;
        let result = construct_from_file(&config, None, true);
        assert!(matches!(result, Err(Error::Config(_))), "{} should fail", name);
    }
    Ok(())
}

#[test]
fn test_unknown_detector_run_and_measurement() -> Result<()> {
    let dir = TempDir::new()?;
    for (name, content) in [
        ("detector.yaml", "hpge_name: X9999\nmeasurement: am_HS1_top_dlt\nrun: 1\n"),
        ("run.yaml", "hpge_name: V07302A\nmeasurement: am_HS1_top_dlt\nrun: 99\n"),
        ("measurement.yaml", "hpge_name: V07302A\nmeasurement: am_HS1_bottom_dlt\nrun: 1\n"),
    ] {
        let config = write_config(&dir, name, content)?;
        let result = construct_from_file(&config, None, true);
        assert!(matches!(result, Err(Error::Metadata(_))), "{} should fail", name);
    }
    Ok(())
}

#[test]
fn test_private_build_requires_metadata() -> Result<()> {
    let dir = TempDir::new()?;
    let config = write_config(
        &dir,
        "config.yaml",
        "hpge_name: V07302A\nmeasurement: am_HS1_top_dlt\nrun: 1\n",
    )?;
    let missing = dir.path().join("no-metadata-here");
    assert!(construct_from_file(&config, Some(&missing), false).is_err());
    Ok(())
}

#[test]
fn test_component_model_with_mounting_constants() -> Result<()> {
    let dir = TempDir::new()?;
    fs::write(
        dir.path().join("holder.gdml"),
        r#"<?xml version="1.0" encoding="UTF-8"?>
<gdml>
  <define>
    <constant name="holder_height_in_mm" value="10"/>
    <constant name="holder_inner_radius_in_mm" value="41"/>
    <constant name="holder_outer_radius_in_mm" value="44"/>
  </define>
  <materials/>
  <solids>
    <tube name="holder_model" rmin="holder_inner_radius_in_mm" rmax="holder_outer_radius_in_mm"
          z="holder_height_in_mm" deltaphi="360" aunit="deg"/>
  </solids>
  <structure>
    <volume name="holder_model">
      <materialref ref="G4_Cu"/>
      <solidref ref="holder_model"/>
    </volume>
  </structure>
  <setup name="Default" version="1.0">
    <world ref="holder_model"/>
  </setup>
</gdml>
"#,
    )?;
    let config = write_config(
        &dir,
        "config.yaml",
        "hpge_name: V07302A\nmeasurement: am_HS1_top_dlt\nrun: 1\nmodels:\n  holder: holder.gdml\n",
    )?;

    let reg = construct_from_file(&config, None, true)?;
    assert_eq!(reg.physical_volume("holder_pv").map(|pv| pv.logical.as_str()), Some("holder_model"));
    // the derived mounting of an 80 mm diode has a 42 mm holder
    let Shape::Tube { z, .. } = reg.solid("holder_model").map(|s| s.shape.clone()).unwrap() else {
        panic!("holder model should be a tube");
    };
    assert_eq!(z, 42.0);
    Ok(())
}

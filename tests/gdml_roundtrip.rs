// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! GDML write/read round trips of constructed geometries

use anyhow::Result;
use approx::assert_relative_eq;
use hades_geom::config::{GeometryConfig, RunId};
use hades_geom::geometry::{check_registry_sanity, Registry};
use hades_geom::hades::construct;
use hades_geom::io;
use hades_geom::metadata::PublicMetadata;
use std::collections::BTreeSet;
use tempfile::TempDir;

fn build(hpge: &str, measurement: &str) -> Result<Registry> {
    let config = GeometryConfig::new(hpge, measurement, RunId(1))?;
    Ok(construct(&config, &PublicMetadata::new()?)?)
}

fn roundtrip(reg: &Registry) -> Result<Registry> {
    let dir = TempDir::new()?;
    let path = dir.path().join("hades.gdml");
    io::write_gdml(reg, &path)?;
    Ok(io::read_gdml(&path)?)
}

#[test]
fn test_volumes_and_placements_survive() -> Result<()> {
    for (hpge, measurement) in [("V07302A", "am_HS1_top_dlt"), ("B00000B", "th_HS2_lat_psa")] {
        let original = build(hpge, measurement)?;
        let read = roundtrip(&original)?;

        assert_eq!(read.world(), original.world());
        assert_eq!(read.physical_volumes().len(), original.physical_volumes().len());
        for pv in original.physical_volumes() {
            let other = read
                .physical_volume(&pv.name)
                .unwrap_or_else(|| panic!("{} lost in round trip", pv.name));
            assert_eq!(other.logical, pv.logical);
            assert_eq!(other.mother, pv.mother);
            for k in 0..3 {
                assert_relative_eq!(other.placement.position[k], pv.placement.position[k], epsilon = 1e-9);
                assert_relative_eq!(other.placement.rotation[k], pv.placement.rotation[k], epsilon = 1e-9);
            }
        }
        assert!(check_registry_sanity(&read).is_ok());
    }
    Ok(())
}

#[test]
fn test_solids_materials_and_colors_survive() -> Result<()> {
    let original = build("V07302A", "am_HS1_top_dlt")?;
    let read = roundtrip(&original)?;

    for solid in original.solids() {
        assert_eq!(read.solid(&solid.name).map(|s| &s.shape), Some(&solid.shape), "{}", solid.name);
    }
    for lv in original.logical_volumes() {
        let other = read.logical_volume(&lv.name).unwrap();
        assert_eq!(other.material, lv.material);
        assert_eq!(other.color, lv.color);
    }

    let names = |reg: &Registry| -> BTreeSet<String> {
        reg.materials().iter().map(|m| m.name().to_string()).collect()
    };
    assert_eq!(names(&original), names(&read));
    let germanium = original
        .materials()
        .iter()
        .find(|m| m.name().starts_with("EnrichedGermanium"))
        .unwrap();
    assert_eq!(read.material(germanium.name()), Some(germanium));
    Ok(())
}

#[test]
fn test_detector_registration_survives() -> Result<()> {
    let original = build("P00000A", "am_HS1_top_dlt")?;
    let read = roundtrip(&original)?;

    assert_eq!(read.detectors().len(), 1);
    let (a, b) = (&original.detectors()[0], &read.detectors()[0]);
    assert_eq!(b.physvol, "P00000A");
    assert_eq!((b.kind, b.uid), (a.kind, a.uid));
    assert_eq!(b.metadata, a.metadata);
    Ok(())
}

#[test]
fn test_second_write_is_identical() -> Result<()> {
    let original = build("C000RG1", "th_HS2_top_dlt")?;
    let first = io::gdml::to_string(&original)?;
    let second = io::gdml::to_string(&roundtrip(&original)?)?;
    assert_eq!(first, second);
    Ok(())
}

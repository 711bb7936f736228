// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! r-z profiles of rotational solids

use super::{Registry, Shape, Solid};
use crate::error::GeometryError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Closed r-z outline of a solid plus the z offset of its placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub r: Vec<f64>,
    pub z: Vec<f64>,
    pub offset: f64,
}

impl Profile {
    /// Outline points in mother coordinates
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.r
            .iter()
            .zip(&self.z)
            .map(move |(&r, &z)| (r, z + self.offset))
    }

    pub fn z_range(&self) -> (f64, f64) {
        self.z.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &z| {
            (lo.min(z + self.offset), hi.max(z + self.offset))
        })
    }

    pub fn r_max(&self) -> f64 {
        self.r.iter().copied().fold(0.0, f64::max)
    }
}

/// Closed outline of a rotational solid, the first point repeated at the end
pub fn get_profile(solid: &Solid) -> Result<Profile, GeometryError> {
    let outline = match &solid.shape {
        Shape::Box { .. } | Shape::Subtraction { .. } => None,
        shape => shape.outline(),
    }
    .ok_or_else(|| {
        GeometryError::InvalidParameter(format!(
            "solid `{}` ({}) has no r-z profile",
            solid.name,
            solid.shape.kind_name()
        ))
    })?;

    let mut r: Vec<f64> = outline.iter().map(|p| p.r).collect();
    let mut z: Vec<f64> = outline.iter().map(|p| p.z).collect();
    if let (Some(&r0), Some(&z0)) = (r.first(), z.first()) {
        r.push(r0);
        z.push(z0);
    }
    Ok(Profile { r, z, offset: 0.0 })
}

/// Profiles of the rotational daughters of `mother` placed on its axis, by logical volume
pub fn collect_profiles(
    registry: &Registry,
    mother: &str,
) -> Result<BTreeMap<String, Profile>, GeometryError> {
    registry.require_logical(mother)?;
    let mut profiles = BTreeMap::new();
    for pv in registry.daughters(mother) {
        let p = &pv.placement;
        if p.is_rotated() || p.position.x.abs() > 1e-9 || p.position.y.abs() > 1e-9 {
            continue;
        }
        let solid = registry.solid_of(&pv.logical)?;
        if let Ok(mut profile) = get_profile(solid) {
            profile.offset = p.position.z;
            profiles.insert(pv.logical.clone(), profile);
        }
    }
    Ok(profiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{LogicalVolume, Material, PhysicalVolume, Placement, RzPoint, ZPlane};

    #[test]
    fn test_profile_is_closed() {
        let solid = Solid::new(
            "det",
            Shape::full_generic_polycone(vec![
                RzPoint::new(0.0, 0.0),
                RzPoint::new(10.0, 0.0),
                RzPoint::new(10.0, 20.0),
                RzPoint::new(0.0, 20.0),
            ]),
        );
        let profile = get_profile(&solid).unwrap();
        assert_eq!(profile.r.len(), 5);
        assert_eq!(profile.r.first(), profile.r.last());
        assert_eq!(profile.z.first(), profile.z.last());
        assert_eq!(profile.r_max(), 10.0);
    }

    #[test]
    fn test_polycone_profile_order() {
        let solid = Solid::new(
            "pc",
            Shape::Polycone {
                startphi: 0.0,
                deltaphi: std::f64::consts::TAU,
                planes: vec![
                    ZPlane { z: 0.0, rmin: 2.0, rmax: 3.0 },
                    ZPlane { z: 10.0, rmin: 10.0, rmax: 10.0 },
                ],
            },
        );
        let profile = get_profile(&solid).unwrap();
        assert_eq!(profile.r, vec![2.0, 10.0, 10.0, 3.0, 2.0]);
        assert_eq!(profile.z, vec![0.0, 10.0, 10.0, 0.0, 0.0]);
    }

    #[test]
    fn test_box_has_no_profile() {
        let solid = Solid::new("b", Shape::Box { x: 1.0, y: 1.0, z: 1.0 });
        assert!(get_profile(&solid).is_err());
    }

    #[test]
    fn test_collect_profiles_uses_offset() {
        let mut reg = Registry::new();
        reg.add_material(Material::nist("G4_AIR")).unwrap();
        reg.add_solid(Solid::new("world", Shape::Box { x: 100.0, y: 100.0, z: 100.0 }))
            .unwrap();
        reg.add_solid(Solid::new("cyl", Shape::full_tube(0.0, 5.0, 10.0)))
            .unwrap();
        reg.add_logical_volume(LogicalVolume::new("world_lv", "world", "G4_AIR"))
            .unwrap();
        reg.add_logical_volume(LogicalVolume::new("cyl_lv", "cyl", "G4_AIR"))
            .unwrap();
        reg.set_world("world_lv").unwrap();
        reg.add_physical_volume(PhysicalVolume::new(
            "cyl_pv",
            "cyl_lv",
            "world_lv",
            Placement::at(0.0, 0.0, -20.0),
        ))
        .unwrap();

        let profiles = collect_profiles(&reg, "world_lv").unwrap();
        let (lo, hi) = profiles["cyl_lv"].z_range();
        assert_eq!((lo, hi), (-25.0, -15.0));
    }
}

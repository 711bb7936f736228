// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Structural checks and listings of a registry

use super::{Registry, Shape};
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

/// Result of [`check_registry_sanity`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SanityReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl SanityReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check references, reachability and detector registrations.
///
/// Registries built through the registry API satisfy most of these by
/// construction; the check matters for registries read from GDML or merged
/// from external models.
pub fn check_registry_sanity(registry: &Registry) -> SanityReport {
    let mut report = SanityReport::default();

    for solid in registry.solids() {
        if let Shape::Subtraction { first, second, .. } = &solid.shape {
            for operand in [first, second] {
                if registry.solid(operand).is_none() {
                    report.errors.push(format!(
                        "solid `{}` references unknown solid `{}`",
                        solid.name, operand
                    ));
                }
            }
        }
    }

    for lv in registry.logical_volumes() {
        if registry.solid(&lv.solid).is_none() {
            report
                .errors
                .push(format!("logical volume `{}` references unknown solid `{}`", lv.name, lv.solid));
        }
        if registry.material(&lv.material).is_none() {
            report.errors.push(format!(
                "logical volume `{}` references unknown material `{}`",
                lv.name, lv.material
            ));
        }
    }

    let Some(world) = registry.world() else {
        report.errors.push("no world volume set".to_string());
        return report;
    };

    // walk the placement tree from the world
    let mut reachable = AHashSet::new();
    let mut stack = vec![world];
    while let Some(lv) = stack.pop() {
        if !reachable.insert(lv) {
            continue;
        }
        for pv in registry.daughters(lv) {
            if pv.logical == world {
                report
                    .errors
                    .push(format!("world volume placed as daughter `{}`", pv.name));
                continue;
            }
            stack.push(pv.logical.as_str());
        }
    }
    for lv in registry.logical_volumes() {
        if !reachable.contains(lv.name.as_str()) {
            report
                .warnings
                .push(format!("logical volume `{}` is not reachable from the world", lv.name));
        }
    }

    let mut uids: AHashMap<u32, &str> = AHashMap::new();
    for det in registry.detectors() {
        match registry.physical_volume(&det.physvol) {
            None => report.errors.push(format!(
                "detector uid {} names unknown physical volume `{}`",
                det.uid, det.physvol
            )),
            Some(pv) if !reachable.contains(pv.mother.as_str()) => report.warnings.push(format!(
                "detector `{}` is placed outside the world tree",
                det.physvol
            )),
            Some(_) => {}
        }
        if let Some(previous) = uids.insert(det.uid, &det.physvol) {
            report.errors.push(format!(
                "detector uid {} used by both `{}` and `{}`",
                det.uid, previous, det.physvol
            ));
        }
    }

    report
}

/// Category listed by [`print_volumes`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeKind {
    Logical,
    Physical,
    Detector,
}

impl VolumeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VolumeKind::Logical => "logical",
            VolumeKind::Physical => "physical",
            VolumeKind::Detector => "detector",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "logical" => Some(VolumeKind::Logical),
            "physical" => Some(VolumeKind::Physical),
            "detector" => Some(VolumeKind::Detector),
            _ => None,
        }
    }
}

/// One line per volume of the requested category
pub fn print_volumes(registry: &Registry, kind: VolumeKind) -> Vec<String> {
    match kind {
        VolumeKind::Logical => registry
            .logical_volumes()
            .iter()
            .map(|lv| format!("{} ({}, {})", lv.name, lv.solid, lv.material))
            .collect(),
        VolumeKind::Physical => registry
            .physical_volumes()
            .iter()
            .map(|pv| {
                let p = pv.placement.position;
                format!("{} ({} in {}) at [{}, {}, {}]", pv.name, pv.logical, pv.mother, p.x, p.y, p.z)
            })
            .collect(),
        VolumeKind::Detector => registry
            .detectors()
            .iter()
            .map(|d| format!("{} {} uid={}", d.physvol, d.kind.as_str(), d.uid))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{
        DetectorKind, DetectorRegistration, LogicalVolume, Material, PhysicalVolume, Placement,
        Solid,
    };

    fn registry() -> Registry {
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
        reg
    }

    #[test]
    fn test_missing_world() {
        let report = check_registry_sanity(&registry());
        assert!(!report.is_ok());
        assert!(report.errors[0].contains("world"));
    }

    #[test]
    fn test_unreachable_volume_warns() {
        let mut reg = registry();
        reg.set_world("world_lv").unwrap();
        let report = check_registry_sanity(&reg);
        assert!(report.is_ok());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("cyl_lv"));
    }

    #[test]
    fn test_complete_registry_and_listings() {
        let mut reg = registry();
        reg.set_world("world_lv").unwrap();
        reg.add_physical_volume(PhysicalVolume::new(
            "cyl_pv",
            "cyl_lv",
            "world_lv",
            Placement::at(1.0, 2.0, 3.0),
        ))
        .unwrap();
        reg.register_detector(DetectorRegistration {
            physvol: "cyl_pv".into(),
            kind: DetectorKind::Germanium,
            uid: 1,
            metadata: None,
        })
        .unwrap();

        let report = check_registry_sanity(&reg);
        assert!(report.is_ok());
        assert!(report.warnings.is_empty());

        assert_eq!(print_volumes(&reg, VolumeKind::Logical).len(), 2);
        assert_eq!(
            print_volumes(&reg, VolumeKind::Physical),
            vec!["cyl_pv (cyl_lv in world_lv) at [1, 2, 3]".to_string()]
        );
        assert_eq!(
            print_volumes(&reg, VolumeKind::Detector),
            vec!["cyl_pv germanium uid=1".to_string()]
        );
        assert_eq!(VolumeKind::from_str("physical"), Some(VolumeKind::Physical));
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry registry: the named materials, solids and volumes of one geometry

use super::{Material, Placement, Shape, Solid};
use crate::error::GeometryError;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Volume definition: a solid filled with a material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalVolume {
    pub name: String,
    pub solid: String,
    pub material: String,
    /// RGBA display color, 0..1
    pub color: Option<[f32; 4]>,
}

impl LogicalVolume {
    pub fn new(name: impl Into<String>, solid: impl Into<String>, material: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            solid: solid.into(),
            material: material.into(),
            color: None,
        }
    }

    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = Some(color);
        self
    }
}

/// Placement of a logical volume inside a mother logical volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalVolume {
    pub name: String,
    pub logical: String,
    pub mother: String,
    pub placement: Placement,
    pub copy_number: u32,
}

impl PhysicalVolume {
    pub fn new(
        name: impl Into<String>,
        logical: impl Into<String>,
        mother: impl Into<String>,
        placement: Placement,
    ) -> Self {
        Self {
            name: name.into(),
            logical: logical.into(),
            mother: mother.into(),
            placement,
            copy_number: 0,
        }
    }
}

/// Kind of sensitive detector attached to a physical volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectorKind {
    Germanium,
    Optical,
    Scintillator,
}

impl DetectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorKind::Germanium => "germanium",
            DetectorKind::Optical => "optical",
            DetectorKind::Scintillator => "scintillator",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "germanium" => Some(DetectorKind::Germanium),
            "optical" => Some(DetectorKind::Optical),
            "scintillator" => Some(DetectorKind::Scintillator),
            _ => None,
        }
    }
}

/// Sensitive-detector registration carried to the simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorRegistration {
    pub physvol: String,
    pub kind: DetectorKind,
    pub uid: u32,
    pub metadata: Option<serde_json::Value>,
}

/// Registry of all definitions making up one geometry.
///
/// Definitions keep insertion order, which is also the serialization
/// order. References are checked when a definition is added.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    materials: Vec<Material>,
    solids: Vec<Solid>,
    logical_volumes: Vec<LogicalVolume>,
    physical_volumes: Vec<PhysicalVolume>,
    detectors: Vec<DetectorRegistration>,
    world: Option<String>,
    material_index: AHashMap<String, usize>,
    solid_index: AHashMap<String, usize>,
    logical_index: AHashMap<String, usize>,
    physical_index: AHashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a material; re-adding an identical definition is a no-op
    pub fn add_material(&mut self, material: Material) -> Result<String, GeometryError> {
        let name = material.name().to_string();
        if let Some(&i) = self.material_index.get(&name) {
            return if self.materials[i] == material {
                Ok(name)
            } else {
                Err(GeometryError::NameCollision {
                    kind: "material",
                    name,
                })
            };
        }
        self.material_index.insert(name.clone(), self.materials.len());
        self.materials.push(material);
        Ok(name)
    }

    /// Add a solid; re-adding an identical definition is a no-op
    pub fn add_solid(&mut self, solid: Solid) -> Result<String, GeometryError> {
        solid.shape.validate(&solid.name)?;
        if let Some(&i) = self.solid_index.get(&solid.name) {
            return if self.solids[i] == solid {
                Ok(solid.name)
            } else {
                Err(GeometryError::NameCollision {
                    kind: "solid",
                    name: solid.name,
                })
            };
        }
        if let Shape::Subtraction { first, second, .. } = &solid.shape {
            self.require_solid(first)?;
            self.require_solid(second)?;
        }
        let name = solid.name.clone();
        self.solid_index.insert(name.clone(), self.solids.len());
        self.solids.push(solid);
        Ok(name)
    }

    /// Add a logical volume; its solid and material must exist
    pub fn add_logical_volume(&mut self, volume: LogicalVolume) -> Result<String, GeometryError> {
        if let Some(&i) = self.logical_index.get(&volume.name) {
            return if self.logical_volumes[i] == volume {
                Ok(volume.name)
            } else {
                Err(GeometryError::NameCollision {
                    kind: "logical volume",
                    name: volume.name,
                })
            };
        }
        self.require_solid(&volume.solid)?;
        if !self.material_index.contains_key(&volume.material) {
            return Err(GeometryError::MissingReference {
                kind: "material",
                name: volume.material,
            });
        }
        let name = volume.name.clone();
        self.logical_index.insert(name.clone(), self.logical_volumes.len());
        self.logical_volumes.push(volume);
        Ok(name)
    }

    /// Place a logical volume inside a mother; names must be unique
    pub fn add_physical_volume(&mut self, volume: PhysicalVolume) -> Result<String, GeometryError> {
        if self.physical_index.contains_key(&volume.name) {
            return Err(GeometryError::NameCollision {
                kind: "physical volume",
                name: volume.name,
            });
        }
        self.require_logical(&volume.logical)?;
        self.require_logical(&volume.mother)?;
        if volume.logical == volume.mother || self.is_ancestor(&volume.logical, &volume.mother) {
            return Err(GeometryError::InvalidParameter(format!(
                "placing `{}` inside `{}` creates a cycle",
                volume.logical, volume.mother
            )));
        }
        if self.world.as_deref() == Some(volume.logical.as_str()) {
            return Err(GeometryError::InvalidParameter(format!(
                "the world volume `{}` cannot be placed",
                volume.logical
            )));
        }
        tracing::debug!(
            pv = %volume.name,
            lv = %volume.logical,
            mother = %volume.mother,
            x = volume.placement.position.x,
            y = volume.placement.position.y,
            z = volume.placement.position.z,
            "placed volume"
        );
        let name = volume.name.clone();
        self.physical_index.insert(name.clone(), self.physical_volumes.len());
        self.physical_volumes.push(volume);
        Ok(name)
    }

    pub fn set_world(&mut self, logical: &str) -> Result<(), GeometryError> {
        self.require_logical(logical)?;
        if self.physical_volumes.iter().any(|pv| pv.logical == logical) {
            return Err(GeometryError::InvalidParameter(format!(
                "`{}` is placed inside another volume and cannot be the world",
                logical
            )));
        }
        self.world = Some(logical.to_string());
        Ok(())
    }

    /// Register a physical volume as a sensitive detector
    pub fn register_detector(&mut self, detector: DetectorRegistration) -> Result<(), GeometryError> {
        if !self.physical_index.contains_key(&detector.physvol) {
            return Err(GeometryError::MissingReference {
                kind: "physical volume",
                name: detector.physvol,
            });
        }
        if self.detectors.iter().any(|d| d.uid == detector.uid) {
            return Err(GeometryError::InvalidParameter(format!(
                "detector uid {} is already registered",
                detector.uid
            )));
        }
        if self.detectors.iter().any(|d| d.physvol == detector.physvol) {
            return Err(GeometryError::NameCollision {
                kind: "detector",
                name: detector.physvol,
            });
        }
        self.detectors.push(detector);
        Ok(())
    }

    /// Copy every definition of another registry and return its world volume name.
    ///
    /// Identical definitions are shared; conflicting ones are an error.
    pub fn import(&mut self, other: &Registry) -> Result<String, GeometryError> {
        let world = other.world().ok_or(GeometryError::NoWorld)?.to_string();
        for material in &other.materials {
            self.add_material(material.clone())?;
        }
        for solid in &other.solids {
            self.add_solid(solid.clone())?;
        }
        for volume in &other.logical_volumes {
            self.add_logical_volume(volume.clone())?;
        }
        for volume in &other.physical_volumes {
            self.add_physical_volume(volume.clone())?;
        }
        for detector in &other.detectors {
            self.register_detector(detector.clone())?;
        }
        Ok(world)
    }

    pub fn material(&self, name: &str) -> Option<&Material> {
        self.material_index.get(name).map(|&i| &self.materials[i])
    }

    pub fn solid(&self, name: &str) -> Option<&Solid> {
        self.solid_index.get(name).map(|&i| &self.solids[i])
    }

    pub fn logical_volume(&self, name: &str) -> Option<&LogicalVolume> {
        self.logical_index.get(name).map(|&i| &self.logical_volumes[i])
    }

    pub fn physical_volume(&self, name: &str) -> Option<&PhysicalVolume> {
        self.physical_index.get(name).map(|&i| &self.physical_volumes[i])
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn solids(&self) -> &[Solid] {
        &self.solids
    }

    pub fn logical_volumes(&self) -> &[LogicalVolume] {
        &self.logical_volumes
    }

    pub fn physical_volumes(&self) -> &[PhysicalVolume] {
        &self.physical_volumes
    }

    pub fn detectors(&self) -> &[DetectorRegistration] {
        &self.detectors
    }

    pub fn world(&self) -> Option<&str> {
        self.world.as_deref()
    }

    pub fn world_volume(&self) -> Result<&LogicalVolume, GeometryError> {
        let name = self.world.as_deref().ok_or(GeometryError::NoWorld)?;
        self.logical_volume(name).ok_or_else(|| GeometryError::MissingReference {
            kind: "logical volume",
            name: name.to_string(),
        })
    }

    /// Physical volumes placed directly inside `mother`
    pub fn daughters<'a>(&'a self, mother: &'a str) -> impl Iterator<Item = &'a PhysicalVolume> + 'a {
        self.physical_volumes.iter().filter(move |pv| pv.mother == mother)
    }

    /// Look up the solid of a logical volume
    pub fn solid_of(&self, logical: &str) -> Result<&Solid, GeometryError> {
        let volume = self.require_logical(logical)?;
        self.require_solid(&volume.solid)
    }

    pub fn require_solid(&self, name: &str) -> Result<&Solid, GeometryError> {
        self.solid(name).ok_or_else(|| GeometryError::MissingReference {
            kind: "solid",
            name: name.to_string(),
        })
    }

    pub fn require_logical(&self, name: &str) -> Result<&LogicalVolume, GeometryError> {
        self.logical_volume(name)
            .ok_or_else(|| GeometryError::MissingReference {
                kind: "logical volume",
                name: name.to_string(),
            })
    }

    /// True when `descendant` is placed, directly or indirectly, inside `ancestor`
    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> bool {
        let mut stack = vec![ancestor];
        let mut seen = ahash::AHashSet::new();
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            for pv in self.daughters(current) {
                if pv.logical == descendant {
                    return true;
                }
                stack.push(pv.logical.as_str());
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Shape;

    fn small_registry() -> Registry {
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
        reg
    }

    #[test]
    fn test_add_and_lookup() {
        let mut reg = small_registry();
        reg.add_physical_volume(PhysicalVolume::new(
            "cyl_pv",
            "cyl_lv",
            "world_lv",
            Placement::at(0.0, 0.0, 10.0),
        ))
        .unwrap();

        assert_eq!(reg.world(), Some("world_lv"));
        assert_eq!(reg.daughters("world_lv").count(), 1);
        assert_eq!(reg.physical_volume("cyl_pv").unwrap().logical, "cyl_lv");
        assert_eq!(reg.solid_of("cyl_lv").unwrap().name, "cyl");
    }

    #[test]
    fn test_identical_redefinition_is_shared() {
        let mut reg = small_registry();
        assert!(reg.add_material(Material::nist("G4_AIR")).is_ok());
        assert!(reg
            .add_solid(Solid::new("cyl", Shape::full_tube(0.0, 5.0, 10.0)))
            .is_ok());
        assert!(matches!(
            reg.add_solid(Solid::new("cyl", Shape::full_tube(0.0, 6.0, 10.0))),
            Err(GeometryError::NameCollision { kind: "solid", .. })
        ));
        assert_eq!(reg.solids().len(), 2);
    }

    #[test]
    fn test_missing_references() {
        let mut reg = small_registry();
        assert!(matches!(
            reg.add_logical_volume(LogicalVolume::new("x", "nope", "G4_AIR")),
            Err(GeometryError::MissingReference { kind: "solid", .. })
        ));
        assert!(matches!(
            reg.add_logical_volume(LogicalVolume::new("x", "cyl", "G4_Pb")),
            Err(GeometryError::MissingReference { kind: "material", .. })
        ));
        assert!(reg
            .add_physical_volume(PhysicalVolume::new(
                "pv",
                "cyl_lv",
                "nope",
                Placement::identity()
            ))
            .is_err());
    }

    #[test]
    fn test_duplicate_physical_volume_names() {
        let mut reg = small_registry();
        let pv = PhysicalVolume::new("cyl_pv", "cyl_lv", "world_lv", Placement::identity());
        reg.add_physical_volume(pv.clone()).unwrap();
        assert!(matches!(
            reg.add_physical_volume(pv),
            Err(GeometryError::NameCollision { .. })
        ));
    }

    #[test]
    fn test_cycles_are_rejected() {
        let mut reg = small_registry();
        reg.add_solid(Solid::new("inner", Shape::full_tube(0.0, 1.0, 1.0)))
            .unwrap();
        reg.add_logical_volume(LogicalVolume::new("inner_lv", "inner", "G4_AIR"))
            .unwrap();
        reg.add_physical_volume(PhysicalVolume::new(
            "inner_pv",
            "inner_lv",
            "cyl_lv",
            Placement::identity(),
        ))
        .unwrap();

        // cyl_lv inside inner_lv would close the loop
        assert!(reg
            .add_physical_volume(PhysicalVolume::new(
                "loop_pv",
                "cyl_lv",
                "inner_lv",
                Placement::identity()
            ))
            .is_err());
        assert!(reg
            .add_physical_volume(PhysicalVolume::new(
                "self_pv",
                "cyl_lv",
                "cyl_lv",
                Placement::identity()
            ))
            .is_err());
        assert!(reg
            .add_physical_volume(PhysicalVolume::new(
                "world_pv",
                "world_lv",
                "cyl_lv",
                Placement::identity()
            ))
            .is_err());
    }

    #[test]
    fn test_detector_registration() {
        let mut reg = small_registry();
        reg.add_physical_volume(PhysicalVolume::new(
            "cyl_pv",
            "cyl_lv",
            "world_lv",
            Placement::identity(),
        ))
        .unwrap();

        let det = DetectorRegistration {
            physvol: "cyl_pv".into(),
            kind: DetectorKind::Germanium,
            uid: 1,
            metadata: None,
        };
        reg.register_detector(det.clone()).unwrap();
        assert!(reg.register_detector(det).is_err());
        assert!(reg
            .register_detector(DetectorRegistration {
                physvol: "missing".into(),
                kind: DetectorKind::Germanium,
                uid: 2,
                metadata: None,
            })
            .is_err());
    }

    #[test]
    fn test_import_shares_identical_definitions() {
        let mut reg = small_registry();
        let mut other = Registry::new();
        other.add_material(Material::nist("G4_AIR")).unwrap();
        other
            .add_solid(Solid::new("part", Shape::Box { x: 1.0, y: 1.0, z: 1.0 }))
            .unwrap();
        other
            .add_logical_volume(LogicalVolume::new("part_lv", "part", "G4_AIR"))
            .unwrap();
        other.set_world("part_lv").unwrap();

        let world = reg.import(&other).unwrap();
        assert_eq!(world, "part_lv");
        assert!(reg.logical_volume("part_lv").is_some());
        assert_eq!(reg.world(), Some("world_lv"));
        assert!(reg.import(&Registry::new()).is_err());
    }
}

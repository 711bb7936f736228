// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Logical volumes of the test stand components
//!
//! Each builder registers the materials, solids and the logical volume of
//! one component and returns the logical volume name. Placement is left to
//! the caller.

use super::dimensions::*;
use super::hpge::detector_profile;
use super::source::CapsuleSpec;
use crate::error::GeometryError;
use crate::geometry::{
    LogicalVolume, Material, PhysicalVolume, Placement, Registry, RzPoint, Shape, Solid,
};
use crate::metadata::{DiodeMetadata, HadesMounting};

pub const CRYOSTAT_COLOR: [f32; 4] = [0.6, 0.6, 0.6, 0.2];
pub const CAVITY_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 0.0];
pub const DETECTOR_COLOR: [f32; 4] = [0.0, 0.6, 0.9, 1.0];
pub const WRAP_COLOR: [f32; 4] = [0.5, 0.5, 0.5, 0.3];
pub const COPPER_COLOR: [f32; 4] = [0.72, 0.45, 0.2, 0.5];
pub const PLATE_COLOR: [f32; 4] = [0.6, 0.6, 0.6, 0.5];
pub const LEAD_COLOR: [f32; 4] = [0.3, 0.3, 0.35, 0.15];
pub const CAPSULE_COLOR: [f32; 4] = [0.8, 0.8, 0.8, 0.8];
pub const SOURCE_COLOR: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
pub const PLEXIGLASS_COLOR: [f32; 4] = [0.9, 0.9, 1.0, 0.3];

fn logical(
    reg: &mut Registry,
    name: &str,
    shape: Shape,
    material: Material,
    color: Option<[f32; 4]>,
) -> Result<String, GeometryError> {
    let solid = reg.add_solid(Solid::new(name, shape))?;
    let material = reg.add_material(material)?;
    let mut volume = LogicalVolume::new(name, solid, material);
    if let Some(color) = color {
        volume = volume.with_color(color);
    }
    reg.add_logical_volume(volume)
}

/// Air-filled world box; becomes the registry world
pub fn create_world(reg: &mut Registry) -> Result<String, GeometryError> {
    reg.add_solid(Solid::new(
        "world",
        Shape::Box {
            x: WORLD_SIZE,
            y: WORLD_SIZE,
            z: WORLD_SIZE,
        },
    ))?;
    reg.add_material(Material::nist("G4_AIR"))?;
    let world = reg.add_logical_volume(LogicalVolume::new("world_lv", "world", "G4_AIR"))?;
    reg.set_world(&world)?;
    Ok(world)
}

/// Solid aluminium cylinder; the vacuum cavity is carved out as a daughter
pub fn create_cryostat(reg: &mut Registry) -> Result<String, GeometryError> {
    logical(
        reg,
        "cryostat",
        Shape::full_tube(0.0, CRYOSTAT_RADIUS, CRYOSTAT_HEIGHT),
        Material::nist("G4_Al"),
        Some(CRYOSTAT_COLOR),
    )
}

pub fn create_vacuum_cavity(reg: &mut Registry) -> Result<String, GeometryError> {
    reg.add_solid(Solid::new(
        "vacuum_cavity",
        Shape::full_tube(0.0, CAVITY_RADIUS, CAVITY_HEIGHT),
    ))?;
    reg.add_material(Material::nist("G4_Galactic"))?;
    reg.add_logical_volume(
        LogicalVolume::new("cavity_lv", "vacuum_cavity", "G4_Galactic").with_color(CAVITY_COLOR),
    )
}

/// Germanium crystal of a diode, named after the diode
pub fn create_detector(reg: &mut Registry, diode: &DiodeMetadata) -> Result<String, GeometryError> {
    let profile = detector_profile(diode)?;
    logical(
        reg,
        &diode.name,
        Shape::full_generic_polycone(profile),
        Material::germanium(diode.enrichment()),
        Some(DETECTOR_COLOR),
    )
}

/// PVC cup over the crystal, local z = 0 at its outer top face
pub fn create_wrap(reg: &mut Registry, mounting: &HadesMounting) -> Result<String, GeometryError> {
    let w = &mounting.wrap;
    let (ro, ri) = (w.outer_radius_in_mm, w.inner_radius_in_mm);
    let (h, t) = (w.outer_height_in_mm, w.top_thickness_in_mm);
    let points = vec![
        RzPoint::new(0.0, 0.0),
        RzPoint::new(ro, 0.0),
        RzPoint::new(ro, -h),
        RzPoint::new(ri, -h),
        RzPoint::new(ri, -t),
        RzPoint::new(0.0, -t),
    ];
    logical(
        reg,
        "wrap",
        Shape::full_generic_polycone(points),
        Material::nist("G4_POLYVINYL_CHLORIDE"),
        Some(WRAP_COLOR),
    )
}

/// Copper cup the crystal rests in, local z = 0 at its outer bottom face
pub fn create_holder(reg: &mut Registry, mounting: &HadesMounting) -> Result<String, GeometryError> {
    let hd = &mounting.holder;
    let (ro, ri) = (hd.outer_radius_in_mm, hd.inner_radius_in_mm);
    let (h, b) = (hd.height_in_mm, hd.bottom_thickness_in_mm);
    let points = vec![
        RzPoint::new(0.0, 0.0),
        RzPoint::new(ro, 0.0),
        RzPoint::new(ro, h),
        RzPoint::new(ri, h),
        RzPoint::new(ri, b),
        RzPoint::new(0.0, b),
    ];
    logical(
        reg,
        "holder",
        Shape::full_generic_polycone(points),
        Material::nist("G4_Cu"),
        Some(COPPER_COLOR),
    )
}

pub fn create_bottom_plate(reg: &mut Registry) -> Result<String, GeometryError> {
    logical(
        reg,
        "bottom_plate",
        Shape::full_tube(0.0, BOTTOM_PLATE_RADIUS, BOTTOM_PLATE_HEIGHT),
        Material::nist("G4_Al"),
        Some(PLATE_COLOR),
    )
}

/// Lead box with the measurement cavity subtracted
pub fn create_lead_castle(reg: &mut Registry, table: &CastleTable) -> Result<String, GeometryError> {
    let [ox, oy, oz] = table.outer;
    let [ix, iy, iz] = table.inner;
    let outer = reg.add_solid(Solid::new("lead_castle_outer", Shape::Box { x: ox, y: oy, z: oz }))?;
    let inner = reg.add_solid(Solid::new("lead_castle_cavity", Shape::Box { x: ix, y: iy, z: iz }))?;
    logical(
        reg,
        "lead_castle",
        Shape::Subtraction {
            first: outer,
            second: inner,
            placement: Placement::at(0.0, 0.0, table.cavity_offset_z()),
        },
        Material::nist("G4_Pb"),
        Some(LEAD_COLOR),
    )
}

/// Copper plate on the castle floor, only on tables that have one
pub fn create_copper_plate(
    reg: &mut Registry,
    table: &CastleTable,
) -> Result<Option<String>, GeometryError> {
    let Some([x, y, z]) = table.copper_plate else {
        return Ok(None);
    };
    logical(
        reg,
        "Copper_plate",
        Shape::Box { x, y, z },
        Material::nist("G4_Cu"),
        Some(COPPER_COLOR),
    )
    .map(Some)
}

/// Source capsule with the active volume `Source` placed inside
pub fn create_source(reg: &mut Registry, spec: &CapsuleSpec) -> Result<String, GeometryError> {
    let capsule = logical(
        reg,
        "source_capsule",
        Shape::full_tube(0.0, spec.radius, spec.height),
        Material::nist(spec.material),
        Some(CAPSULE_COLOR),
    )?;
    let active = logical(
        reg,
        "Source",
        Shape::full_tube(0.0, spec.active_radius, spec.active_height),
        Material::nist(spec.active_material),
        Some(SOURCE_COLOR),
    )?;
    reg.add_physical_volume(PhysicalVolume::new(
        "Source",
        active,
        capsule.as_str(),
        Placement::at(0.0, 0.0, spec.active_z()),
    ))?;
    Ok(capsule)
}

/// Plexiglass plate the capsule of a top measurement lies on
pub fn create_top_source_holder(reg: &mut Registry) -> Result<String, GeometryError> {
    logical(
        reg,
        "source_holder",
        Shape::full_tube(
            0.0,
            SOURCE_HOLDER_TOP_PLATE_RADIUS,
            SOURCE_HOLDER_TOP_PLATE_HEIGHT,
        ),
        Material::nist("G4_PLEXIGLASS"),
        Some(PLEXIGLASS_COLOR),
    )
}

/// Plexiglass bar behind the capsule of a lateral measurement
pub fn create_lateral_source_holder(reg: &mut Registry) -> Result<String, GeometryError> {
    let [x, y, z] = LATERAL_HOLDER_SIZE;
    logical(
        reg,
        "source_holder",
        Shape::Box { x, y, z },
        Material::nist("G4_PLEXIGLASS"),
        Some(PLEXIGLASS_COLOR),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::shape::polygon_area;
    use crate::metadata::{MetadataSource, PublicMetadata};

    #[test]
    fn test_world_is_set() {
        let mut reg = Registry::new();
        let world = create_world(&mut reg).unwrap();
        assert_eq!(reg.world(), Some(world.as_str()));
        assert!(reg.material("G4_AIR").is_some());
    }

    #[test]
    fn test_cups_are_closed_outlines() {
        let diode = PublicMetadata::new().unwrap().diode("V07302A").unwrap();
        let mounting = diode.mounting();
        let mut reg = Registry::new();
        let wrap = create_wrap(&mut reg, &mounting).unwrap();
        let holder = create_holder(&mut reg, &mounting).unwrap();
        for lv in [wrap, holder] {
            let outline = reg.solid_of(&lv).unwrap().shape.outline().unwrap();
            assert_eq!(outline.len(), 6);
            assert!(polygon_area(&outline).abs() > 1.0);
        }
    }

    #[test]
    fn test_source_contains_active_volume() {
        let mut reg = Registry::new();
        let spec = CapsuleSpec::for_source("ba_HS4").unwrap();
        let capsule = create_source(&mut reg, spec).unwrap();
        let daughters: Vec<_> = reg.daughters(&capsule).map(|pv| pv.name.as_str()).collect();
        assert_eq!(daughters, vec!["Source"]);
        assert_eq!(reg.logical_volume("Source").unwrap().material, "G4_KAPTON");
    }

    #[test]
    fn test_copper_plate_only_on_table_two() {
        let mut reg = Registry::new();
        assert_eq!(create_copper_plate(&mut reg, &TABLE_1).unwrap(), None);
        assert_eq!(
            create_copper_plate(&mut reg, &TABLE_2).unwrap().as_deref(),
            Some("Copper_plate")
        );
    }

    #[test]
    fn test_castle_is_subtraction() {
        let mut reg = Registry::new();
        let castle = create_lead_castle(&mut reg, &TABLE_2).unwrap();
        let solid = reg.solid_of(&castle).unwrap();
        assert!(matches!(solid.shape, Shape::Subtraction { .. }));
        assert_eq!(reg.logical_volume(&castle).unwrap().material, "G4_Pb");
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Assembly of the full test stand geometry

use super::assembly::Assembly;
use super::dimensions::*;
use super::source::{source_layout, CapsuleSpec, SourceSide};
use super::volumes::*;
use crate::config::{GeometryConfig, COARSE_SEGMENTS};
use crate::error::{GeometryError, Result};
use crate::geometry::tessellate::tessellate_solid;
use crate::geometry::{
    BoundingBox, DetectorKind, DetectorRegistration, PhysicalVolume, Placement, Registry,
};
use crate::io::read_gdml_with_replacements;
use crate::metadata::{resolve_setup, DiodeMetadata, HadesMounting, MetadataSource, ResolvedSetup};
use nalgebra::Point3;
use std::collections::BTreeMap;

/// Resolve a configuration and build its geometry
pub fn construct(config: &GeometryConfig, source: &dyn MetadataSource) -> Result<Registry> {
    let setup = resolve_setup(config, source)?;
    build_registry(config, &setup)
}

/// Logical volume that placed volumes go into, and its world z
struct Mother {
    logical: String,
    z: f64,
}

struct Builder<'a> {
    reg: Registry,
    config: &'a GeometryConfig,
    replacements: BTreeMap<String, f64>,
}

impl Builder<'_> {
    /// Build a component, or import it from its configured model file
    fn component(
        &mut self,
        assembly: Assembly,
        build: impl FnOnce(&mut Registry) -> std::result::Result<String, GeometryError>,
    ) -> Result<String> {
        match self.config.models.get(&assembly) {
            Some(path) => {
                tracing::info!(%assembly, path = %path.display(), "importing component model");
                let model = read_gdml_with_replacements(path, &self.replacements)?;
                Ok(self.reg.import(&model)?)
            }
            None => Ok(build(&mut self.reg)?),
        }
    }

    fn place(&mut self, name: &str, logical: &str, mother: &Mother, placement: Placement) -> Result<()> {
        let mut placement = placement;
        placement.position.z -= mother.z;
        self.reg.add_physical_volume(PhysicalVolume::new(
            name,
            logical,
            mother.logical.as_str(),
            placement,
        ))?;
        Ok(())
    }
}

/// Build the geometry of a resolved measurement setup
pub fn build_registry(config: &GeometryConfig, setup: &ResolvedSetup) -> Result<Registry> {
    let table = CastleTable::from_card_interface(config.daq_settings.card_interface())?;
    let diode = &setup.diode;
    let mounting = diode.mounting();

    let mut b = Builder {
        reg: Registry::new(),
        config,
        replacements: mounting.replacements(),
    };
    let world = Mother {
        logical: create_world(&mut b.reg)?,
        z: 0.0,
    };

    let mut inner = Mother {
        logical: world.logical.clone(),
        z: 0.0,
    };
    if config.has(Assembly::Cryostat) {
        let cryostat = b.component(Assembly::Cryostat, create_cryostat)?;
        b.place("cryostat_pv", &cryostat, &world, Placement::at(0.0, 0.0, CRYOSTAT_CENTER_Z))?;
        inner = Mother {
            logical: cryostat,
            z: CRYOSTAT_CENTER_Z,
        };
    }
    if config.has(Assembly::VacuumCavity) {
        let cavity = b.component(Assembly::VacuumCavity, create_vacuum_cavity)?;
        b.place("cavity_pv", &cavity, &inner, Placement::at(0.0, 0.0, CAVITY_CENTER_Z))?;
        inner = Mother {
            logical: cavity,
            z: CAVITY_CENTER_Z,
        };
    }

    let mounted = [Assembly::Detector, Assembly::Wrap, Assembly::Holder];
    if mounted.iter().any(|&a| config.has(a)) {
        check_mounting(diode, &mounting)?;
    }
    let detector_top = WRAP_TOP_Z - mounting.wrap.top_thickness_in_mm;
    let detector_bottom = detector_top - diode.geometry.height_in_mm;

    if config.has(Assembly::Detector) {
        let lv = b.component(Assembly::Detector, |reg| create_detector(reg, diode))?;
        b.place(&diode.name, &lv, &inner, Placement::at(0.0, 0.0, detector_bottom))?;
        let metadata = serde_json::to_value(diode).map_err(|e| {
            GeometryError::InvalidParameter(format!("metadata of {} is not serializable: {}", diode.name, e))
        })?;
        b.reg.register_detector(DetectorRegistration {
            physvol: diode.name.clone(),
            kind: DetectorKind::Germanium,
            uid: 1,
            metadata: Some(metadata),
        })?;
    }
    if config.has(Assembly::Wrap) {
        let lv = b.component(Assembly::Wrap, |reg| create_wrap(reg, &mounting))?;
        b.place("wrap_pv", &lv, &inner, Placement::at(0.0, 0.0, WRAP_TOP_Z))?;
    }
    if config.has(Assembly::Holder) {
        let lv = b.component(Assembly::Holder, |reg| create_holder(reg, &mounting))?;
        let z = detector_bottom - mounting.holder.bottom_thickness_in_mm;
        b.place("holder_pv", &lv, &inner, Placement::at(0.0, 0.0, z))?;
    }

    if config.has(Assembly::BottomPlate) {
        let lv = b.component(Assembly::BottomPlate, create_bottom_plate)?;
        b.place("plate_pv", &lv, &world, Placement::at(0.0, 0.0, BOTTOM_PLATE_CENTER_Z))?;
    }
    if config.has(Assembly::LeadCastle) {
        let lv = b.component(Assembly::LeadCastle, |reg| create_lead_castle(reg, table))?;
        b.place("castle_pv", &lv, &world, Placement::at(0.0, 0.0, table.center_z()))?;
        if let Some(plate) = create_copper_plate(&mut b.reg, table)? {
            let z = table.copper_plate_center_z();
            b.place("Copper_plate_PV", &plate, &world, Placement::at(0.0, 0.0, z))?;
        }
    }

    if config.has(Assembly::Source) || config.has(Assembly::SourceHolder) {
        let side = SourceSide::from_measurement(&setup.measurement.position)?;
        let spec = CapsuleSpec::for_source(&setup.measurement.source)?;
        let layout = source_layout(spec, side, setup.frame_position, setup.position.phi_in_deg)?;

        if config.has(Assembly::Source) {
            let lv = b.component(Assembly::Source, |reg| create_source(reg, spec))?;
            check_inside_castle(&b.reg, &lv, &layout.capsule, table)?;
            b.place("source_pv", &lv, &world, layout.capsule)?;
        }
        if config.has(Assembly::SourceHolder) {
            let lv = b.component(Assembly::SourceHolder, |reg| match side {
                SourceSide::Top => create_top_source_holder(reg),
                SourceSide::Lateral => create_lateral_source_holder(reg),
            })?;
            check_inside_castle(&b.reg, &lv, &layout.holder, table)?;
            b.place("s_holder_pv", &lv, &world, layout.holder)?;
        }
    }

    tracing::info!(
        hpge = %diode.name,
        table = table.number,
        volumes = b.reg.physical_volumes().len(),
        "constructed geometry"
    );
    Ok(b.reg)
}

/// Wrap and holder must enclose the crystal and fit into the cryostat
fn check_mounting(diode: &DiodeMetadata, mounting: &HadesMounting) -> std::result::Result<(), GeometryError> {
    let invalid = |message: String| {
        Err(GeometryError::InvalidParameter(format!(
            "mounting of {}: {}",
            diode.name, message
        )))
    };
    let (height, radius) = (diode.geometry.height_in_mm, diode.geometry.radius_in_mm);
    let w = &mounting.wrap;
    let h = &mounting.holder;

    if !(w.inner_radius_in_mm >= radius && w.outer_radius_in_mm > w.inner_radius_in_mm) {
        return invalid(format!(
            "wrap radii {}..{} do not enclose the crystal radius {}",
            w.inner_radius_in_mm, w.outer_radius_in_mm, radius
        ));
    }
    if !(w.top_thickness_in_mm > 0.0
        && w.outer_height_in_mm > w.top_thickness_in_mm
        && w.outer_height_in_mm <= w.top_thickness_in_mm + height + 1e-9)
    {
        return invalid(format!(
            "wrap height {} must lie between its top thickness {} and the crystal bottom",
            w.outer_height_in_mm, w.top_thickness_in_mm
        ));
    }
    if !(h.inner_radius_in_mm >= w.outer_radius_in_mm && h.outer_radius_in_mm > h.inner_radius_in_mm) {
        return invalid(format!(
            "holder radii {}..{} do not clear the wrap radius {}",
            h.inner_radius_in_mm, h.outer_radius_in_mm, w.outer_radius_in_mm
        ));
    }
    if !(h.bottom_thickness_in_mm > 0.0 && h.height_in_mm > h.bottom_thickness_in_mm) {
        return invalid(format!(
            "holder height {} must exceed its bottom thickness {}",
            h.height_in_mm, h.bottom_thickness_in_mm
        ));
    }

    if h.outer_radius_in_mm > CAVITY_RADIUS {
        return invalid(format!(
            "holder radius {} exceeds the cryostat cavity radius {}",
            h.outer_radius_in_mm, CAVITY_RADIUS
        ));
    }
    let cavity_bottom = CAVITY_CENTER_Z - CAVITY_HEIGHT / 2.0;
    let holder_bottom = WRAP_TOP_Z - w.top_thickness_in_mm - height - h.bottom_thickness_in_mm;
    if holder_bottom < cavity_bottom {
        return invalid(format!(
            "holder bottom at z = {} mm is below the cavity floor at {} mm",
            holder_bottom, cavity_bottom
        ));
    }
    Ok(())
}

/// Placed volume must lie within the lead castle cavity
fn check_inside_castle(
    reg: &Registry,
    logical: &str,
    placement: &Placement,
    table: &CastleTable,
) -> std::result::Result<(), GeometryError> {
    let solid = reg.solid_of(logical)?.name.clone();
    let mut mesh = tessellate_solid(reg, &solid, COARSE_SEGMENTS)?;
    mesh.transform(&placement.to_matrix());
    let bounds = mesh.bounding_box();

    let (lo, hi) = table.cavity_bounds();
    let cavity = BoundingBox::new(Point3::from(lo), Point3::from(hi));
    if !cavity.contains_box(&bounds, 1e-9) {
        return Err(GeometryError::InvalidParameter(format!(
            "`{}` spans {:?}..{:?} and leaves the castle cavity of table {}",
            logical,
            bounds.min.coords.as_slice(),
            bounds.max.coords.as_slice(),
            table.number
        )));
    }
    Ok(())
}
